use tokio::sync::mpsc::{error::TryRecvError, unbounded_channel};
use whisker_core::config::SpawnSpec;
use whisker_core::{AgentId, AgentState, DecisionResponse, World, WorldConfig};
use whisker_relay::{
    decode_client_data, encode_client_data, encode_server_data, ClientData, Relay, RelayError,
    RelaySink, ServerData, Target,
};

fn action(target: Target, action_index: i64) -> ServerData {
    ServerData::Action {
        agent_id: target,
        action_index,
    }
}

#[test]
fn forward_without_decision_maker_drops_data() {
    let mut relay = Relay::new();
    assert_eq!(
        relay.forward(ClientData::Snapshot),
        Err(RelayError::NoDecisionMaker("snapshot"))
    );
}

#[test]
fn forward_reaches_the_attached_decision_maker() {
    let mut relay = Relay::new();
    let (tx, mut rx) = unbounded_channel();
    relay.attach_decision_maker(tx);

    relay.forward(ClientData::Epsilon { epsilon: 0.1 }).unwrap();
    assert_eq!(rx.try_recv().unwrap(), ClientData::Epsilon { epsilon: 0.1 });

    relay.detach_decision_maker();
    assert!(!relay.has_decision_maker());
    assert!(relay.forward(ClientData::Snapshot).is_err());
}

#[test]
fn closed_decision_maker_is_detached() {
    let mut relay = Relay::new();
    let (tx, rx) = unbounded_channel();
    relay.attach_decision_maker(tx);
    drop(rx);

    assert!(relay.forward(ClientData::Snapshot).is_err());
    assert!(!relay.has_decision_maker());
}

#[test]
fn route_delivers_to_the_owning_client() {
    let mut relay = Relay::new();
    let (a_tx, mut a_rx) = unbounded_channel();
    let (b_tx, mut b_rx) = unbounded_channel();
    relay.register_agent(AgentId(1), 100, a_tx);
    relay.register_agent(AgentId(2), 200, b_tx);

    assert_eq!(relay.route(action(Target::Agent(AgentId(2)), 4)), Ok(AgentId(2)));
    assert_eq!(
        b_rx.try_recv().unwrap(),
        DecisionResponse {
            agent: AgentId(2),
            action_index: 4
        }
    );
    assert_eq!(a_rx.try_recv(), Err(TryRecvError::Empty));
}

#[test]
fn wildcard_goes_to_the_first_registered_agent() {
    let mut relay = Relay::new();
    assert_eq!(relay.route(action(Target::Any, 0)), Err(RelayError::NoAgents));

    let (a_tx, mut a_rx) = unbounded_channel();
    let (b_tx, _b_rx) = unbounded_channel();
    relay.register_agent(AgentId(7), 1, a_tx);
    relay.register_agent(AgentId(3), 1, b_tx);

    assert_eq!(relay.route(action(Target::Any, 1)), Ok(AgentId(7)));
    assert_eq!(a_rx.try_recv().unwrap().agent, AgentId(7));
}

#[test]
fn unknown_target_is_reported() {
    let mut relay = Relay::new();
    assert_eq!(
        relay.route(action(Target::Agent(AgentId(9)), 0)),
        Err(RelayError::UnknownAgent(AgentId(9)))
    );
}

#[test]
fn detaching_a_client_drops_only_its_agents() {
    let mut relay = Relay::new();
    let (tx, _rx) = unbounded_channel();
    relay.register_agent(AgentId(1), 1, tx.clone());
    relay.register_agent(AgentId(2), 2, tx.clone());
    relay.register_agent(AgentId(3), 1, tx);

    assert_eq!(relay.detach_agents_of(1), 2);
    assert_eq!(relay.agents().collect::<Vec<_>>(), vec![AgentId(2)]);
    assert_eq!(relay.detach_agents_of(1), 0);
}

#[test]
fn closed_client_route_is_removed() {
    let mut relay = Relay::new();
    let (tx, rx) = unbounded_channel();
    relay.register_agent(AgentId(1), 1, tx);
    drop(rx);

    assert_eq!(
        relay.route(action(Target::Agent(AgentId(1)), 0)),
        Err(RelayError::ClientGone(AgentId(1)))
    );
    assert_eq!(relay.agent_count(), 0);
}

#[test]
fn world_round_trip_through_the_relay() {
    let mut config = WorldConfig::empty(400.0, 400.0);
    config.agents = vec![SpawnSpec::at("a", 100.0, 100.0)];
    let mut world = World::new(config).unwrap();
    let id = world.agents()[0].id;

    let mut relay = Relay::new();
    let (dm_tx, mut dm_rx) = unbounded_channel();
    relay.attach_decision_maker(dm_tx);
    let (resp_tx, mut resp_rx) = unbounded_channel();

    {
        let mut sink = RelaySink::new(&mut relay, 1, resp_tx.clone());
        world.register_agents(&mut sink);
        world.tick(&mut sink);
        assert_eq!(sink.dropped(), 0);
    }
    assert_eq!(relay.agents().collect::<Vec<_>>(), vec![id]);

    // The decision-maker sees the request as JSON and answers to the wildcard.
    let request = dm_rx.try_recv().unwrap();
    let request = decode_client_data(&encode_client_data(&request).unwrap()).unwrap();
    let (agent_id, input) = match request {
        ClientData::Input {
            agent_id, input, ..
        } => (agent_id, input),
        other => panic!("expected input, got {other:?}"),
    };
    assert_eq!(agent_id, id);
    assert_eq!(input.len(), 27);
    assert!(encode_server_data(&action(Target::Any, 0))
        .unwrap()
        .contains(r#""agent_id":"*""#));

    relay.route(action(Target::Any, 0)).unwrap();
    let response = resp_rx.try_recv().unwrap();
    assert_eq!(response.agent, id);

    {
        let mut sink = RelaySink::new(&mut relay, 1, resp_tx);
        world.handle_response(response, &mut sink).unwrap();
    }
    match dm_rx.try_recv().unwrap() {
        ClientData::Transition {
            agent_id,
            action_index,
            state,
            after_state,
            ..
        } => {
            assert_eq!(agent_id, id);
            assert_eq!(action_index, 0);
            assert_eq!(state, input);
            assert_eq!(after_state.len(), 27);
        }
        other => panic!("expected transition, got {other:?}"),
    }
}

#[test]
fn sink_counts_events_it_could_not_deliver() {
    let mut relay = Relay::new();
    let (resp_tx, _resp_rx) = unbounded_channel();
    let world = World::new(WorldConfig::empty(100.0, 100.0)).unwrap();

    let mut sink = RelaySink::new(&mut relay, 1, resp_tx);
    world.request_snapshot(&mut sink);
    assert_eq!(sink.dropped(), 1);
}

#[test]
fn requests_lost_before_attach_are_reissued_after_release() {
    let mut config = WorldConfig::empty(400.0, 400.0);
    config.agents = vec![SpawnSpec::at("early", 100.0, 100.0)];
    let mut world = World::new(config).unwrap();
    let id = world.agents()[0].id;

    let mut relay = Relay::new();
    let (resp_tx, _resp_rx) = unbounded_channel();
    {
        let mut sink = RelaySink::new(&mut relay, 1, resp_tx.clone());
        world.register_agents(&mut sink);
        world.tick(&mut sink);
        assert_eq!(sink.dropped(), 1);
    }

    let (dm_tx, mut dm_rx) = unbounded_channel();
    relay.attach_decision_maker(dm_tx);
    for _ in 0..100 {
        let mut sink = RelaySink::new(&mut relay, 1, resp_tx.clone());
        world.tick(&mut sink);
    }
    assert_eq!(dm_rx.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(
        world.agent(id).unwrap().state,
        AgentState::Waiting { since_tick: 1 }
    );

    assert_eq!(world.release_waiting(), 1);
    {
        let mut sink = RelaySink::new(&mut relay, 1, resp_tx);
        world.tick(&mut sink);
        assert_eq!(sink.dropped(), 0);
    }
    match dm_rx.try_recv().unwrap() {
        ClientData::Input { agent_id, .. } => assert_eq!(agent_id, id),
        other => panic!("expected input, got {other:?}"),
    }
}
