//! Stand-in decision-maker so a world can run without an external learner.

use clap::ValueEnum;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};
use whisker_core::{Action, DeterministicRng, SplitMix64};
use whisker_relay::{ClientData, ServerData, Target};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ResponderKind {
    /// Uniformly random action for every request
    Random,
    /// Always drive straight ahead
    Forward,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ResponderStats {
    pub requests: u64,
    pub transitions: u64,
    pub reward_sum: f64,
    pub snapshots: u64,
}

/// Answer decision requests until the relay closes `inbox`.
pub async fn run(
    kind: ResponderKind,
    seed: u64,
    mut inbox: UnboundedReceiver<ClientData>,
    outbox: UnboundedSender<ServerData>,
) -> ResponderStats {
    let mut rng = SplitMix64::new(seed);
    let mut stats = ResponderStats::default();

    while let Some(data) = inbox.recv().await {
        match data {
            ClientData::Input { agent_id, .. } => {
                stats.requests += 1;
                let action_index = match kind {
                    ResponderKind::Forward => Action::Forward.index() as i64,
                    ResponderKind::Random => (rng.next_u64() % Action::COUNT as u64) as i64,
                };
                let reply = ServerData::Action {
                    agent_id: Target::Agent(agent_id),
                    action_index,
                };
                if outbox.send(reply).is_err() {
                    debug!("driver gone; responder stopping");
                    break;
                }
            }
            ClientData::Transition { reward, .. } => {
                stats.transitions += 1;
                stats.reward_sum += reward;
            }
            ClientData::Snapshot => {
                stats.snapshots += 1;
                info!("snapshot requested; stand-in responder has nothing to persist");
            }
            ClientData::Epsilon { epsilon } => {
                info!(epsilon, "responder exploration updated");
            }
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;
    use whisker_core::AgentId;

    #[tokio::test]
    async fn forward_responder_answers_every_input() {
        let (in_tx, in_rx) = unbounded_channel();
        let (out_tx, mut out_rx) = unbounded_channel();

        for id in [1, 2] {
            in_tx
                .send(ClientData::Input {
                    agent_id: AgentId(id),
                    input: vec![1.0; 27],
                    epsilon: 0.5,
                })
                .unwrap();
        }
        in_tx
            .send(ClientData::Transition {
                agent_id: AgentId(1),
                state: Vec::new(),
                action_index: 0,
                reward: 1.5,
                after_state: Vec::new(),
            })
            .unwrap();
        in_tx.send(ClientData::Snapshot).unwrap();
        drop(in_tx);

        let stats = run(ResponderKind::Forward, 0, in_rx, out_tx).await;
        assert_eq!(
            stats,
            ResponderStats {
                requests: 2,
                transitions: 1,
                reward_sum: 1.5,
                snapshots: 1,
            }
        );
        for id in [1, 2] {
            assert_eq!(
                out_rx.recv().await,
                Some(ServerData::Action {
                    agent_id: Target::Agent(AgentId(id)),
                    action_index: 0,
                })
            );
        }
    }

    #[tokio::test]
    async fn random_responder_stays_inside_the_catalog() {
        let (in_tx, in_rx) = unbounded_channel();
        let (out_tx, mut out_rx) = unbounded_channel();
        for _ in 0..200 {
            in_tx
                .send(ClientData::Input {
                    agent_id: AgentId(1),
                    input: Vec::new(),
                    epsilon: 1.0,
                })
                .unwrap();
        }
        drop(in_tx);

        run(ResponderKind::Random, 9, in_rx, out_tx).await;
        while let Some(ServerData::Action { action_index, .. }) = out_rx.recv().await {
            assert!((0..Action::COUNT as i64).contains(&action_index));
        }
    }
}
