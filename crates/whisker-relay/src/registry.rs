//! Agent routes and the decision-maker slot.

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use whisker_core::{AgentId, DecisionResponse};

use crate::wire::{ClientData, ServerData, Target};

/// Identifies the simulation client that owns a set of agent routes.
pub type ClientId = u64;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("no decision-maker attached; {0} dropped")]
    NoDecisionMaker(&'static str),
    #[error("no client owns agent {0}")]
    UnknownAgent(AgentId),
    #[error("wildcard target but no agents registered")]
    NoAgents,
    #[error("client for agent {0} went away")]
    ClientGone(AgentId),
}

struct Route {
    agent: AgentId,
    client: ClientId,
    responses: UnboundedSender<DecisionResponse>,
}

/// Routes traffic between any number of simulation clients and at most one decision-maker.
///
/// Agent routes are kept in registration order; the wildcard target resolves to the oldest.
#[derive(Default)]
pub struct Relay {
    routes: Vec<Route>,
    decision_maker: Option<UnboundedSender<ClientData>>,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route for `agent`. Returns `false` if the agent already had one; the first
    /// route is kept.
    pub fn register_agent(
        &mut self,
        agent: AgentId,
        client: ClientId,
        responses: UnboundedSender<DecisionResponse>,
    ) -> bool {
        if self.routes.iter().any(|r| r.agent == agent) {
            debug!(%agent, client, "agent already registered");
            return false;
        }
        info!(%agent, client, "agent joined");
        self.routes.push(Route {
            agent,
            client,
            responses,
        });
        true
    }

    /// Drop every route owned by `client`. Returns how many were removed.
    pub fn detach_agents_of(&mut self, client: ClientId) -> usize {
        let before = self.routes.len();
        self.routes.retain(|r| {
            let owned = r.client == client;
            if owned {
                info!(agent = %r.agent, client, "agent left");
            }
            !owned
        });
        before - self.routes.len()
    }

    /// Attach the decision-maker, replacing any previous one.
    pub fn attach_decision_maker(&mut self, outbound: UnboundedSender<ClientData>) {
        if self.decision_maker.replace(outbound).is_some() {
            warn!("decision-maker replaced");
        } else {
            info!("decision-maker joined");
        }
    }

    pub fn detach_decision_maker(&mut self) {
        if self.decision_maker.take().is_some() {
            info!("decision-maker left");
        }
    }

    pub fn has_decision_maker(&self) -> bool {
        self.decision_maker.is_some()
    }

    pub fn agent_count(&self) -> usize {
        self.routes.len()
    }

    /// Registered agents, oldest first.
    pub fn agents(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.routes.iter().map(|r| r.agent)
    }

    /// Pass client data to the decision-maker. Without one the data is dropped.
    pub fn forward(&mut self, data: ClientData) -> Result<(), RelayError> {
        let kind = data.kind();
        let Some(decision_maker) = &self.decision_maker else {
            warn!(kind, "no decision-maker to send client data");
            return Err(RelayError::NoDecisionMaker(kind));
        };
        if decision_maker.send(data).is_err() {
            warn!(kind, "decision-maker channel closed");
            self.decision_maker = None;
            return Err(RelayError::NoDecisionMaker(kind));
        }
        Ok(())
    }

    /// Deliver a decision to the client that owns its target agent.
    ///
    /// A wildcard response is delivered to the oldest agent and rewritten to name it.
    pub fn route(&mut self, data: ServerData) -> Result<AgentId, RelayError> {
        let ServerData::Action {
            agent_id: target,
            action_index,
        } = data;

        let position = match target {
            Target::Agent(agent) => self.routes.iter().position(|r| r.agent == agent),
            Target::Any => (!self.routes.is_empty()).then_some(0),
        };
        let Some(position) = position else {
            return Err(match target {
                Target::Agent(agent) => {
                    warn!(%agent, "no client/agent to send server data");
                    RelayError::UnknownAgent(agent)
                }
                Target::Any => {
                    debug!("wildcard server data with no agents registered");
                    RelayError::NoAgents
                }
            });
        };

        let route = &self.routes[position];
        let agent = route.agent;
        let response = DecisionResponse {
            agent,
            action_index,
        };
        if route.responses.send(response).is_err() {
            warn!(%agent, "client channel closed; dropping its route");
            self.routes.remove(position);
            return Err(RelayError::ClientGone(agent));
        }
        Ok(agent)
    }
}
