//! JSON messages exchanged with the decision-maker.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use whisker_core::{AgentId, Outbound};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed target {0:?}")]
    Target(String),
}

/// Simulation-to-decision-maker payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientData {
    /// Decision request.
    Input {
        agent_id: AgentId,
        input: Vec<f64>,
        epsilon: f64,
    },
    Transition {
        agent_id: AgentId,
        state: Vec<f64>,
        action_index: usize,
        reward: f64,
        after_state: Vec<f64>,
    },
    Snapshot,
    Epsilon { epsilon: f64 },
}

impl ClientData {
    /// Wire form of a world event. Registration travels out of band and has none.
    pub fn from_outbound(event: Outbound) -> Option<Self> {
        match event {
            Outbound::Register { .. } => None,
            Outbound::DecisionRequest {
                agent,
                observation,
                exploration,
            } => Some(ClientData::Input {
                agent_id: agent,
                input: observation.0,
                epsilon: exploration,
            }),
            Outbound::TransitionReport {
                agent,
                before,
                action_index,
                reward,
                after,
            } => Some(ClientData::Transition {
                agent_id: agent,
                state: before.0,
                action_index,
                reward,
                after_state: after.0,
            }),
            Outbound::SnapshotRequest => Some(ClientData::Snapshot),
            Outbound::SetExploration { exploration } => Some(ClientData::Epsilon {
                epsilon: exploration,
            }),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClientData::Input { .. } => "input",
            ClientData::Transition { .. } => "transition",
            ClientData::Snapshot => "snapshot",
            ClientData::Epsilon { .. } => "epsilon",
        }
    }
}

/// Decision-maker-to-simulation payloads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerData {
    Action { agent_id: Target, action_index: i64 },
}

/// Addressee of a [`ServerData`] message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Target {
    Agent(AgentId),
    /// `"*"`: whichever agent registered first.
    Any,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Agent(id) => write!(f, "{id}"),
            Target::Any => f.write_str("*"),
        }
    }
}

impl FromStr for Target {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "*" {
            return Ok(Target::Any);
        }
        s.parse::<AgentId>()
            .map(Target::Agent)
            .map_err(|_| WireError::Target(s.to_string()))
    }
}

impl TryFrom<String> for Target {
    type Error = WireError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Target> for String {
    fn from(target: Target) -> Self {
        target.to_string()
    }
}

impl From<AgentId> for Target {
    fn from(id: AgentId) -> Self {
        Target::Agent(id)
    }
}

pub fn encode_client_data(data: &ClientData) -> Result<String, WireError> {
    Ok(serde_json::to_string(data)?)
}

pub fn decode_client_data(text: &str) -> Result<ClientData, WireError> {
    Ok(serde_json::from_str(text)?)
}

pub fn encode_server_data(data: &ServerData) -> Result<String, WireError> {
    Ok(serde_json::to_string(data)?)
}

pub fn decode_server_data(text: &str) -> Result<ServerData, WireError> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use whisker_core::Observation;

    #[test]
    fn input_uses_decision_maker_field_names() {
        let data = ClientData::from_outbound(Outbound::DecisionRequest {
            agent: AgentId(0x2a),
            observation: Observation(vec![1.0, 0.5, 1.0]),
            exploration: 0.5,
        })
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&encode_client_data(&data).unwrap()).unwrap();
        assert_eq!(json["type"], "input");
        assert_eq!(json["agent_id"], "000000000000002a");
        assert_eq!(json["input"], serde_json::json!([1.0, 0.5, 1.0]));
        assert_eq!(json["epsilon"], 0.5);
    }

    #[test]
    fn register_has_no_client_data() {
        assert_eq!(ClientData::from_outbound(Outbound::Register { agent: AgentId(1) }), None);
    }

    #[test]
    fn wildcard_target_parses() {
        let data = decode_server_data(r#"{"type":"action","agent_id":"*","action_index":3}"#).unwrap();
        assert_eq!(
            data,
            ServerData::Action {
                agent_id: Target::Any,
                action_index: 3
            }
        );
        assert!(decode_server_data(r#"{"type":"action","agent_id":"zz","action_index":3}"#).is_err());
    }
}
