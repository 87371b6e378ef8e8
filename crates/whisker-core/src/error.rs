use crate::AgentId;

/// Input the world refused to act on. None of these leave the world in a different state.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("no agent with id {0}")]
    UnknownAgent(AgentId),
    #[error("action index {index} outside catalog of {count}")]
    ActionOutOfRange { index: i64, count: usize },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
