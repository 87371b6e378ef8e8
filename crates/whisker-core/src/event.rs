//! Events crossing the simulation boundary.

use serde::{Deserialize, Serialize};

use crate::eye::CHANNELS_PER_EYE;
use crate::{AgentId, Eye};

/// Flattened eye readings: three channels per eye, `1.0` meaning nothing seen.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Observation(pub Vec<f64>);

impl Observation {
    pub fn from_eyes(eyes: &[Eye]) -> Self {
        let mut values = vec![1.0; eyes.len() * CHANNELS_PER_EYE];
        for (eye, block) in eyes.iter().zip(values.chunks_exact_mut(CHANNELS_PER_EYE)) {
            eye.write_channels(block);
        }
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Simulation-to-decision-maker traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Outbound {
    /// Sent once per agent when the world is populated.
    Register { agent: AgentId },
    DecisionRequest {
        agent: AgentId,
        observation: Observation,
        exploration: f64,
    },
    TransitionReport {
        agent: AgentId,
        before: Observation,
        action_index: usize,
        reward: f64,
        after: Observation,
    },
    /// Ask the decision-maker to persist its state. Fire-and-forget.
    SnapshotRequest,
    /// New exploration parameter for every agent.
    SetExploration { exploration: f64 },
}

impl Outbound {
    pub fn agent(&self) -> Option<AgentId> {
        match self {
            Outbound::Register { agent }
            | Outbound::DecisionRequest { agent, .. }
            | Outbound::TransitionReport { agent, .. } => Some(*agent),
            Outbound::SnapshotRequest | Outbound::SetExploration { .. } => None,
        }
    }
}

/// Decision-maker reply. `action_index` is untrusted and checked against the action catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionResponse {
    pub agent: AgentId,
    pub action_index: i64,
}

/// Where the world sends [`Outbound`] events.
///
/// Sinks must not block; a sink with nobody listening simply drops events.
pub trait EventSink {
    fn send(&mut self, event: Outbound);
}

#[derive(Debug, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&mut self, _event: Outbound) {}
}

#[derive(Debug, Default)]
pub struct VecEventSink {
    pub events: Vec<Outbound>,
}

impl VecEventSink {
    pub fn take(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for VecEventSink {
    fn send(&mut self, event: Outbound) {
        self.events.push(event);
    }
}
