//! Deterministic particle-life engine.
//!
//! Agents steer a two-wheel body around a walled arena, see through ray-cast eyes, eat food and
//! collect a shaped reward. Decisions come from an external policy process: the [`World`] emits
//! decision requests on its fixed tick and applies the action indices that come back.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod action;
pub mod agent;
pub mod config;
pub mod error;
pub mod event;
pub mod eye;
pub mod food;
pub mod geometry;
pub mod math;
pub mod reward;
pub mod rng;
pub mod world;

pub use action::Action;
pub use agent::{Agent, AgentId, AgentState};
pub use config::{BoxSpec, EyeLayout, FoodRuleset, SpawnSpec, WorldConfig};
pub use error::SimError;
pub use event::{
    DecisionResponse, EventSink, NullEventSink, Observation, Outbound, VecEventSink,
};
pub use eye::{Eye, SensedKind};
pub use food::{Food, FoodKind, Freshness};
pub use geometry::{circle_intersect, segment_intersect, Intersection, Segment};
pub use math::Vec2;
pub use reward::{Digestion, RewardBreakdown};
pub use rng::{DeterministicRng, SplitMix64};
pub use world::{Hit, StepReport, World};
