use core::fmt;
use core::str::FromStr;
use std::f64::consts::{FRAC_PI_2, TAU};

use serde::{Deserialize, Serialize};

use crate::event::Observation;
use crate::reward::{self, Digestion, RewardBreakdown};
use crate::{Action, Eye, FoodKind, SimError, Vec2};

/// Opaque agent identifier, rendered as 16 lowercase hex digits on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for AgentId {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str_radix(s, 16)
            .map(AgentId)
            .map_err(|_| SimError::InvalidConfig(format!("malformed agent id {s:?}")))
    }
}

impl TryFrom<String> for AgentId {
    type Error = SimError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AgentId> for String {
    fn from(id: AgentId) -> Self {
        id.to_string()
    }
}

/// Decision-request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    #[default]
    Ready,
    /// A decision request is outstanding since `since_tick`.
    Waiting { since_tick: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub position: Vec2,
    pub radius: f64,
    /// Heading in radians, kept in `[0, 2π)`.
    pub angle: f64,
    pub eyes: Vec<Eye>,
    pub state: AgentState,
    /// Exploration parameter forwarded with every decision request.
    pub exploration: f64,
    pub current_action: Option<Action>,
    pub last_reward: f64,
    pub digestion: Digestion,
    pub total_good_food: u32,
    pub total_bad_food: u32,
    /// Observation sent with the outstanding (or last) decision request.
    pub last_observation: Observation,
}

impl Agent {
    pub fn new(id: AgentId, name: impl Into<String>, position: Vec2, eyes: Vec<Eye>) -> Self {
        let last_observation = Observation::from_eyes(&eyes);
        Self {
            id,
            name: name.into(),
            position,
            radius: 10.0,
            angle: 0.0,
            eyes,
            state: AgentState::Ready,
            exploration: 0.5,
            current_action: None,
            last_reward: 0.0,
            digestion: Digestion::default(),
            total_good_food: 0,
            total_bad_food: 0,
            last_observation,
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = wrap_heading(angle);
        self
    }

    pub fn with_exploration(mut self, exploration: f64) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn is_ready(&self) -> bool {
        self.state == AgentState::Ready
    }

    /// Current eye readings as a fresh observation vector.
    pub fn observation(&self) -> Observation {
        Observation::from_eyes(&self.eyes)
    }

    pub fn eye_end_point(&self, eye: &Eye) -> Vec2 {
        eye.end_point(self.position, self.angle)
    }

    /// Drive both wheels for one step.
    ///
    /// Each wheel contact point sits `radius / 2` to either side of the heading; each is
    /// swung around the other by its wheel's rotation and the body lands between them.
    pub fn apply_action(&mut self, action: Action) {
        let (rotation1, rotation2) = action.wheels();
        self.current_action = Some(action);

        let axle = Vec2::new(0.0, self.radius / 2.0).rotate(self.angle + FRAC_PI_2);
        let wheel1 = self.position + axle;
        let wheel2 = self.position - axle;

        let swing1 = (self.position - wheel2).rotate(-rotation1);
        let swing2 = (self.position - wheel1).rotate(rotation2);
        let half1 = (wheel2 + swing1).scale(0.5);
        let half2 = (wheel1 + swing2).scale(0.5);
        self.position = half1 + half2;

        self.angle -= rotation1;
        if self.angle < 0.0 {
            self.angle += TAU;
        }
        self.angle += rotation2;
        if self.angle >= TAU {
            self.angle -= TAU;
        }
    }

    pub fn eat(&mut self, kind: FoodKind) {
        self.digestion.eat(kind);
        match kind {
            FoodKind::Good => self.total_good_food += 1,
            FoodKind::Bad => self.total_bad_food += 1,
        }
    }

    /// Score the step just taken from the current eye readings, then decay digestion.
    pub fn reward(&mut self) -> RewardBreakdown {
        let breakdown = reward::score(&self.eyes, self.current_action, &mut self.digestion);
        self.last_reward = breakdown.total;
        breakdown
    }
}

/// Bring an arbitrary angle into `[0, 2π)`.
pub fn wrap_heading(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}
