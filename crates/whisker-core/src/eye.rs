use serde::{Deserialize, Serialize};

use crate::Vec2;

/// What an eye ray hit first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensedKind {
    #[default]
    Nothing,
    Wall,
    GoodFood,
    BadFood,
}

impl SensedKind {
    /// Observation channel for this kind within an eye's three-channel block.
    pub fn channel(self) -> Option<usize> {
        match self {
            SensedKind::Nothing => None,
            SensedKind::Wall => Some(0),
            SensedKind::GoodFood => Some(1),
            SensedKind::BadFood => Some(2),
        }
    }
}

/// Channels per eye in an observation vector.
pub const CHANNELS_PER_EYE: usize = 3;

/// Fixed-angle ray sensor attached to an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Eye {
    /// Offset from the agent heading, in radians.
    pub angle: f64,
    pub max_range: f64,
    pub sensed_proximity: f64,
    pub sensed: SensedKind,
}

impl Eye {
    pub fn new(angle: f64, max_range: f64) -> Self {
        Self {
            angle,
            max_range,
            sensed_proximity: max_range,
            sensed: SensedKind::Nothing,
        }
    }

    /// Far end of the ray for an agent at `origin` facing `heading`.
    pub fn end_point(&self, origin: Vec2, heading: f64) -> Vec2 {
        let (sin, cos) = (heading + self.angle).sin_cos();
        Vec2::new(origin.x + self.max_range * sin, origin.y + self.max_range * cos)
    }

    pub fn clear(&mut self) {
        self.sensed = SensedKind::Nothing;
        self.sensed_proximity = self.max_range;
    }

    pub fn record(&mut self, kind: SensedKind, proximity: f64) {
        self.sensed = kind;
        self.sensed_proximity = proximity;
    }

    /// Sensed distance scaled into `[0, 1]`.
    pub fn normalized_proximity(&self) -> f64 {
        self.sensed_proximity / self.max_range
    }

    /// Write this eye's three channels into `out`.
    pub fn write_channels(&self, out: &mut [f64]) {
        out[..CHANNELS_PER_EYE].fill(1.0);
        if let Some(channel) = self.sensed.channel() {
            out[channel] = self.normalized_proximity();
        }
    }
}
