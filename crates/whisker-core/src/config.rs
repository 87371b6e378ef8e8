//! World configuration loading and validation.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{Eye, SimError, Vec2};

/// Everything needed to build a [`crate::World`], loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f64,
    pub height: f64,

    /// Inset of the outer wall box from the world edge.
    pub pad: f64,

    /// Extra wall boxes inside the arena.
    pub interior_boxes: Vec<BoxSpec>,

    /// Fixed tick rate of the driving scheduler, in Hz.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: f64,

    /// Food is restocked up to this many items.
    #[serde(default = "default_food_target")]
    pub food_target: usize,

    #[serde(default = "default_food_radius")]
    pub food_radius: f64,

    /// Food spawns at least this far from the world edge.
    #[serde(default = "default_food_margin")]
    pub food_margin: f64,

    /// Age added to every food item per tick. Follows `tick_hz` when unset.
    pub food_age_step: Option<f64>,

    pub food_rules: FoodRuleset,

    pub agents: Vec<SpawnSpec>,

    pub eyes: EyeLayout,

    /// Initial exploration parameter of every agent.
    #[serde(default = "default_exploration")]
    pub exploration: f64,

    /// Transitions are reported only for agents exploring above this.
    pub transition_threshold: f64,

    /// Return an agent to ready after this many ticks without a decision.
    pub decision_timeout_ticks: Option<u64>,

    pub seed: u64,
}

fn default_tick_hz() -> f64 {
    60.0
}
fn default_food_target() -> usize {
    30
}
fn default_food_radius() -> f64 {
    10.0
}
fn default_food_margin() -> f64 {
    20.0
}
fn default_exploration() -> f64 {
    0.5
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            pad: 10.0,
            interior_boxes: vec![
                BoxSpec {
                    x: 100.0,
                    y: 100.0,
                    w: 200.0,
                    h: 300.0,
                    sides: BoxSpec::TOP | BoxSpec::RIGHT | BoxSpec::BOTTOM,
                },
                BoxSpec {
                    x: 400.0,
                    y: 100.0,
                    w: 200.0,
                    h: 300.0,
                    sides: BoxSpec::TOP | BoxSpec::RIGHT | BoxSpec::LEFT,
                },
            ],
            tick_hz: default_tick_hz(),
            food_target: default_food_target(),
            food_radius: default_food_radius(),
            food_margin: default_food_margin(),
            food_age_step: None,
            food_rules: FoodRuleset::default(),
            agents: vec![
                SpawnSpec::at("mouse-1", 50.0, 50.0),
                SpawnSpec::at("mouse-2", 70.0, 50.0),
            ],
            eyes: EyeLayout::default(),
            exploration: default_exploration(),
            transition_threshold: 0.0,
            decision_timeout_ticks: None,
            seed: 0x5EED,
        }
    }
}

/// Axis-aligned wall box; `sides` is a bit set of [`BoxSpec::TOP`] and friends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxSpec {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(default = "BoxSpec::all_sides")]
    pub sides: u8,
}

impl BoxSpec {
    pub const TOP: u8 = 1;
    pub const RIGHT: u8 = 2;
    pub const BOTTOM: u8 = 4;
    pub const LEFT: u8 = 8;
    pub const ALL: u8 = Self::TOP | Self::RIGHT | Self::BOTTOM | Self::LEFT;

    fn all_sides() -> u8 {
        Self::ALL
    }
}

/// Selects which food model the world runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FoodRuleset {
    /// Each item is good or bad from birth and never spoils.
    Binary {
        /// Probability a spawned item is bad.
        bad_fraction: f64,
    },
    /// Items turn bad past best-before and vanish past expiry. Thresholds are drawn per item
    /// from the given `[min, max)` ranges.
    Aging {
        best_before: (f64, f64),
        expire: (f64, f64),
    },
}

impl Default for FoodRuleset {
    fn default() -> Self {
        FoodRuleset::Aging {
            best_before: (50_000.0, 150_000.0),
            expire: (150_000.0, 300_000.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnSpec {
    pub name: String,
    pub position: Vec2,
    #[serde(default = "SpawnSpec::default_radius")]
    pub radius: f64,
    #[serde(default)]
    pub angle: f64,
}

impl SpawnSpec {
    pub fn at(name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            name: name.into(),
            position: Vec2::new(x, y),
            radius: Self::default_radius(),
            angle: 0.0,
        }
    }

    fn default_radius() -> f64 {
        10.0
    }
}

/// Eyes fan out from `first_angle` in steps of `spacing`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EyeLayout {
    pub count: usize,
    pub first_angle: f64,
    pub spacing: f64,
    pub max_range: f64,
}

impl Default for EyeLayout {
    fn default() -> Self {
        Self {
            count: 9,
            first_angle: -0.75,
            spacing: 0.25,
            max_range: 85.0,
        }
    }
}

impl EyeLayout {
    pub fn build(&self) -> Vec<Eye> {
        (0..self.count)
            .map(|k| Eye::new(self.first_angle + k as f64 * self.spacing, self.max_range))
            .collect()
    }
}

/// Slowest and fastest tick rates a driver can schedule.
pub const MIN_TICK_HZ: f64 = 1e-3;
pub const MAX_TICK_HZ: f64 = 1e6;

impl WorldConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// An arena with nothing in it: no walls, no food, no agents.
    pub fn empty(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            pad: 0.0,
            interior_boxes: Vec::new(),
            food_target: 0,
            agents: Vec::new(),
            ..Self::default()
        }
    }

    /// Scheduler period for `tick_hz`.
    pub fn tick_interval(&self) -> Result<Duration, SimError> {
        if !(MIN_TICK_HZ..=MAX_TICK_HZ).contains(&self.tick_hz) {
            return Err(SimError::InvalidConfig(format!(
                "tick_hz {} outside [{MIN_TICK_HZ}, {MAX_TICK_HZ}]",
                self.tick_hz
            )));
        }
        Duration::try_from_secs_f64(1.0 / self.tick_hz)
            .ok()
            .filter(|period| !period.is_zero())
            .ok_or_else(|| {
                SimError::InvalidConfig(format!("tick_hz {} has no usable period", self.tick_hz))
            })
    }

    /// Age added to each food item per tick.
    pub fn food_age_step(&self) -> f64 {
        self.food_age_step.unwrap_or(self.tick_hz)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        let invalid = |msg: String| -> Result<(), SimError> { Err(SimError::InvalidConfig(msg)) };

        if !(self.width > 0.0 && self.height > 0.0) {
            return invalid(format!("world size {}x{} must be positive", self.width, self.height));
        }
        self.tick_interval()?;
        if self.food_radius <= 0.0 {
            return invalid(format!("food_radius {} must be positive", self.food_radius));
        }
        if self.food_target > 0 && 2.0 * self.food_margin >= self.width.min(self.height) {
            return invalid(format!("food_margin {} leaves no room to spawn", self.food_margin));
        }
        let age_step = self.food_age_step();
        if !(age_step.is_finite() && age_step >= 0.0) {
            return invalid(format!("food_age_step {age_step} must not be negative"));
        }
        if self.eyes.max_range <= 0.0 {
            return invalid(format!("eye range {} must be positive", self.eyes.max_range));
        }
        if !(0.0..=1.0).contains(&self.exploration) {
            return invalid(format!("exploration {} outside [0, 1]", self.exploration));
        }
        match self.food_rules {
            FoodRuleset::Binary { bad_fraction } if !(0.0..=1.0).contains(&bad_fraction) => {
                return invalid(format!("bad_fraction {bad_fraction} outside [0, 1]"));
            }
            FoodRuleset::Aging {
                best_before,
                expire,
            } => {
                for (name, (lo, hi)) in [("best_before", best_before), ("expire", expire)] {
                    if lo > hi {
                        return invalid(format!("{name} range {lo}..{hi} is inverted"));
                    }
                }
            }
            FoodRuleset::Binary { .. } => {}
        }
        for spawn in &self.agents {
            if spawn.radius <= 0.0 {
                return invalid(format!("agent {} radius must be positive", spawn.name));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        WorldConfig::default().validate().unwrap();
        WorldConfig::empty(100.0, 100.0).validate().unwrap();
    }

    #[test]
    fn default_eye_layout_matches_fan() {
        let eyes = EyeLayout::default().build();
        assert_eq!(eyes.len(), 9);
        assert_eq!(eyes[0].angle, -0.75);
        assert_eq!(eyes[3].angle, 0.0);
        assert_eq!(eyes[8].angle, 1.25);
        assert!(eyes.iter().all(|e| e.max_range == 85.0));
    }

    #[test]
    fn rejects_out_of_range_exploration() {
        let config = WorldConfig {
            exploration: 1.5,
            ..WorldConfig::default()
        };
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_inverted_age_ranges() {
        let config = WorldConfig {
            food_rules: FoodRuleset::Aging {
                best_before: (10.0, 5.0),
                expire: (20.0, 30.0),
            },
            ..WorldConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
