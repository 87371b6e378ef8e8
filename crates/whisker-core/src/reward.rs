//! Per-step reward shaping.
//!
//! The reward keeps agents away from walls, nudges them to drive straight in open space and
//! folds in a decaying signal from recently eaten food.

use serde::{Deserialize, Serialize};

use crate::{Action, Eye, FoodKind, SensedKind};

/// Walls closer than this fraction of eye range start to cost reward.
const PROXIMITY_SAFETY_FACTOR: f64 = 2.0;
const FORWARD_BONUS_SCALE: f64 = 0.1;
const FORWARD_BONUS_MIN_PROXIMITY: f64 = 0.75;

const GOOD_FOOD_SIGNAL: f64 = 5.0;
const BAD_FOOD_SIGNAL: f64 = -7.0;
const DIGESTION_DECAY: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RewardBreakdown {
    pub proximity: f64,
    pub forward_bonus: f64,
    pub digestion: f64,
    pub total: f64,
}

/// Average wall clearance over all eyes, saturating at half range.
pub fn proximity_term(eyes: &[Eye]) -> f64 {
    if eyes.is_empty() {
        return 1.0;
    }
    let sum: f64 = eyes
        .iter()
        .map(|e| match e.sensed {
            SensedKind::Wall => e.normalized_proximity(),
            _ => 1.0,
        })
        .sum();
    let avg = sum / eyes.len() as f64;
    (avg * PROXIMITY_SAFETY_FACTOR).min(1.0)
}

pub fn forward_bonus(action: Option<Action>, proximity: f64) -> f64 {
    match action {
        Some(a) if a.is_full_speed_straight() && proximity > FORWARD_BONUS_MIN_PROXIMITY => {
            FORWARD_BONUS_SCALE * proximity
        }
        _ => 0.0,
    }
}

/// Decaying signal of recently eaten food.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Digestion(pub f64);

impl Digestion {
    pub fn value(self) -> f64 {
        self.0
    }

    pub fn eat(&mut self, kind: FoodKind) {
        self.0 += match kind {
            FoodKind::Good => GOOD_FOOD_SIGNAL,
            FoodKind::Bad => BAD_FOOD_SIGNAL,
        };
    }

    pub fn decay(&mut self) {
        self.0 -= DIGESTION_DECAY * self.0;
    }
}

/// Score one step and decay `digestion` afterwards.
pub fn score(eyes: &[Eye], action: Option<Action>, digestion: &mut Digestion) -> RewardBreakdown {
    let proximity = proximity_term(eyes);
    let forward_bonus = forward_bonus(action, proximity);
    let digested = digestion.value();
    digestion.decay();
    RewardBreakdown {
        proximity,
        forward_bonus,
        digestion: digested,
        total: proximity + forward_bonus + digested,
    }
}
