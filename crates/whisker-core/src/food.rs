use serde::{Deserialize, Serialize};

use crate::{SensedKind, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodKind {
    Good,
    Bad,
}

/// How a food item decides whether it is good to eat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Freshness {
    /// Fixed at spawn.
    Kind { kind: FoodKind },
    /// Turns bad once `age > best_before_age`, disappears once `age > expire_age`.
    Aging {
        best_before_age: f64,
        expire_age: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub position: Vec2,
    pub radius: f64,
    pub freshness: Freshness,
    pub age: f64,
}

impl Food {
    pub fn new(position: Vec2, radius: f64, freshness: Freshness) -> Self {
        Self {
            position,
            radius,
            freshness,
            age: 0.0,
        }
    }

    pub fn good(position: Vec2, radius: f64) -> Self {
        Self::new(position, radius, Freshness::Kind { kind: FoodKind::Good })
    }

    pub fn bad(position: Vec2, radius: f64) -> Self {
        Self::new(position, radius, Freshness::Kind { kind: FoodKind::Bad })
    }

    pub fn aging(position: Vec2, radius: f64, best_before_age: f64, expire_age: f64) -> Self {
        Self::new(
            position,
            radius,
            Freshness::Aging {
                best_before_age,
                expire_age,
            },
        )
    }

    pub fn is_rancid(&self) -> bool {
        match self.freshness {
            Freshness::Kind { .. } => false,
            Freshness::Aging {
                best_before_age, ..
            } => self.age > best_before_age,
        }
    }

    /// Aging food past its expiry. Food with a fixed kind never expires.
    pub fn is_expired(&self) -> bool {
        match self.freshness {
            Freshness::Kind { .. } => false,
            Freshness::Aging { expire_age, .. } => self.age > expire_age,
        }
    }

    pub fn kind(&self) -> FoodKind {
        match self.freshness {
            Freshness::Kind { kind } => kind,
            Freshness::Aging { .. } if self.is_rancid() => FoodKind::Bad,
            Freshness::Aging { .. } => FoodKind::Good,
        }
    }

    pub fn sensed_kind(&self) -> SensedKind {
        match self.kind() {
            FoodKind::Good => SensedKind::GoodFood,
            FoodKind::Bad => SensedKind::BadFood,
        }
    }

    pub fn advance_age(&mut self, step: f64) {
        self.age += step;
    }
}
