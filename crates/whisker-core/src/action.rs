use serde::{Deserialize, Serialize};

use crate::SimError;

/// The fixed catalog of wheel commands.
///
/// Discriminants are the indices the external decision-maker sends; their order is part of the
/// wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Forward = 0,
    VeerLeft = 1,
    VeerRight = 2,
    PivotLeft = 3,
    PivotRight = 4,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Forward,
        Action::VeerLeft,
        Action::VeerRight,
        Action::PivotLeft,
        Action::PivotRight,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Checked lookup of an index received from outside the simulation.
    pub fn from_index(index: i64) -> Result<Self, SimError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(SimError::ActionOutOfRange {
                index,
                count: Self::COUNT,
            })
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// `(rotation1, rotation2)` wheel magnitudes, in radians.
    pub fn wheels(self) -> (f64, f64) {
        match self {
            Action::Forward => (1.0, 1.0),
            Action::VeerLeft => (0.8, 1.0),
            Action::VeerRight => (1.0, 0.8),
            Action::PivotLeft => (0.5, 0.0),
            Action::PivotRight => (0.0, 0.5),
        }
    }

    /// Both wheels at full magnitude.
    pub fn is_full_speed_straight(self) -> bool {
        self.wheels() == (1.0, 1.0)
    }
}
