use core::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Immutable 2-D point / direction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    pub fn scale(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s)
    }

    /// Rotate by `a` radians: `x' = x cos a + y sin a`, `y' = -x sin a + y cos a`.
    ///
    /// With `y` pointing down the screen this turns clockwise for positive `a`.
    pub fn rotate(self, a: f64) -> Self {
        let (sin, cos) = a.sin_cos();
        Self::new(self.x * cos + self.y * sin, -self.x * sin + self.y * cos)
    }

    /// Unit vector in the same direction.
    ///
    /// A zero-length vector yields NaN components; callers that cannot rule that out should use
    /// [`Vec2::try_normalize`].
    pub fn normalize(self) -> Self {
        self.scale(1.0 / self.length())
    }

    pub fn try_normalize(self) -> Option<Self> {
        let len = self.length();
        if len > 0.0 && len.is_finite() {
            Some(self.scale(1.0 / len))
        } else {
            None
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        self.scale(rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}
