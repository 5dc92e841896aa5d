//! Vector and angle utilities in arena coordinates.
//!
//! The arena uses compass conventions: heading 0 points along +y
//! ("north") and angles increase clockwise. A bearing from `a` to `b` is
//! therefore `atan2(b.x - a.x, b.y - a.y)`, and projecting a point along a
//! heading adds `(d·sin h, d·cos h)`.

use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

/// Simulation time in engine ticks.
pub type Tick = u64;

/// 2D vector in arena units (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Vec2 {
    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Squared length.
    #[must_use]
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    /// Length of the vector.
    #[must_use]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Scale by a scalar.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Linearly interpolate between two vectors.
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// Unit vector in the same direction, or zero for a zero-length vector.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len <= f64::EPSILON {
            return Self::ZERO;
        }
        Self::new(self.x / len, self.y / len)
    }

    /// Absolute bearing from `self` to `other` (0 = north, clockwise).
    #[must_use]
    pub fn bearing_to(self, other: Self) -> f64 {
        (other.x - self.x).atan2(other.y - self.y)
    }

    /// Point `distance` away from `self` along `heading`.
    #[must_use]
    pub fn project(self, heading: f64, distance: f64) -> Self {
        Self::new(
            self.x + distance * heading.sin(),
            self.y + distance * heading.cos(),
        )
    }

    /// Unit vector pointing along `heading`.
    #[must_use]
    pub fn from_heading(heading: f64) -> Self {
        Self::new(heading.sin(), heading.cos())
    }

    /// Heading of this vector treated as a direction.
    #[must_use]
    pub fn heading(self) -> f64 {
        self.x.atan2(self.y)
    }

    /// True when both components are finite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::ops::Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        self.scale(rhs)
    }
}

/// Normalise an angle to `(-π, π]`.
#[must_use]
pub fn normal_relative_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    if a > PI {
        a - TAU
    } else {
        a
    }
}

/// Normalise an angle to `[0, 2π)`.
#[must_use]
pub fn normal_absolute_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if a >= TAU {
        0.0
    } else {
        a
    }
}

/// Circular mean of a set of headings, or `None` if they cancel out.
#[must_use]
pub fn mean_heading(headings: &[f64]) -> Option<f64> {
    let sum = headings
        .iter()
        .fold(Vec2::ZERO, |acc, &h| acc + Vec2::from_heading(h));
    if sum.length_squared() <= 1e-12 {
        return None;
    }
    Some(sum.heading())
}
