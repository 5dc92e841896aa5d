//! Position and aim prediction.
//!
//! Two kinds of model live here:
//!
//! - Geometric predictors ([`LinearPredictor`], [`QuadraticPredictor`]) fit
//!   an opponent's recent positions and extrapolate them. They are cheap and
//!   rebuilt after every observation; [`GeometricPredictor`] picks the best
//!   one the history supports.
//! - [`GuessFactorModel`] learns where an opponent tends to end up relative
//!   to straight-line aim. It persists for the whole engagement.
//!
//! Geometric predictors measure time in ticks relative to the newest sample:
//! `predict(0.0)` is the last observed position.

mod guess_factor;
mod linear;
mod quadratic;

pub use guess_factor::{GuessFactorModel, ShotId, ShotRecord};
pub use linear::LinearPredictor;
pub use quadratic::QuadraticPredictor;

use serde::{Deserialize, Serialize};

use crate::math::{Tick, Vec2};

/// Below this magnitude the intercept quadratic is treated as linear.
const QUADRATIC_EPSILON: f64 = 1e-6;

/// A timed position sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Tick of the observation.
    pub time: Tick,
    /// Absolute position.
    pub position: Vec2,
}

impl Sample {
    /// Create a sample.
    #[must_use]
    pub const fn new(time: Tick, position: Vec2) -> Self {
        Self { time, position }
    }
}

/// Contract shared by the geometric predictors.
pub trait Predictor {
    /// Position `ticks_ahead` ticks after the newest sample.
    ///
    /// Returns `None` when the history is too short to say anything.
    fn predict(&self, ticks_ahead: f64) -> Option<Vec2>;

    /// Point where a projectile fired from `origin` at `projectile_speed`
    /// meets the target.
    ///
    /// Returns `None` only when no prediction is available at all. An
    /// unsolvable intercept falls back to the current position.
    fn intercept(&self, projectile_speed: f64, origin: Vec2) -> Option<Vec2>;

    /// [`intercept`](Self::intercept) for a projectile fired `elapsed` ticks
    /// after the newest sample, linearised around `predict(elapsed)`.
    fn intercept_after(&self, projectile_speed: f64, origin: Vec2, elapsed: f64) -> Option<Vec2> {
        if elapsed <= 0.0 {
            return self.intercept(projectile_speed, origin);
        }
        let from = self.predict(elapsed)?;
        let next = self.predict(elapsed + 1.0)?;
        Some(solve_intercept(from, next - from, origin, projectile_speed))
    }
}

/// Solve `|P + V·t − O| = s·t` for the smallest non-negative `t` and return
/// the target position at that time.
///
/// Falls back to `position` when the quadratic degenerates, the
/// discriminant is negative or both roots are in the past.
#[must_use]
pub fn solve_intercept(position: Vec2, velocity: Vec2, origin: Vec2, speed: f64) -> Vec2 {
    let offset = position - origin;
    let a = velocity.length_squared() - speed * speed;
    let b = 2.0 * offset.dot(velocity);
    let c = offset.length_squared();

    if a.abs() < QUADRATIC_EPSILON {
        return position;
    }
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return position;
    }

    let root = discriminant.sqrt();
    let t1 = (-b - root) / (2.0 * a);
    let t2 = (-b + root) / (2.0 * a);
    let t = match (t1 >= 0.0, t2 >= 0.0) {
        (true, true) => t1.min(t2),
        (true, false) => t1,
        (false, true) => t2,
        (false, false) => return position,
    };
    position + velocity * t
}

/// The geometric model an opponent tracker currently uses.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum GeometricPredictor {
    /// Not enough history.
    #[default]
    Unavailable,
    /// Constant-velocity fit.
    Linear(LinearPredictor),
    /// Quadratic regression.
    Quadratic(QuadraticPredictor),
}

impl GeometricPredictor {
    /// Pick the richest model the history supports: quadratic from three
    /// samples, linear from two, otherwise none.
    #[must_use]
    pub fn select(samples: &[Sample]) -> Self {
        if samples.len() >= 3 {
            let quadratic = QuadraticPredictor::new(samples);
            if quadratic.is_available() {
                return Self::Quadratic(quadratic);
            }
        }
        let linear = LinearPredictor::new(samples);
        if linear.is_available() {
            Self::Linear(linear)
        } else {
            Self::Unavailable
        }
    }

    /// True when a model was fitted.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable)
    }

    /// Short label for logs and reports.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::Linear(_) => "linear",
            Self::Quadratic(_) => "quadratic",
        }
    }
}

impl Predictor for GeometricPredictor {
    fn predict(&self, ticks_ahead: f64) -> Option<Vec2> {
        match self {
            Self::Unavailable => None,
            Self::Linear(p) => p.predict(ticks_ahead),
            Self::Quadratic(p) => p.predict(ticks_ahead),
        }
    }

    fn intercept(&self, projectile_speed: f64, origin: Vec2) -> Option<Vec2> {
        match self {
            Self::Unavailable => None,
            Self::Linear(p) => p.intercept(projectile_speed, origin),
            Self::Quadratic(p) => p.intercept(projectile_speed, origin),
        }
    }
}
