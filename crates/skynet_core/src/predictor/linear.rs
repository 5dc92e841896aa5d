//! Constant-velocity predictor.

use serde::{Deserialize, Serialize};

use super::{solve_intercept, Predictor, Sample};
use crate::math::Vec2;

/// Extrapolates the newest position along the mean per-step velocity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearPredictor {
    fit: Option<LinearFit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct LinearFit {
    position: Vec2,
    velocity: Vec2,
}

impl LinearPredictor {
    /// Fit samples ordered oldest to newest.
    ///
    /// Needs two samples with distinct times; otherwise every query
    /// reports unavailable.
    #[must_use]
    pub fn new(samples: &[Sample]) -> Self {
        if samples.len() < 2 {
            return Self { fit: None };
        }

        let mut sum = Vec2::ZERO;
        let mut count = 0_u32;
        for pair in samples.windows(2) {
            let dt = pair[1].time.saturating_sub(pair[0].time);
            if dt > 0 {
                sum = sum + (pair[1].position - pair[0].position).scale(1.0 / dt as f64);
                count += 1;
            }
        }
        if count == 0 {
            return Self { fit: None };
        }

        let newest = samples[samples.len() - 1];
        Self {
            fit: Some(LinearFit {
                position: newest.position,
                velocity: sum.scale(1.0 / f64::from(count)),
            }),
        }
    }

    /// True when a velocity could be fitted.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.fit.is_some()
    }

    /// Fitted velocity, units per tick.
    #[must_use]
    pub fn velocity(&self) -> Option<Vec2> {
        self.fit.map(|f| f.velocity)
    }
}

impl Predictor for LinearPredictor {
    fn predict(&self, ticks_ahead: f64) -> Option<Vec2> {
        self.fit
            .map(|f| f.position + f.velocity * ticks_ahead)
    }

    fn intercept(&self, projectile_speed: f64, origin: Vec2) -> Option<Vec2> {
        self.fit
            .map(|f| solve_intercept(f.position, f.velocity, origin, projectile_speed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_history_is_unavailable() {
        let one = [Sample::new(5, Vec2::new(10.0, 10.0))];
        let p = LinearPredictor::new(&one);
        assert!(p.predict(3.0).is_none());
        assert!(p.intercept(11.0, Vec2::ZERO).is_none());
        assert!(LinearPredictor::new(&[]).predict(0.0).is_none());
    }

    #[test]
    fn test_same_tick_samples_are_unavailable() {
        let samples = [
            Sample::new(5, Vec2::new(10.0, 10.0)),
            Sample::new(5, Vec2::new(12.0, 10.0)),
        ];
        assert!(!LinearPredictor::new(&samples).is_available());
    }

    #[test]
    fn test_mean_velocity_over_uneven_gaps() {
        let samples = [
            Sample::new(0, Vec2::new(0.0, 0.0)),
            Sample::new(2, Vec2::new(4.0, 0.0)),
            Sample::new(3, Vec2::new(6.0, 0.0)),
        ];
        let p = LinearPredictor::new(&samples);
        let v = p.velocity().unwrap();
        assert!((v.x - 2.0).abs() < 1e-12);
        let ahead = p.predict(5.0).unwrap();
        assert!((ahead.x - 16.0).abs() < 1e-12);
    }
}
