//! Immutable scan records.

use serde::{Deserialize, Serialize};

use crate::engine::{ScanEvent, SelfPose};
use crate::math::{normal_absolute_angle, Tick, Vec2};
use crate::predictor::{GeometricPredictor, Sample};

/// One observation of a robot, with the predictor fitted once it was
/// recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    name: String,
    energy: f64,
    bearing: f64,
    distance: f64,
    velocity: f64,
    heading: f64,
    position: Vec2,
    time: Tick,
    predictor: GeometricPredictor,
}

impl Observation {
    /// Build an observation from a scan taken at `pose`.
    ///
    /// The scan bearing is relative to our body; the stored bearing is
    /// absolute.
    #[must_use]
    pub fn from_scan(scan: &ScanEvent, pose: &SelfPose) -> Self {
        let bearing = normal_absolute_angle(pose.heading + scan.bearing);
        Self {
            name: scan.name.clone(),
            energy: scan.energy,
            bearing,
            distance: scan.distance,
            velocity: scan.velocity,
            heading: scan.heading,
            position: pose.position.project(bearing, scan.distance),
            time: scan.time,
            predictor: GeometricPredictor::Unavailable,
        }
    }

    /// Build the observation our own robot would produce of itself.
    #[must_use]
    pub fn of_self(name: &str, pose: &SelfPose) -> Self {
        Self {
            name: name.to_string(),
            energy: pose.energy,
            bearing: 0.0,
            distance: 0.0,
            velocity: pose.velocity,
            heading: pose.heading,
            position: pose.position,
            time: pose.time,
            predictor: GeometricPredictor::Unavailable,
        }
    }

    /// Attach the predictor fitted over the history ending with this
    /// observation.
    #[must_use]
    pub fn with_predictor(mut self, predictor: GeometricPredictor) -> Self {
        self.predictor = predictor;
        self
    }

    /// Name of the observed robot.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Observed energy.
    #[must_use]
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Absolute bearing from us, radians in `[0, 2π)`.
    #[must_use]
    pub fn bearing(&self) -> f64 {
        self.bearing
    }

    /// Distance from us.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Observed speed.
    #[must_use]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Observed body heading.
    #[must_use]
    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// Derived absolute position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Tick of the observation.
    #[must_use]
    pub fn time(&self) -> Tick {
        self.time
    }

    /// Predictor snapshot.
    #[must_use]
    pub fn predictor(&self) -> &GeometricPredictor {
        &self.predictor
    }

    /// Timed position for predictor fitting.
    #[must_use]
    pub fn sample(&self) -> Sample {
        Sample::new(self.time, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_position_uses_absolute_bearing() {
        let mut pose = SelfPose::at(Vec2::new(100.0, 100.0), 12);
        pose.heading = FRAC_PI_2;
        let scan = ScanEvent {
            name: "walls.Walls".to_string(),
            bearing: FRAC_PI_2,
            distance: 50.0,
            energy: 90.0,
            heading: 0.0,
            velocity: 8.0,
            time: 12,
        };
        let obs = Observation::from_scan(&scan, &pose);
        // facing east, target on our right: due south
        assert!((obs.position().x - 100.0).abs() < 1e-9);
        assert!((obs.position().y - 50.0).abs() < 1e-9);
        assert!((obs.bearing() - std::f64::consts::PI).abs() < 1e-9);
        assert!(!obs.predictor().is_available());
    }
}
