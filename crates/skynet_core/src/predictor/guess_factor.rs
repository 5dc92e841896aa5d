//! Statistical aim model over GuessFactor bins.
//!
//! A GuessFactor is the bearing offset a target achieved by the time a shot
//! reached it, divided by the largest offset it could possibly have
//! achieved. Counting GuessFactors in bins and aiming at the fullest bin
//! exploits any habit in how an opponent dodges.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::math::{normal_relative_angle, Vec2};

/// Identity of a fired shot, unique per weapon.
pub type ShotId = u64;

/// Shots awaiting a result before the oldest is forgotten.
const MAX_PENDING_SHOTS: usize = 64;

/// Everything needed to turn a later target position into a GuessFactor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotRecord {
    /// Where the shot was fired from.
    pub origin: Vec2,
    /// Direct bearing to the target when fired (before any offset).
    pub bearing: f64,
    /// Largest bearing offset the target could reach.
    pub max_escape_angle: f64,
}

/// Bin histogram of observed GuessFactors for one opponent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessFactorModel {
    bins: Vec<u32>,
    mode: usize,
    mode_count: u32,
    max_robot_speed: f64,
    pending: BTreeMap<ShotId, ShotRecord>,
}

impl GuessFactorModel {
    /// Create an empty model. `bin_count` is rounded up to a power of two.
    #[must_use]
    pub fn new(bin_count: usize, max_robot_speed: f64) -> Self {
        let bin_count = bin_count.max(2).next_power_of_two();
        Self {
            bins: vec![0; bin_count],
            mode: bin_count / 2,
            mode_count: 0,
            max_robot_speed,
            pending: BTreeMap::new(),
        }
    }

    /// Largest angle a target at `distance` can move off a projectile's line.
    #[must_use]
    pub fn max_escape_angle(&self, distance: f64, projectile_speed: f64) -> f64 {
        if projectile_speed <= 0.0 {
            return std::f64::consts::FRAC_PI_2;
        }
        let time_to_impact = distance / projectile_speed;
        (self.max_robot_speed * time_to_impact).atan2(distance)
    }

    /// GuessFactor in `[-1, 1)` represented by `bin`.
    #[must_use]
    pub fn guess_factor(&self, bin: usize) -> f64 {
        bin as f64 / self.bins.len() as f64 * 2.0 - 1.0
    }

    /// Bin a GuessFactor falls in. Values are clamped to `[-1, 1]` and `+1`
    /// wraps onto bin 0.
    #[must_use]
    pub fn bin_for(&self, guess_factor: f64) -> usize {
        let gf = guess_factor.clamp(-1.0, 1.0);
        let count = self.bins.len();
        ((gf + 1.0) / 2.0 * count as f64).floor() as usize & (count - 1)
    }

    /// Offset to add to the direct bearing when firing at `distance`.
    ///
    /// Zero until the first result has been recorded.
    #[must_use]
    pub fn predict_bearing_offset(&self, distance: f64, projectile_speed: f64) -> f64 {
        self.guess_factor(self.mode) * self.max_escape_angle(distance, projectile_speed)
    }

    /// Remember a shot so a later [`record_result`](Self::record_result) can
    /// score it.
    pub fn record_shot(&mut self, id: ShotId, record: ShotRecord) {
        self.pending.insert(id, record);
        while self.pending.len() > MAX_PENDING_SHOTS {
            self.pending.pop_first();
        }
    }

    /// Score a shot against where the target actually was when the shot
    /// arrived. Returns the incremented bin, or `None` for unknown shots
    /// and shots with no usable escape angle.
    pub fn record_result(&mut self, id: ShotId, actual: Vec2) -> Option<usize> {
        let shot = self.pending.remove(&id)?;
        if shot.max_escape_angle == 0.0 {
            return None;
        }
        let offset = normal_relative_angle(shot.origin.bearing_to(actual) - shot.bearing);
        let bin = self.bin_for(offset / shot.max_escape_angle);
        self.bins[bin] += 1;
        if self.bins[bin] > self.mode_count {
            self.mode_count = self.bins[bin];
            self.mode = bin;
        }
        tracing::trace!(shot = id, bin, count = self.bins[bin], "GuessFactor recorded");
        Some(bin)
    }

    /// Drop shots that can no longer be scored.
    pub fn forget_pending(&mut self) {
        self.pending.clear();
    }

    /// Current fullest bin.
    #[must_use]
    pub fn mode(&self) -> usize {
        self.mode
    }

    /// Per-bin counts.
    #[must_use]
    pub fn bins(&self) -> &[u32] {
        &self.bins
    }

    /// Total recorded results.
    #[must_use]
    pub fn total_results(&self) -> u64 {
        self.bins.iter().map(|&c| u64::from(c)).sum()
    }

    /// Shots still awaiting a result.
    #[must_use]
    pub fn pending_shots(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> GuessFactorModel {
        GuessFactorModel::new(32, 8.0)
    }

    #[test]
    fn test_empty_model_aims_directly() {
        let m = model();
        assert_eq!(m.predict_bearing_offset(400.0, 15.5), 0.0);
        assert_eq!(m.total_results(), 0);
    }

    #[test]
    fn test_max_escape_angle() {
        let m = model();
        // atan(8 / 11) regardless of distance
        let expected = (8.0_f64 / 11.0).atan();
        assert!((m.max_escape_angle(300.0, 11.0) - expected).abs() < 1e-12);
        assert!((m.max_escape_angle(50.0, 11.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_bin_mapping_edges() {
        let m = model();
        assert_eq!(m.bin_for(-1.0), 0);
        assert_eq!(m.bin_for(0.0), 16);
        assert_eq!(m.bin_for(0.99), 31);
        // +1 wraps around the mask
        assert_eq!(m.bin_for(1.0), 0);
        assert_eq!(m.bin_for(7.0), 0);
    }

    #[test]
    fn test_repeated_results_move_the_mode() {
        let mut m = model();
        let origin = Vec2::new(100.0, 100.0);
        let mea = m.max_escape_angle(200.0, 15.5);
        // target always ends up about half the escape angle clockwise
        for id in 0..5 {
            m.record_shot(
                id,
                ShotRecord {
                    origin,
                    bearing: 0.0,
                    max_escape_angle: mea,
                },
            );
            let actual = origin.project(mea * 0.53, 200.0);
            assert_eq!(m.record_result(id, actual), Some(24));
        }
        assert_eq!(m.mode(), 24);
        let offset = m.predict_bearing_offset(200.0, 15.5);
        assert!((offset - 0.5 * mea).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_shot_is_ignored() {
        let mut m = model();
        assert_eq!(m.record_result(99, Vec2::ZERO), None);
        assert_eq!(m.total_results(), 0);
    }

    #[test]
    fn test_pending_shots_are_bounded() {
        let mut m = model();
        let record = ShotRecord {
            origin: Vec2::ZERO,
            bearing: 0.0,
            max_escape_angle: 0.5,
        };
        for id in 0..100 {
            m.record_shot(id, record);
        }
        assert_eq!(m.pending_shots(), MAX_PENDING_SHOTS);
        // the oldest were dropped
        assert_eq!(m.record_result(0, Vec2::new(0.0, 10.0)), None);
        assert!(m.record_result(99, Vec2::new(0.0, 10.0)).is_some());
    }
}
