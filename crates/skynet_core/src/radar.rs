//! Radar sweeping.
//!
//! The radar either spins a full circle to find everyone, or wobbles
//! between the bearing extremes of the known opponents to keep their
//! observations fresh.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::config::RadarConfig;
use crate::engine::SelfPose;
use crate::math::{normal_relative_angle, Tick, Vec2};

/// Radar state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RadarMode {
    /// Spinning a full circle.
    #[default]
    FullSweep,
    /// Sweeping between the outermost opponents.
    TargetedSweep,
}

/// Angular spread of a group of opponents seen from one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BearingSpread {
    /// Mean opponent position.
    pub mass_centre: Vec2,
    /// Furthest anti-clockwise bearing, margin included.
    pub anticlockwise: f64,
    /// Furthest clockwise bearing, margin included.
    pub clockwise: f64,
}

impl BearingSpread {
    /// Measure `positions` from `from`, widening each extreme by `margin`.
    #[must_use]
    pub fn measure(from: Vec2, positions: &[Vec2], margin: f64) -> Option<Self> {
        if positions.is_empty() {
            return None;
        }
        let sum = positions.iter().fold(Vec2::ZERO, |acc, &p| acc + p);
        let mass_centre = sum.scale(1.0 / positions.len() as f64);
        let centre_bearing = from.bearing_to(mass_centre);

        let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
        for &p in positions {
            let rel = normal_relative_angle(from.bearing_to(p) - centre_bearing);
            lo = lo.min(rel);
            hi = hi.max(rel);
        }
        Some(Self {
            mass_centre,
            anticlockwise: centre_bearing + lo - margin,
            clockwise: centre_bearing + hi + margin,
        })
    }

    /// Angle between the extremes.
    #[must_use]
    pub fn span(&self) -> f64 {
        self.clockwise - self.anticlockwise
    }
}

/// What the radar needs to know each tick.
#[derive(Debug, Clone, Copy)]
pub struct RadarContext<'a> {
    /// Our pose.
    pub pose: &'a SelfPose,
    /// Opponents we hold observations for.
    pub tracked: usize,
    /// Opponents the engine reports alive.
    pub alive: usize,
    /// Age of the stalest observation among tracked opponents.
    pub oldest_age: Option<Tick>,
    /// Last known positions of tracked opponents.
    pub positions: &'a [Vec2],
}

/// Adaptive radar controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarController {
    mode: RadarMode,
    direction: f64,
}

impl Default for RadarController {
    fn default() -> Self {
        Self::new()
    }
}

impl RadarController {
    /// Controller starting with a clockwise full sweep.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: RadarMode::FullSweep,
            direction: 1.0,
        }
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> RadarMode {
        self.mode
    }

    /// Current wobble direction, `1.0` clockwise or `-1.0`.
    #[must_use]
    pub fn direction(&self) -> f64 {
        self.direction
    }

    /// Radar turn to command this tick. Zero while an earlier turn is
    /// still in flight.
    pub fn sweep(&mut self, ctx: &RadarContext<'_>, config: &RadarConfig) -> f64 {
        if ctx.pose.radar_turn_remaining.abs() > config.idle_epsilon {
            return 0.0;
        }

        let stale = ctx
            .oldest_age
            .map_or(true, |age| age > config.staleness_threshold);
        let spread = BearingSpread::measure(ctx.pose.position, ctx.positions, config.sweep_margin);
        let surrounded = spread.map_or(false, |s| s.span() >= PI);
        let needs_full = ctx.tracked == 0 || ctx.tracked < ctx.alive || stale || surrounded;

        let turn = match spread {
            Some(spread) if !needs_full => {
                self.set_mode(RadarMode::TargetedSweep);
                self.direction = -self.direction;
                let extreme = if self.direction > 0.0 {
                    spread.clockwise
                } else {
                    spread.anticlockwise
                };
                normal_relative_angle(extreme - ctx.pose.radar_heading)
            }
            _ => {
                self.set_mode(RadarMode::FullSweep);
                let turn = self.direction * config.full_sweep_turn;
                self.direction = -self.direction;
                turn
            }
        };
        tracing::trace!(mode = ?self.mode, turn, "Radar");
        turn
    }

    fn set_mode(&mut self, mode: RadarMode) {
        if self.mode != mode {
            tracing::debug!(from = ?self.mode, to = ?mode, "Radar mode change");
            self.mode = mode;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose() -> SelfPose {
        SelfPose::at(Vec2::new(400.0, 300.0), 50)
    }

    #[test]
    fn test_full_sweep_until_everyone_is_tracked() {
        let config = RadarConfig::default();
        let mut radar = RadarController::new();
        let p = pose();
        let ctx = RadarContext {
            pose: &p,
            tracked: 1,
            alive: 2,
            oldest_age: Some(0),
            positions: &[Vec2::new(400.0, 500.0)],
        };
        let first = radar.sweep(&ctx, &config);
        assert!((first - config.full_sweep_turn).abs() < 1e-12);
        let second = radar.sweep(&ctx, &config);
        assert!((second + config.full_sweep_turn).abs() < 1e-12);
        assert_eq!(radar.mode(), RadarMode::FullSweep);
    }

    #[test]
    fn test_waits_for_turn_in_flight() {
        let config = RadarConfig::default();
        let mut radar = RadarController::new();
        let mut p = pose();
        p.radar_turn_remaining = 0.3;
        let ctx = RadarContext {
            pose: &p,
            tracked: 0,
            alive: 1,
            oldest_age: None,
            positions: &[],
        };
        assert_eq!(radar.sweep(&ctx, &config), 0.0);
        assert_eq!(radar.direction(), 1.0);
    }

    #[test]
    fn test_targeted_sweep_wobbles_between_extremes() {
        let config = RadarConfig::default();
        let mut radar = RadarController::new();
        let p = pose();
        // one opponent due north
        let ctx = RadarContext {
            pose: &p,
            tracked: 1,
            alive: 1,
            oldest_age: Some(2),
            positions: &[Vec2::new(400.0, 500.0)],
        };
        let first = radar.sweep(&ctx, &config);
        assert_eq!(radar.mode(), RadarMode::TargetedSweep);
        // direction flipped to anticlockwise first
        assert!((first + config.sweep_margin).abs() < 1e-9);
        let second = radar.sweep(&ctx, &config);
        assert!((second - config.sweep_margin).abs() < 1e-9);
    }

    #[test]
    fn test_stale_observation_forces_full_sweep() {
        let config = RadarConfig::default();
        let mut radar = RadarController::new();
        let p = pose();
        let ctx = RadarContext {
            pose: &p,
            tracked: 1,
            alive: 1,
            oldest_age: Some(11),
            positions: &[Vec2::new(400.0, 500.0)],
        };
        radar.sweep(&ctx, &config);
        assert_eq!(radar.mode(), RadarMode::FullSweep);
    }

    #[test]
    fn test_surrounded_forces_full_sweep() {
        let config = RadarConfig::default();
        let mut radar = RadarController::new();
        let p = pose();
        let ctx = RadarContext {
            pose: &p,
            tracked: 2,
            alive: 2,
            oldest_age: Some(1),
            positions: &[Vec2::new(400.0, 500.0), Vec2::new(400.0, 100.0)],
        };
        radar.sweep(&ctx, &config);
        assert_eq!(radar.mode(), RadarMode::FullSweep);
    }

    #[test]
    fn test_spread_measures_extremes() {
        let from = Vec2::new(0.0, 0.0);
        let positions = [Vec2::new(-100.0, 100.0), Vec2::new(100.0, 100.0)];
        let spread = BearingSpread::measure(from, &positions, 0.0).unwrap();
        assert!((spread.anticlockwise + PI / 4.0).abs() < 1e-9);
        assert!((spread.clockwise - PI / 4.0).abs() < 1e-9);
        assert_eq!(spread.mass_centre, Vec2::new(0.0, 100.0));
    }
}
