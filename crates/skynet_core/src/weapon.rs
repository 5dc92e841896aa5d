//! Aiming and firing at one opponent.
//!
//! Each opponent tracker owns a [`WeaponController`]. Aim is the geometric
//! intercept corrected by the opponent's learned GuessFactor offset; shots
//! are remembered until they reach the opponent so the statistics can learn
//! from them.

use serde::{Deserialize, Serialize};

use crate::config::{TacticsConfig, WeaponConfig};
use crate::engine::SelfPose;
use crate::math::{normal_relative_angle, Tick, Vec2};
use crate::predictor::{GeometricPredictor, GuessFactorModel, Predictor, ShotId, ShotRecord};

/// Fired shots kept for resolution before the oldest is dropped.
const MAX_SHOTS_IN_FLIGHT: usize = 32;

/// Gun heat treated as a cold gun.
const COLD_GUN: f64 = 1e-9;

/// One of our shots still travelling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct ShotInFlight {
    id: ShotId,
    origin: Vec2,
    fired_at: Tick,
    speed: f64,
}

/// Result of one aiming pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AimSolution {
    /// Point the gun is aimed at.
    pub aim_point: Vec2,
    /// Bearing to the geometric intercept.
    pub direct_bearing: f64,
    /// Learned offset added to the direct bearing.
    pub offset: f64,
    /// Gun turn to command.
    pub gun_turn: f64,
    /// Firing power, when firing this tick.
    pub fire: Option<f64>,
}

/// What the weapon knows about its target this tick.
#[derive(Debug, Clone, Copy)]
pub struct TargetView<'a> {
    /// Last known position.
    pub position: Vec2,
    /// Ticks since `position` was observed.
    pub elapsed: f64,
    /// Active geometric predictor.
    pub predictor: &'a GeometricPredictor,
}

/// Statistical gun dedicated to one opponent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponController {
    model: GuessFactorModel,
    in_flight: Vec<ShotInFlight>,
    next_shot: ShotId,
    aim_point: Option<Vec2>,
}

impl WeaponController {
    /// Controller with a fresh statistical model.
    #[must_use]
    pub fn new(config: &WeaponConfig, max_robot_speed: f64) -> Self {
        Self::with_model(GuessFactorModel::new(config.bins, max_robot_speed))
    }

    /// Controller resuming an existing model.
    #[must_use]
    pub fn with_model(mut model: GuessFactorModel) -> Self {
        model.forget_pending();
        Self {
            model,
            in_flight: Vec::new(),
            next_shot: 0,
            aim_point: None,
        }
    }

    /// Hand back the statistical model, for example at the end of a round.
    #[must_use]
    pub fn into_model(self) -> GuessFactorModel {
        self.model
    }

    /// The learned statistics.
    #[must_use]
    pub fn model(&self) -> &GuessFactorModel {
        &self.model
    }

    /// Point aimed at on the last pass.
    #[must_use]
    pub fn aim_point(&self) -> Option<Vec2> {
        self.aim_point
    }

    /// Shots still being tracked.
    #[must_use]
    pub fn shots_in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Forget the aim point when the target has never been seen.
    pub fn clear(&mut self) {
        self.aim_point = None;
    }

    /// Score every shot that has travelled as far as the target now is.
    pub fn resolve_shots(&mut self, target: Vec2, now: Tick) -> usize {
        let mut resolved = 0;
        let model = &mut self.model;
        self.in_flight.retain(|shot| {
            let travelled = now.saturating_sub(shot.fired_at) as f64 * shot.speed;
            if travelled < shot.origin.distance(target) {
                return true;
            }
            if model.record_result(shot.id, target).is_some() {
                resolved += 1;
            }
            false
        });
        resolved
    }

    /// Aim at `target` and decide whether to fire.
    pub fn aim(
        &mut self,
        target: TargetView<'_>,
        pose: &SelfPose,
        config: &WeaponConfig,
    ) -> AimSolution {
        let power = config.fire_power;
        let speed = TacticsConfig::projectile_speed(power);
        let origin = pose.position;

        let current = target
            .predictor
            .predict(target.elapsed)
            .unwrap_or(target.position);
        let intercept = target
            .predictor
            .intercept_after(speed, origin, target.elapsed)
            .unwrap_or(current);
        let direct_bearing = origin.bearing_to(intercept);
        let distance = origin.distance(current);
        let offset = self.model.predict_bearing_offset(distance, speed);
        let aim = direct_bearing + offset;
        let gun_turn = normal_relative_angle(aim - pose.gun_heading);
        let aim_point = origin.project(aim, origin.distance(intercept));
        self.aim_point = Some(aim_point);

        let ready = pose.gun_heat <= COLD_GUN && pose.energy > power;
        let fire = (ready && gun_turn.abs() < config.aim_tolerance).then(|| {
            self.record_fire(current, pose, speed, distance);
            power
        });

        AimSolution {
            aim_point,
            direct_bearing,
            offset,
            gun_turn,
            fire,
        }
    }

    fn record_fire(&mut self, target: Vec2, pose: &SelfPose, speed: f64, distance: f64) {
        let id = self.next_shot;
        self.next_shot += 1;
        self.model.record_shot(
            id,
            ShotRecord {
                origin: pose.position,
                bearing: pose.position.bearing_to(target),
                max_escape_angle: self.model.max_escape_angle(distance, speed),
            },
        );
        self.in_flight.push(ShotInFlight {
            id,
            origin: pose.position,
            fired_at: pose.time,
            speed,
        });
        if self.in_flight.len() > MAX_SHOTS_IN_FLIGHT {
            self.in_flight.remove(0);
        }
        tracing::debug!(shot = id, tick = pose.time, speed, "Fired");
    }
}
