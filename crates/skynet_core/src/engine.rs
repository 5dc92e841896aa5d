//! Types exchanged with the hosting engine.
//!
//! The core never talks to an engine directly. A thin shim converts engine
//! callbacks into [`ArenaEvent`]s and a [`SelfPose`], hands them over as a
//! [`TickInput`], and applies the returned [`Commands`].

use serde::{Deserialize, Serialize};

use crate::math::{Tick, Vec2};

/// Our own robot state at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelfPose {
    /// Position in arena coordinates.
    pub position: Vec2,
    /// Body heading, radians (0 = north, clockwise).
    pub heading: f64,
    /// Signed speed along the heading.
    pub velocity: f64,
    /// Remaining energy.
    pub energy: f64,
    /// Gun heading, radians.
    pub gun_heading: f64,
    /// Gun heat; the gun can fire when this is zero.
    pub gun_heat: f64,
    /// Radar heading, radians.
    pub radar_heading: f64,
    /// Radar turn still in flight from an earlier command, radians.
    pub radar_turn_remaining: f64,
    /// Engine tick.
    pub time: Tick,
}

impl SelfPose {
    /// Pose at `position` with everything else at rest and the gun cold.
    #[must_use]
    pub fn at(position: Vec2, time: Tick) -> Self {
        Self {
            position,
            heading: 0.0,
            velocity: 0.0,
            energy: 100.0,
            gun_heading: 0.0,
            gun_heat: 0.0,
            radar_heading: 0.0,
            radar_turn_remaining: 0.0,
            time,
        }
    }

    /// True when every numeric field is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.heading.is_finite()
            && self.velocity.is_finite()
            && self.energy.is_finite()
            && self.gun_heading.is_finite()
            && self.gun_heat.is_finite()
            && self.radar_heading.is_finite()
            && self.radar_turn_remaining.is_finite()
    }
}

/// A radar contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanEvent {
    /// Opponent name, stable for the match.
    pub name: String,
    /// Bearing relative to our body heading, radians.
    pub bearing: f64,
    /// Distance between robot centres.
    pub distance: f64,
    /// Opponent energy.
    pub energy: f64,
    /// Opponent body heading, radians.
    pub heading: f64,
    /// Opponent signed speed.
    pub velocity: f64,
    /// Tick of the scan.
    pub time: Tick,
}

/// Discrete engine event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArenaEvent {
    /// Radar swept over an opponent.
    Scanned(ScanEvent),
    /// A robot was destroyed.
    Destroyed {
        /// Name of the destroyed robot.
        name: String,
    },
    /// We drove into a wall.
    WallCollision {
        /// Bearing of the wall relative to our heading, radians.
        bearing: f64,
    },
    /// We were hit by an opponent projectile.
    HitByProjectile {
        /// Name of the shooter.
        shooter: String,
        /// Power of the projectile.
        power: f64,
    },
    /// Our projectile hit an opponent.
    ProjectileHit {
        /// Name of the victim.
        victim: String,
        /// Victim energy after the hit.
        victim_energy: f64,
    },
    /// Our projectile left the arena.
    ProjectileMissed,
    /// A new round begins.
    RoundStarted {
        /// Zero-based round number.
        round: u32,
    },
    /// The current round is over.
    RoundEnded {
        /// Zero-based round number.
        round: u32,
    },
    /// The whole battle is over.
    BattleEnded,
    /// Any engine callback the core has no use for.
    Unrecognized(String),
}

/// Everything the core consumes for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Our pose at the start of the tick.
    pub pose: SelfPose,
    /// Opponents the engine reports alive.
    pub alive_opponents: usize,
    /// Events delivered since the previous tick, in engine order.
    pub events: Vec<ArenaEvent>,
}

/// Actuation requested for one tick.
///
/// Every field is a fresh request rather than an increment, so repeating
/// the same commands is harmless.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Commands {
    /// Body turn, radians, positive clockwise.
    pub body_turn: f64,
    /// Signed travel distance; negative drives backwards.
    pub travel: f64,
    /// Radar turn, radians. Zero leaves any in-flight turn alone.
    pub radar_turn: f64,
    /// Gun turn, radians.
    pub gun_turn: f64,
    /// Firing power, if a shot should be fired.
    pub fire: Option<f64>,
}

impl Commands {
    /// Stop moving and hold fire.
    #[must_use]
    pub fn hold() -> Self {
        Self::default()
    }

    /// True when the body is asked to stay put.
    #[must_use]
    pub fn is_stop(&self) -> bool {
        self.body_turn == 0.0 && self.travel == 0.0
    }
}
