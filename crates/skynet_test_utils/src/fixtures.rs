//! Test fixtures and helpers.
//!
//! Poses, scans and scripted duels for consistent testing.

use skynet_core::arena::ArenaModel;
use skynet_core::config::TacticsConfig;
use skynet_core::engine::{ArenaEvent, ScanEvent, SelfPose, TickInput};
use skynet_core::math::{normal_relative_angle, Tick, Vec2};

/// Width of the standard test arena.
pub const ARENA_WIDTH: f64 = 800.0;
/// Height of the standard test arena.
pub const ARENA_HEIGHT: f64 = 600.0;
/// Name of our own robot in fixtures.
pub const SELF_NAME: &str = "skynet";

/// Our pose at `(x, y)` on `time`, facing north with a cold gun.
#[must_use]
pub fn pose_at(x: f64, y: f64, time: Tick) -> SelfPose {
    SelfPose::at(Vec2::new(x, y), time)
}

/// A scan of `name` standing at the absolute point `target`, as seen from
/// `observer`.
#[must_use]
pub fn scan_of(observer: &SelfPose, name: &str, target: Vec2, energy: f64) -> ScanEvent {
    let absolute = observer.position.bearing_to(target);
    ScanEvent {
        name: name.to_string(),
        bearing: normal_relative_angle(absolute - observer.heading),
        distance: observer.position.distance(target),
        energy,
        heading: 0.0,
        velocity: 0.0,
        time: observer.time,
    }
}

/// Standard 800 × 600 arena with default tuning.
///
/// # Panics
///
/// Panics if the default configuration cannot build an arena.
#[must_use]
pub fn duel_arena() -> ArenaModel {
    ArenaModel::new(ARENA_WIDTH, ARENA_HEIGHT, SELF_NAME, TacticsConfig::default())
        .expect("default arena")
}

/// An opponent that moves in a straight line and fires on a fixed period.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedOpponent {
    /// Robot name.
    pub name: String,
    /// Position at tick 0.
    pub start: Vec2,
    /// Displacement per tick.
    pub velocity: Vec2,
    /// Energy at tick 0.
    pub energy: f64,
    /// Fire every this many ticks; 0 never fires.
    pub fire_every: Tick,
    /// Power of every shot.
    pub fire_power: f64,
}

impl ScriptedOpponent {
    /// A still opponent that never fires.
    #[must_use]
    pub fn sitting(name: &str, at: Vec2) -> Self {
        Self {
            name: name.to_string(),
            start: at,
            velocity: Vec2::ZERO,
            energy: 100.0,
            fire_every: 0,
            fire_power: 0.0,
        }
    }

    /// Builder: move by `velocity` each tick.
    #[must_use]
    pub fn moving(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Builder: fire `power` every `every` ticks once the gun has cooled.
    #[must_use]
    pub fn firing(mut self, every: Tick, power: f64) -> Self {
        self.fire_every = every;
        self.fire_power = power;
        self
    }

    /// Position at `time`.
    #[must_use]
    pub fn position_at(&self, time: Tick) -> Vec2 {
        self.start + self.velocity * time as f64
    }

    /// Shots fired up to and including `time`.
    #[must_use]
    pub fn shots_by(&self, time: Tick) -> u64 {
        if self.fire_every == 0 || time < FIRST_SHOT {
            return 0;
        }
        (time - FIRST_SHOT) / self.fire_every + 1
    }

    /// Energy at `time`.
    #[must_use]
    pub fn energy_at(&self, time: Tick) -> f64 {
        self.energy - self.fire_power * self.shots_by(time) as f64
    }
}

/// Tick of the first scripted shot, after the starting gun heat is gone.
pub const FIRST_SHOT: Tick = 31;

/// Inputs for `ticks` ticks in which we stand at `me` and scan every
/// scripted opponent every tick.
#[must_use]
pub fn scripted_inputs(me: Vec2, opponents: &[ScriptedOpponent], ticks: Tick) -> Vec<TickInput> {
    (0..ticks)
        .map(|time| {
            let pose = SelfPose::at(me, time);
            let events = opponents
                .iter()
                .map(|o| {
                    ArenaEvent::Scanned(scan_of(&pose, &o.name, o.position_at(time), o.energy_at(time)))
                })
                .collect();
            TickInput {
                pose,
                alive_opponents: opponents.len(),
                events,
            }
        })
        .collect()
}

/// Two opponents crossing the arena, one of them firing regularly.
#[must_use]
pub fn crossing_duel(ticks: Tick) -> Vec<TickInput> {
    let opponents = [
        ScriptedOpponent::sitting("crosser", Vec2::new(100.0, 500.0))
            .moving(Vec2::new(3.0, 0.0))
            .firing(16, 2.0),
        ScriptedOpponent::sitting("lurker", Vec2::new(700.0, 100.0)).moving(Vec2::new(0.0, 2.0)),
    ];
    scripted_inputs(Vec2::new(400.0, 300.0), &opponents, ticks)
}
