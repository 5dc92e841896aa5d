//! # Skynet Core
//!
//! Tactical core for a tank in a real-time robot arena.
//!
//! This crate contains **only** decision logic:
//! - No rendering
//! - No IO beyond loading a config file
//! - No randomness
//!
//! Every tick the host feeds an [`engine::TickInput`] (our pose plus the
//! events since the last tick) into an [`arena::ArenaModel`] and applies the
//! returned [`engine::Commands`]. Identical inputs produce identical
//! commands, which the headless harness relies on for replays and
//! determinism checks.
//!
//! ## Crate Structure
//!
//! - [`arena`] - Per-match model and the tick driver
//! - [`tracker`] - Opponent history, discharge detection
//! - [`wave`] - Danger waves and sector merging
//! - [`predictor`] - Linear, quadratic and GuessFactor predictors
//! - [`motion`] - Sample-ring motion planner
//! - [`radar`] - Adaptive radar sweep
//! - [`weapon`] - Per-opponent statistical gun
//! - [`geometry`] - Shapes, footprints, safe regions
//! - [`math`] - Vectors and angle conventions

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod arena;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod math;
pub mod motion;
pub mod observation;
pub mod obstacle;
pub mod predictor;
pub mod radar;
pub mod tracker;
pub mod wave;
pub mod weapon;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::arena::{ArenaModel, ArenaStats};
    pub use crate::config::{ConfigError, TacticsConfig};
    pub use crate::engine::{ArenaEvent, Commands, ScanEvent, SelfPose, TickInput};
    pub use crate::error::{Result, TacticsError};
    pub use crate::geometry::{Footprint, Rect, SafeRegion, Shape};
    pub use crate::math::{normal_absolute_angle, normal_relative_angle, Tick, Vec2};
    pub use crate::motion::{MotionCommand, MotionPlanner, MotionState};
    pub use crate::observation::Observation;
    pub use crate::obstacle::{Obstacle, ObstacleKind, ObstacleRef};
    pub use crate::predictor::{
        GeometricPredictor, GuessFactorModel, LinearPredictor, Predictor, QuadraticPredictor,
        Sample,
    };
    pub use crate::radar::{RadarController, RadarMode};
    pub use crate::tracker::{OpponentTracker, TrackerId, TrackerRole};
    pub use crate::wave::{DangerWave, WaveId, WaveSector};
    pub use crate::weapon::{AimSolution, WeaponController};
}
