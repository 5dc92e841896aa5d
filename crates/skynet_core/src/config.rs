//! Tunable constants for the tactical core.
//!
//! Every section has a `Default` matching the values the core was tuned
//! with, and `#[serde(default)]` so a RON file only needs to name the
//! fields it overrides.
//!
//! # Example RON
//!
//! ```ron
//! TacticsConfig(
//!     motion: (
//!         rings: 4,
//!         samples_per_ring: 16,
//!     ),
//!     weapon: (
//!         fire_power: 2.0,
//!     ),
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found.
    #[error("Config file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// A value is outside its usable range.
    #[error("Invalid config value for {field}: {reason}")]
    Invalid {
        /// Offending field path.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// Engine rules the core models (Robocode-like).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Half the side of a robot's bounding box.
    pub robot_radius: f64,
    /// Maximum robot speed, units per tick.
    pub max_robot_speed: f64,
    /// Gun heat lost per tick.
    pub gun_cooling_rate: f64,
    /// Gun heat every robot starts a round with.
    pub initial_gun_heat: f64,
    /// Smallest legal firing power.
    pub min_fire_power: f64,
    /// Largest legal firing power.
    pub max_fire_power: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            robot_radius: 18.0,
            max_robot_speed: 8.0,
            gun_cooling_rate: 0.1,
            initial_gun_heat: 3.0,
            min_fire_power: 0.1,
            max_fire_power: 3.0,
        }
    }
}

/// Opponent tracking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    /// Observations retained per opponent.
    pub history_window: usize,
    /// Tolerance around the legal firing-power band when reading energy drops.
    pub energy_tolerance: f64,
    /// Gun heat below which an opponent is considered able to fire.
    pub gun_heat_epsilon: f64,
    /// Radius of the area an opponent is assumed to threaten.
    pub footprint_radius: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            history_window: 10,
            energy_tolerance: 0.0001,
            gun_heat_epsilon: 0.0001,
            // eight ticks of travel plus the robot itself
            footprint_radius: 82.0,
        }
    }
}

/// Danger wave geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WaveConfig {
    /// Band depth of a freshly detected wave.
    pub base_depth: f64,
    /// Extra depth per tick of detection staleness.
    pub depth_per_stale_tick: f64,
    /// Upper bound on band depth.
    pub max_depth: f64,
    /// Extra radius added per stale tick on top of the travel correction.
    pub staleness_margin: f64,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            base_depth: 40.0,
            depth_per_stale_tick: 8.0,
            max_depth: 120.0,
            staleness_margin: 2.0,
        }
    }
}

/// Arena-level bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArenaConfig {
    /// Margin cut from every wall before danger subtraction.
    pub wall_exclusion: f64,
    /// Cells per side of the least-contested-point grid.
    pub grid_size: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            wall_exclusion: 28.0,
            grid_size: 10,
        }
    }
}

/// Ring sampling and movement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MotionConfig {
    /// Number of concentric sample rings.
    pub rings: usize,
    /// Samples per ring.
    pub samples_per_ring: usize,
    /// Radius of the innermost ring.
    pub min_ring_radius: f64,
    /// Outermost ring radius as a fraction of the arena diagonal.
    pub outer_ring_fraction: f64,
    /// Score weight of each ring, innermost first. Missing entries reuse the last.
    pub ring_weights: Vec<f64>,
    /// Weight of the least-contested-point term.
    pub least_contested_weight: f64,
    /// Offset added to wave distance when computing urgency.
    pub urgency_distance_offset: f64,
    /// Turn beyond `π/2` that forces a direction flip.
    pub flip_margin: f64,
    /// Reverse when the reverse turn is below this fraction of the forward turn.
    pub reverse_ratio: f64,
    /// Travel commanded per tick at full speed.
    pub full_travel: f64,
    /// Travel for turns sharper than `moderate_turn`.
    pub moderate_travel: f64,
    /// Travel for turns sharper than `sharp_turn`.
    pub sharp_travel: f64,
    /// Turn above which travel drops to `moderate_travel`, radians.
    pub moderate_turn: f64,
    /// Turn above which travel drops to `sharp_travel`, radians.
    pub sharp_turn: f64,
    /// Distance from a wall that biases the emergency escape.
    pub wall_escape_threshold: f64,
    /// Ticks spent in wall recovery.
    pub recovery_ticks: u32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            rings: 4,
            samples_per_ring: 16,
            min_ring_radius: 40.0,
            outer_ring_fraction: 0.2,
            ring_weights: vec![4.0, 2.0, 1.0, 0.5],
            least_contested_weight: 0.3,
            urgency_distance_offset: 50.0,
            flip_margin: 0.3,
            reverse_ratio: 0.7,
            full_travel: 100.0,
            moderate_travel: 50.0,
            sharp_travel: 20.0,
            moderate_turn: std::f64::consts::FRAC_PI_6,
            sharp_turn: std::f64::consts::FRAC_PI_3,
            wall_escape_threshold: 100.0,
            recovery_ticks: 20,
        }
    }
}

/// Radar sweeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RadarConfig {
    /// Observation age that forces a full sweep.
    pub staleness_threshold: u64,
    /// Turn issued for a full sweep, radians.
    pub full_sweep_turn: f64,
    /// Margin added outward at each bearing extreme.
    pub sweep_margin: f64,
    /// Remaining radar turn below which the radar counts as idle.
    pub idle_epsilon: f64,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            staleness_threshold: 10,
            full_sweep_turn: 370.0_f64.to_radians(),
            sweep_margin: 0.2,
            idle_epsilon: 1e-4,
        }
    }
}

/// Aiming and firing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WeaponConfig {
    /// Power of every shot.
    pub fire_power: f64,
    /// Gun turn tolerance within which a shot may be fired, radians.
    pub aim_tolerance: f64,
    /// Number of GuessFactor bins. Must be a power of two.
    pub bins: usize,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            fire_power: 1.5,
            aim_tolerance: 0.05,
            bins: 32,
        }
    }
}

/// Complete configuration of the tactical core.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TacticsConfig {
    /// Engine rules.
    pub physics: PhysicsConfig,
    /// Opponent tracking.
    pub tracker: TrackerConfig,
    /// Danger waves.
    pub wave: WaveConfig,
    /// Arena bookkeeping.
    pub arena: ArenaConfig,
    /// Motion planning.
    pub motion: MotionConfig,
    /// Radar control.
    pub radar: RadarConfig,
    /// Weapon control.
    pub weapon: WeaponConfig,
}

impl TacticsConfig {
    /// Load a configuration from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Parse a configuration from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, ConfigError> {
        let config: TacticsConfig = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the core cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracker.history_window < 2 {
            return Err(ConfigError::Invalid {
                field: "tracker.history_window",
                reason: "must retain at least two observations",
            });
        }
        if !self.weapon.bins.is_power_of_two() {
            return Err(ConfigError::Invalid {
                field: "weapon.bins",
                reason: "must be a power of two",
            });
        }
        if self.motion.rings == 0 || self.motion.samples_per_ring == 0 {
            return Err(ConfigError::Invalid {
                field: "motion",
                reason: "rings and samples_per_ring must be positive",
            });
        }
        if self.motion.ring_weights.is_empty() {
            return Err(ConfigError::Invalid {
                field: "motion.ring_weights",
                reason: "at least one weight is required",
            });
        }
        if self.arena.grid_size == 0 {
            return Err(ConfigError::Invalid {
                field: "arena.grid_size",
                reason: "must be positive",
            });
        }
        Ok(())
    }

    /// Projectile speed for a firing power under engine rules.
    #[must_use]
    pub fn projectile_speed(power: f64) -> f64 {
        20.0 - 3.0 * power
    }

    /// Gun heat generated by a shot of `power`.
    #[must_use]
    pub fn gun_heat_for(power: f64) -> f64 {
        1.0 + power / 5.0
    }
}
