//! Scenario loading and configuration.
//!
//! Scenarios describe one match for the stand-in engine: the arena, our
//! starting pose and a set of scripted opponents.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Parsed, but unusable.
    #[error("Invalid scenario '{scenario}': {reason}")]
    Invalid {
        /// Scenario name.
        scenario: String,
        /// What is wrong.
        reason: String,
    },
}

/// How a scripted opponent moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum Movement {
    /// Never moves.
    #[default]
    Stationary,
    /// Drives along `heading` (radians) at `speed`, bouncing off walls.
    Linear {
        /// Initial heading.
        heading: f64,
        /// Speed per tick.
        speed: f64,
    },
    /// Strafes back and forth along `heading`, reversing every `period`
    /// ticks.
    Oscillate {
        /// Axis heading.
        heading: f64,
        /// Speed per tick.
        speed: f64,
        /// Ticks between reversals.
        period: u64,
    },
}

/// Periodic fire aimed at us.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FireSchedule {
    /// Fire every this many ticks, gun heat permitting.
    pub every: u64,
    /// Projectile power.
    pub power: f64,
}

/// One scripted opponent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentScript {
    /// Robot name.
    pub name: String,
    /// Starting position.
    pub start: (f64, f64),
    /// Starting energy.
    #[serde(default = "default_energy")]
    pub energy: f64,
    /// Movement pattern.
    #[serde(default)]
    pub movement: Movement,
    /// Optional fire schedule.
    #[serde(default)]
    pub fire: Option<FireSchedule>,
}

fn default_energy() -> f64 {
    100.0
}

impl OpponentScript {
    /// Stationary, silent opponent at `(x, y)`.
    #[must_use]
    pub fn new(name: &str, x: f64, y: f64) -> Self {
        Self {
            name: name.to_string(),
            start: (x, y),
            energy: default_energy(),
            movement: Movement::Stationary,
            fire: None,
        }
    }

    /// Builder: movement pattern.
    #[must_use]
    pub fn with_movement(mut self, movement: Movement) -> Self {
        self.movement = movement;
        self
    }

    /// Builder: fire `power` every `every` ticks.
    #[must_use]
    pub fn with_fire(mut self, every: u64, power: f64) -> Self {
        self.fire = Some(FireSchedule { every, power });
        self
    }
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Arena dimensions (width, height).
    pub arena: (f64, f64),
    /// Ticks to run unless the match ends first.
    pub ticks: u64,
    /// Our starting position.
    pub start: (f64, f64),
    /// Our starting heading in radians.
    #[serde(default)]
    pub heading: f64,
    /// Scripted opponents.
    pub opponents: Vec<OpponentScript>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::duel()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing, unreadable, malformed or invalid.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    ///
    /// # Errors
    ///
    /// Fails if the text is malformed or the scenario is invalid.
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check the scenario can be run.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Invalid`] on a degenerate arena, a start
    /// outside it, or duplicate or empty opponent names.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let invalid = |reason: String| ScenarioError::Invalid {
            scenario: self.name.clone(),
            reason,
        };
        let (w, h) = self.arena;
        if !(w > 0.0 && h > 0.0) {
            return Err(invalid(format!("arena {w}x{h} has no area")));
        }
        let inside = |(x, y): (f64, f64)| (0.0..=w).contains(&x) && (0.0..=h).contains(&y);
        if !inside(self.start) {
            return Err(invalid("our start is outside the arena".to_string()));
        }
        let mut names = HashSet::new();
        for o in &self.opponents {
            if o.name.is_empty() {
                return Err(invalid("opponent with an empty name".to_string()));
            }
            if !names.insert(o.name.as_str()) {
                return Err(invalid(format!("opponent '{}' listed twice", o.name)));
            }
            if !inside(o.start) {
                return Err(invalid(format!("opponent '{}' starts outside the arena", o.name)));
            }
            if let Some(fire) = o.fire {
                if fire.every == 0 || !(0.1..=3.0).contains(&fire.power) {
                    return Err(invalid(format!("opponent '{}' has an invalid fire schedule", o.name)));
                }
            }
        }
        Ok(())
    }

    /// One strafing gunner across an 800 × 600 arena.
    #[must_use]
    pub fn duel() -> Self {
        Self {
            name: "duel".to_string(),
            description: "One oscillating gunner firing power 2 every 20 ticks".to_string(),
            arena: (800.0, 600.0),
            ticks: 600,
            start: (200.0, 150.0),
            heading: 0.0,
            opponents: vec![OpponentScript::new("strafer", 600.0, 450.0)
                .with_movement(Movement::Oscillate {
                    heading: std::f64::consts::FRAC_PI_2,
                    speed: 6.0,
                    period: 25,
                })
                .with_fire(20, 2.0)],
        }
    }

    /// Three opponents of mixed behaviour.
    #[must_use]
    pub fn melee() -> Self {
        Self {
            name: "melee".to_string(),
            description: "A sitter, a cruiser and a strafing gunner".to_string(),
            arena: (800.0, 600.0),
            ticks: 800,
            start: (400.0, 300.0),
            heading: 0.0,
            opponents: vec![
                OpponentScript::new("sitter", 100.0, 500.0),
                OpponentScript::new("cruiser", 700.0, 100.0).with_movement(Movement::Linear {
                    heading: 0.3,
                    speed: 5.0,
                }),
                OpponentScript::new("gunner", 650.0, 500.0)
                    .with_movement(Movement::Oscillate {
                        heading: 0.0,
                        speed: 4.0,
                        period: 30,
                    })
                    .with_fire(25, 1.5),
            ],
        }
    }

    /// Built-in scenario by name.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "duel" => Some(Self::duel()),
            "melee" => Some(Self::melee()),
            _ => None,
        }
    }
}
