//! Headless arena runner for the tactical core.
//!
//! Plays scripted scenarios against [`skynet_core::arena::ArenaModel`]
//! with a small stand-in engine, so tactics can be exercised from CI and
//! the command line without a real battle engine.
//!
//! - **Scenarios**: RON files describing the arena and scripted opponents
//! - **Runner**: one match, with a wall-clock deadline per tactical tick
//! - **Batch**: many matches in parallel, results as JSON
//!
//! # Example
//!
//! ```bash
//! # Run a built-in scenario
//! cargo run -p skynet_headless -- run duel
//!
//! # Run scenario files in parallel
//! cargo run -p skynet_headless -- batch scenarios/duel.ron melee --output results/batch.json
//! ```

pub mod batch;
pub mod runner;
pub mod scenario;
pub mod sim;

pub use batch::{run_batch, BatchConfig, BatchError, BatchResults};
pub use runner::{MatchReport, MatchRunner, RunnerConfig, RunnerError};
pub use scenario::{FireSchedule, Movement, OpponentScript, Scenario, ScenarioError};
pub use sim::{EngineStats, StandInEngine};
