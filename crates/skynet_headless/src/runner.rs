//! Match runner: drives one [`ArenaModel`] against the stand-in engine.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use skynet_core::arena::ArenaModel;
use skynet_core::config::{ConfigError, TacticsConfig};
use skynet_core::error::TacticsError;
use thiserror::Error;

use crate::scenario::{Scenario, ScenarioError};
use crate::sim::StandInEngine;

/// Default wall-clock budget for one tactical tick.
pub const DEFAULT_TICK_DEADLINE: Duration = Duration::from_millis(15);

/// Error type for match runs.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// Scenario could not be loaded or is invalid.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    /// Tactical tuning is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The tactical core could not be set up.
    #[error("Tactical core error: {0}")]
    Tactics(#[from] TacticsError),
    /// A tick took longer than the engine allows.
    #[error("Tick {tick} took {elapsed_us}us, over the {limit_us}us deadline")]
    DeadlineMissed {
        /// Offending tick.
        tick: u64,
        /// Time taken.
        elapsed_us: u64,
        /// Allowed time.
        limit_us: u64,
    },
}

/// Runner configuration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Name our robot goes by.
    pub self_name: String,
    /// Tactical tuning.
    pub tactics: TacticsConfig,
    /// Per-tick wall-clock budget; `None` disables the check.
    pub tick_deadline: Option<Duration>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            self_name: "skynet".to_string(),
            tactics: TacticsConfig::default(),
            tick_deadline: Some(DEFAULT_TICK_DEADLINE),
        }
    }
}

/// Outcome of one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Scenario name.
    pub scenario: String,
    /// Ticks played.
    pub ticks: u64,
    /// Whether we were still alive at the end.
    pub survived: bool,
    /// Our energy at the end.
    pub final_energy: f64,
    /// Projectiles we fired.
    pub shots_fired: u64,
    /// Our projectiles that hit.
    pub shots_hit: u64,
    /// Opponent projectiles that hit us.
    pub hits_taken: u64,
    /// Danger waves the core inferred.
    pub waves_detected: u64,
    /// Opponents destroyed.
    pub opponents_destroyed: u64,
    /// Wall collisions.
    pub wall_collisions: u64,
    /// Ticks the core degraded to holding still.
    pub degraded_ticks: u64,
    /// Slowest tactical tick in microseconds.
    pub slowest_tick_us: u64,
    /// Final tactical state hash.
    pub state_hash: u64,
}

impl MatchReport {
    /// Fraction of our shots that hit, or zero before the first shot.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        if self.shots_fired == 0 {
            0.0
        } else {
            self.shots_hit as f64 / self.shots_fired as f64
        }
    }
}

/// Runs scenarios through the tactical core.
#[derive(Debug, Clone, Default)]
pub struct MatchRunner {
    config: RunnerConfig,
}

impl MatchRunner {
    /// Runner with the given configuration.
    #[must_use]
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Play `scenario` to the end.
    ///
    /// # Errors
    ///
    /// Fails if the scenario is invalid, the core cannot be built, or a
    /// tick overruns the deadline.
    pub fn run(&self, scenario: &Scenario) -> Result<MatchReport, RunnerError> {
        scenario.validate()?;
        self.config.tactics.validate()?;
        let (width, height) = scenario.arena;
        let mut arena = ArenaModel::new(
            width,
            height,
            &self.config.self_name,
            self.config.tactics.clone(),
        )?;
        let mut engine = StandInEngine::new(scenario, &self.config.self_name);

        tracing::info!(
            scenario = %scenario.name,
            opponents = scenario.opponents.len(),
            ticks = scenario.ticks,
            "Starting match"
        );

        let mut slowest = Duration::ZERO;
        let mut ticks = 0;
        while ticks < scenario.ticks && !engine.is_over() {
            let input = engine.next_input();
            let started = Instant::now();
            let commands = arena.tick(&input);
            let elapsed = started.elapsed();
            slowest = slowest.max(elapsed);
            if let Some(limit) = self.config.tick_deadline {
                if elapsed > limit {
                    return Err(RunnerError::DeadlineMissed {
                        tick: input.pose.time,
                        elapsed_us: duration_us(elapsed),
                        limit_us: duration_us(limit),
                    });
                }
            }
            engine.step(&commands);
            ticks += 1;
        }
        // deliver the final events, including the end of the battle
        let last = engine.next_input();
        arena.tick(&last);

        let engine_stats = engine.stats();
        let core_stats = arena.stats();
        let report = MatchReport {
            scenario: scenario.name.clone(),
            ticks,
            survived: engine.survived(),
            final_energy: engine.energy(),
            shots_fired: engine_stats.shots_fired,
            shots_hit: engine_stats.shots_hit,
            hits_taken: engine_stats.hits_taken,
            waves_detected: core_stats.waves_detected,
            opponents_destroyed: engine_stats.opponents_destroyed,
            wall_collisions: engine_stats.wall_collisions,
            degraded_ticks: core_stats.degraded_ticks,
            slowest_tick_us: duration_us(slowest),
            state_hash: arena.state_hash(),
        };
        tracing::info!(
            scenario = %report.scenario,
            ticks = report.ticks,
            survived = report.survived,
            hit_rate = report.hit_rate(),
            "Match finished"
        );
        Ok(report)
    }
}

fn duration_us(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{Movement, OpponentScript};

    fn unlimited() -> MatchRunner {
        MatchRunner::new(RunnerConfig {
            tick_deadline: None,
            ..RunnerConfig::default()
        })
    }

    #[test]
    fn test_duel_runs_to_completion() {
        let report = unlimited().run(&Scenario::duel()).unwrap();
        assert!(report.ticks > 0 && report.ticks <= 600);
        assert!(report.shots_fired > 0);
        assert!(report.waves_detected > 0);
        assert_eq!(report.degraded_ticks, 0);
    }

    #[test]
    fn test_runs_are_reproducible() {
        let runner = unlimited();
        let mut a = runner.run(&Scenario::melee()).unwrap();
        let mut b = runner.run(&Scenario::melee()).unwrap();
        a.slowest_tick_us = 0;
        b.slowest_tick_us = 0;
        assert_eq!(a, b);
    }

    #[test]
    fn test_sitting_target_gets_hit() {
        let scenario = Scenario {
            name: "sitter".to_string(),
            description: String::new(),
            arena: (800.0, 600.0),
            ticks: 2000,
            start: (400.0, 100.0),
            heading: 0.0,
            opponents: vec![OpponentScript::new("sitter", 400.0, 400.0)
                .with_movement(Movement::Stationary)],
        };
        let report = unlimited().run(&scenario).unwrap();
        assert!(report.shots_hit > 0);
        assert!(report.survived);
        assert_eq!(report.hits_taken, 0);
    }

    #[test]
    fn test_deadline_overrun_is_fatal() {
        let runner = MatchRunner::new(RunnerConfig {
            tick_deadline: Some(Duration::from_nanos(1)),
            ..RunnerConfig::default()
        });
        assert!(matches!(
            runner.run(&Scenario::duel()),
            Err(RunnerError::DeadlineMissed { tick: 0, .. })
        ));
    }

    #[test]
    fn test_invalid_scenario_is_rejected() {
        let mut scenario = Scenario::duel();
        scenario.arena = (0.0, 600.0);
        assert!(matches!(
            unlimited().run(&scenario),
            Err(RunnerError::Scenario(_))
        ));
    }
}
