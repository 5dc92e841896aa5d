//! Batch match runner.
//!
//! Plays many scenarios in parallel using rayon and collects the reports.

use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::runner::{MatchReport, MatchRunner, RunnerConfig};
use crate::scenario::Scenario;

/// Configuration for a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchConfig {
    /// Per-match runner configuration.
    pub runner: RunnerConfig,
    /// Maximum parallel matches (0 = rayon default).
    pub parallel: usize,
}

/// Error during a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchError {
    /// Scenario that failed.
    pub scenario: String,
    /// Error message.
    pub message: String,
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Reports of the matches that completed, in input order.
    pub reports: Vec<MatchReport>,
    /// Matches that failed.
    pub errors: Vec<BatchError>,
    /// Total runtime.
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Matches we survived.
    #[must_use]
    pub fn survived(&self) -> usize {
        self.reports.iter().filter(|r| r.survived).count()
    }

    /// Hit rate over every completed match.
    #[must_use]
    pub fn overall_hit_rate(&self) -> f64 {
        let fired: u64 = self.reports.iter().map(|r| r.shots_fired).sum();
        let hit: u64 = self.reports.iter().map(|r| r.shots_hit).sum();
        if fired == 0 {
            0.0
        } else {
            hit as f64 / fired as f64
        }
    }

    /// Save results to a JSON file.
    ///
    /// # Errors
    ///
    /// Fails if the file or its directory cannot be written.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from a JSON file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Run every scenario in `scenarios`.
#[must_use]
pub fn run_batch(scenarios: &[Scenario], config: &BatchConfig) -> BatchResults {
    let start = Instant::now();
    info!(matches = scenarios.len(), parallel = config.parallel, "Starting batch run");

    let runner = MatchRunner::new(config.runner.clone());
    let play = || -> Vec<Result<MatchReport, BatchError>> {
        scenarios
            .par_iter()
            .map(|scenario| {
                runner.run(scenario).map_err(|e| {
                    warn!(scenario = %scenario.name, error = %e, "Match failed");
                    BatchError {
                        scenario: scenario.name.clone(),
                        message: e.to_string(),
                    }
                })
            })
            .collect()
    };

    let results = if config.parallel > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel)
            .build()
        {
            Ok(pool) => pool.install(play),
            Err(e) => {
                warn!(error = %e, "Could not build thread pool, using the global one");
                play()
            }
        }
    } else {
        play()
    };

    let (reports, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let reports: Vec<MatchReport> = reports.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        completed = reports.len(),
        failed = errors.len(),
        seconds = duration_seconds,
        "Batch complete"
    );

    BatchResults {
        reports,
        errors,
        duration_seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unlimited(parallel: usize) -> BatchConfig {
        BatchConfig {
            runner: RunnerConfig {
                tick_deadline: None,
                ..RunnerConfig::default()
            },
            parallel,
        }
    }

    #[test]
    fn test_batch_keeps_input_order() {
        let scenarios = [Scenario::duel(), Scenario::melee()];
        let results = run_batch(&scenarios, &unlimited(2));
        assert!(results.errors.is_empty());
        let names: Vec<&str> = results.reports.iter().map(|r| r.scenario.as_str()).collect();
        assert_eq!(names, ["duel", "melee"]);
    }

    #[test]
    fn test_batch_collects_failures() {
        let mut broken = Scenario::duel();
        broken.name = "broken".to_string();
        broken.start = (-10.0, 0.0);
        let results = run_batch(&[broken, Scenario::duel()], &unlimited(0));
        assert_eq!(results.reports.len(), 1);
        assert_eq!(results.errors.len(), 1);
        assert_eq!(results.errors[0].scenario, "broken");
    }

    #[test]
    fn test_parallel_and_serial_agree() {
        let scenarios = vec![Scenario::melee(); 3];
        let serial = run_batch(&scenarios, &unlimited(1));
        let parallel = run_batch(&scenarios, &unlimited(3));
        let hashes = |r: &BatchResults| r.reports.iter().map(|m| m.state_hash).collect::<Vec<_>>();
        assert_eq!(hashes(&serial), hashes(&parallel));
    }
}
