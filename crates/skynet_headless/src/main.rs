//! Headless arena runner.
//!
//! Plays scenarios against the tactical core and prints the match reports
//! as JSON on stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Built-in duel with default tuning
//! cargo run -p skynet_headless -- run duel
//!
//! # Scenario file with custom tuning and a relaxed deadline
//! cargo run -p skynet_headless -- run scenarios/duel.ron --config config/tactics.ron --deadline-ms 50
//!
//! # Several scenarios in parallel
//! cargo run -p skynet_headless -- batch duel melee --parallel 2 --output results/batch.json
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use skynet_core::config::TacticsConfig;
use skynet_headless::{
    batch::{run_batch, BatchConfig},
    runner::{MatchRunner, RunnerConfig},
    scenario::{Scenario, ScenarioError},
};

#[derive(Parser)]
#[command(name = "skynet_headless")]
#[command(about = "Headless arena runner for the tactical core")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one scenario
    Run {
        /// Scenario file, or the name of a built-in scenario
        scenario: String,

        /// Tactics tuning file (RON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Per-tick deadline in milliseconds (0 = unlimited)
        #[arg(long, default_value = "15")]
        deadline_ms: u64,

        /// Pretty-print the report
        #[arg(long)]
        pretty: bool,
    },

    /// Play several scenarios in parallel
    Batch {
        /// Scenario files or built-in names
        #[arg(required = true)]
        scenarios: Vec<String>,

        /// Tactics tuning file (RON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Maximum parallel matches (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: usize,

        /// Per-tick deadline in milliseconds (0 = unlimited)
        #[arg(long, default_value = "15")]
        deadline_ms: u64,

        /// Write results to this JSON file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Commands::Run {
            scenario,
            config,
            deadline_ms,
            pretty,
        } => cmd_run(&scenario, config.as_deref(), deadline_ms, pretty),
        Commands::Batch {
            scenarios,
            config,
            parallel,
            deadline_ms,
            output,
        } => cmd_batch(&scenarios, config.as_deref(), parallel, deadline_ms, output.as_deref()),
    }
}

/// Built-in scenario by name, otherwise a RON file.
fn resolve_scenario(name_or_path: &str) -> Result<Scenario, ScenarioError> {
    match Scenario::builtin(name_or_path) {
        Some(scenario) => Ok(scenario),
        None => Scenario::load(name_or_path),
    }
}

fn runner_config(config: Option<&Path>, deadline_ms: u64) -> RunnerConfig {
    let tactics = match config {
        Some(path) => match TacticsConfig::load(path) {
            Ok(tactics) => {
                tracing::info!(path = %path.display(), "Loaded tactics config");
                tactics
            }
            Err(e) => fail(&format!("Cannot load tactics config '{}': {e}", path.display())),
        },
        None => TacticsConfig::default(),
    };
    RunnerConfig {
        tactics,
        tick_deadline: (deadline_ms > 0).then(|| Duration::from_millis(deadline_ms)),
        ..RunnerConfig::default()
    }
}

fn cmd_run(scenario: &str, config: Option<&Path>, deadline_ms: u64, pretty: bool) {
    let scenario = resolve_scenario(scenario)
        .unwrap_or_else(|e| fail(&format!("Cannot load scenario '{scenario}': {e}")));
    let runner = MatchRunner::new(runner_config(config, deadline_ms));

    let report = runner
        .run(&scenario)
        .unwrap_or_else(|e| fail(&format!("Match '{}' failed: {e}", scenario.name)));

    let json = if pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    };
    match json {
        Ok(json) => println!("{json}"),
        Err(e) => fail(&format!("Cannot serialize report: {e}")),
    }
}

fn cmd_batch(
    scenarios: &[String],
    config: Option<&Path>,
    parallel: usize,
    deadline_ms: u64,
    output: Option<&Path>,
) {
    let scenarios: Vec<Scenario> = scenarios
        .iter()
        .map(|s| {
            resolve_scenario(s).unwrap_or_else(|e| fail(&format!("Cannot load scenario '{s}': {e}")))
        })
        .collect();
    let batch = BatchConfig {
        runner: runner_config(config, deadline_ms),
        parallel,
    };

    let results = run_batch(&scenarios, &batch);
    tracing::info!(
        completed = results.reports.len(),
        failed = results.errors.len(),
        survived = results.survived(),
        hit_rate = results.overall_hit_rate(),
        "Batch summary"
    );

    match output {
        Some(path) => {
            if let Err(e) = results.save(path) {
                fail(&format!("Cannot write results to '{}': {e}", path.display()));
            }
            tracing::info!(path = %path.display(), "Results saved");
        }
        None => match serde_json::to_string_pretty(&results) {
            Ok(json) => println!("{json}"),
            Err(e) => fail(&format!("Cannot serialize results: {e}")),
        },
    }

    if !results.errors.is_empty() {
        std::process::exit(1);
    }
}

fn fail(message: &str) -> ! {
    tracing::error!("{message}");
    std::process::exit(1);
}
