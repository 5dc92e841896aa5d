//! End-to-end runs of the headless harness.

use std::path::PathBuf;

use skynet_core::config::TacticsConfig;
use skynet_headless::{
    run_batch, BatchConfig, BatchResults, MatchRunner, RunnerConfig, Scenario, ScenarioError,
};
use skynet_test_utils::init_tracing;

fn shipped_scenario() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios/duel.ron")
}

fn unlimited() -> RunnerConfig {
    RunnerConfig {
        tick_deadline: None,
        ..RunnerConfig::default()
    }
}

#[test]
fn shipped_scenario_loads_and_plays() {
    init_tracing();
    let scenario = Scenario::load(shipped_scenario()).unwrap();
    assert_eq!(scenario.name, "duel_file");
    assert_eq!(scenario.opponents.len(), 2);
    assert_eq!(scenario.opponents[1].energy, 80.0);

    let report = MatchRunner::new(unlimited()).run(&scenario).unwrap();
    assert!(report.ticks > 0);
    assert!(report.waves_detected > 0);
    assert_eq!(report.degraded_ticks, 0);
}

#[test]
fn scenario_written_to_disk_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("melee.ron");
    let text = ron::ser::to_string_pretty(&Scenario::melee(), ron::ser::PrettyConfig::default())
        .unwrap();
    std::fs::write(&path, text).unwrap();
    assert_eq!(Scenario::load(&path).unwrap(), Scenario::melee());
}

#[test]
fn malformed_scenario_reports_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.ron");
    std::fs::write(&path, "(name: \"broken\", arena: ").unwrap();
    assert!(matches!(
        Scenario::load(&path),
        Err(ScenarioError::ParseError(_))
    ));
}

#[test]
fn tuned_config_changes_fire_power() {
    let tactics = TacticsConfig::from_ron_str("(weapon: (fire_power: 2.5))").unwrap();
    let config = RunnerConfig {
        tactics,
        ..unlimited()
    };
    let report = MatchRunner::new(config).run(&Scenario::duel()).unwrap();
    let baseline = MatchRunner::new(unlimited()).run(&Scenario::duel()).unwrap();
    assert_ne!(report.state_hash, baseline.state_hash);
}

#[test]
fn batch_results_survive_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out/batch.json");
    let results = run_batch(
        &[Scenario::duel(), Scenario::melee()],
        &BatchConfig {
            runner: unlimited(),
            parallel: 2,
        },
    );
    results.save(&path).unwrap();

    let loaded = BatchResults::load(&path).unwrap();
    let summary = |r: &BatchResults| {
        r.reports
            .iter()
            .map(|m| (m.scenario.clone(), m.ticks, m.state_hash))
            .collect::<Vec<_>>()
    };
    assert_eq!(summary(&loaded), summary(&results));
    assert_eq!(loaded.errors, results.errors);
}
