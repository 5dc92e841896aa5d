//! Arena-level behaviour: motion, radar, targeting, lifecycle and
//! determinism.

use skynet_core::prelude::*;
use skynet_test_utils::determinism::{find_first_divergence, verify_arena_determinism, verify_determinism};
use skynet_test_utils::fixtures::{
    crossing_duel, duel_arena, pose_at, scan_of, scripted_inputs, ScriptedOpponent,
};

fn tick_with(arena: &mut ArenaModel, pose: SelfPose, alive: usize, seen: &[(&str, Vec2)]) -> Commands {
    let events = seen
        .iter()
        .map(|&(name, at)| ArenaEvent::Scanned(scan_of(&pose, name, at, 100.0)))
        .collect();
    arena.tick(&TickInput {
        pose,
        alive_opponents: alive,
        events,
    })
}

#[test]
fn test_empty_arena_holds_still() {
    let mut arena = duel_arena();
    let commands = tick_with(&mut arena, pose_at(400.0, 300.0, 1), 0, &[]);
    assert_eq!(commands.travel, 0.0);
    assert_eq!(commands.body_turn, 0.0);
    assert!(commands.fire.is_none());
    assert_eq!(arena.motion_state(), MotionState::Cruising);
    assert_eq!(arena.least_contested_point(), None);
}

#[test]
fn test_opponent_on_top_of_us_triggers_emergency_escape() {
    let mut arena = duel_arena();
    let commands = tick_with(
        &mut arena,
        pose_at(400.0, 300.0, 1),
        1,
        &[("rammer", Vec2::new(400.0, 320.0))],
    );
    assert_eq!(arena.motion_state(), MotionState::EmergencyEscape);
    assert_eq!(commands.travel.abs(), 100.0);
}

#[test]
fn test_nearby_opponent_steers_us_away() {
    let mut arena = duel_arena();
    let commands = tick_with(
        &mut arena,
        pose_at(400.0, 300.0, 1),
        1,
        &[("neighbour", Vec2::new(400.0, 420.0))],
    );
    assert_eq!(arena.motion_state(), MotionState::Cruising);
    assert!(commands.travel != 0.0);
    // the opponent's footprint reaches our innermost ring to the north
    assert!(!arena.safe_region(0).contains(Vec2::new(400.0, 340.0)));
    assert!(arena.safe_region(0).contains(Vec2::new(400.0, 260.0)));
}

#[test]
fn test_wall_collision_starts_recovery() {
    let mut arena = duel_arena();
    let pose = pose_at(40.0, 300.0, 5);
    let commands = arena.tick(&TickInput {
        pose,
        alive_opponents: 0,
        events: vec![ArenaEvent::WallCollision { bearing: -1.5 }],
    });
    assert!(matches!(arena.motion_state(), MotionState::WallRecovery { .. }));
    assert!(commands.travel != 0.0);

    for time in 6..40 {
        tick_with(&mut arena, pose_at(400.0, 300.0, time), 0, &[]);
    }
    assert_eq!(arena.motion_state(), MotionState::Cruising);
}

#[test]
fn test_radar_locks_on_once_everyone_is_seen() {
    let mut arena = duel_arena();
    tick_with(
        &mut arena,
        pose_at(400.0, 300.0, 1),
        2,
        &[("first", Vec2::new(400.0, 500.0))],
    );
    assert_eq!(arena.radar_mode(), RadarMode::FullSweep);

    tick_with(
        &mut arena,
        pose_at(400.0, 300.0, 2),
        2,
        &[("second", Vec2::new(500.0, 500.0))],
    );
    assert_eq!(arena.radar_mode(), RadarMode::TargetedSweep);
    assert_eq!(arena.oldest_observation_age(), Some(1));
}

#[test]
fn test_targets_nearest_and_fires_when_aligned() {
    let mut arena = duel_arena();
    let commands = tick_with(
        &mut arena,
        pose_at(400.0, 300.0, 50),
        2,
        &[("far", Vec2::new(400.0, 560.0)), ("near", Vec2::new(400.0, 450.0))],
    );
    assert_eq!(arena.target().map(OpponentTracker::name), Some("near"));
    assert!(commands.gun_turn.abs() < 1e-9);
    assert_eq!(commands.fire, Some(1.5));
    assert_eq!(arena.stats().shots_fired, 1);
}

#[test]
fn test_shot_at_previous_target_is_scored_on_arrival() {
    let mut arena = duel_arena();
    let a = Vec2::new(400.0, 450.0);
    let b = Vec2::new(400.0, 400.0);
    let commands = tick_with(&mut arena, pose_at(400.0, 300.0, 50), 2, &[("a", a)]);
    assert_eq!(commands.fire, Some(1.5));
    let weapon_of = |arena: &ArenaModel, name: &str| {
        arena.tracker(name).and_then(OpponentTracker::weapon).cloned().unwrap()
    };
    assert_eq!(weapon_of(&arena, "a").shots_in_flight(), 1);

    // 150 units at 15.5 per tick lands on tick 60
    for time in 51..60 {
        tick_with(&mut arena, pose_at(400.0, 300.0, time), 2, &[("a", a), ("b", b)]);
        assert_eq!(arena.target().map(OpponentTracker::name), Some("b"));
        assert_eq!(weapon_of(&arena, "a").shots_in_flight(), 1);
        assert_eq!(weapon_of(&arena, "a").model().total_results(), 0);
    }
    tick_with(&mut arena, pose_at(400.0, 300.0, 60), 2, &[("a", a), ("b", b)]);
    assert_eq!(arena.target().map(OpponentTracker::name), Some("b"));
    let weapon = weapon_of(&arena, "a");
    assert_eq!(weapon.shots_in_flight(), 0);
    assert_eq!(weapon.model().total_results(), 1);
    assert_eq!(weapon.model().bins()[16], 1);
}

#[test]
fn test_hot_gun_holds_fire() {
    let mut arena = duel_arena();
    let mut pose = pose_at(400.0, 300.0, 50);
    pose.gun_heat = 0.5;
    let commands = tick_with(&mut arena, pose, 1, &[("near", Vec2::new(400.0, 450.0))]);
    assert!(commands.fire.is_none());
}

#[test]
fn test_destroyed_target_is_released_but_its_waves_remain() {
    let mut arena = duel_arena();
    let shooter = Vec2::new(400.0, 500.0);
    for (time, energy) in [(40, 100.0), (41, 97.0)] {
        let pose = pose_at(400.0, 300.0, time);
        arena.tick(&TickInput {
            pose,
            alive_opponents: 1,
            events: vec![ArenaEvent::Scanned(scan_of(&pose, "shooter", shooter, energy))],
        });
    }
    assert_eq!(arena.waves().len(), 1);

    arena.tick(&TickInput {
        pose: pose_at(400.0, 300.0, 42),
        alive_opponents: 0,
        events: vec![ArenaEvent::Destroyed {
            name: "shooter".to_string(),
        }],
    });
    assert!(arena.target().is_none());
    assert!(arena.opponents().is_empty());
    let waves = arena.waves();
    assert_eq!(waves.len(), 1);
    assert_eq!(waves[0].source(), None);
    assert!(arena
        .obstacles()
        .iter()
        .any(|o| o.kind() == ObstacleKind::Wave));
}

#[test]
fn test_obstacles_are_listed_in_creation_order() {
    let mut arena = duel_arena();
    tick_with(
        &mut arena,
        pose_at(400.0, 300.0, 1),
        3,
        &[
            ("zulu", Vec2::new(100.0, 100.0)),
            ("alpha", Vec2::new(700.0, 500.0)),
            ("mike", Vec2::new(100.0, 500.0)),
        ],
    );
    let kinds: Vec<ObstacleKind> = arena.obstacles().iter().map(ObstacleRef::kind).collect();
    assert_eq!(
        kinds,
        [
            ObstacleKind::SelfModel,
            ObstacleKind::Opponent,
            ObstacleKind::Opponent,
            ObstacleKind::Opponent
        ]
    );
    let names: Vec<&str> = arena.opponents().into_iter().map(OpponentTracker::name).collect();
    assert_eq!(names, ["zulu", "alpha", "mike"]);
}

#[test]
fn test_learning_survives_rounds() {
    let opponents = [ScriptedOpponent::sitting("dodger", Vec2::new(400.0, 500.0))
        .moving(Vec2::new(1.0, 0.0))];
    let mut arena = duel_arena();
    for input in scripted_inputs(Vec2::new(400.0, 200.0), &opponents, 120) {
        arena.tick(&input);
    }
    let learned = arena
        .tracker("dodger")
        .and_then(OpponentTracker::weapon)
        .map(|w| w.model().total_results())
        .unwrap_or_default();
    assert!(learned > 0);

    arena.tick(&TickInput {
        pose: pose_at(400.0, 200.0, 0),
        alive_opponents: 1,
        events: vec![ArenaEvent::RoundStarted { round: 1 }],
    });
    assert_eq!(arena.round(), 1);
    assert_eq!(
        arena.learned_model("dodger").map(GuessFactorModel::total_results),
        Some(learned)
    );
}

#[test]
fn test_identical_inputs_give_identical_matches() {
    let inputs = crossing_duel(200);
    verify_arena_determinism(duel_arena, &inputs, 3).assert_deterministic();
    assert_eq!(find_first_divergence(duel_arena, &inputs), None);
}

#[test]
fn test_state_hash_is_reproducible_tick_by_tick() {
    let inputs = crossing_duel(80);
    let result = verify_determinism(
        2,
        inputs.len() as u64,
        duel_arena,
        |arena, tick| {
            let index = usize::try_from(tick).unwrap_or(usize::MAX);
            if let Some(input) = inputs.get(index) {
                arena.tick(input);
            }
        },
        ArenaModel::state_hash,
    );
    result.assert_deterministic();
}
