//! Discharge detection through the whole arena: scans in, waves out.

use std::f64::consts::PI;

use skynet_core::prelude::*;
use skynet_test_utils::fixtures::{duel_arena, pose_at, scan_of};

/// Two consecutive scans of `name` at `at`, with energies `before` then
/// `after`, taken at ticks `t` and `t + 1` from (100, 100).
fn two_scans(arena: &mut ArenaModel, name: &str, at: Vec2, before: f64, after: f64, t: Tick) {
    for (time, energy) in [(t, before), (t + 1, after)] {
        let pose = pose_at(100.0, 100.0, time);
        let scan = scan_of(&pose, name, at, energy);
        arena.tick(&TickInput {
            pose,
            alive_opponents: 1,
            events: vec![ArenaEvent::Scanned(scan)],
        });
    }
}

#[test]
fn test_energy_drop_of_three_creates_one_wave() {
    let mut arena = duel_arena();
    let opponent = Vec2::new(100.0, 300.0);
    two_scans(&mut arena, "gunner", opponent, 100.0, 97.0, 40);

    let waves = arena.waves();
    assert_eq!(waves.len(), 1);
    let wave = waves[0];
    assert!((wave.speed() - 11.0).abs() < 1e-9);
    assert_eq!(wave.origin(), opponent);
    assert_eq!(wave.created(), 41);
    assert_eq!(wave.staleness(), 0);

    // the only potential victim is us, due south of the shooter
    assert_eq!(wave.sectors().len(), 1);
    let sector = wave.sectors()[0];
    let half = (8.0f64 / 11.0).atan();
    assert!((sector.start - (PI - half)).abs() < 1e-9);
    assert!((sector.sweep - 2.0 * half).abs() < 1e-9);
    assert_eq!(arena.stats().waves_detected, 1);
}

#[test]
fn test_energy_drop_outside_firing_band_is_ignored() {
    let mut arena = duel_arena();
    two_scans(&mut arena, "gunner", Vec2::new(100.0, 300.0), 100.0, 96.0, 40);
    assert!(arena.waves().is_empty());

    let mut arena = duel_arena();
    two_scans(&mut arena, "gunner", Vec2::new(100.0, 300.0), 100.0, 99.95, 40);
    assert!(arena.waves().is_empty());
}

#[test]
fn test_drop_while_starting_heat_remains_is_ignored() {
    let mut arena = duel_arena();
    two_scans(&mut arena, "gunner", Vec2::new(100.0, 300.0), 100.0, 98.0, 3);
    assert!(arena.waves().is_empty());
}

#[test]
fn test_wave_sectors_cover_every_other_robot() {
    let mut arena = duel_arena();
    let shooter = Vec2::new(400.0, 300.0);
    let west = Vec2::new(100.0, 300.0);
    let east = Vec2::new(700.0, 300.0);

    let t = 40;
    for (time, energy) in [(t, 100.0), (t + 1, 98.5)] {
        let pose = pose_at(400.0, 50.0, time);
        let events = vec![
            ArenaEvent::Scanned(scan_of(&pose, "west", west, 100.0)),
            ArenaEvent::Scanned(scan_of(&pose, "east", east, 100.0)),
            ArenaEvent::Scanned(scan_of(&pose, "shooter", shooter, energy)),
        ];
        arena.tick(&TickInput {
            pose,
            alive_opponents: 3,
            events,
        });
    }

    let waves = arena.waves();
    assert_eq!(waves.len(), 1);
    let wave = waves[0];
    assert_eq!(wave.source(), arena.tracker("shooter").map(OpponentTracker::id));
    // west, east and ourselves to the south: three disjoint cones
    assert_eq!(wave.sectors().len(), 3);
    for target in [west, east, Vec2::new(400.0, 50.0)] {
        let bearing = shooter.bearing_to(target);
        assert!(
            wave.sectors()
                .iter()
                .any(|s| normal_absolute_angle(bearing - s.start) <= s.sweep),
            "no sector towards {target:?}"
        );
    }
}

#[test]
fn test_missed_scans_widen_and_push_the_wave() {
    let mut arena = duel_arena();
    let opponent = Vec2::new(100.0, 400.0);
    let first = pose_at(100.0, 100.0, 40);
    arena.tick(&TickInput {
        pose: first,
        alive_opponents: 1,
        events: vec![ArenaEvent::Scanned(scan_of(&first, "gunner", opponent, 100.0))],
    });
    for time in 41..44 {
        arena.tick(&TickInput {
            pose: pose_at(100.0, 100.0, time),
            alive_opponents: 1,
            events: Vec::new(),
        });
    }
    let late = pose_at(100.0, 100.0, 44);
    arena.tick(&TickInput {
        pose: late,
        alive_opponents: 1,
        events: vec![ArenaEvent::Scanned(scan_of(&late, "gunner", opponent, 99.0))],
    });

    let waves = arena.waves();
    assert_eq!(waves.len(), 1);
    let wave = waves[0];
    assert_eq!(wave.staleness(), 3);
    assert!((wave.depth() - 64.0).abs() < 1e-9);
    // 17 per tick, one tick elapsed, plus 3 stale ticks of travel and margin
    assert!((wave.radius() - (17.0 + 3.0 * 17.0 + 3.0 * 2.0)).abs() < 1e-9);
}

#[test]
fn test_wave_is_dropped_once_it_passes_us() {
    let mut arena = duel_arena();
    two_scans(&mut arena, "gunner", Vec2::new(100.0, 300.0), 100.0, 97.0, 40);
    assert_eq!(arena.waves().len(), 1);

    let mut last_radius = 0.0;
    for time in 42..80 {
        arena.tick(&TickInput {
            pose: pose_at(100.0, 100.0, time),
            alive_opponents: 1,
            events: Vec::new(),
        });
        match arena.waves().first() {
            Some(wave) => {
                assert!(wave.radius() >= last_radius);
                last_radius = wave.radius();
            }
            None => return,
        }
    }
    panic!("wave never passed");
}
