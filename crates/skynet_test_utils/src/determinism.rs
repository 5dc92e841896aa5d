//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the arena model produces
//! identical commands and state given identical inputs.
//!
//! # Testing Strategy
//!
//! The headless harness replays matches and compares reports, so the
//! tactical core must be a pure function of its inputs. Sources of
//! non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Trackers are always iterated in creation order.
//!
//! - **System randomness**: the core has none.
//!
//! - **Floating-point math**: identical on one machine for identical
//!   operation order, which the fixed system order guarantees.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use skynet_core::arena::ArenaModel;
use skynet_core::engine::{Commands, TickInput};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic run).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Arena is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of ticks per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance by one tick, given the tick index
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for tick in 0..ticks {
            step(&mut state, tick);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    if !is_deterministic {
        tracing::warn!(runs, ticks, "Runs diverged");
    }

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Feed `inputs` through a fresh arena from `setup`, returning the final
/// state hash combined with every command issued.
pub fn replay_hash<F>(setup: F, inputs: &[TickInput]) -> u64
where
    F: Fn() -> ArenaModel,
{
    let mut arena = setup();
    let mut hasher = DefaultHasher::new();
    for input in inputs {
        hash_commands(&arena.tick(input), &mut hasher);
    }
    arena.state_hash().hash(&mut hasher);
    hasher.finish()
}

/// Replay the same inputs `runs` times and compare.
pub fn verify_arena_determinism<F>(setup: F, inputs: &[TickInput], runs: usize) -> DeterminismResult
where
    F: Fn() -> ArenaModel,
{
    let hashes: Vec<u64> = (0..runs).map(|_| replay_hash(&setup, inputs)).collect();
    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: inputs.len() as u64,
    }
}

/// Replay the same inputs on `runs` scoped threads.
pub fn replay_in_parallel<F>(setup: F, inputs: &[TickInput], runs: usize) -> DeterminismResult
where
    F: Fn() -> ArenaModel + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..runs)
            .map(|_| s.spawn(|| replay_hash(&setup, inputs)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_default())
            .collect()
    });
    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: inputs.len() as u64,
    }
}

/// Compare two arenas tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the arenas agree throughout, `Some(tick)` at the first tick
/// whose commands or state differ.
pub fn find_first_divergence<F>(setup: F, inputs: &[TickInput]) -> Option<u64>
where
    F: Fn() -> ArenaModel,
{
    let mut a = setup();
    let mut b = setup();
    if a.state_hash() != b.state_hash() {
        return Some(0);
    }
    for input in inputs {
        if a.tick(input) != b.tick(input) || a.state_hash() != b.state_hash() {
            return Some(input.pose.time);
        }
    }
    None
}

fn hash_commands(commands: &Commands, hasher: &mut DefaultHasher) {
    commands.body_turn.to_bits().hash(hasher);
    commands.travel.to_bits().hash(hasher);
    commands.radar_turn.to_bits().hash(hasher);
    commands.gun_turn.to_bits().hash(hasher);
    commands.fire.map(f64::to_bits).hash(hasher);
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for tactical inputs.
pub mod strategies {
    use proptest::prelude::*;
    use skynet_core::math::Vec2;
    use skynet_core::predictor::Sample;

    /// A point inside an 800 × 600 arena, clear of the walls.
    pub fn arb_arena_point() -> impl Strategy<Value = Vec2> {
        (40.0f64..760.0, 40.0f64..560.0).prop_map(|(x, y)| Vec2::new(x, y))
    }

    /// Any heading.
    pub fn arb_heading() -> impl Strategy<Value = f64> {
        0.0f64..std::f64::consts::TAU
    }

    /// A velocity no faster than a robot can move.
    pub fn arb_velocity() -> impl Strategy<Value = Vec2> {
        (arb_heading(), 0.0f64..8.0).prop_map(|(h, s)| Vec2::from_heading(h).scale(s))
    }

    /// Consecutive samples of a robot moving at constant velocity.
    pub fn arb_linear_track(max_len: usize) -> impl Strategy<Value = (Vec<Sample>, Vec2)> {
        (arb_arena_point(), arb_velocity(), 2usize..max_len.max(3), 0u64..1000).prop_map(
            |(start, velocity, len, t0)| {
                let samples = (0..len)
                    .map(|i| Sample::new(t0 + i as u64, start + velocity * i as f64))
                    .collect();
                (samples, velocity)
            },
        )
    }

    /// Angular intervals `(start, sweep)` with sweeps below a half turn.
    pub fn arb_intervals(max_len: usize) -> impl Strategy<Value = Vec<(f64, f64)>> {
        proptest::collection::vec(
            (-10.0f64..10.0, 0.0f64..std::f64::consts::PI),
            0..max_len,
        )
    }

    /// Energy drops, inside and outside the firing band.
    pub fn arb_energy_drop() -> impl Strategy<Value = f64> {
        prop_oneof![0.1f64..3.0, 3.01f64..20.0, -5.0f64..0.0999]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{crossing_duel, duel_arena};

    #[test]
    fn test_verify_determinism_counter() {
        let result = verify_determinism(3, 10, || 0u64, |s, t| *s += t, compute_hash);
        result.assert_deterministic();
        assert_eq!(result.unique_hashes().len(), 1);
    }

    #[test]
    fn test_duel_replays_identically() {
        let inputs = crossing_duel(120);
        verify_arena_determinism(duel_arena, &inputs, 3).assert_deterministic();
        assert_eq!(find_first_divergence(duel_arena, &inputs), None);
    }

    #[test]
    fn test_parallel_replays_agree() {
        let inputs = crossing_duel(60);
        replay_in_parallel(duel_arena, &inputs, 4).assert_deterministic();
    }
}
