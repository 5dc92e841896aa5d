//! The arena model: owner of every obstacle and driver of the tick.
//!
//! One [`ArenaModel`] exists per match. Each engine tick it receives our
//! pose and the events delivered since the last tick, routes them to the
//! right trackers, and then runs the per-tick systems in a fixed order:
//!
//! 1. Radar
//! 2. Obstacle advance (waves grow, passed waves are dropped)
//! 3. Least-contested point
//! 4. Motion
//! 5. Target selection
//! 6. Weapon
//!
//! Trackers are iterated in creation order, so ties in target selection and
//! grid sampling always resolve the same way for the same input.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::config::TacticsConfig;
use crate::engine::{ArenaEvent, Commands, ScanEvent, SelfPose, TickInput};
use crate::error::{Result, TacticsError};
use crate::geometry::{Rect, SafeRegion};
use crate::math::{Tick, Vec2};
use crate::motion::{MotionContext, MotionPlanner, MotionState, WaveThreat};
use crate::obstacle::{Obstacle, ObstacleKind, ObstacleRef, UpdateContext};
use crate::predictor::GuessFactorModel;
use crate::radar::{RadarContext, RadarController, RadarMode};
use crate::tracker::{OpponentTracker, TrackerId, TrackerStorage};
use crate::wave::DangerWave;
use crate::weapon::WeaponController;

/// Running counters for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArenaStats {
    /// Danger waves created from inferred discharges.
    pub waves_detected: u64,
    /// Shots we fired.
    pub shots_fired: u64,
    /// Ticks that failed internally and fell back to holding still.
    pub degraded_ticks: u64,
    /// Opponents removed after a destruction event.
    pub opponents_destroyed: u64,
}

/// Per-match tactical state.
#[derive(Debug)]
pub struct ArenaModel {
    bounds: Rect,
    self_name: String,
    self_id: TrackerId,
    config: TacticsConfig,
    trackers: TrackerStorage,
    orphan_waves: Vec<DangerWave>,
    target: Option<TrackerId>,
    least_contested: Option<Vec2>,
    oldest_observation_age: Option<Tick>,
    motion: MotionPlanner,
    radar: RadarController,
    learned: HashMap<String, GuessFactorModel>,
    now: Tick,
    round: u32,
    stats: ArenaStats,
}

impl ArenaModel {
    /// Create the model for an arena of `width × height` in which we are
    /// called `self_name`.
    ///
    /// # Example
    ///
    /// ```
    /// use skynet_core::prelude::*;
    ///
    /// let mut arena = ArenaModel::new(800.0, 600.0, "me", TacticsConfig::default()).unwrap();
    /// let input = TickInput {
    ///     pose: SelfPose::at(Vec2::new(400.0, 300.0), 0),
    ///     alive_opponents: 1,
    ///     events: Vec::new(),
    /// };
    /// let commands = arena.tick(&input);
    /// assert!(commands.fire.is_none());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`TacticsError::InvariantViolation`] if the self-model cannot
    /// be registered.
    pub fn new(width: f64, height: f64, self_name: &str, config: TacticsConfig) -> Result<Self> {
        let bounds = Rect::from_size(width, height);
        let mut trackers = TrackerStorage::new();
        let self_id = trackers.insert(OpponentTracker::self_model(
            trackers.next_id(),
            self_name,
            &config,
        ))?;
        Ok(Self {
            bounds,
            self_name: self_name.to_string(),
            self_id,
            motion: MotionPlanner::new(bounds, &config.motion),
            radar: RadarController::new(),
            config,
            trackers,
            orphan_waves: Vec::new(),
            target: None,
            least_contested: None,
            oldest_observation_age: None,
            learned: HashMap::new(),
            now: 0,
            round: 0,
            stats: ArenaStats::default(),
        })
    }

    /// Process one engine tick and return the commands to apply.
    ///
    /// Never fails: an internal error is logged and degrades to
    /// [`Commands::hold`]. With the `debug-validation` feature the error
    /// panics instead.
    pub fn tick(&mut self, input: &TickInput) -> Commands {
        let result = self.try_tick(input);
        self.total(result)
    }

    /// Run the per-tick systems for an already-routed set of events.
    ///
    /// Same failure behaviour as [`tick`](Self::tick).
    pub fn update(&mut self, pose: &SelfPose, alive_opponents: usize) -> Commands {
        let result = self.try_update(pose, alive_opponents);
        self.total(result)
    }

    fn total(&mut self, result: Result<Commands>) -> Commands {
        match result {
            Ok(commands) => commands,
            Err(err) => {
                self.stats.degraded_ticks += 1;
                tracing::error!(tick = self.now, error = %err, "Tick failed, holding position");
                #[cfg(feature = "debug-validation")]
                panic!("tick {} failed: {err}", self.now);
                #[cfg(not(feature = "debug-validation"))]
                Commands::hold()
            }
        }
    }

    /// Fallible tick: pose, events, then systems.
    ///
    /// # Errors
    ///
    /// Returns [`TacticsError::NonFinitePose`] for an unusable pose, or any
    /// invariant violation raised while routing events or updating.
    pub fn try_tick(&mut self, input: &TickInput) -> Result<Commands> {
        self.observe_pose(&input.pose)?;
        for event in &input.events {
            self.handle_event(&input.pose, event)?;
        }
        self.try_update(&input.pose, input.alive_opponents)
    }

    fn observe_pose(&mut self, pose: &SelfPose) -> Result<()> {
        if !pose.is_finite() {
            return Err(TacticsError::NonFinitePose { tick: pose.time });
        }
        self.now = pose.time;
        self.trackers
            .get_mut(self.self_id)
            .ok_or(TacticsError::UnknownTracker(self.self_id.0))?
            .observe_self(pose)
    }

    /// Route one engine event.
    ///
    /// # Errors
    ///
    /// Fails only on invariant violations inside the tracker table.
    pub fn handle_event(&mut self, pose: &SelfPose, event: &ArenaEvent) -> Result<()> {
        match event {
            ArenaEvent::Scanned(scan) => self.on_scan(pose, scan),
            ArenaEvent::Destroyed { name } => {
                self.on_destroyed(name);
                Ok(())
            }
            ArenaEvent::WallCollision { bearing } => {
                tracing::debug!(tick = self.now, bearing, "Wall collision");
                self.motion.on_wall_collision();
                Ok(())
            }
            ArenaEvent::HitByProjectile { shooter, power } => {
                if shooter == &self.self_name {
                    return Ok(());
                }
                let id = self.resolve_or_create(shooter)?;
                if let Some(tracker) = self.trackers.get_mut(id) {
                    tracker.credit_energy(3.0 * power);
                }
                Ok(())
            }
            ArenaEvent::ProjectileHit {
                victim,
                victim_energy,
            } => {
                if victim == &self.self_name {
                    return Ok(());
                }
                let id = self.resolve_or_create(victim)?;
                if let Some(tracker) = self.trackers.get_mut(id) {
                    tracker.reset_energy(*victim_energy);
                }
                Ok(())
            }
            ArenaEvent::ProjectileMissed => Ok(()),
            ArenaEvent::RoundStarted { round } => self.start_round(*round, pose),
            ArenaEvent::RoundEnded { round } => {
                tracing::debug!(round, tick = self.now, "Round ended");
                Ok(())
            }
            ArenaEvent::BattleEnded => {
                tracing::info!(
                    rounds = self.round + 1,
                    waves = self.stats.waves_detected,
                    shots = self.stats.shots_fired,
                    degraded = self.stats.degraded_ticks,
                    "Battle ended"
                );
                Ok(())
            }
            ArenaEvent::Unrecognized(kind) => {
                tracing::trace!(kind = %kind, "Ignoring unrecognised event");
                Ok(())
            }
        }
    }

    fn on_scan(&mut self, pose: &SelfPose, scan: &ScanEvent) -> Result<()> {
        if scan.name == self.self_name {
            tracing::warn!(tick = self.now, "Scan names ourselves, ignoring");
            return Ok(());
        }
        if !(scan.bearing.is_finite() && scan.distance.is_finite() && scan.energy.is_finite()) {
            tracing::warn!(opponent = %scan.name, "Malformed scan, ignoring");
            return Ok(());
        }
        let id = self.resolve_or_create(&scan.name)?;
        let victims: Vec<Vec2> = self
            .trackers
            .iter()
            .filter(|t| t.id() != id)
            .filter_map(OpponentTracker::last_position)
            .collect();
        let tracker = self
            .trackers
            .get_mut(id)
            .ok_or(TacticsError::UnknownTracker(id.0))?;
        if tracker
            .observe(scan, pose, &victims, &self.config.wave)?
            .is_some()
        {
            self.stats.waves_detected += 1;
        }
        Ok(())
    }

    fn resolve_or_create(&mut self, name: &str) -> Result<TrackerId> {
        if let Some(id) = self.trackers.id_of(name) {
            return Ok(id);
        }
        let weapon = match self.learned.remove(name) {
            Some(model) => WeaponController::with_model(model),
            None => WeaponController::new(&self.config.weapon, self.config.physics.max_robot_speed),
        };
        let tracker =
            OpponentTracker::opponent(self.trackers.next_id(), name, weapon, &self.config);
        let id = self.trackers.insert(tracker)?;
        tracing::debug!(opponent = %name, id = %id, "Tracking new opponent");
        Ok(id)
    }

    fn on_destroyed(&mut self, name: &str) {
        if name == self.self_name {
            tracing::debug!(tick = self.now, "We were destroyed");
            return;
        }
        let Some(id) = self.trackers.id_of(name) else {
            return;
        };
        if let Some(mut tracker) = self.trackers.remove(id) {
            self.orphan_waves.extend(tracker.take_waves());
            if let Some(weapon) = tracker.take_weapon() {
                self.learned.insert(name.to_string(), weapon.into_model());
            }
            self.stats.opponents_destroyed += 1;
        }
        if self.target == Some(id) {
            self.target = None;
        }
        tracing::debug!(opponent = %name, tick = self.now, "Opponent destroyed");
    }

    fn start_round(&mut self, round: u32, pose: &SelfPose) -> Result<()> {
        for tracker in self.trackers.iter_mut() {
            if let Some(weapon) = tracker.take_weapon() {
                self.learned
                    .insert(tracker.name().to_string(), weapon.into_model());
            }
        }
        self.trackers.clear();
        self.self_id = self.trackers.insert(OpponentTracker::self_model(
            self.trackers.next_id(),
            &self.self_name,
            &self.config,
        ))?;
        self.orphan_waves.clear();
        self.target = None;
        self.least_contested = None;
        self.oldest_observation_age = None;
        self.motion = MotionPlanner::new(self.bounds, &self.config.motion);
        self.radar = RadarController::new();
        self.round = round;
        tracing::debug!(round, learned = self.learned.len(), "Round started");
        self.observe_pose(pose)
    }

    /// Fallible per-tick systems.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-finite pose or a broken tracker table.
    pub fn try_update(&mut self, pose: &SelfPose, alive_opponents: usize) -> Result<Commands> {
        if !pose.is_finite() {
            return Err(TacticsError::NonFinitePose { tick: pose.time });
        }
        self.now = pose.time;
        self.oldest_observation_age = self.compute_oldest_age();

        // 1. Radar
        let positions: Vec<Vec2> = self
            .opponent_iter()
            .filter_map(OpponentTracker::last_position)
            .collect();
        let radar_turn = self.radar.sweep(
            &RadarContext {
                pose,
                tracked: positions.len(),
                alive: alive_opponents,
                oldest_age: self.oldest_observation_age,
                positions: &positions,
            },
            &self.config.radar,
        );

        // 2. Advance obstacles, scoring shots against every opponent
        let ctx = UpdateContext {
            now: self.now,
            self_position: pose.position,
            self_radius: self.config.physics.robot_radius,
        };
        for tracker in self.trackers.iter_mut() {
            tracker.update(&ctx);
            tracker.resolve_shots(ctx.now);
        }
        self.orphan_waves.retain_mut(|wave| {
            wave.update(&ctx);
            !wave.has_passed(ctx.self_position, ctx.self_radius)
        });

        // 3. Least-contested point
        self.least_contested = self.compute_least_contested(&positions);

        // 4. Motion
        let region = self.safe_region(0);
        let threats: Vec<WaveThreat> = self
            .waves()
            .into_iter()
            .map(|w| WaveThreat {
                origin: w.origin(),
                radius: w.radius(),
            })
            .collect();
        let movement = self.motion.plan(&MotionContext {
            pose,
            region: &region,
            waves: &threats,
            least_contested: self.least_contested,
        });

        // 5. Target selection
        self.select_target(pose.position);

        // 6. Weapon
        let mut commands = Commands {
            body_turn: movement.turn,
            travel: movement.travel,
            radar_turn,
            gun_turn: 0.0,
            fire: None,
        };
        if let Some(id) = self.target {
            let tracker = self
                .trackers
                .get_mut(id)
                .ok_or(TacticsError::UnknownTracker(id.0))?;
            if let Some(aim) = tracker.engage(pose, &self.config) {
                commands.gun_turn = aim.gun_turn;
                commands.fire = aim.fire;
                if aim.fire.is_some() {
                    self.stats.shots_fired += 1;
                }
            }
        }

        tracing::trace!(
            tick = self.now,
            turn = commands.body_turn,
            travel = commands.travel,
            radar = commands.radar_turn,
            gun = commands.gun_turn,
            fire = ?commands.fire,
            "Commands"
        );
        Ok(commands)
    }

    fn compute_oldest_age(&self) -> Option<Tick> {
        self.opponent_iter()
            .filter_map(|t| t.ticks_since_seen(self.now))
            .max()
    }

    fn compute_least_contested(&self, opponents: &[Vec2]) -> Option<Vec2> {
        if opponents.is_empty() {
            return None;
        }
        let interior = self.bounds.shrink(self.config.arena.wall_exclusion);
        let cells = self.config.arena.grid_size;
        let cell_w = interior.width() / cells as f64;
        let cell_h = interior.height() / cells as f64;

        let mut best: Option<(f64, Vec2)> = None;
        for i in 0..cells {
            for j in 0..cells {
                let point = Vec2::new(
                    interior.min.x + (i as f64 + 0.5) * cell_w,
                    interior.min.y + (j as f64 + 0.5) * cell_h,
                );
                let nearest = opponents
                    .iter()
                    .map(|&o| o.distance_squared(point))
                    .fold(f64::INFINITY, f64::min);
                if best.map_or(true, |(d, _)| nearest > d) {
                    best = Some((nearest, point));
                }
            }
        }
        best.map(|(_, point)| point)
    }

    fn select_target(&mut self, from: Vec2) {
        let mut nearest: Option<(f64, TrackerId)> = None;
        for tracker in self.opponent_iter() {
            let Some(position) = tracker.last_position() else {
                continue;
            };
            let d = from.distance_squared(position);
            if nearest.map_or(true, |(best, _)| d < best) {
                nearest = Some((d, tracker.id()));
            }
        }
        let next = nearest.map(|(_, id)| id);
        if next != self.target {
            tracing::debug!(
                tick = self.now,
                opponent = ?next.and_then(|id| self.trackers.get(id)).map(OpponentTracker::name),
                "Target changed"
            );
            self.target = next;
        }
    }

    fn opponent_iter(&self) -> impl Iterator<Item = &OpponentTracker> {
        self.trackers.iter().filter(|t| !t.is_self())
    }

    /// Arena rectangle minus the wall margin and every obstacle footprint
    /// `ticks_ahead` ticks from now. The self-model is never subtracted.
    #[must_use]
    pub fn safe_region(&self, ticks_ahead: u32) -> SafeRegion {
        let mut region = SafeRegion::new(self.bounds.shrink(self.config.arena.wall_exclusion));
        for obstacle in self.obstacles() {
            if obstacle.kind() == ObstacleKind::SelfModel {
                continue;
            }
            let footprint = obstacle.as_obstacle().footprint(ticks_ahead);
            if footprint.is_substantial() {
                region.subtract(&footprint);
            }
        }
        region
    }

    /// Every obstacle: trackers in creation order, each followed by its
    /// waves, then waves whose shooter is gone.
    #[must_use]
    pub fn obstacles(&self) -> Vec<ObstacleRef<'_>> {
        let mut out = Vec::new();
        for tracker in self.trackers.iter() {
            out.push(ObstacleRef::Tracker(tracker));
            out.extend(tracker.waves().iter().map(ObstacleRef::Wave));
        }
        out.extend(self.orphan_waves.iter().map(ObstacleRef::Wave));
        out
    }

    /// Every live wave, in obstacle order.
    #[must_use]
    pub fn waves(&self) -> Vec<&DangerWave> {
        self.trackers
            .iter()
            .flat_map(|t| t.waves().iter())
            .chain(self.orphan_waves.iter())
            .collect()
    }

    /// Opponent trackers, excluding ourselves.
    #[must_use]
    pub fn opponents(&self) -> Vec<&OpponentTracker> {
        self.opponent_iter().collect()
    }

    /// Tracker by name, including the self-model.
    #[must_use]
    pub fn tracker(&self, name: &str) -> Option<&OpponentTracker> {
        self.trackers.id_of(name).and_then(|id| self.trackers.get(id))
    }

    /// Our own tracker.
    #[must_use]
    pub fn self_tracker(&self) -> Option<&OpponentTracker> {
        self.trackers.get(self.self_id)
    }

    /// Currently selected target.
    #[must_use]
    pub fn target(&self) -> Option<&OpponentTracker> {
        self.target.and_then(|id| self.trackers.get(id))
    }

    /// Least-contested point from the last update.
    #[must_use]
    pub fn least_contested_point(&self) -> Option<Vec2> {
        self.least_contested
    }

    /// Age of the stalest opponent observation at the last update.
    #[must_use]
    pub fn oldest_observation_age(&self) -> Option<Tick> {
        self.oldest_observation_age
    }

    /// Motion planner state.
    #[must_use]
    pub fn motion_state(&self) -> MotionState {
        self.motion.state()
    }

    /// Radar state.
    #[must_use]
    pub fn radar_mode(&self) -> RadarMode {
        self.radar.mode()
    }

    /// Learned GuessFactor model for an opponent no longer tracked.
    #[must_use]
    pub fn learned_model(&self, name: &str) -> Option<&GuessFactorModel> {
        self.learned.get(name)
    }

    /// Running counters.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        self.stats
    }

    /// Arena rectangle.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &TacticsConfig {
        &self.config
    }

    /// Tick of the last processed pose.
    #[must_use]
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Current round.
    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Hash of the tactical state, equal for equal inputs.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.now.hash(&mut hasher);
        self.round.hash(&mut hasher);

        self.trackers.len().hash(&mut hasher);
        for tracker in self.trackers.iter() {
            tracker.id().hash(&mut hasher);
            tracker.name().hash(&mut hasher);
            if let Some(p) = tracker.last_position() {
                p.x.to_bits().hash(&mut hasher);
                p.y.to_bits().hash(&mut hasher);
            }
            tracker.history().len().hash(&mut hasher);
            tracker.energy().map(f64::to_bits).hash(&mut hasher);
            tracker.predictor().label().hash(&mut hasher);
            if let Some(weapon) = tracker.weapon() {
                weapon.model().bins().hash(&mut hasher);
                weapon.shots_in_flight().hash(&mut hasher);
            }
        }

        for wave in self.waves() {
            wave.id().hash(&mut hasher);
            wave.source().hash(&mut hasher);
            wave.radius().to_bits().hash(&mut hasher);
            wave.sectors().len().hash(&mut hasher);
            for sector in wave.sectors() {
                sector.start.to_bits().hash(&mut hasher);
                sector.sweep.to_bits().hash(&mut hasher);
            }
        }

        self.target.hash(&mut hasher);
        if let Some(p) = self.least_contested {
            p.x.to_bits().hash(&mut hasher);
            p.y.to_bits().hash(&mut hasher);
        }
        self.motion.state().hash(&mut hasher);
        self.motion.direction().to_bits().hash(&mut hasher);
        self.radar.mode().hash(&mut hasher);
        self.radar.direction().to_bits().hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> ArenaModel {
        ArenaModel::new(800.0, 600.0, "me", TacticsConfig::default()).unwrap()
    }

    fn pose(time: Tick) -> SelfPose {
        SelfPose::at(Vec2::new(100.0, 100.0), time)
    }

    fn scan(name: &str, bearing: f64, distance: f64, energy: f64, time: Tick) -> ArenaEvent {
        ArenaEvent::Scanned(ScanEvent {
            name: name.to_string(),
            bearing,
            distance,
            energy,
            heading: 0.0,
            velocity: 0.0,
            time,
        })
    }

    fn tick(arena: &mut ArenaModel, time: Tick, events: Vec<ArenaEvent>) -> Commands {
        arena.tick(&TickInput {
            pose: pose(time),
            alive_opponents: 2,
            events,
        })
    }

    #[test]
    fn test_self_model_registered_and_excluded() {
        let mut a = arena();
        tick(&mut a, 1, Vec::new());
        assert!(a.self_tracker().is_some());
        assert!(a.opponents().is_empty());
        assert!(a.target().is_none());
        assert_eq!(a.safe_region(0).holes().len(), 0);
    }

    #[test]
    fn test_scan_creates_tracker_and_selects_nearest_target() {
        let mut a = arena();
        tick(
            &mut a,
            1,
            vec![scan("far", 0.0, 400.0, 100.0, 1), scan("near", 1.0, 150.0, 100.0, 1)],
        );
        assert_eq!(a.opponents().len(), 2);
        assert_eq!(a.target().unwrap().name(), "near");
        assert!(a.least_contested_point().is_some());
    }

    #[test]
    fn test_destroyed_opponent_leaves_waves_behind() {
        let mut a = arena();
        tick(&mut a, 40, vec![scan("a", 0.0, 300.0, 100.0, 40)]);
        tick(&mut a, 41, vec![scan("a", 0.0, 300.0, 98.0, 41)]);
        assert_eq!(a.waves().len(), 1);
        tick(
            &mut a,
            42,
            vec![ArenaEvent::Destroyed {
                name: "a".to_string(),
            }],
        );
        assert!(a.tracker("a").is_none());
        assert!(a.target().is_none());
        let waves = a.waves();
        assert_eq!(waves.len(), 1);
        assert!(waves[0].source().is_none());
        assert!(a.learned_model("a").is_some());
        assert_eq!(a.stats().opponents_destroyed, 1);
    }

    #[test]
    fn test_opponent_footprint_is_subtracted() {
        let mut a = arena();
        tick(&mut a, 1, vec![scan("a", 0.0, 300.0, 100.0, 1)]);
        let region = a.safe_region(0);
        assert!(!region.contains(Vec2::new(100.0, 400.0)));
        assert!(region.contains(Vec2::new(600.0, 300.0)));
        // ourselves never block the region
        assert!(region.contains(Vec2::new(100.0, 100.0)));
    }

    #[test]
    fn test_safe_region_resubtraction_is_idempotent() {
        let mut a = arena();
        tick(&mut a, 1, vec![scan("a", 0.5, 250.0, 100.0, 1)]);
        let region = a.safe_region(0);
        let mut again = region.clone();
        for obstacle in a.obstacles() {
            if obstacle.kind() != ObstacleKind::SelfModel {
                again.subtract(&obstacle.as_obstacle().footprint(0));
            }
        }
        assert_eq!(region, again);
    }

    #[test]
    fn test_round_start_keeps_learning_and_resets_state() {
        let mut a = arena();
        tick(&mut a, 1, vec![scan("a", 0.0, 200.0, 100.0, 1)]);
        tick(&mut a, 2, vec![ArenaEvent::RoundStarted { round: 1 }]);
        assert_eq!(a.round(), 1);
        assert!(a.opponents().is_empty());
        assert!(a.learned_model("a").is_some());
        assert!(a.self_tracker().unwrap().last_position().is_some());
        // the model is handed back when the opponent reappears
        tick(&mut a, 3, vec![scan("a", 0.0, 200.0, 100.0, 3)]);
        assert!(a.learned_model("a").is_none());
    }

    #[test]
    fn test_non_finite_pose_degrades_to_hold() {
        let mut a = arena();
        let mut bad = pose(5);
        bad.position.x = f64::NAN;
        let input = TickInput {
            pose: bad,
            alive_opponents: 1,
            events: Vec::new(),
        };
        assert!(matches!(
            a.try_tick(&input),
            Err(TacticsError::NonFinitePose { tick: 5 })
        ));
        #[cfg(not(feature = "debug-validation"))]
        {
            assert_eq!(a.tick(&input), Commands::hold());
            assert_eq!(a.stats().degraded_ticks, 1);
        }
    }

    #[test]
    fn test_hit_by_projectile_credits_shooter() {
        let mut a = arena();
        tick(&mut a, 40, vec![scan("a", 0.0, 300.0, 100.0, 40)]);
        tick(
            &mut a,
            41,
            vec![
                ArenaEvent::HitByProjectile {
                    shooter: "a".to_string(),
                    power: 2.0,
                },
                scan("a", 0.0, 300.0, 104.0, 41),
            ],
        );
        // fired 2, regained 6
        assert_eq!(a.waves().len(), 1);
    }

    #[test]
    fn test_projectile_hit_resets_victim_baseline() {
        let mut a = arena();
        tick(&mut a, 40, vec![scan("a", 0.0, 300.0, 100.0, 40)]);
        tick(
            &mut a,
            41,
            vec![
                ArenaEvent::ProjectileHit {
                    victim: "a".to_string(),
                    victim_energy: 98.0,
                },
                scan("a", 0.0, 300.0, 98.0, 41),
            ],
        );
        assert!(a.waves().is_empty());
    }

    #[test]
    fn test_unrecognized_event_is_ignored() {
        let mut a = arena();
        let input = TickInput {
            pose: pose(0),
            alive_opponents: 0,
            events: vec![ArenaEvent::Unrecognized("Skipped".to_string())],
        };
        assert!(a.try_tick(&input).is_ok());
        assert!(a.opponents().is_empty());
    }

    #[test]
    fn test_least_contested_prefers_far_corner() {
        let mut a = arena();
        // opponent near the bottom-left corner
        tick(&mut a, 1, vec![scan("a", 0.0, 10.0, 100.0, 1)]);
        let point = a.least_contested_point().unwrap();
        assert!(point.x > 700.0 && point.y > 500.0, "{point:?}");
    }
}
