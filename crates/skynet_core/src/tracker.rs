//! Opponent tracking: history, prediction, discharge detection.
//!
//! Every robot in the arena, ourselves included, gets an
//! [`OpponentTracker`]. Our own tracker is tagged [`TrackerRole::SelfModel`]
//! and exists so that waves fired by opponents can be aimed at us.

use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::config::{PhysicsConfig, TacticsConfig, TrackerConfig, WaveConfig};
use crate::engine::{ScanEvent, SelfPose};
use crate::error::{Result, TacticsError};
use crate::geometry::{Footprint, Shape};
use crate::math::{Tick, Vec2};
use crate::observation::Observation;
use crate::obstacle::{Obstacle, ObstacleKind, UpdateContext};
use crate::predictor::{GeometricPredictor, Predictor, Sample};
use crate::wave::{DangerWave, Discharge, WaveId};
use crate::weapon::{AimSolution, TargetView, WeaponController};

/// Stable handle to a tracker within one arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackerId(pub u32);

impl std::fmt::Display for TrackerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a tracker models an opponent or ourselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackerRole {
    /// A real opponent.
    Opponent,
    /// Our own robot, as seen by others.
    SelfModel,
}

/// Distance and absolute bearing from us at the last scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Polar {
    /// Distance from us.
    pub distance: f64,
    /// Absolute bearing from us.
    pub bearing: f64,
}

/// Everything known about one robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentTracker {
    id: TrackerId,
    name: String,
    role: TrackerRole,
    position: Option<Vec2>,
    polar: Option<Polar>,
    history: VecDeque<Observation>,
    last_energy: Option<f64>,
    last_shot: Option<(Tick, f64)>,
    waves: Vec<DangerWave>,
    next_wave: u32,
    weapon: Option<WeaponController>,
    predictor: GeometricPredictor,
    now: Tick,
    config: TrackerConfig,
    physics: PhysicsConfig,
}

impl OpponentTracker {
    /// Tracker for an opponent.
    #[must_use]
    pub fn opponent(
        id: TrackerId,
        name: &str,
        weapon: WeaponController,
        config: &TacticsConfig,
    ) -> Self {
        Self::build(id, name, TrackerRole::Opponent, Some(weapon), config)
    }

    /// Tracker modelling ourselves. It has no weapon and never detects
    /// discharges.
    #[must_use]
    pub fn self_model(id: TrackerId, name: &str, config: &TacticsConfig) -> Self {
        Self::build(id, name, TrackerRole::SelfModel, None, config)
    }

    fn build(
        id: TrackerId,
        name: &str,
        role: TrackerRole,
        weapon: Option<WeaponController>,
        config: &TacticsConfig,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            role,
            position: None,
            polar: None,
            history: VecDeque::with_capacity(config.tracker.history_window + 1),
            last_energy: None,
            last_shot: None,
            waves: Vec::new(),
            next_wave: 0,
            weapon,
            predictor: GeometricPredictor::Unavailable,
            now: 0,
            config: config.tracker.clone(),
            physics: config.physics.clone(),
        }
    }

    /// Record a scan of this opponent taken from `pose`.
    ///
    /// Discharge detection runs against the previous observation before the
    /// new one is appended. When a shot is inferred a [`DangerWave`] is
    /// created with one sector per merged cone towards `victims`, and a
    /// reference to it is returned.
    ///
    /// # Errors
    ///
    /// Returns [`TacticsError::IdentityMismatch`] if the scan names a
    /// different robot.
    pub fn observe(
        &mut self,
        scan: &ScanEvent,
        pose: &SelfPose,
        victims: &[Vec2],
        waves: &WaveConfig,
    ) -> Result<Option<&DangerWave>> {
        if scan.name != self.name {
            return Err(TacticsError::IdentityMismatch {
                tracker: self.name.clone(),
                observed: scan.name.clone(),
            });
        }
        self.now = self.now.max(scan.time);
        let observation = Observation::from_scan(scan, pose);
        self.polar = Some(Polar {
            distance: observation.distance(),
            bearing: observation.bearing(),
        });

        let discharge = self.detect_discharge(&observation);
        self.record(observation);

        let Some(discharge) = discharge else {
            return Ok(None);
        };
        let id = WaveId {
            source: self.id,
            seq: self.next_wave,
        };
        self.next_wave += 1;
        let wave = DangerWave::new(id, &discharge, victims, &self.physics, waves);
        tracing::debug!(
            opponent = %self.name,
            power = discharge.power,
            speed = wave.speed(),
            staleness = discharge.staleness,
            sectors = wave.sectors().len(),
            "Discharge detected"
        );
        self.waves.push(wave);
        Ok(self.waves.last())
    }

    /// Record our own pose on the self-model.
    ///
    /// # Errors
    ///
    /// Returns [`TacticsError::InvariantViolation`] when called on an
    /// opponent tracker.
    pub fn observe_self(&mut self, pose: &SelfPose) -> Result<()> {
        if self.role != TrackerRole::SelfModel {
            return Err(TacticsError::InvariantViolation(format!(
                "self pose routed to opponent tracker '{}'",
                self.name
            )));
        }
        self.now = self.now.max(pose.time);
        self.last_energy = Some(pose.energy);
        self.record(Observation::of_self(&self.name, pose));
        Ok(())
    }

    fn record(&mut self, observation: Observation) {
        self.position = Some(observation.position());
        let observation = match self.role {
            TrackerRole::Opponent => {
                let window = self.config.history_window;
                let keep = self.history.len().min(window.saturating_sub(1));
                let samples: Vec<Sample> = self
                    .history
                    .iter()
                    .skip(self.history.len() - keep)
                    .map(Observation::sample)
                    .chain(std::iter::once(observation.sample()))
                    .collect();
                self.predictor = GeometricPredictor::select(&samples);
                observation.with_predictor(self.predictor.clone())
            }
            TrackerRole::SelfModel => observation,
        };
        self.history.push_back(observation);
        while self.history.len() > self.config.history_window {
            self.history.pop_front();
        }
    }

    fn detect_discharge(&mut self, observation: &Observation) -> Option<Discharge> {
        let energy = observation.energy();
        let time = observation.time();
        let previous = self.last_energy.replace(energy)?;
        let drop = previous - energy;

        let low = self.physics.min_fire_power - self.config.energy_tolerance;
        let high = self.physics.max_fire_power + self.config.energy_tolerance;
        if !(drop > low && drop < high) {
            return None;
        }
        let heat = self.gun_heat(time);
        if heat >= self.config.gun_heat_epsilon {
            tracing::trace!(opponent = %self.name, drop, heat, "Energy drop while gun hot");
            return None;
        }

        let last_seen = self.history.back().map_or(time, Observation::time);
        self.last_shot = Some((time, drop));
        Some(Discharge {
            origin: observation.position(),
            time,
            power: drop,
            staleness: time.saturating_sub(last_seen).saturating_sub(1),
        })
    }

    /// Modelled gun heat of this opponent at `time`.
    #[must_use]
    pub fn gun_heat(&self, time: Tick) -> f64 {
        let cooling = self.physics.gun_cooling_rate;
        match self.last_shot {
            None => (self.physics.initial_gun_heat - cooling * time as f64).max(0.0),
            Some((fired, power)) => {
                let elapsed = time.saturating_sub(fired) as f64;
                (TacticsConfig::gun_heat_for(power) - cooling * elapsed).max(0.0)
            }
        }
    }

    /// Add energy the opponent regained, so the next scan's drop is not
    /// understated.
    pub fn credit_energy(&mut self, amount: f64) {
        if let Some(energy) = self.last_energy.as_mut() {
            *energy += amount;
        }
    }

    /// Replace the energy baseline after damage we caused.
    pub fn reset_energy(&mut self, energy: f64) {
        self.last_energy = Some(energy);
    }

    /// Aim this tracker's weapon. Returns `None` for the self-model and for
    /// opponents never observed.
    pub fn engage(&mut self, pose: &SelfPose, config: &TacticsConfig) -> Option<AimSolution> {
        let elapsed = self.ticks_since_seen(pose.time).unwrap_or(0) as f64;
        let weapon = self.weapon.as_mut()?;
        let Some(position) = self.position else {
            weapon.clear();
            return None;
        };
        let target = TargetView {
            position,
            elapsed,
            predictor: &self.predictor,
        };
        Some(weapon.aim(target, pose, &config.weapon))
    }

    /// Score our shots that have reached this opponent by `now`, against
    /// its estimated position at `now`. Returns how many were scored.
    pub fn resolve_shots(&mut self, now: Tick) -> usize {
        let Ok(target) = self.predicted_position(now, 0) else {
            return 0;
        };
        self.weapon
            .as_mut()
            .map_or(0, |weapon| weapon.resolve_shots(target, now))
    }

    /// Predicted position `ticks_ahead` ticks after `now`, falling back to
    /// the last observed position.
    ///
    /// # Errors
    ///
    /// Returns [`TacticsError::PositionUnknown`] before the first observation.
    pub fn predicted_position(&self, now: Tick, ticks_ahead: u32) -> Result<Vec2> {
        let position = self.position_or_err()?;
        let last = self.history.back().map_or(now, Observation::time);
        let horizon = now.saturating_sub(last) + Tick::from(ticks_ahead);
        if horizon == 0 {
            return Ok(position);
        }
        Ok(self.predictor.predict(horizon as f64).unwrap_or(position))
    }

    /// Point a projectile fired from `origin` at `speed` should aim for.
    ///
    /// # Errors
    ///
    /// Returns [`TacticsError::NoPrediction`] while the history is too short.
    pub fn intercept(&self, speed: f64, origin: Vec2) -> Result<Vec2> {
        self.predictor
            .intercept(speed, origin)
            .ok_or_else(|| TacticsError::NoPrediction {
                name: self.name.clone(),
            })
    }

    fn position_or_err(&self) -> Result<Vec2> {
        self.position.ok_or_else(|| TacticsError::PositionUnknown {
            name: self.name.clone(),
        })
    }

    /// Move every wave out of this tracker, detaching them from it.
    pub fn take_waves(&mut self) -> Vec<DangerWave> {
        let mut waves = std::mem::take(&mut self.waves);
        for wave in &mut waves {
            wave.orphan();
        }
        waves
    }

    /// Take the weapon's learned statistics, leaving a tracker without a
    /// weapon.
    pub fn take_weapon(&mut self) -> Option<WeaponController> {
        self.weapon.take()
    }

    /// Handle.
    #[must_use]
    pub fn id(&self) -> TrackerId {
        self.id
    }

    /// Robot name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Role tag.
    #[must_use]
    pub fn role(&self) -> TrackerRole {
        self.role
    }

    /// True for the self-model.
    #[must_use]
    pub fn is_self(&self) -> bool {
        self.role == TrackerRole::SelfModel
    }

    /// Last known position, if observed.
    #[must_use]
    pub fn last_position(&self) -> Option<Vec2> {
        self.position
    }

    /// Offset from us at the last scan.
    #[must_use]
    pub fn polar(&self) -> Option<Polar> {
        self.polar
    }

    /// Observations, oldest first.
    #[must_use]
    pub fn history(&self) -> &VecDeque<Observation> {
        &self.history
    }

    /// Newest observation.
    #[must_use]
    pub fn latest(&self) -> Option<&Observation> {
        self.history.back()
    }

    /// Energy baseline used for discharge detection.
    #[must_use]
    pub fn energy(&self) -> Option<f64> {
        self.last_energy
    }

    /// Active geometric predictor.
    #[must_use]
    pub fn predictor(&self) -> &GeometricPredictor {
        &self.predictor
    }

    /// Waves attributed to this tracker.
    #[must_use]
    pub fn waves(&self) -> &[DangerWave] {
        &self.waves
    }

    /// Dedicated weapon, absent for the self-model.
    #[must_use]
    pub fn weapon(&self) -> Option<&WeaponController> {
        self.weapon.as_ref()
    }
}

impl Obstacle for OpponentTracker {
    fn kind(&self) -> ObstacleKind {
        match self.role {
            TrackerRole::Opponent => ObstacleKind::Opponent,
            TrackerRole::SelfModel => ObstacleKind::SelfModel,
        }
    }

    /// Advance waves and drop those whose front has passed us.
    fn update(&mut self, ctx: &UpdateContext) {
        self.now = self.now.max(ctx.now);
        let name = &self.name;
        self.waves.retain_mut(|wave| {
            wave.advance(ctx.now);
            let passed = wave.has_passed(ctx.self_position, ctx.self_radius);
            if passed {
                tracing::trace!(opponent = %name, wave = wave.id().seq, "Wave passed");
            }
            !passed
        });
    }

    fn position(&self) -> Result<Vec2> {
        self.position_or_err()
    }

    fn footprint(&self, ticks_ahead: u32) -> Footprint {
        let Some(last) = self.history.back() else {
            return Footprint::empty();
        };
        let radius = match self.role {
            TrackerRole::Opponent => self.config.footprint_radius,
            TrackerRole::SelfModel => self.physics.robot_radius,
        };
        let centre = self
            .predicted_position(self.now, ticks_ahead)
            .unwrap_or_else(|_| last.position());
        Footprint::single(Shape::Circle { centre, radius })
    }

    fn ticks_since_seen(&self, now: Tick) -> Option<Tick> {
        self.history
            .back()
            .map(|obs| now.saturating_sub(obs.time()))
    }
}

/// Trackers keyed by handle, iterated in creation order.
#[derive(Debug, Clone)]
pub struct TrackerStorage {
    trackers: BTreeMap<TrackerId, OpponentTracker>,
    by_name: HashMap<String, TrackerId>,
    next_id: u32,
}

impl TrackerStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            trackers: BTreeMap::new(),
            by_name: HashMap::new(),
            next_id: 1,
        }
    }

    /// Handle the next inserted tracker will get.
    #[must_use]
    pub fn next_id(&self) -> TrackerId {
        TrackerId(self.next_id)
    }

    /// Insert a tracker built for [`next_id`](Self::next_id).
    ///
    /// # Errors
    ///
    /// Returns [`TacticsError::InvariantViolation`] if the tracker was built
    /// for another handle or its name is already tracked.
    pub fn insert(&mut self, tracker: OpponentTracker) -> Result<TrackerId> {
        let id = tracker.id();
        if id.0 != self.next_id {
            return Err(TacticsError::InvariantViolation(format!(
                "tracker {id} inserted, expected #{}",
                self.next_id
            )));
        }
        if self.by_name.contains_key(tracker.name()) {
            return Err(TacticsError::InvariantViolation(format!(
                "'{}' is already tracked",
                tracker.name()
            )));
        }
        self.next_id += 1;
        self.by_name.insert(tracker.name().to_string(), id);
        self.trackers.insert(id, tracker);
        Ok(id)
    }

    /// Remove a tracker by handle.
    pub fn remove(&mut self, id: TrackerId) -> Option<OpponentTracker> {
        let tracker = self.trackers.remove(&id)?;
        self.by_name.remove(tracker.name());
        Some(tracker)
    }

    /// Get a tracker by handle.
    #[must_use]
    pub fn get(&self, id: TrackerId) -> Option<&OpponentTracker> {
        self.trackers.get(&id)
    }

    /// Get a mutable tracker by handle.
    pub fn get_mut(&mut self, id: TrackerId) -> Option<&mut OpponentTracker> {
        self.trackers.get_mut(&id)
    }

    /// Resolve a name to a handle.
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<TrackerId> {
        self.by_name.get(name).copied()
    }

    /// Number of trackers, self-model included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    /// True when nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    /// Trackers in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &OpponentTracker> {
        self.trackers.values()
    }

    /// Mutable trackers in creation order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut OpponentTracker> {
        self.trackers.values_mut()
    }

    /// Drop every tracker.
    pub fn clear(&mut self) {
        self.trackers.clear();
        self.by_name.clear();
    }
}

impl Default for TrackerStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TacticsConfig {
        TacticsConfig::default()
    }

    fn tracker(name: &str) -> OpponentTracker {
        let cfg = config();
        OpponentTracker::opponent(
            TrackerId(2),
            name,
            WeaponController::new(&cfg.weapon, cfg.physics.max_robot_speed),
            &cfg,
        )
    }

    fn scan(name: &str, energy: f64, time: Tick) -> ScanEvent {
        ScanEvent {
            name: name.to_string(),
            bearing: 0.0,
            distance: 200.0,
            energy,
            heading: 0.0,
            velocity: 0.0,
            time,
        }
    }

    fn pose(time: Tick) -> SelfPose {
        SelfPose::at(Vec2::new(100.0, 100.0), time)
    }

    #[test]
    fn test_position_unknown_before_first_scan() {
        let t = tracker("a");
        assert!(matches!(
            t.position(),
            Err(TacticsError::PositionUnknown { .. })
        ));
        assert!(t.ticks_since_seen(10).is_none());
        assert!(t.footprint(0).is_empty());
    }

    #[test]
    fn test_rejects_foreign_scan() {
        let mut t = tracker("a");
        let cfg = config();
        let err = t
            .observe(&scan("b", 100.0, 1), &pose(1), &[], &cfg.wave)
            .unwrap_err();
        assert!(matches!(err, TacticsError::IdentityMismatch { .. }));
        assert!(t.history().is_empty());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut t = tracker("a");
        let cfg = config();
        for time in 0..25 {
            t.observe(&scan("a", 100.0, time), &pose(time), &[], &cfg.wave)
                .unwrap();
        }
        assert_eq!(t.history().len(), cfg.tracker.history_window);
        assert_eq!(t.history().front().unwrap().time(), 15);
        assert!(matches!(t.predictor(), GeometricPredictor::Quadratic(_)));
        // the newest observation carries the predictor snapshot
        assert_eq!(t.latest().unwrap().predictor(), t.predictor());
    }

    #[test]
    fn test_discharge_creates_wave() {
        let mut t = tracker("a");
        let cfg = config();
        t.observe(&scan("a", 100.0, 40), &pose(40), &[], &cfg.wave)
            .unwrap();
        let victims = [Vec2::new(100.0, 100.0)];
        let wave = t
            .observe(&scan("a", 97.0, 41), &pose(41), &victims, &cfg.wave)
            .unwrap()
            .cloned()
            .unwrap();
        assert!((wave.speed() - 11.0).abs() < 1e-9);
        assert_eq!(wave.staleness(), 0);
        assert_eq!(wave.sectors().len(), 1);
        assert_eq!(t.waves().len(), 1);
    }

    #[test]
    fn test_no_discharge_on_first_scan_or_hot_gun() {
        let mut t = tracker("a");
        let cfg = config();
        // first scan only sets the baseline
        assert!(t
            .observe(&scan("a", 97.0, 5), &pose(5), &[], &cfg.wave)
            .unwrap()
            .is_none());
        // gun still hot from the start of the round
        assert!(t
            .observe(&scan("a", 95.0, 6), &pose(6), &[], &cfg.wave)
            .unwrap()
            .is_none());
        assert!(t.waves().is_empty());
    }

    #[test]
    fn test_drop_outside_band_ignored() {
        let mut t = tracker("a");
        let cfg = config();
        t.observe(&scan("a", 100.0, 40), &pose(40), &[], &cfg.wave)
            .unwrap();
        assert!(t
            .observe(&scan("a", 96.0, 41), &pose(41), &[], &cfg.wave)
            .unwrap()
            .is_none());
        assert!(t
            .observe(&scan("a", 95.95, 42), &pose(42), &[], &cfg.wave)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_gun_heat_after_inferred_shot() {
        let mut t = tracker("a");
        let cfg = config();
        assert!((t.gun_heat(10) - 2.0).abs() < 1e-9);
        t.observe(&scan("a", 100.0, 40), &pose(40), &[], &cfg.wave)
            .unwrap();
        t.observe(&scan("a", 98.0, 41), &pose(41), &[], &cfg.wave)
            .unwrap();
        // 1 + 2/5 = 1.4 at tick 41
        assert!((t.gun_heat(41) - 1.4).abs() < 1e-9);
        assert!((t.gun_heat(46) - 0.9).abs() < 1e-9);
        assert_eq!(t.gun_heat(60), 0.0);
    }

    #[test]
    fn test_stale_discharge_is_compensated() {
        let mut t = tracker("a");
        let cfg = config();
        t.observe(&scan("a", 100.0, 40), &pose(40), &[], &cfg.wave)
            .unwrap();
        let wave = t
            .observe(&scan("a", 99.0, 44), &pose(44), &[], &cfg.wave)
            .unwrap()
            .unwrap();
        assert_eq!(wave.staleness(), 3);
    }

    #[test]
    fn test_energy_credit_hides_hit_regain() {
        let mut t = tracker("a");
        let cfg = config();
        t.observe(&scan("a", 100.0, 40), &pose(40), &[], &cfg.wave)
            .unwrap();
        // shot of power 2 that then hits us: -2 + 6
        t.credit_energy(6.0);
        let wave = t
            .observe(&scan("a", 104.0, 41), &pose(41), &[], &cfg.wave)
            .unwrap();
        assert!(wave.is_some());
    }

    #[test]
    fn test_waves_removed_once_passed() {
        let mut t = tracker("a");
        let cfg = config();
        t.observe(&scan("a", 100.0, 40), &pose(40), &[], &cfg.wave)
            .unwrap();
        t.observe(&scan("a", 97.0, 41), &pose(41), &[], &cfg.wave)
            .unwrap();
        let me = Vec2::new(100.0, 100.0);
        let mut ctx = UpdateContext {
            now: 41,
            self_position: me,
            self_radius: 18.0,
        };
        t.update(&ctx);
        assert_eq!(t.waves().len(), 1);
        // 200 units at 11 per tick; gone once radius + 18 exceeds 200
        ctx.now = 56;
        t.update(&ctx);
        assert_eq!(t.waves().len(), 1);
        ctx.now = 57;
        t.update(&ctx);
        assert!(t.waves().is_empty());
    }

    #[test]
    fn test_storage_iterates_in_creation_order() {
        let cfg = config();
        let mut storage = TrackerStorage::new();
        for name in ["zeta", "alpha", "mid"] {
            let id = storage.next_id();
            let tracker = OpponentTracker::self_model(id, name, &cfg);
            storage.insert(tracker).unwrap();
        }
        let names: Vec<&str> = storage.iter().map(OpponentTracker::name).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
        let alpha = storage.id_of("alpha").unwrap();
        assert!(storage.remove(alpha).is_some());
        assert!(storage.id_of("alpha").is_none());
        assert_eq!(storage.len(), 2);
        let ids: Vec<TrackerId> = storage.iter_mut().map(|t| t.id()).collect();
        assert_eq!(ids, [TrackerId(1), TrackerId(3)]);
    }

    fn advancing_scan(time: Tick) -> ScanEvent {
        // due north of (100, 100), receding 8 units per tick from tick 40
        ScanEvent {
            distance: 200.0 + 8.0 * (time - 40) as f64,
            ..scan("a", 100.0, time)
        }
    }

    #[test]
    fn test_footprint_projects_from_current_tick() {
        let mut t = tracker("a");
        let cfg = config();
        for time in 40..43 {
            t.observe(&advancing_scan(time), &pose(time), &[], &cfg.wave)
                .unwrap();
        }
        let centre = |t: &OpponentTracker, ticks| match t.footprint(ticks).shapes()[0] {
            Shape::Circle { centre, .. } => centre,
            ref other => panic!("unexpected shape {other:?}"),
        };
        // last seen at (100, 316) on tick 42
        assert!(centre(&t, 0).distance(Vec2::new(100.0, 316.0)) < 1e-6);

        t.update(&UpdateContext {
            now: 45,
            self_position: Vec2::new(100.0, 100.0),
            self_radius: 18.0,
        });
        assert!(centre(&t, 0).distance(Vec2::new(100.0, 340.0)) < 1e-6);
        assert!(centre(&t, 2).distance(Vec2::new(100.0, 356.0)) < 1e-6);
    }

    #[test]
    fn test_resolve_shots_scores_against_estimated_position() {
        let mut t = tracker("a");
        let cfg = config();
        for time in 40..43 {
            t.observe(&advancing_scan(time), &pose(time), &[], &cfg.wave)
                .unwrap();
        }
        let solution = t.engage(&pose(42), &cfg).unwrap();
        assert!(solution.fire.is_some());
        assert_eq!(t.resolve_shots(42), 0);
        assert_eq!(t.weapon().unwrap().shots_in_flight(), 1);

        // never scanned again: the estimate keeps receding, so the shot lands
        // once 15.5 per tick catches up with 216 + 8 per tick
        assert_eq!(t.resolve_shots(70), 0);
        assert_eq!(t.resolve_shots(71), 1);
        assert_eq!(t.weapon().unwrap().model().total_results(), 1);
    }

    #[test]
    fn test_storage_rejects_duplicate_names() {
        let cfg = config();
        let mut storage = TrackerStorage::new();
        let first = OpponentTracker::self_model(storage.next_id(), "a", &cfg);
        storage.insert(first).unwrap();
        let dup = OpponentTracker::self_model(storage.next_id(), "a", &cfg);
        assert!(storage.insert(dup).is_err());
    }
}
