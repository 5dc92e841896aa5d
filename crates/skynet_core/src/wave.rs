//! Danger waves: the expanding front of a projectile we believe was fired.
//!
//! A wave is a circle centred where the shooter stood, growing by the
//! projectile speed every tick. Only the angular slices that point at a
//! potential victim are dangerous, so each wave carries a fixed list of
//! [`WaveSector`]s computed when it is created.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::config::{PhysicsConfig, WaveConfig};
use crate::error::Result;
use crate::geometry::{Footprint, Shape};
use crate::math::{normal_absolute_angle, Tick, Vec2};
use crate::obstacle::{Obstacle, ObstacleKind, UpdateContext};
use crate::tracker::TrackerId;

/// Identity of a wave: its source tracker and a per-tracker sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaveId {
    /// Tracker that detected the discharge.
    pub source: TrackerId,
    /// Sequence number within that tracker.
    pub seq: u32,
}

/// An angular slice of a wave, swept clockwise from `start`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveSector {
    /// Start bearing in `[0, 2π)`.
    pub start: f64,
    /// Clockwise sweep in `(0, 2π]`.
    pub sweep: f64,
    /// Wave this sector belongs to.
    pub wave: WaveId,
}

impl WaveSector {
    /// End bearing, possibly beyond `2π`.
    #[must_use]
    pub fn end(&self) -> f64 {
        self.start + self.sweep
    }
}

/// Where and when a discharge was inferred.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discharge {
    /// Position of the shooter at the observation that revealed the shot.
    pub origin: Vec2,
    /// Tick of that observation.
    pub time: Tick,
    /// Inferred firing power.
    pub power: f64,
    /// Ticks the shooter went unobserved before the revealing scan.
    pub staleness: Tick,
}

impl Discharge {
    /// Projectile speed under engine rules.
    #[must_use]
    pub fn speed(&self) -> f64 {
        crate::config::TacticsConfig::projectile_speed(self.power)
    }
}

/// Merge angular intervals `(start, end)` into the minimal covering set.
///
/// Starts are normalised to `[0, 2π)`, intervals are sorted by start, and
/// overlapping or touching intervals are joined, including across north.
/// The result is a list of `(start, sweep)` pairs sorted by start; a
/// single `(0, 2π)` covers everything.
#[must_use]
pub fn merge_intervals(intervals: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut spans: Vec<(f64, f64)> = intervals
        .iter()
        .filter(|(s, e)| e >= s)
        .map(|&(s, e)| {
            let start = normal_absolute_angle(s);
            (start, start + (e - s).min(TAU))
        })
        .collect();
    if spans.iter().any(|(s, e)| e - s >= TAU) {
        return vec![(0.0, TAU)];
    }
    spans.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut merged: Vec<(f64, f64)> = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }

    // only the last span can run past 2π; fold the front of the list into it
    if let Some(&(_, end)) = merged.last() {
        let mut wrapped_end = end;
        while merged.len() > 1 && merged[0].0 + TAU <= wrapped_end {
            let (_, first_end) = merged.remove(0);
            wrapped_end = wrapped_end.max(first_end + TAU);
        }
        if let Some(last) = merged.last_mut() {
            last.1 = wrapped_end;
        }
    }

    merged
        .into_iter()
        .map(|(s, e)| {
            let sweep = (e - s).min(TAU);
            if sweep >= TAU {
                (0.0, TAU)
            } else {
                (s, sweep)
            }
        })
        .collect()
}

/// An expanding projectile front with its dangerous sectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DangerWave {
    id: WaveId,
    source: Option<TrackerId>,
    origin: Vec2,
    created: Tick,
    speed: f64,
    power: f64,
    staleness: Tick,
    correction: f64,
    depth: f64,
    radius: f64,
    sectors: Vec<WaveSector>,
}

impl DangerWave {
    /// Build a wave for `discharge`, with one sector per merged victim cone.
    ///
    /// `victims` are the current positions of every robot other than the
    /// shooter that could be the intended target.
    #[must_use]
    pub fn new(
        id: WaveId,
        discharge: &Discharge,
        victims: &[Vec2],
        physics: &PhysicsConfig,
        config: &WaveConfig,
    ) -> Self {
        let speed = discharge.speed();
        let stale = discharge.staleness as f64;
        let correction = speed * stale + stale * config.staleness_margin;
        let depth = (config.base_depth + stale * config.depth_per_stale_tick).min(config.max_depth);

        let raw: Vec<(f64, f64)> = victims
            .iter()
            .filter_map(|&victim| {
                let distance = discharge.origin.distance(victim);
                if distance <= f64::EPSILON || speed <= 0.0 {
                    return None;
                }
                let bearing = discharge.origin.bearing_to(victim);
                let time_to_impact = distance / speed;
                let lateral = physics.max_robot_speed * time_to_impact;
                let half = (lateral / distance).atan();
                Some((bearing - half, bearing + half))
            })
            .collect();
        let sectors = merge_intervals(&raw)
            .into_iter()
            .map(|(start, sweep)| WaveSector {
                start,
                sweep,
                wave: id,
            })
            .collect();

        let mut wave = Self {
            id,
            source: Some(id.source),
            origin: discharge.origin,
            created: discharge.time,
            speed,
            power: discharge.power,
            staleness: discharge.staleness,
            correction,
            depth,
            radius: 0.0,
            sectors,
        };
        wave.radius = wave.radius_at(discharge.time);
        wave
    }

    fn radius_at(&self, now: Tick) -> f64 {
        let elapsed = now.saturating_sub(self.created) + 1;
        elapsed as f64 * self.speed + self.correction
    }

    /// Advance the front to `now`. The radius never shrinks.
    pub fn advance(&mut self, now: Tick) {
        self.radius = self.radius.max(self.radius_at(now));
    }

    /// True once the front has passed a robot of `robot_radius` at `position`.
    #[must_use]
    pub fn has_passed(&self, position: Vec2, robot_radius: f64) -> bool {
        self.origin.distance(position) < self.radius + robot_radius
    }

    /// Front radius `ticks_ahead` ticks from now.
    #[must_use]
    pub fn outer_radius(&self, ticks_ahead: u32) -> f64 {
        self.radius + self.speed * f64::from(ticks_ahead)
    }

    /// Stop attributing this wave to a tracker.
    pub fn orphan(&mut self) {
        self.source = None;
    }

    /// Wave identity.
    #[must_use]
    pub fn id(&self) -> WaveId {
        self.id
    }

    /// Tracker the wave is still attributed to, if any.
    #[must_use]
    pub fn source(&self) -> Option<TrackerId> {
        self.source
    }

    /// Centre of the wave.
    #[must_use]
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Tick at which the discharge was observed.
    #[must_use]
    pub fn created(&self) -> Tick {
        self.created
    }

    /// Projectile speed.
    #[must_use]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Inferred firing power.
    #[must_use]
    pub fn power(&self) -> f64 {
        self.power
    }

    /// Detection staleness in ticks.
    #[must_use]
    pub fn staleness(&self) -> Tick {
        self.staleness
    }

    /// Current front radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Band depth behind the front.
    #[must_use]
    pub fn depth(&self) -> f64 {
        self.depth
    }

    /// Dangerous sectors.
    #[must_use]
    pub fn sectors(&self) -> &[WaveSector] {
        &self.sectors
    }
}

impl Obstacle for DangerWave {
    fn kind(&self) -> ObstacleKind {
        ObstacleKind::Wave
    }

    fn update(&mut self, ctx: &UpdateContext) {
        self.advance(ctx.now);
    }

    fn position(&self) -> Result<Vec2> {
        Ok(self.origin)
    }

    fn footprint(&self, ticks_ahead: u32) -> Footprint {
        let outer = self.outer_radius(ticks_ahead);
        let inner = (outer - self.depth).max(0.0);
        let mut footprint = Footprint::empty();
        for sector in &self.sectors {
            footprint.push(Shape::AnnularSector {
                centre: self.origin,
                inner,
                outer,
                start: sector.start,
                sweep: sector.sweep,
            });
        }
        footprint
    }

    fn ticks_since_seen(&self, now: Tick) -> Option<Tick> {
        Some(now.saturating_sub(self.created))
    }
}
