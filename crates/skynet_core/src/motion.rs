//! Motion planning by ring sampling.
//!
//! Each tick the planner drops sample points on concentric rings around us
//! and keeps those inside the safe region. The chosen heading is a smooth
//! average of the best point on each ring, where "best" trades continuing
//! the current course, heading for the least-contested point, and moving
//! perpendicular to incoming waves.
//!
//! Three states:
//!
//! - `Cruising`: normal scored planning, or a stop when nothing threatens.
//! - `EmergencyEscape`: the innermost ring is fully blocked; sprint away
//!   from the nearest walls.
//! - `WallRecovery`: entered on a wall collision; a scripted drive towards
//!   the centre for a fixed number of ticks.

use std::f64::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

use crate::config::MotionConfig;
use crate::engine::SelfPose;
use crate::geometry::{Rect, SafeRegion};
use crate::math::{mean_heading, normal_absolute_angle, normal_relative_angle, Vec2};

/// Planner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MotionState {
    /// Normal planning.
    #[default]
    Cruising,
    /// No safe point close by; escaping at full speed.
    EmergencyEscape,
    /// Backing off a wall.
    WallRecovery {
        /// Ticks left in recovery.
        ticks_remaining: u32,
    },
}

/// Body command produced by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionCommand {
    /// Body turn, radians.
    pub turn: f64,
    /// Signed travel distance.
    pub travel: f64,
}

impl MotionCommand {
    /// Zero turn, zero travel.
    #[must_use]
    pub fn stop() -> Self {
        Self::default()
    }

    /// Heading the robot will actually travel along after the turn.
    #[must_use]
    pub fn travel_heading(&self, heading: f64) -> f64 {
        let facing = heading + self.turn;
        if self.travel < 0.0 {
            normal_absolute_angle(facing + PI)
        } else {
            normal_absolute_angle(facing)
        }
    }
}

/// A wave as the planner sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveThreat {
    /// Wave centre.
    pub origin: Vec2,
    /// Current front radius.
    pub radius: f64,
}

/// Inputs for one planning pass.
#[derive(Debug, Clone, Copy)]
pub struct MotionContext<'a> {
    /// Our pose.
    pub pose: &'a SelfPose,
    /// Safe region at the current tick.
    pub region: &'a SafeRegion,
    /// Active waves.
    pub waves: &'a [WaveThreat],
    /// Least-contested point, if one was found.
    pub least_contested: Option<Vec2>,
}

/// Ring-sampling motion planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionPlanner {
    state: MotionState,
    direction: f64,
    arena: Rect,
    ring_radii: Vec<f64>,
    ring_weights: Vec<f64>,
    config: MotionConfig,
    last_bearing: Option<f64>,
}

impl MotionPlanner {
    /// Planner for an arena of the given bounds.
    #[must_use]
    pub fn new(arena: Rect, config: &MotionConfig) -> Self {
        let diagonal = Vec2::new(arena.width(), arena.height()).length();
        let outer = (diagonal * config.outer_ring_fraction).max(config.min_ring_radius);
        let rings = config.rings.max(1);
        let ring_radii = (0..rings)
            .map(|i| {
                if rings == 1 {
                    config.min_ring_radius
                } else {
                    config.min_ring_radius
                        + i as f64 * (outer - config.min_ring_radius) / (rings - 1) as f64
                }
            })
            .collect();
        let fallback = config.ring_weights.last().copied().unwrap_or(1.0);
        let ring_weights = (0..rings)
            .map(|i| config.ring_weights.get(i).copied().unwrap_or(fallback))
            .collect();
        Self {
            state: MotionState::Cruising,
            direction: 1.0,
            arena,
            ring_radii,
            ring_weights,
            config: config.clone(),
            last_bearing: None,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> MotionState {
        self.state
    }

    /// Travel direction bias, `1.0` forward or `-1.0` reverse.
    #[must_use]
    pub fn direction(&self) -> f64 {
        self.direction
    }

    /// Ring radii, innermost first.
    #[must_use]
    pub fn ring_radii(&self) -> &[f64] {
        &self.ring_radii
    }

    /// Bearing chosen on the last planning pass.
    #[must_use]
    pub fn last_bearing(&self) -> Option<f64> {
        self.last_bearing
    }

    /// Start wall recovery and reverse the direction bias.
    pub fn on_wall_collision(&mut self) {
        self.direction = -self.direction;
        self.transition(MotionState::WallRecovery {
            ticks_remaining: self.config.recovery_ticks,
        });
    }

    /// Plan this tick's body command.
    pub fn plan(&mut self, ctx: &MotionContext<'_>) -> MotionCommand {
        if let MotionState::WallRecovery { ticks_remaining } = self.state {
            if ticks_remaining > 0 {
                self.state = MotionState::WallRecovery {
                    ticks_remaining: ticks_remaining - 1,
                };
                return self.recover(ctx.pose);
            }
            self.transition(MotionState::Cruising);
        }

        let pos = ctx.pose.position;
        let safe = self.sample(pos, ctx.region);
        let bounds = ctx.region.bounds();

        let all_safe = self
            .ring_radii
            .iter()
            .zip(&safe)
            .all(|(&radius, ring)| {
                ring.iter().enumerate().all(|(j, &ok)| {
                    ok || !bounds.contains(pos.project(self.sample_bearing(j), radius))
                })
            });
        if all_safe {
            self.transition(MotionState::Cruising);
            self.last_bearing = None;
            return MotionCommand::stop();
        }

        let inner_blocked = safe.first().map_or(true, |ring| !ring.iter().any(|&ok| ok));
        if inner_blocked {
            self.transition(MotionState::EmergencyEscape);
            let bearing = self.wall_escape_bearing(pos);
            self.last_bearing = Some(bearing);
            return self.steer(ctx.pose, bearing, true);
        }

        self.transition(MotionState::Cruising);
        let bearing = self
            .best_path(ctx, &safe)
            .unwrap_or_else(|| self.wall_escape_bearing(pos));
        self.last_bearing = Some(bearing);
        self.steer(ctx.pose, bearing, false)
    }

    fn sample_bearing(&self, index: usize) -> f64 {
        index as f64 * 2.0 * PI / self.config.samples_per_ring as f64
    }

    fn sample(&self, pos: Vec2, region: &SafeRegion) -> Vec<Vec<bool>> {
        self.ring_radii
            .iter()
            .map(|&radius| {
                (0..self.config.samples_per_ring)
                    .map(|j| region.contains(pos.project(self.sample_bearing(j), radius)))
                    .collect()
            })
            .collect()
    }

    fn best_path(&self, ctx: &MotionContext<'_>, safe: &[Vec<bool>]) -> Option<f64> {
        let pos = ctx.pose.position;
        let preferred = self.facing(ctx.pose.heading);
        let goal = ctx.least_contested.unwrap_or_else(|| self.arena.centre());
        let goal_bearing = pos.bearing_to(goal);

        let mut chosen = Vec::with_capacity(safe.len());
        for (ring, weight) in safe.iter().zip(&self.ring_weights) {
            let mut best: Option<(f64, f64)> = None;
            for (j, _) in ring.iter().enumerate().filter(|&(_, &ok)| ok) {
                let bearing = self.sample_bearing(j);
                let mut score = normal_relative_angle(bearing - preferred).abs()
                    + self.config.least_contested_weight
                        * normal_relative_angle(bearing - goal_bearing).abs();
                for wave in ctx.waves {
                    let gap = (pos.distance(wave.origin) - wave.radius).max(0.0);
                    let urgency = weight / (gap + self.config.urgency_distance_offset);
                    let radial = wave.origin.bearing_to(pos);
                    let angle = normal_relative_angle(bearing - radial).abs();
                    score += urgency * (angle - FRAC_PI_2).abs();
                }
                if best.map_or(true, |(s, _)| score < s) {
                    best = Some((score, bearing));
                }
            }
            chosen.push(best?.1);
        }
        Some(mean_heading(&chosen).unwrap_or(preferred))
    }

    /// Heading the robot effectively travels along under the current bias.
    fn facing(&self, heading: f64) -> f64 {
        if self.direction > 0.0 {
            heading
        } else {
            normal_absolute_angle(heading + PI)
        }
    }

    /// Bearing away from the nearest walls, or towards the centre.
    #[must_use]
    pub fn wall_escape_bearing(&self, pos: Vec2) -> f64 {
        let threshold = self.config.wall_escape_threshold;
        let a = self.arena;
        let to_left = pos.x - a.min.x;
        let to_right = a.max.x - pos.x;
        let to_bottom = pos.y - a.min.y;
        let to_top = a.max.y - pos.y;
        let centre = a.centre();
        let nearest = to_left.min(to_right).min(to_bottom).min(to_top);
        if nearest >= threshold {
            return pos.bearing_to(centre);
        }

        let mut escape = centre;
        if to_left < threshold {
            escape.x = a.min.x + a.width() * 0.75;
        }
        if to_right < threshold {
            escape.x = a.min.x + a.width() * 0.25;
        }
        if to_bottom < threshold {
            escape.y = a.min.y + a.height() * 0.75;
        }
        if to_top < threshold {
            escape.y = a.min.y + a.height() * 0.25;
        }
        pos.bearing_to(escape)
    }

    /// Turn towards `bearing`, flipping the direction bias when driving the
    /// other way needs much less turning.
    fn steer(&mut self, pose: &SelfPose, bearing: f64, sprint: bool) -> MotionCommand {
        let same = normal_relative_angle(bearing - self.facing(pose.heading));
        let other = normal_relative_angle(same + PI);
        let flip = other.abs() < self.config.reverse_ratio * same.abs()
            || same.abs() > FRAC_PI_2 + self.config.flip_margin;
        let turn_from_facing = if flip {
            self.direction = -self.direction;
            tracing::trace!(direction = self.direction, "Direction flip");
            other
        } else {
            same
        };

        let speed = if sprint || turn_from_facing.abs() <= self.config.moderate_turn {
            self.config.full_travel
        } else if turn_from_facing.abs() > self.config.sharp_turn {
            self.config.sharp_travel
        } else {
            self.config.moderate_travel
        };
        MotionCommand {
            turn: turn_from_facing,
            travel: self.direction * speed,
        }
    }

    fn recover(&self, pose: &SelfPose) -> MotionCommand {
        let bearing = pose.position.bearing_to(self.arena.centre());
        MotionCommand {
            turn: normal_relative_angle(bearing - self.facing(pose.heading)),
            travel: self.direction * self.config.full_travel,
        }
    }

    fn transition(&mut self, next: MotionState) {
        let changed = match (self.state, next) {
            (MotionState::WallRecovery { .. }, MotionState::WallRecovery { .. }) => true,
            (a, b) => a != b,
        };
        if changed {
            tracing::debug!(from = ?self.state, to = ?next, "Motion state change");
        }
        self.state = next;
    }
}
