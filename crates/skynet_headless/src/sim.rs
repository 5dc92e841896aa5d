//! Minimal stand-in arena engine.
//!
//! Just enough of a tank-arena engine to drive the tactical core end to end:
//! body, gun and radar turn limits, acceleration, gun heat, projectiles,
//! energy transfer on hits, wall clamping and radar-arc scanning. Opponents
//! follow their [`OpponentScript`] and fire straight at our current
//! position.

use std::f64::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};
use skynet_core::engine::{ArenaEvent, Commands, ScanEvent, SelfPose, TickInput};
use skynet_core::geometry::Rect;
use skynet_core::math::{normal_absolute_angle, normal_relative_angle, Tick, Vec2};

use crate::scenario::{Movement, OpponentScript, Scenario};

/// Collision radius of every robot.
pub const ROBOT_RADIUS: f64 = 18.0;
const MAX_SPEED: f64 = 8.0;
const ACCELERATION: f64 = 1.0;
const DECELERATION: f64 = 2.0;
const GUN_COOLING: f64 = 0.1;
const INITIAL_GUN_HEAT: f64 = 3.0;
const SCAN_RANGE: f64 = 1200.0;
const COLD_GUN: f64 = 1e-9;

fn max_body_turn(velocity: f64) -> f64 {
    (10.0 - 0.75 * velocity.abs()).to_radians()
}

fn max_gun_turn() -> f64 {
    20f64.to_radians()
}

fn max_radar_turn() -> f64 {
    45f64.to_radians()
}

fn projectile_speed(power: f64) -> f64 {
    20.0 - 3.0 * power
}

fn damage(power: f64) -> f64 {
    4.0 * power + 2.0 * (power - 1.0).max(0.0)
}

/// New velocity after one tick of driving towards `target`.
fn approach(velocity: f64, target: f64) -> f64 {
    let speeding_up = target.abs() > velocity.abs() && target * velocity >= 0.0;
    let limit = if speeding_up { ACCELERATION } else { DECELERATION };
    velocity + (target - velocity).clamp(-limit, limit)
}

/// Distance from `p` to the segment `a..b`.
fn segment_distance(a: Vec2, b: Vec2, p: Vec2) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= f64::EPSILON {
        return a.distance(p);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    a.lerp(b, t).distance(p)
}

/// Who fired a projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shooter {
    /// Our robot.
    Us,
    /// Index into the scenario's opponents.
    Opponent(usize),
}

#[derive(Debug, Clone, PartialEq)]
struct Projectile {
    shooter: Shooter,
    position: Vec2,
    heading: f64,
    power: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct Body {
    position: Vec2,
    heading: f64,
    velocity: f64,
    energy: f64,
    gun_heat: f64,
}

impl Body {
    fn new(position: Vec2, heading: f64, energy: f64) -> Self {
        Self {
            position,
            heading,
            velocity: 0.0,
            energy,
            gun_heat: INITIAL_GUN_HEAT,
        }
    }

    fn can_fire(&self, power: f64) -> bool {
        self.gun_heat <= COLD_GUN && self.energy > power
    }

    fn fire(&mut self, power: f64) {
        self.energy -= power;
        self.gun_heat = 1.0 + power / 5.0;
    }
}

#[derive(Debug, Clone, PartialEq)]
struct OurTank {
    body: Body,
    gun_heading: f64,
    radar_heading: f64,
    turn_remaining: f64,
    travel_remaining: f64,
    gun_turn_remaining: f64,
    radar_turn_remaining: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct Bot {
    script: OpponentScript,
    body: Body,
    direction: f64,
    alive: bool,
}

/// Running engine counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineStats {
    /// Projectiles we fired.
    pub shots_fired: u64,
    /// Our projectiles that hit an opponent.
    pub shots_hit: u64,
    /// Opponent projectiles that hit us.
    pub hits_taken: u64,
    /// Opponents destroyed.
    pub opponents_destroyed: u64,
    /// Times we drove into a wall.
    pub wall_collisions: u64,
}

/// Stand-in engine for one scenario.
#[derive(Debug, Clone)]
pub struct StandInEngine {
    arena: Rect,
    bounds: Rect,
    time: Tick,
    self_name: String,
    us: OurTank,
    alive: bool,
    bots: Vec<Bot>,
    projectiles: Vec<Projectile>,
    pending: Vec<ArenaEvent>,
    stats: EngineStats,
}

impl StandInEngine {
    /// Set up `scenario`, with our robot called `self_name`.
    #[must_use]
    pub fn new(scenario: &Scenario, self_name: &str) -> Self {
        let (w, h) = scenario.arena;
        let arena = Rect::from_size(w, h);
        let start = Vec2::new(scenario.start.0, scenario.start.1);
        let bots = scenario
            .opponents
            .iter()
            .map(|script| {
                let heading = match script.movement {
                    Movement::Stationary => 0.0,
                    Movement::Linear { heading, .. } | Movement::Oscillate { heading, .. } => {
                        normal_absolute_angle(heading)
                    }
                };
                Bot {
                    body: Body::new(Vec2::new(script.start.0, script.start.1), heading, script.energy),
                    script: script.clone(),
                    direction: 1.0,
                    alive: true,
                }
            })
            .collect();
        Self {
            arena,
            bounds: arena.shrink(ROBOT_RADIUS),
            time: 0,
            self_name: self_name.to_string(),
            us: OurTank {
                body: Body::new(start, normal_absolute_angle(scenario.heading), 100.0),
                gun_heading: normal_absolute_angle(scenario.heading),
                radar_heading: normal_absolute_angle(scenario.heading),
                turn_remaining: 0.0,
                travel_remaining: 0.0,
                gun_turn_remaining: 0.0,
                radar_turn_remaining: 0.0,
            },
            alive: true,
            bots,
            projectiles: Vec::new(),
            pending: vec![ArenaEvent::RoundStarted { round: 0 }],
            stats: EngineStats::default(),
        }
    }

    /// Current tick.
    #[must_use]
    pub fn time(&self) -> Tick {
        self.time
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Our current energy.
    #[must_use]
    pub fn energy(&self) -> f64 {
        self.us.body.energy
    }

    /// Whether we are still alive.
    #[must_use]
    pub fn survived(&self) -> bool {
        self.alive
    }

    /// Opponents still alive.
    #[must_use]
    pub fn alive_opponents(&self) -> usize {
        self.bots.iter().filter(|b| b.alive).count()
    }

    /// True once we or every opponent are destroyed.
    #[must_use]
    pub fn is_over(&self) -> bool {
        !self.alive || self.alive_opponents() == 0
    }

    /// Our pose plus every event since the last call.
    pub fn next_input(&mut self) -> TickInput {
        let us = &self.us;
        TickInput {
            pose: SelfPose {
                position: us.body.position,
                heading: us.body.heading,
                velocity: us.body.velocity,
                energy: us.body.energy,
                gun_heading: us.gun_heading,
                gun_heat: us.body.gun_heat,
                radar_heading: us.radar_heading,
                radar_turn_remaining: us.radar_turn_remaining,
                time: self.time,
            },
            alive_opponents: self.alive_opponents(),
            events: std::mem::take(&mut self.pending),
        }
    }

    /// Apply `commands` and advance one tick.
    pub fn step(&mut self, commands: &Commands) {
        self.order(commands);
        self.time += 1;

        self.us.body.gun_heat = (self.us.body.gun_heat - GUN_COOLING).max(0.0);
        for bot in &mut self.bots {
            bot.body.gun_heat = (bot.body.gun_heat - GUN_COOLING).max(0.0);
        }

        self.drive();
        let (radar_from, radar_turn) = self.turn_turrets();
        self.move_bots();
        self.bots_fire();
        self.move_projectiles();
        self.scan(radar_from, radar_turn);

        if self.is_over() {
            self.pending.push(ArenaEvent::RoundEnded { round: 0 });
            self.pending.push(ArenaEvent::BattleEnded);
        }
    }

    fn order(&mut self, commands: &Commands) {
        let us = &mut self.us;
        us.turn_remaining = commands.body_turn;
        us.travel_remaining = commands.travel;
        us.gun_turn_remaining = commands.gun_turn;
        // a zero radar turn leaves the current sweep running
        if commands.radar_turn != 0.0 {
            us.radar_turn_remaining = commands.radar_turn;
        }
        if let Some(power) = commands.fire {
            let power = power.clamp(0.1, 3.0);
            if self.alive && us.body.can_fire(power) {
                us.body.fire(power);
                self.projectiles.push(Projectile {
                    shooter: Shooter::Us,
                    position: us.body.position,
                    heading: us.gun_heading,
                    power,
                });
                self.stats.shots_fired += 1;
            }
        }
    }

    fn drive(&mut self) {
        let body = &mut self.us.body;
        let limit = max_body_turn(body.velocity);
        let turn = self.us.turn_remaining.clamp(-limit, limit);
        body.heading = normal_absolute_angle(body.heading + turn);
        self.us.turn_remaining -= turn;

        body.velocity = approach(body.velocity, self.us.travel_remaining.clamp(-MAX_SPEED, MAX_SPEED));
        let next = body.position + Vec2::from_heading(body.heading) * body.velocity;
        self.us.travel_remaining -= body.velocity;

        let b = self.bounds;
        let clamped = Vec2::new(next.x.clamp(b.min.x, b.max.x), next.y.clamp(b.min.y, b.max.y));
        if clamped != next {
            let wall_bearing = if next.x < b.min.x {
                3.0 * FRAC_PI_2
            } else if next.x > b.max.x {
                FRAC_PI_2
            } else if next.y < b.min.y {
                PI
            } else {
                0.0
            };
            self.pending.push(ArenaEvent::WallCollision {
                bearing: normal_relative_angle(wall_bearing - body.heading),
            });
            body.velocity = 0.0;
            self.us.travel_remaining = 0.0;
            self.stats.wall_collisions += 1;
        }
        body.position = clamped;
    }

    /// Turn gun and radar; returns the radar heading before the turn and
    /// the turn applied.
    fn turn_turrets(&mut self) -> (f64, f64) {
        let us = &mut self.us;
        let gun = us.gun_turn_remaining.clamp(-max_gun_turn(), max_gun_turn());
        us.gun_heading = normal_absolute_angle(us.gun_heading + gun);
        us.gun_turn_remaining -= gun;

        let from = us.radar_heading;
        let radar = us.radar_turn_remaining.clamp(-max_radar_turn(), max_radar_turn());
        us.radar_heading = normal_absolute_angle(from + radar);
        us.radar_turn_remaining -= radar;
        (from, radar)
    }

    fn move_bots(&mut self) {
        let b = self.bounds;
        let time = self.time;
        for bot in self.bots.iter_mut().filter(|bot| bot.alive) {
            let (speed, reverse_every) = match bot.script.movement {
                Movement::Stationary => continue,
                Movement::Linear { speed, .. } => (speed, None),
                Movement::Oscillate { speed, period, .. } => (speed, Some(period.max(1))),
            };
            if reverse_every.is_some_and(|period| time % period == 0) {
                bot.direction = -bot.direction;
            }
            bot.body.velocity = speed * bot.direction;
            let next = bot.body.position + Vec2::from_heading(bot.body.heading) * bot.body.velocity;
            let hit_x = next.x < b.min.x || next.x > b.max.x;
            let hit_y = next.y < b.min.y || next.y > b.max.y;
            bot.body.position =
                Vec2::new(next.x.clamp(b.min.x, b.max.x), next.y.clamp(b.min.y, b.max.y));
            if hit_x || hit_y {
                match bot.script.movement {
                    Movement::Linear { .. } => {
                        let h = bot.body.heading;
                        let h = if hit_x { -h } else { h };
                        let h = if hit_y { PI - h } else { h };
                        bot.body.heading = normal_absolute_angle(h);
                    }
                    _ => bot.direction = -bot.direction,
                }
            }
        }
    }

    fn bots_fire(&mut self) {
        if !self.alive {
            return;
        }
        let target = self.us.body.position;
        let time = self.time;
        for (index, bot) in self.bots.iter_mut().enumerate() {
            let Some(fire) = bot.script.fire else {
                continue;
            };
            if !bot.alive || fire.every == 0 || time % fire.every != 0 || !bot.body.can_fire(fire.power) {
                continue;
            }
            bot.body.fire(fire.power);
            self.projectiles.push(Projectile {
                shooter: Shooter::Opponent(index),
                position: bot.body.position,
                heading: bot.body.position.bearing_to(target),
                power: fire.power,
            });
            tracing::trace!(opponent = %bot.script.name, tick = time, power = fire.power, "Scripted shot");
        }
    }

    fn move_projectiles(&mut self) {
        let projectiles = std::mem::take(&mut self.projectiles);
        for mut p in projectiles {
            let from = p.position;
            p.position = from + Vec2::from_heading(p.heading) * projectile_speed(p.power);
            if self.resolve_hit(&p, from) {
                continue;
            }
            if self.arena.contains(p.position) {
                self.projectiles.push(p);
            } else if p.shooter == Shooter::Us {
                self.pending.push(ArenaEvent::ProjectileMissed);
            }
        }
    }

    /// Apply a hit by `p`, travelling from `from`, if it struck anyone.
    fn resolve_hit(&mut self, p: &Projectile, from: Vec2) -> bool {
        match p.shooter {
            Shooter::Opponent(index) => {
                if !self.alive || segment_distance(from, p.position, self.us.body.position) >= ROBOT_RADIUS {
                    return false;
                }
                self.us.body.energy -= damage(p.power);
                let shooter = &mut self.bots[index];
                shooter.body.energy += 3.0 * p.power;
                self.pending.push(ArenaEvent::HitByProjectile {
                    shooter: shooter.script.name.clone(),
                    power: p.power,
                });
                self.stats.hits_taken += 1;
                if self.us.body.energy <= 0.0 {
                    self.alive = false;
                    self.pending.push(ArenaEvent::Destroyed {
                        name: self.self_name.clone(),
                    });
                }
                true
            }
            Shooter::Us => {
                let Some(bot) = self.bots.iter_mut().find(|bot| {
                    bot.alive && segment_distance(from, p.position, bot.body.position) < ROBOT_RADIUS
                }) else {
                    return false;
                };
                bot.body.energy -= damage(p.power);
                self.us.body.energy += 3.0 * p.power;
                self.pending.push(ArenaEvent::ProjectileHit {
                    victim: bot.script.name.clone(),
                    victim_energy: bot.body.energy.max(0.0),
                });
                self.stats.shots_hit += 1;
                if bot.body.energy <= 0.0 {
                    bot.alive = false;
                    self.pending.push(ArenaEvent::Destroyed {
                        name: bot.script.name.clone(),
                    });
                    self.stats.opponents_destroyed += 1;
                }
                true
            }
        }
    }

    fn scan(&mut self, from: f64, turn: f64) {
        if !self.alive || turn == 0.0 {
            return;
        }
        let us = &self.us.body;
        for bot in self.bots.iter().filter(|bot| bot.alive) {
            let bearing = us.position.bearing_to(bot.body.position);
            let distance = us.position.distance(bot.body.position);
            let swept = if turn > 0.0 {
                normal_absolute_angle(bearing - from) <= turn
            } else {
                normal_absolute_angle(from - bearing) <= -turn
            };
            if !swept || distance > SCAN_RANGE {
                continue;
            }
            self.pending.push(ArenaEvent::Scanned(ScanEvent {
                name: bot.script.name.clone(),
                bearing: normal_relative_angle(bearing - us.heading),
                distance,
                energy: bot.body.energy,
                heading: bot.body.heading,
                velocity: bot.body.velocity,
                time: self.time,
            }));
        }
    }
}
