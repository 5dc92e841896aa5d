//! The capability shared by everything that occupies or threatens space.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::Footprint;
use crate::math::{Tick, Vec2};
use crate::tracker::OpponentTracker;
use crate::wave::DangerWave;

/// What kind of obstacle an [`Obstacle`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// A tracked opponent.
    Opponent,
    /// Our own robot as others see it. Never subtracted, never targeted.
    SelfModel,
    /// A danger wave.
    Wave,
}

/// State the arena passes to every obstacle once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateContext {
    /// Current tick.
    pub now: Tick,
    /// Our position this tick.
    pub self_position: Vec2,
    /// Radius of our own robot.
    pub self_radius: f64,
}

/// Common contract of opponents and danger waves.
pub trait Obstacle {
    /// Kind tag.
    fn kind(&self) -> ObstacleKind;

    /// Advance one tick.
    fn update(&mut self, ctx: &UpdateContext);

    /// Reference position.
    ///
    /// # Errors
    ///
    /// Returns [`TacticsError::PositionUnknown`](crate::error::TacticsError::PositionUnknown)
    /// when nothing has been observed yet.
    fn position(&self) -> Result<Vec2>;

    /// Area occupied or threatened `ticks_ahead` ticks from now.
    fn footprint(&self, ticks_ahead: u32) -> Footprint;

    /// Ticks since the last observation, or `None` if never observed.
    fn ticks_since_seen(&self, now: Tick) -> Option<Tick>;
}

/// Borrowed view of one obstacle owned by the arena.
#[derive(Debug, Clone, Copy)]
pub enum ObstacleRef<'a> {
    /// An opponent or the self-model.
    Tracker(&'a OpponentTracker),
    /// A danger wave.
    Wave(&'a DangerWave),
}

impl ObstacleRef<'_> {
    /// The underlying obstacle.
    #[must_use]
    pub fn as_obstacle(&self) -> &dyn Obstacle {
        match self {
            ObstacleRef::Tracker(t) => *t,
            ObstacleRef::Wave(w) => *w,
        }
    }

    /// Kind tag.
    #[must_use]
    pub fn kind(&self) -> ObstacleKind {
        self.as_obstacle().kind()
    }
}
