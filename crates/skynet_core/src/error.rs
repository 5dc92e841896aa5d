//! Error types for the tactical core.

use thiserror::Error;

use crate::math::Tick;

/// Result type alias using [`TacticsError`].
pub type Result<T> = std::result::Result<T, TacticsError>;

/// Top-level error type for the tactical core.
///
/// Geometric degeneracy (singular fits, negative discriminants, zero-length
/// vectors) is resolved locally by falling back to a coarser estimate and is
/// never reported through this type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TacticsError {
    /// A tracker was asked for its position before any observation.
    #[error("Position not yet known for '{name}'")]
    PositionUnknown {
        /// Tracker name.
        name: String,
    },

    /// A tracker was asked for a prediction it cannot make yet.
    #[error("No prediction available for '{name}'")]
    NoPrediction {
        /// Tracker name.
        name: String,
    },

    /// An observation was routed to a tracker with a different identity.
    #[error("Observation of '{observed}' routed to tracker '{tracker}'")]
    IdentityMismatch {
        /// Tracker that received the observation.
        tracker: String,
        /// Name carried by the observation.
        observed: String,
    },

    /// The engine reported a pose that cannot be used for arithmetic.
    #[error("Self pose at tick {tick} is not finite")]
    NonFinitePose {
        /// Tick of the offending pose.
        tick: Tick,
    },

    /// A tracker handle no longer resolves.
    #[error("Unknown tracker handle {0}")]
    UnknownTracker(u32),

    /// A core invariant was broken.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}
