//! Simulation error types
//!
//! Only internal consistency violations end up here. Rejected player commands
//! and throttled spawns are ordinary outcomes and never produce an error.

use thiserror::Error;

/// Errors raised when a simulation invariant would be broken.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// A collision box must have a positive extent on both axes.
    #[error("invalid collision box: width {width}, height {height}")]
    InvalidBox { width: f32, height: f32 },

    /// Tried to retire an obstacle that is not in the active set.
    #[error("obstacle {0} is not active")]
    ObstacleNotActive(u32),

    /// Tuning data failed to parse or validate.
    #[error("invalid tuning: {0}")]
    InvalidTuning(String),
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::InvalidTuning(err.to_string())
    }
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;
