//! Lane Crosser - A lane-crossing arcade game core
//!
//! Core modules:
//! - `sim`: Frame-stepped simulation (obstacle pool, collisions, progression)
//! - `tuning`: Data-driven game balance
//! - `error`: Invariant violations surfaced to callers and tests
//!
//! Rendering, asset loading and keyboard handling live in the shell that
//! drives [`sim::tick`].

pub mod error;
pub mod sim;
pub mod tuning;

pub use error::{SimError, SimResult};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (one tick per 60 Hz display refresh)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Longest frame the driver will feed the simulation, in seconds
    pub const MAX_FRAME_DT: f32 = 0.1;
}
