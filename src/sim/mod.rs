//! Simulation module
//!
//! All gameplay logic lives here. This module must stay free of rendering
//! and platform concerns:
//! - Frame-stepped, single owner ([`GameState`])
//! - Seeded RNG only
//! - Shells observe through snapshots, events and the progression listener

pub mod collision;
pub mod entity;
pub mod pool;
pub mod progression;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use collision::{CollisionBox, overlaps};
pub use entity::{Direction, GemColor, Item, ItemKind, Lane, MenuInput, Obstacle, Player};
pub use pool::{LaneRetirer, LaneSpawner, ObstaclePool, PoolSignal, Retirer, SpawnOutcome, Spawner};
pub use progression::{
    Contact, ContactOutcome, GoalOutcome, ItemDrop, LevelState, Progression, ProgressionListener,
    ProgressionSnapshot, roll_item,
};
pub use snapshot::{ItemView, ObstacleView, Snapshot};
pub use state::{GameEvent, GameState};
pub use tick::tick;
