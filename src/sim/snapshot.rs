//! Read-only views for the rendering and display shells

use glam::Vec2;
use serde::Serialize;

use super::entity::{ItemKind, Lane};
use super::progression::LevelState;

/// An active obstacle as the renderer sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObstacleView {
    pub id: u32,
    pub pos: Vec2,
    pub lane: Lane,
    pub sprite: &'static str,
}

/// An item on the board as the renderer sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    pub id: u32,
    pub pos: Vec2,
    pub kind: ItemKind,
    pub sprite: &'static str,
}

/// Everything a frame needs to draw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub time_ticks: u64,
    pub score: u32,
    pub lives: u32,
    pub level_state: LevelState,
    pub paused: bool,
    /// Highlighted entry on the select screen
    pub character: usize,
    pub player_pos: Vec2,
    pub player_sprite: String,
    pub obstacles: Vec<ObstacleView>,
    pub items: Vec<ItemView>,
}
