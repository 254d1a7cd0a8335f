//! Entity types: obstacles, items and the player
//!
//! Entities are plain data holding a [`CollisionBox`]. Behavior that depends
//! on game rules lives in the pool, progression and tick modules.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::CollisionBox;
use crate::tuning::Tuning;

/// One of the three obstacle lanes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Lane {
    #[default]
    Top,
    Middle,
    Bottom,
}

impl Lane {
    pub const ALL: [Lane; 3] = [Lane::Top, Lane::Middle, Lane::Bottom];

    pub fn index(self) -> usize {
        match self {
            Lane::Top => 0,
            Lane::Middle => 1,
            Lane::Bottom => 2,
        }
    }

    /// Next lane in rotation, wrapping bottom back to top
    pub fn next(self) -> Lane {
        match self {
            Lane::Top => Lane::Middle,
            Lane::Middle => Lane::Bottom,
            Lane::Bottom => Lane::Top,
        }
    }

    /// Scene y for this lane
    pub fn y(self, tuning: &Tuning) -> f32 {
        tuning.lane_y[self.index()]
    }
}

/// Sprite key shared by all obstacles
pub const OBSTACLE_SPRITE: &str = "images/enemy-bug.png";

/// A moving hazard travelling left to right along a lane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub lane: Lane,
    /// Units per second
    pub speed: f32,
    /// Advances since the last spawn broadcast
    pub step_count: u32,
    pub left_limit: f32,
    pub right_limit: f32,
    pub collider: CollisionBox,
}

impl Obstacle {
    pub fn new(id: u32, lane: Lane, speed: f32, collider: CollisionBox, tuning: &Tuning) -> Self {
        let mut obstacle = Self {
            id,
            lane,
            speed,
            step_count: 0,
            left_limit: tuning.obstacle_left_limit,
            right_limit: tuning.obstacle_right_limit,
            collider,
        };
        obstacle.place(lane, tuning);
        obstacle
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.collider.pos
    }

    /// Put the obstacle at the start of `lane`. The broadcast counter keeps
    /// running across placements.
    pub fn place(&mut self, lane: Lane, tuning: &Tuning) {
        self.lane = lane;
        self.collider.pos = Vec2::new(self.left_limit, lane.y(tuning));
    }

    /// Move along the lane. Returns true when a spawn broadcast is due.
    pub fn advance(&mut self, dt: f32, broadcast_every: u32) -> bool {
        self.collider.pos.x += self.speed * dt;
        self.step_count += 1;
        if self.step_count >= broadcast_every {
            self.step_count = 0;
            return true;
        }
        false
    }

    pub fn past_right_limit(&self) -> bool {
        self.collider.pos.x >= self.right_limit
    }
}

/// Gem colors, from least to most valuable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GemColor {
    Blue,
    Green,
    Orange,
}

impl GemColor {
    fn index(self) -> usize {
        match self {
            GemColor::Blue => 0,
            GemColor::Green => 1,
            GemColor::Orange => 2,
        }
    }

    pub fn value(self, tuning: &Tuning) -> u32 {
        tuning.gem_values[self.index()]
    }
}

/// Item categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Currency, worth its color's value
    Gem(GemColor),
    /// Restores a life
    Heart,
    /// Goal token, picking it up wins the level
    Key,
    /// Bonus decoration, collected for show
    Star,
    /// Decorative hazard. Removed on contact, costs nothing.
    Rock,
}

impl ItemKind {
    pub fn sprite(self) -> &'static str {
        match self {
            ItemKind::Gem(GemColor::Blue) => "images/Gem-Blue.png",
            ItemKind::Gem(GemColor::Green) => "images/Gem-Green.png",
            ItemKind::Gem(GemColor::Orange) => "images/Gem-Orange.png",
            ItemKind::Heart => "images/Heart.png",
            ItemKind::Key => "images/Key.png",
            ItemKind::Star => "images/Star.png",
            ItemKind::Rock => "images/Rock.png",
        }
    }

    pub fn is_gem(self) -> bool {
        matches!(self, ItemKind::Gem(_))
    }
}

/// A collectable item waiting on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: u32,
    pub kind: ItemKind,
    /// Score value (gems only, zero otherwise)
    pub value: u32,
    pub collider: CollisionBox,
}

impl Item {
    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.collider.pos
    }
}

/// Player movement commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    TogglePause,
}

/// Character select commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuInput {
    Prev,
    Next,
    Confirm,
}

/// The single player entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub collider: CollisionBox,
    /// 0..=3, widens the horizontal step
    pub power_level: u8,
    pub sprite: String,
    pub reached_goal: bool,
    start: Vec2,
}

impl Player {
    pub fn new(collider: CollisionBox, start: Vec2, sprite: String) -> Self {
        Self {
            collider: collider.at(start),
            power_level: 0,
            sprite,
            reached_goal: false,
            start,
        }
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.collider.pos
    }

    /// Back to the start point
    pub fn reset(&mut self) {
        self.collider.pos = self.start;
        self.reached_goal = false;
    }

    /// Step in a direction, clamped to the board. Pause toggles are ignored.
    pub fn step(&mut self, direction: Direction, tuning: &Tuning) {
        let horizontal = tuning.horizontal_step_for(self.power_level);
        let vertical = tuning.vertical_step;
        let pos = &mut self.collider.pos;
        match direction {
            Direction::Left => pos.x = (pos.x - horizontal).max(tuning.player_min.x),
            Direction::Right => pos.x = (pos.x + horizontal).min(tuning.player_max.x),
            Direction::Up => pos.y = (pos.y - vertical).max(tuning.player_min.y),
            Direction::Down => pos.y = (pos.y + vertical).min(tuning.player_max.y),
            Direction::TogglePause => {}
        }
    }

    /// Check and latch the goal line
    pub fn check_goal(&mut self, tuning: &Tuning) -> bool {
        if !self.reached_goal && self.collider.pos.y <= tuning.goal_line {
            self.reached_goal = true;
            return true;
        }
        false
    }
}
