//! Data-driven game balance
//!
//! Every number the simulation depends on lives in [`Tuning`]. The defaults
//! describe the standard 505x606 board; a JSON file can override any subset
//! of fields.
//!
//! The difficulty table is the one place where score thresholds are defined.
//! Player power, obstacle speed and the obstacle cap are all read from it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::sim::collision::CollisionBox;

/// One row of the score-driven difficulty table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyBand {
    /// Band applies from this score upward
    pub min_score: u32,
    /// Player power level (scales horizontal step)
    pub power_level: u8,
    /// Allowed obstacle count
    pub enemy_cap: usize,
    /// Obstacle speed in units/second
    pub obstacle_speed: f32,
}

const FALLBACK_BAND: DifficultyBand = DifficultyBand {
    min_score: 0,
    power_level: 0,
    enemy_cap: 3,
    obstacle_speed: 100.0,
};

/// Gem color roll ceiling for a score band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GemBand {
    pub min_score: u32,
    /// The roll is `round(u * max_roll)` for uniform `u` in `[0, 1)`, so the
    /// end values carry half weight; 1..=3 pick a gem color
    pub max_roll: u32,
}

/// Collision rectangle description (offset from sprite origin plus size)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxSpec {
    pub offset: Vec2,
    pub width: f32,
    pub height: f32,
}

impl BoxSpec {
    pub const fn new(dx: f32, dy: f32, width: f32, height: f32) -> Self {
        Self {
            offset: Vec2::new(dx, dy),
            width,
            height,
        }
    }

    pub fn to_box(&self) -> SimResult<CollisionBox> {
        CollisionBox::new(self.offset, self.width, self.height)
    }
}

/// Complete game balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Difficulty ===
    /// Sorted by `min_score`, first band starts at 0
    pub difficulty: Vec<DifficultyBand>,
    /// Sorted by `min_score`, first band starts at 0
    pub gem_bands: Vec<GemBand>,

    // === Obstacles ===
    /// Top, middle, bottom lane y positions
    pub lane_y: [f32; 3],
    pub obstacle_left_limit: f32,
    pub obstacle_right_limit: f32,
    /// Advances between spawn broadcasts
    pub step_broadcast: u32,
    /// An obstacle only asks for company once past this x
    pub spawn_trigger_x: f32,
    pub obstacle_box: BoxSpec,

    // === Player ===
    pub player_box: BoxSpec,
    pub player_start: Vec2,
    pub player_min: Vec2,
    pub player_max: Vec2,
    pub horizontal_step: f32,
    pub vertical_step: f32,
    /// Extra horizontal distance per power level
    pub power_step_bonus: f32,
    /// Reaching `y <= goal_line` counts as crossing
    pub goal_line: f32,
    pub characters: Vec<String>,

    // === Progression ===
    pub starting_lives: u32,
    pub goal_bonus: u32,
    pub goal_token_score: u32,
    pub goal_token_pos: Vec2,
    /// Inclusive delta-score window in which gems may spawn
    pub gem_delta_min: u32,
    pub gem_delta_max: u32,
    /// Blue, green, orange
    pub gem_values: [u32; 3],
    /// Hearts replace stars while lives are below this
    pub heart_below_lives: u32,
    pub item_area_min: Vec2,
    pub item_area_max: Vec2,

    // === Item boxes ===
    pub gem_box: BoxSpec,
    pub heart_box: BoxSpec,
    pub key_box: BoxSpec,
    pub star_box: BoxSpec,
    pub rock_box: BoxSpec,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            difficulty: vec![
                FALLBACK_BAND,
                DifficultyBand {
                    min_score: 40,
                    power_level: 1,
                    enemy_cap: 4,
                    obstacle_speed: 130.0,
                },
                DifficultyBand {
                    min_score: 80,
                    power_level: 2,
                    enemy_cap: 5,
                    obstacle_speed: 150.0,
                },
                DifficultyBand {
                    min_score: 120,
                    power_level: 3,
                    enemy_cap: 6,
                    obstacle_speed: 170.0,
                },
            ],
            gem_bands: vec![
                GemBand {
                    min_score: 0,
                    max_roll: 2,
                },
                GemBand {
                    min_score: 80,
                    max_roll: 3,
                },
                // A score of exactly 99 drops back to the opening ceiling
                GemBand {
                    min_score: 99,
                    max_roll: 2,
                },
                GemBand {
                    min_score: 100,
                    max_roll: 4,
                },
            ],

            lane_y: [60.0, 145.0, 225.0],
            obstacle_left_limit: -98.0,
            obstacle_right_limit: 505.0,
            step_broadcast: 100,
            spawn_trigger_x: 150.0,
            obstacle_box: BoxSpec::new(3.0, 103.0, 95.0, 25.0),

            player_box: BoxSpec::new(30.0, 113.0, 44.0, 27.0),
            player_start: Vec2::new(200.0, 300.0),
            player_min: Vec2::new(-10.0, -15.0),
            player_max: Vec2::new(412.0, 360.0),
            horizontal_step: 101.0,
            vertical_step: 83.0,
            power_step_bonus: 10.0,
            goal_line: -15.0,
            characters: [
                "images/char-boy.png",
                "images/char-cat-girl.png",
                "images/char-horn-girl.png",
                "images/char-pink-girl.png",
                "images/char-princess-girl.png",
            ]
            .into_iter()
            .map(String::from)
            .collect(),

            starting_lives: 3,
            goal_bonus: 10,
            goal_token_score: 100,
            goal_token_pos: Vec2::new(350.0, 90.0),
            gem_delta_min: 40,
            gem_delta_max: 70,
            gem_values: [10, 20, 30],
            heart_below_lives: 3,
            item_area_min: Vec2::new(10.0, 60.0),
            item_area_max: Vec2::new(390.0, 260.0),

            gem_box: BoxSpec::new(3.0, 50.0, 60.0, 45.0),
            heart_box: BoxSpec::new(5.0, 50.0, 55.0, 25.0),
            key_box: BoxSpec::new(20.0, 75.0, 27.0, 28.0),
            star_box: BoxSpec::new(15.0, 45.0, 50.0, 52.0),
            rock_box: BoxSpec::new(15.0, 50.0, 55.0, 52.0),
        }
    }
}

impl Tuning {
    /// Parse tuning overrides from JSON and validate the result
    pub fn from_json(json: &str) -> SimResult<Self> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Check the tables and boxes the simulation relies on
    pub fn validate(&self) -> SimResult<()> {
        fn starts_at_zero_sorted(mins: &[u32]) -> bool {
            mins.first() == Some(&0) && mins.windows(2).all(|w| w[0] < w[1])
        }

        let mins: Vec<u32> = self.difficulty.iter().map(|b| b.min_score).collect();
        if !starts_at_zero_sorted(&mins) {
            return Err(SimError::InvalidTuning(
                "difficulty bands must start at 0 and be strictly increasing".into(),
            ));
        }
        if self.difficulty.iter().any(|b| b.enemy_cap == 0) {
            return Err(SimError::InvalidTuning("enemy cap must be at least 1".into()));
        }
        if self.difficulty.windows(2).any(|w| w[1].enemy_cap < w[0].enemy_cap) {
            return Err(SimError::InvalidTuning("enemy cap must not shrink".into()));
        }
        let gem_mins: Vec<u32> = self.gem_bands.iter().map(|b| b.min_score).collect();
        if !starts_at_zero_sorted(&gem_mins) {
            return Err(SimError::InvalidTuning(
                "gem bands must start at 0 and be strictly increasing".into(),
            ));
        }
        if self.obstacle_left_limit >= self.obstacle_right_limit {
            return Err(SimError::InvalidTuning(
                "obstacle left limit must be below the right limit".into(),
            ));
        }
        if self.step_broadcast == 0 {
            return Err(SimError::InvalidTuning("step broadcast must be positive".into()));
        }
        if self.characters.is_empty() {
            return Err(SimError::InvalidTuning("at least one character is required".into()));
        }
        if self.item_area_min.cmpge(self.item_area_max).any() {
            return Err(SimError::InvalidTuning("item area is empty".into()));
        }
        for spec in [
            &self.obstacle_box,
            &self.player_box,
            &self.gem_box,
            &self.heart_box,
            &self.key_box,
            &self.star_box,
            &self.rock_box,
        ] {
            spec.to_box()?;
        }
        Ok(())
    }

    /// Difficulty band for a score
    pub fn band_for(&self, score: u32) -> &DifficultyBand {
        self.difficulty
            .iter()
            .rev()
            .find(|b| score >= b.min_score)
            .unwrap_or(&FALLBACK_BAND)
    }

    /// Gem roll ceiling for a score
    pub fn gem_max_roll(&self, score: u32) -> u32 {
        self.gem_bands
            .iter()
            .rev()
            .find(|b| score >= b.min_score)
            .map(|b| b.max_roll)
            .unwrap_or(0)
    }

    /// Horizontal step for a power level
    pub fn horizontal_step_for(&self, power_level: u8) -> f32 {
        self.horizontal_step + self.power_step_bonus * f32::from(power_level)
    }
}
