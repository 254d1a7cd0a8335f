//! Score, lives and level progression
//!
//! [`Progression`] is the only owner of score, delta-score, lives, the goal
//! token latch and the level state. It never touches the board directly:
//! operations return what the board should do (items to place, whether the
//! player goes back to the start) and the tick applies it.

use std::fmt;
use std::sync::mpsc::Sender;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{GemColor, ItemKind, MenuInput};
use crate::tuning::{DifficultyBand, Tuning};

/// Coarse game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LevelState {
    /// Character select screen
    #[default]
    ChoosingEntity,
    /// Run in progress (may be paused)
    Active,
    /// Out of lives
    Lost,
    /// Goal token collected
    Won,
}

/// Item the board should place
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemDrop {
    pub kind: ItemKind,
    pub pos: Vec2,
}

/// Something the player touched
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contact {
    Obstacle,
    Item { kind: ItemKind, value: u32 },
}

/// Board effects of a resolved contact
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactOutcome {
    /// The contact was resolved (false when ignored outside an active run)
    pub applied: bool,
    pub reset_player: bool,
    /// The touched item leaves the board
    pub consume_item: bool,
    pub drops: Vec<ItemDrop>,
}

/// Board effects of crossing the goal line
#[derive(Debug, Clone, PartialEq)]
pub struct GoalOutcome {
    pub drops: Vec<ItemDrop>,
    /// Difficulty band for the new score
    pub band: DifficultyBand,
}

/// Display-facing copy of the progression numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionSnapshot {
    pub score: u32,
    pub delta_score: u32,
    pub lives: u32,
    pub level_state: LevelState,
    pub paused: bool,
}

/// Receives a snapshot after every score or lives change.
///
/// Delivery is one-way: the simulation never waits on or reacts to the
/// listener.
pub trait ProgressionListener {
    fn progression_changed(&mut self, snapshot: &ProgressionSnapshot);
}

impl ProgressionListener for Sender<ProgressionSnapshot> {
    fn progression_changed(&mut self, snapshot: &ProgressionSnapshot) {
        // A closed display is not our problem
        let _ = self.send(*snapshot);
    }
}

/// Decide whether the board earns a new item.
///
/// Gems appear only while `delta_score` is inside the gem window and no gem
/// is waiting to be picked up. The color roll is `round(u * max_roll)` for a
/// uniform `u` in `[0, 1)` and the score band's ceiling, with 1/2/3 giving
/// blue/green/orange and anything else giving nothing. Past the window a
/// heart (low on lives) or a star appears.
pub fn roll_item<R: Rng + ?Sized>(
    tuning: &Tuning,
    delta_score: u32,
    score: u32,
    lives: u32,
    gems_outstanding: u32,
    rng: &mut R,
) -> Option<ItemDrop> {
    let kind = if (tuning.gem_delta_min..=tuning.gem_delta_max).contains(&delta_score) {
        if gems_outstanding > 0 {
            return None;
        }
        let max_roll = tuning.gem_max_roll(score) as f32;
        let roll = (rng.random::<f32>() * max_roll).round() as u32;
        let color = match roll {
            1 => GemColor::Blue,
            2 => GemColor::Green,
            3 => GemColor::Orange,
            _ => return None,
        };
        ItemKind::Gem(color)
    } else if delta_score > tuning.gem_delta_max {
        if lives < tuning.heart_below_lives {
            ItemKind::Heart
        } else {
            ItemKind::Star
        }
    } else {
        return None;
    };

    let pos = Vec2::new(
        rng.random_range(tuning.item_area_min.x..tuning.item_area_max.x),
        rng.random_range(tuning.item_area_min.y..tuning.item_area_max.y),
    );
    Some(ItemDrop { kind, pos })
}

/// Run progression state machine
pub struct Progression {
    score: u32,
    delta_score: u32,
    lives: u32,
    goal_token_granted: bool,
    gems_outstanding: u32,
    level_state: LevelState,
    paused: bool,
    character: usize,
    listener: Option<Box<dyn ProgressionListener>>,
}

impl fmt::Debug for Progression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Progression")
            .field("score", &self.score)
            .field("delta_score", &self.delta_score)
            .field("lives", &self.lives)
            .field("goal_token_granted", &self.goal_token_granted)
            .field("gems_outstanding", &self.gems_outstanding)
            .field("level_state", &self.level_state)
            .field("paused", &self.paused)
            .field("character", &self.character)
            .finish_non_exhaustive()
    }
}

impl Progression {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            score: 0,
            delta_score: 0,
            lives: tuning.starting_lives,
            goal_token_granted: false,
            gems_outstanding: 0,
            level_state: LevelState::ChoosingEntity,
            paused: false,
            character: 0,
            listener: None,
        }
    }

    pub fn set_listener(&mut self, listener: Box<dyn ProgressionListener>) {
        self.listener = Some(listener);
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn delta_score(&self) -> u32 {
        self.delta_score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn level_state(&self) -> LevelState {
        self.level_state
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn goal_token_granted(&self) -> bool {
        self.goal_token_granted
    }

    pub fn gems_outstanding(&self) -> u32 {
        self.gems_outstanding
    }

    /// Highlighted character on the select screen
    pub fn character(&self) -> usize {
        self.character
    }

    /// Active and not paused
    pub fn is_running(&self) -> bool {
        self.level_state == LevelState::Active && !self.paused
    }

    pub fn snapshot(&self) -> ProgressionSnapshot {
        ProgressionSnapshot {
            score: self.score,
            delta_score: self.delta_score,
            lives: self.lives,
            level_state: self.level_state,
            paused: self.paused,
        }
    }

    fn notify(&mut self) {
        let snapshot = self.snapshot();
        if let Some(listener) = self.listener.as_mut() {
            listener.progression_changed(&snapshot);
        }
    }

    fn set_level_state(&mut self, next: LevelState) {
        log::info!("Level state {:?} -> {:?}", self.level_state, next);
        self.level_state = next;
        if matches!(next, LevelState::Won | LevelState::Lost) {
            self.paused = true;
        }
    }

    /// Grant the goal token the first time the score reaches the threshold
    fn check_goal_token(&mut self, tuning: &Tuning) -> Option<ItemDrop> {
        if self.goal_token_granted || self.score < tuning.goal_token_score {
            return None;
        }
        self.goal_token_granted = true;
        log::info!("Score {} unlocked the goal token", self.score);
        Some(ItemDrop {
            kind: ItemKind::Key,
            pos: tuning.goal_token_pos,
        })
    }

    /// Add points, then see whether the board earned an item
    pub fn add_score<R: Rng + ?Sized>(
        &mut self,
        delta: u32,
        tuning: &Tuning,
        rng: &mut R,
    ) -> Vec<ItemDrop> {
        self.score = self.score.saturating_add(delta);
        self.delta_score = self.delta_score.saturating_add(delta);

        let mut drops: Vec<ItemDrop> = self.check_goal_token(tuning).into_iter().collect();
        if let Some(drop) = roll_item(
            tuning,
            self.delta_score,
            self.score,
            self.lives,
            self.gems_outstanding,
            rng,
        ) {
            if drop.kind.is_gem() {
                self.gems_outstanding += 1;
            }
            drops.push(drop);
        }

        self.notify();
        drops
    }

    /// Resolve a player contact. Ignored unless the run is active and unpaused.
    pub fn on_collision(&mut self, contact: Contact, tuning: &Tuning) -> ContactOutcome {
        let mut outcome = ContactOutcome::default();
        if !self.is_running() {
            return outcome;
        }
        outcome.applied = true;

        match contact {
            Contact::Obstacle => {
                self.lives = self.lives.saturating_sub(1);
                if self.lives > 0 {
                    outcome.reset_player = true;
                } else {
                    self.set_level_state(LevelState::Lost);
                }
            }
            Contact::Item { kind, value } => {
                outcome.consume_item = true;
                match kind {
                    ItemKind::Key => self.set_level_state(LevelState::Won),
                    ItemKind::Heart => {
                        self.lives += 1;
                        self.delta_score = 0;
                    }
                    ItemKind::Gem(_) => {
                        self.score = self.score.saturating_add(value);
                        self.delta_score = 0;
                        outcome.drops.extend(self.check_goal_token(tuning));
                    }
                    ItemKind::Star | ItemKind::Rock => {}
                }
                if kind.is_gem() {
                    self.gems_outstanding = self.gems_outstanding.saturating_sub(1);
                }
            }
        }

        self.notify();
        outcome
    }

    /// Award the crossing bonus and report the difficulty band it lands in
    pub fn on_goal_reached<R: Rng + ?Sized>(&mut self, tuning: &Tuning, rng: &mut R) -> GoalOutcome {
        let drops = self.add_score(tuning.goal_bonus, tuning, rng);
        let band = *tuning.band_for(self.score);
        log::debug!("Goal reached, score {} -> band {:?}", self.score, band);
        GoalOutcome { drops, band }
    }

    /// Flip the pause flag. Only meaningful during an active run.
    pub fn toggle_pause(&mut self) -> bool {
        if self.level_state != LevelState::Active {
            return false;
        }
        self.paused = !self.paused;
        log::info!("Paused: {}", self.paused);
        true
    }

    /// Character select navigation. Returns true when the selection was
    /// confirmed and the run started.
    pub fn on_menu_input(&mut self, input: MenuInput, roster_len: usize) -> bool {
        if self.level_state != LevelState::ChoosingEntity || roster_len == 0 {
            return false;
        }
        match input {
            MenuInput::Next => self.character = (self.character + 1) % roster_len,
            MenuInput::Prev => self.character = (self.character + roster_len - 1) % roster_len,
            MenuInput::Confirm => {
                self.set_level_state(LevelState::Active);
                self.notify();
                return true;
            }
        }
        false
    }
}
