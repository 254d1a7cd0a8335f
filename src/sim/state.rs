//! Game state and external commands
//!
//! [`GameState`] is the single owner of everything a run needs: the obstacle
//! pool, progression, player, items and the RNG. The shell talks to it
//! through commands (`submit_movement`, `submit_menu_input`), the tick, and
//! read-only accessors.

use std::collections::VecDeque;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::entity::{Direction, Item, ItemKind, Lane, MenuInput, OBSTACLE_SPRITE, Obstacle, Player};
use super::pool::{ObstaclePool, SpawnOutcome};
use super::progression::{ItemDrop, LevelState, Progression, ProgressionListener};
use super::snapshot::{ItemView, ObstacleView, Snapshot};
use crate::error::SimResult;
use crate::tuning::Tuning;

/// Things that happened during a tick, for logging and sound cues
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum GameEvent {
    ObstacleSpawned { id: u32, lane: Lane, reused: bool },
    SpawnThrottled,
    ObstacleRetired { id: u32 },
    Hit { lives_left: u32 },
    ItemSpawned { id: u32, kind: ItemKind },
    ItemCollected { id: u32, kind: ItemKind },
    GoalReached { score: u32 },
    Won,
    Lost,
}

/// Complete run state
#[derive(Debug)]
pub struct GameState {
    /// Run seed
    pub seed: u64,
    /// Simulation tick counter (running ticks only)
    pub time_ticks: u64,
    pub(crate) tuning: Tuning,
    pub(crate) rng: Pcg32,
    pub(crate) pool: ObstaclePool,
    pub(crate) progression: Progression,
    pub(crate) player: Player,
    pub(crate) items: Vec<Item>,
    /// Accepted moves waiting for the next tick
    pub(crate) pending_moves: VecDeque<Direction>,
    pub(crate) events: Vec<GameEvent>,
    next_item_id: u32,
}

impl GameState {
    /// New run with the default tuning
    pub fn new(seed: u64) -> SimResult<Self> {
        Self::with_tuning(Tuning::default(), seed)
    }

    pub fn with_tuning(tuning: Tuning, seed: u64) -> SimResult<Self> {
        tuning.validate()?;
        let pool = ObstaclePool::from_tuning(&tuning)?;
        let player = Player::new(
            tuning.player_box.to_box()?,
            tuning.player_start,
            tuning.characters[0].clone(),
        );
        Ok(Self {
            seed,
            time_ticks: 0,
            rng: Pcg32::seed_from_u64(seed),
            pool,
            progression: Progression::new(&tuning),
            player,
            items: Vec::new(),
            pending_moves: VecDeque::new(),
            events: Vec::new(),
            next_item_id: 1,
            tuning,
        })
    }

    /// Attach the score/lives display
    pub fn set_listener(&mut self, listener: Box<dyn ProgressionListener>) {
        self.progression.set_listener(listener);
    }

    // === Commands ===

    /// Queue a move for the next tick. Moves are only accepted during an
    /// unpaused run; the pause toggle works whenever the run is active.
    pub fn submit_movement(&mut self, direction: Direction) -> bool {
        if direction == Direction::TogglePause {
            return self.progression.toggle_pause();
        }
        if !self.progression.is_running() {
            log::debug!(
                "Ignoring {:?} in {:?} (paused: {})",
                direction,
                self.progression.level_state(),
                self.progression.paused()
            );
            return false;
        }
        self.pending_moves.push_back(direction);
        true
    }

    /// Character select input. Confirming starts the run.
    pub fn submit_menu_input(&mut self, input: MenuInput) -> bool {
        if self.progression.level_state() != LevelState::ChoosingEntity {
            log::debug!("Ignoring menu input {:?}", input);
            return false;
        }
        let started = self
            .progression
            .on_menu_input(input, self.tuning.characters.len());
        if started {
            let character = self.progression.character();
            self.player.sprite = self.tuning.characters[character].clone();
            self.player.reset();
            self.sync_difficulty();
            log::info!("Run started with {}", self.player.sprite);
        }
        true
    }

    // === Accessors ===

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn score(&self) -> u32 {
        self.progression.score()
    }

    pub fn lives(&self) -> u32 {
        self.progression.lives()
    }

    pub fn level_state(&self) -> LevelState {
        self.progression.level_state()
    }

    pub fn paused(&self) -> bool {
        self.progression.paused()
    }

    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_pos(&self) -> Vec2 {
        self.player.pos()
    }

    pub fn pool(&self) -> &ObstaclePool {
        &self.pool
    }

    pub fn active_obstacles(&self) -> &[Obstacle] {
        self.pool.active()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn obstacle_views(&self) -> Vec<ObstacleView> {
        self.pool
            .active()
            .iter()
            .map(|o| ObstacleView {
                id: o.id,
                pos: o.pos(),
                lane: o.lane,
                sprite: OBSTACLE_SPRITE,
            })
            .collect()
    }

    pub fn item_views(&self) -> Vec<ItemView> {
        self.items
            .iter()
            .map(|i| ItemView {
                id: i.id,
                pos: i.pos(),
                kind: i.kind,
                sprite: i.kind.sprite(),
            })
            .collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            time_ticks: self.time_ticks,
            score: self.score(),
            lives: self.lives(),
            level_state: self.level_state(),
            paused: self.paused(),
            character: self.progression.character(),
            player_pos: self.player_pos(),
            player_sprite: self.player.sprite.clone(),
            obstacles: self.obstacle_views(),
            items: self.item_views(),
        }
    }

    /// Take the events recorded since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // === Internal helpers used by the tick ===

    /// Speed for obstacles entering the field now
    pub(crate) fn current_speed(&self) -> f32 {
        self.tuning.band_for(self.score()).obstacle_speed
    }

    /// Re-derive player power and obstacle cap from the score
    pub(crate) fn sync_difficulty(&mut self) {
        let band = *self.tuning.band_for(self.progression.score());
        self.player.power_level = band.power_level;
        self.pool.set_allowed_cap(band.enemy_cap);
    }

    pub(crate) fn record_spawn(&mut self, outcome: SpawnOutcome) {
        let event = match outcome {
            SpawnOutcome::Reused(id) | SpawnOutcome::Created(id) => {
                let lane = self
                    .pool
                    .active()
                    .iter()
                    .find(|o| o.id == id)
                    .map(|o| o.lane)
                    .unwrap_or_default();
                GameEvent::ObstacleSpawned {
                    id,
                    lane,
                    reused: matches!(outcome, SpawnOutcome::Reused(_)),
                }
            }
            SpawnOutcome::Throttled => GameEvent::SpawnThrottled,
        };
        self.events.push(event);
    }

    /// Turn progression drops into board items
    pub(crate) fn place_drops(&mut self, drops: Vec<ItemDrop>) -> SimResult<()> {
        for drop in drops {
            let (spec, value) = match drop.kind {
                ItemKind::Gem(color) => (self.tuning.gem_box, color.value(&self.tuning)),
                ItemKind::Heart => (self.tuning.heart_box, 0),
                ItemKind::Key => (self.tuning.key_box, 0),
                ItemKind::Star => (self.tuning.star_box, 0),
                ItemKind::Rock => (self.tuning.rock_box, 0),
            };
            let id = self.next_item_id;
            self.next_item_id += 1;
            self.items.push(Item {
                id,
                kind: drop.kind,
                value,
                collider: spec.to_box()?.at(drop.pos),
            });
            log::debug!("Placed {:?} #{} at {}", drop.kind, id, drop.pos);
            self.events.push(GameEvent::ItemSpawned { id, kind: drop.kind });
        }
        Ok(())
    }
}
