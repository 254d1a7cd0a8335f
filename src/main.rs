//! Lane Crosser headless driver
//!
//! Runs a seeded game with a simple autopilot, logging events and
//! progression updates, then prints the final snapshot as JSON.
//!
//! Usage: `lane-crosser [seed] [tuning.json] [max_frames]`

use std::process::ExitCode;
use std::sync::mpsc::{self, Receiver};

use glam::Vec2;

use lane_crosser::consts::{MAX_FRAME_DT, SIM_DT};
use lane_crosser::sim::{
    Direction, GameEvent, GameState, LevelState, MenuInput, ProgressionSnapshot, overlaps, tick,
};
use lane_crosser::{SimResult, Tuning};

/// Max simulation ticks per driver frame
const MAX_SUBSTEPS: u32 = 8;
/// Ticks between autopilot decisions
const DECISION_INTERVAL: u64 = 12;
/// How far ahead (seconds) the autopilot projects obstacles
const LOOKAHEAD: f32 = 0.6;
/// Two minutes at 60 Hz
const DEFAULT_MAX_FRAMES: u64 = 60 * 120;

/// Driver holding the run and its fixed-step accumulator
struct Driver {
    state: GameState,
    updates: Receiver<ProgressionSnapshot>,
    accumulator: f32,
    last_decision: u64,
}

impl Driver {
    fn new(tuning: Tuning, seed: u64) -> SimResult<Self> {
        let mut state = GameState::with_tuning(tuning, seed)?;
        let (tx, rx) = mpsc::channel();
        state.set_listener(Box::new(tx));
        Ok(Self {
            state,
            updates: rx,
            accumulator: 0.0,
            last_decision: 0,
        })
    }

    /// Run simulation ticks for one frame
    fn update(&mut self, dt: f32) {
        self.accumulator += dt.min(MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.autopilot();
            tick(&mut self.state, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }

        for event in self.state.drain_events() {
            log_event(&event);
        }
        for update in self.updates.try_iter() {
            log::debug!(
                "Progression: score {} (+{}) lives {} {:?}",
                update.score,
                update.delta_score,
                update.lives,
                update.level_state
            );
        }
    }

    /// Step up when the next lane stays clear, back off when the current spot
    /// is about to be hit.
    fn autopilot(&mut self) {
        let ticks = self.state.time_ticks;
        if ticks < self.last_decision + DECISION_INTERVAL {
            return;
        }
        self.last_decision = ticks;

        let step = self.state.tuning().vertical_step;
        let here = self.state.player_pos();
        let direction = if self.clear_at(here - Vec2::new(0.0, step)) {
            Some(Direction::Up)
        } else if !self.clear_at(here) && self.clear_at(here + Vec2::new(0.0, step)) {
            Some(Direction::Down)
        } else {
            None
        };

        if let Some(direction) = direction {
            self.state.submit_movement(direction);
        }
    }

    /// Whether the player would be untouched at `pos` over the lookahead
    fn clear_at(&self, pos: Vec2) -> bool {
        let player = self.state.player().collider.at(pos);
        self.state.active_obstacles().iter().all(|obstacle| {
            let ahead = obstacle.pos() + Vec2::new(obstacle.speed * LOOKAHEAD, 0.0);
            !overlaps(&player, &obstacle.collider)
                && !overlaps(&player, &obstacle.collider.at(ahead))
        })
    }

    fn finished(&self) -> bool {
        matches!(self.state.level_state(), LevelState::Won | LevelState::Lost)
    }
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::ObstacleSpawned { .. }
        | GameEvent::ObstacleRetired { .. }
        | GameEvent::SpawnThrottled => log::trace!("{:?}", event),
        GameEvent::Won | GameEvent::Lost => log::info!("{:?}", event),
        _ => log::debug!("{:?}", event),
    }
}

/// Tuning from a JSON file, falling back to defaults
fn load_tuning(path: Option<&str>) -> Tuning {
    let Some(path) = path else {
        return Tuning::default();
    };
    match std::fs::read_to_string(path) {
        Ok(json) => match Tuning::from_json(&json) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path);
                tuning
            }
            Err(e) => {
                log::warn!("Bad tuning in {}: {} (using defaults)", path, e);
                Tuning::default()
            }
        },
        Err(e) => {
            log::warn!("Could not read {}: {} (using defaults)", path, e);
            Tuning::default()
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let seed = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(42);
    let tuning = load_tuning(args.get(2).map(String::as_str));
    let max_frames = args
        .get(3)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_MAX_FRAMES);

    log::info!("Lane Crosser (headless) starting with seed {}", seed);

    let mut driver = match Driver::new(tuning, seed) {
        Ok(driver) => driver,
        Err(e) => {
            log::error!("Failed to start: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Character select: second character, then start
    driver.state.submit_menu_input(MenuInput::Next);
    driver.state.submit_menu_input(MenuInput::Confirm);

    let mut frames = 0;
    while frames < max_frames && !driver.finished() {
        driver.update(SIM_DT);
        frames += 1;
    }

    log::info!(
        "Stopped after {} frames: {:?}, score {}, lives {}",
        frames,
        driver.state.level_state(),
        driver.state.score(),
        driver.state.lives()
    );

    match serde_json::to_string_pretty(&driver.state.snapshot()) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Failed to serialize snapshot: {}", e);
            ExitCode::FAILURE
        }
    }
}
