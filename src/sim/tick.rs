//! Frame tick
//!
//! One call advances the run by `dt` seconds in a fixed order:
//! 1. obstacles (bootstrap, movement, spawn/retire signals)
//! 2. player (queued moves, goal line)
//! 3. collisions, each resolved immediately so later checks see its effects
//!
//! Nothing moves and nothing collides while paused or outside an active run.

use super::collision::overlaps;
use super::pool::PoolSignal;
use super::progression::{Contact, ItemDrop, LevelState};
use super::state::{GameEvent, GameState};

/// Advance the game state by one frame
pub fn tick(state: &mut GameState, dt: f32) {
    if !state.progression.is_running() {
        return;
    }
    state.time_ticks += 1;

    update_obstacles(state, dt);
    update_player(state);
    resolve_collisions(state);
}

fn update_obstacles(state: &mut GameState, dt: f32) {
    let speed = state.current_speed();
    keep_field_populated(state, speed);

    for signal in state.pool.advance(dt) {
        match signal {
            PoolSignal::SpawnRequest { lane, .. } => {
                let outcome = state.pool.request_spawn(lane, speed);
                state.record_spawn(outcome);
            }
            PoolSignal::Retire(id) => match state.pool.retire(id) {
                Ok(()) => state.events.push(GameEvent::ObstacleRetired { id }),
                Err(err) => {
                    log::error!("Retire failed: {}", err);
                    debug_assert!(false, "retire failed: {err}");
                }
            },
        }
    }
    // The last obstacle may have just been parked
    keep_field_populated(state, speed);
}

fn keep_field_populated(state: &mut GameState, speed: f32) {
    if let Some(outcome) = state.pool.tick(speed) {
        state.record_spawn(outcome);
    }
}

fn update_player(state: &mut GameState) {
    while let Some(direction) = state.pending_moves.pop_front() {
        state.player.step(direction, &state.tuning);
        if state.player.check_goal(&state.tuning) {
            on_goal(state);
        }
    }
}

fn on_goal(state: &mut GameState) {
    let outcome = state
        .progression
        .on_goal_reached(&state.tuning, &mut state.rng);
    state.events.push(GameEvent::GoalReached {
        score: state.progression.score(),
    });
    place(state, outcome.drops);
    state.player.power_level = outcome.band.power_level;
    state.pool.set_allowed_cap(outcome.band.enemy_cap);
    state.player.reset();
}

fn place(state: &mut GameState, drops: Vec<ItemDrop>) {
    if let Err(err) = state.place_drops(drops) {
        log::error!("Failed to place item: {}", err);
        debug_assert!(false, "failed to place item: {err}");
    }
}

fn record_transition(state: &mut GameState, before: LevelState) {
    let after = state.progression.level_state();
    if before == after {
        return;
    }
    match after {
        LevelState::Won => state.events.push(GameEvent::Won),
        LevelState::Lost => state.events.push(GameEvent::Lost),
        _ => {}
    }
}

fn resolve_collisions(state: &mut GameState) {
    // Hazards stay on the field, so plain index iteration is fine
    for idx in 0..state.pool.active().len() {
        if !state.progression.is_running() {
            return;
        }
        if !overlaps(&state.player.collider, &state.pool.active()[idx].collider) {
            continue;
        }
        let before = state.progression.level_state();
        let outcome = state
            .progression
            .on_collision(Contact::Obstacle, &state.tuning);
        if !outcome.applied {
            continue;
        }
        state.events.push(GameEvent::Hit {
            lives_left: state.progression.lives(),
        });
        if outcome.reset_player {
            state.player.reset();
        }
        record_transition(state, before);
    }

    // Pickups may remove the item and may add new ones at the end
    let mut idx = 0;
    while idx < state.items.len() {
        if !state.progression.is_running() {
            return;
        }
        if !overlaps(&state.player.collider, &state.items[idx].collider) {
            idx += 1;
            continue;
        }
        let (id, kind, value) = {
            let item = &state.items[idx];
            (item.id, item.kind, item.value)
        };
        let before = state.progression.level_state();
        let outcome = state
            .progression
            .on_collision(Contact::Item { kind, value }, &state.tuning);
        if outcome.consume_item {
            state.items.remove(idx);
            state.events.push(GameEvent::ItemCollected { id, kind });
        } else {
            idx += 1;
        }
        place(state, outcome.drops);
        state.sync_difficulty();
        record_transition(state, before);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::entity::{Direction, GemColor, ItemKind, Lane, MenuInput};
    use glam::Vec2;
    use proptest::prelude::*;

    fn playing(seed: u64) -> GameState {
        let mut state = GameState::new(seed).unwrap();
        state.submit_menu_input(MenuInput::Confirm);
        state
    }

    /// Put the first obstacle right on top of the player
    fn park_obstacle_on_player(state: &mut GameState) {
        let target = state.player_pos() + Vec2::new(0.0, -10.0);
        let obstacle = &mut state.pool.active_mut()[0];
        obstacle.collider.pos = target;
        obstacle.speed = 0.0;
    }

    /// Move every obstacle far off the board and stop it
    fn clear_lanes(state: &mut GameState) {
        for obstacle in state.pool.active_mut() {
            obstacle.collider.pos.x = -5000.0;
            obstacle.speed = 0.0;
        }
    }

    /// Position where an item box overlaps the player box
    fn under_player(state: &GameState) -> Vec2 {
        state.player_pos() + Vec2::new(0.0, 50.0)
    }

    #[test]
    fn test_no_tick_while_choosing() {
        let mut state = GameState::new(1).unwrap();
        tick(&mut state, SIM_DT);
        assert_eq!(state.time_ticks, 0);
        assert!(state.active_obstacles().is_empty());
    }

    #[test]
    fn test_first_tick_spawns_top_lane_obstacle() {
        let mut state = playing(1);
        tick(&mut state, SIM_DT);
        let obstacles = state.obstacle_views();
        assert_eq!(obstacles.len(), 1);
        assert_eq!(obstacles[0].lane, Lane::Top);
        assert_eq!(obstacles[0].sprite, "images/enemy-bug.png");
        assert_eq!(
            state.drain_events(),
            vec![GameEvent::ObstacleSpawned {
                id: 1,
                lane: Lane::Top,
                reused: false
            }]
        );
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut state = playing(1);
        tick(&mut state, SIM_DT);
        let before = state.obstacle_views();
        state.submit_movement(Direction::TogglePause);
        for _ in 0..30 {
            tick(&mut state, SIM_DT);
        }
        assert_eq!(state.obstacle_views(), before);
        assert_eq!(state.time_ticks, 1);

        state.submit_movement(Direction::TogglePause);
        tick(&mut state, SIM_DT);
        assert!(state.obstacle_views()[0].pos.x > before[0].pos.x);
    }

    #[test]
    fn test_moves_applied_on_tick() {
        let mut state = playing(1);
        assert!(state.submit_movement(Direction::Left));
        assert_eq!(state.player_pos(), Vec2::new(200.0, 300.0));
        tick(&mut state, SIM_DT);
        assert_eq!(state.player_pos(), Vec2::new(99.0, 300.0));
    }

    #[test]
    fn test_crossing_awards_bonus_and_resets() {
        let mut state = playing(1);
        // Keep obstacles out of the way
        tick(&mut state, SIM_DT);
        clear_lanes(&mut state);

        for _ in 0..4 {
            state.submit_movement(Direction::Up);
        }
        tick(&mut state, SIM_DT);
        assert_eq!(state.score(), 10);
        assert_eq!(state.player_pos(), Vec2::new(200.0, 300.0));
        assert!(
            state
                .drain_events()
                .contains(&GameEvent::GoalReached { score: 10 })
        );
    }

    #[test]
    fn test_crossings_raise_cap_and_power() {
        let mut state = playing(1);
        tick(&mut state, SIM_DT);
        clear_lanes(&mut state);

        for _ in 0..4 {
            for _ in 0..4 {
                state.submit_movement(Direction::Up);
            }
            tick(&mut state, SIM_DT);
        }
        assert!(state.score() >= 40);
        assert_eq!(state.pool().allowed_cap(), 4);
        assert_eq!(state.player().power_level, 1);
        assert_eq!(state.current_speed(), 130.0);
    }

    #[test]
    fn test_hazard_with_two_lives_resets_player() {
        let mut state = playing(1);
        let tuning = state.tuning().clone();
        state.progression.on_collision(Contact::Obstacle, &tuning);
        assert_eq!(state.lives(), 2);

        state.submit_movement(Direction::Left);
        tick(&mut state, SIM_DT);
        park_obstacle_on_player(&mut state);
        tick(&mut state, SIM_DT);

        assert_eq!(state.lives(), 1);
        assert_eq!(state.level_state(), LevelState::Active);
        assert_eq!(state.player_pos(), Vec2::new(200.0, 300.0));
    }

    #[test]
    fn test_hazard_on_last_life_loses_in_place() {
        let mut state = playing(1);
        let tuning = state.tuning().clone();
        state.progression.on_collision(Contact::Obstacle, &tuning);
        state.progression.on_collision(Contact::Obstacle, &tuning);
        assert_eq!(state.lives(), 1);

        state.submit_movement(Direction::Left);
        tick(&mut state, SIM_DT);
        let moved = state.player_pos();
        park_obstacle_on_player(&mut state);
        tick(&mut state, SIM_DT);

        assert_eq!(state.lives(), 0);
        assert_eq!(state.level_state(), LevelState::Lost);
        assert_eq!(state.player_pos(), moved);
        assert!(state.paused());
        assert!(state.drain_events().contains(&GameEvent::Lost));

        // Run is over, the tick does nothing
        let ticks = state.time_ticks;
        tick(&mut state, SIM_DT);
        assert_eq!(state.time_ticks, ticks);
        assert_eq!(state.lives(), 0);
    }

    #[test]
    fn test_gem_pickup_scores_and_removes_item() {
        let mut state = playing(1);
        tick(&mut state, SIM_DT);
        clear_lanes(&mut state);

        let pos = under_player(&state);
        state
            .place_drops(vec![ItemDrop {
                kind: ItemKind::Gem(GemColor::Green),
                pos,
            }])
            .unwrap();
        state.drain_events();
        tick(&mut state, SIM_DT);

        assert_eq!(state.score(), 20);
        assert!(state.items().is_empty());
        assert!(
            state
                .drain_events()
                .contains(&GameEvent::ItemCollected {
                    id: 1,
                    kind: ItemKind::Gem(GemColor::Green)
                })
        );
    }

    #[test]
    fn test_key_pickup_wins() {
        let mut state = playing(1);
        tick(&mut state, SIM_DT);
        clear_lanes(&mut state);

        let pos = under_player(&state);
        state
            .place_drops(vec![ItemDrop {
                kind: ItemKind::Key,
                pos,
            }])
            .unwrap();
        tick(&mut state, SIM_DT);
        assert_eq!(state.level_state(), LevelState::Won);
        assert!(state.paused());
        assert!(state.snapshot().paused);
        assert!(state.drain_events().contains(&GameEvent::Won));
    }

    #[test]
    fn test_item_check_sees_hazard_reset() {
        let mut state = playing(1);
        state.submit_movement(Direction::Left);
        tick(&mut state, SIM_DT);

        // The gem sits under the start point, away from the player
        let start = state.tuning().player_start;
        state
            .place_drops(vec![ItemDrop {
                kind: ItemKind::Gem(GemColor::Blue),
                pos: start + Vec2::new(0.0, 50.0),
            }])
            .unwrap();
        park_obstacle_on_player(&mut state);
        state.drain_events();
        tick(&mut state, SIM_DT);

        assert_eq!(state.lives(), 2);
        assert_eq!(state.player_pos(), start);
        assert_eq!(state.score(), 10);
        assert!(state.items().is_empty());
        let events = state.drain_events();
        let hit = events
            .iter()
            .position(|e| matches!(e, GameEvent::Hit { .. }));
        let collected = events
            .iter()
            .position(|e| matches!(e, GameEvent::ItemCollected { .. }));
        assert!(hit < collected, "{events:?}");
    }

    #[test]
    fn test_key_from_gem_collected_same_tick() {
        let mut state = playing(1);
        tick(&mut state, SIM_DT);
        clear_lanes(&mut state);

        let tuning = state.tuning().clone();
        state.progression.add_score(90, &tuning, &mut state.rng);
        assert!(!state.progression().goal_token_granted());
        state.items.clear();

        // Player box straddles both the gem and the key drop point
        state.player.collider.pos = Vec2::new(345.0, 60.0);
        state
            .place_drops(vec![ItemDrop {
                kind: ItemKind::Gem(GemColor::Orange),
                pos: Vec2::new(360.0, 130.0),
            }])
            .unwrap();
        state.drain_events();
        tick(&mut state, SIM_DT);

        assert_eq!(state.score(), 120);
        assert_eq!(state.level_state(), LevelState::Won);
        assert!(state.items().iter().all(|i| i.kind != ItemKind::Key));
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::ItemCollected {
            id: 2,
            kind: ItemKind::Key
        }));
        assert!(events.contains(&GameEvent::Won));
    }

    #[test]
    fn test_obstacle_recycled_after_pass() {
        let mut state = playing(1);
        // Obstacles cross the 603-unit field in ~6 s at 100 u/s
        for _ in 0..(8 * 60) {
            tick(&mut state, SIM_DT);
            // Keep the player safe at the bottom edge
            state.player.collider.pos = Vec2::new(-5000.0, 5000.0);
        }
        let events = state.drain_events();
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::ObstacleRetired { .. }))
        );
        assert!(!state.active_obstacles().is_empty());
        assert!(state.pool().created_count() <= 2);
    }

    proptest! {
        #[test]
        fn prop_run_invariants(
            seed in any::<u64>(),
            moves in prop::collection::vec(0u8..5, 0..400),
        ) {
            let mut state = playing(seed);
            let mut losses = 0;
            for m in moves {
                let direction = match m {
                    0 => Direction::Up,
                    1 => Direction::Down,
                    2 => Direction::Left,
                    3 => Direction::Right,
                    _ => Direction::TogglePause,
                };
                state.submit_movement(direction);
                for _ in 0..5 {
                    tick(&mut state, SIM_DT);
                }
                losses += state
                    .drain_events()
                    .iter()
                    .filter(|e| **e == GameEvent::Lost)
                    .count();

                prop_assert!(state.active_obstacles().len() <= state.pool().allowed_cap());
                if state.progression.is_running() {
                    prop_assert!(!state.active_obstacles().is_empty());
                }
                let keys = state.items().iter().filter(|i| i.kind == ItemKind::Key).count();
                prop_assert!(keys <= 1);
            }
            prop_assert!(losses <= 1);
            prop_assert_eq!(losses == 1, state.level_state() == LevelState::Lost);
        }
    }
}
