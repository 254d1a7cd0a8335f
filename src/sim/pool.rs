//! Obstacle population control
//!
//! Obstacles are never dropped during a run. They live in exactly one of two
//! sets: `active` (moving and collidable) or `inactive` (parked for reuse).
//! New obstacles are only built while the creation budget allows; otherwise
//! the pool recycles what it already has.
//!
//! How an obstacle is built and when it asks to leave the field are
//! strategies ([`Spawner`], [`Retirer`]) handed to the pool at construction.

use std::fmt;

use super::collision::CollisionBox;
use super::entity::{Lane, Obstacle};
use crate::error::{SimError, SimResult};
use crate::tuning::Tuning;

/// Builds and refits obstacles
pub trait Spawner {
    /// Build a brand-new obstacle at the start of `lane`
    fn create(&mut self, id: u32, lane: Lane, speed: f32) -> Obstacle;
    /// Prepare a parked obstacle for another pass along `lane`
    fn refit(&mut self, obstacle: &mut Obstacle, lane: Lane, speed: f32);
}

/// Decides when an active obstacle signals the pool
pub trait Retirer {
    /// The obstacle has finished its pass and should be parked
    fn should_retire(&self, obstacle: &Obstacle) -> bool;
    /// On a spawn broadcast, whether the obstacle has travelled far enough
    /// to ask for another one
    fn wants_company(&self, obstacle: &Obstacle) -> bool;
}

/// Default spawner: obstacles enter at the left travel limit of their lane
#[derive(Debug, Clone)]
pub struct LaneSpawner {
    collider: CollisionBox,
    tuning: Tuning,
}

impl LaneSpawner {
    pub fn new(tuning: &Tuning) -> SimResult<Self> {
        Ok(Self {
            collider: tuning.obstacle_box.to_box()?,
            tuning: tuning.clone(),
        })
    }
}

impl Spawner for LaneSpawner {
    fn create(&mut self, id: u32, lane: Lane, speed: f32) -> Obstacle {
        Obstacle::new(id, lane, speed, self.collider, &self.tuning)
    }

    fn refit(&mut self, obstacle: &mut Obstacle, lane: Lane, speed: f32) {
        obstacle.speed = speed;
        obstacle.place(lane, &self.tuning);
    }
}

/// Default retirer: park at the right limit, ask for company past a fixed x
#[derive(Debug, Clone, Copy)]
pub struct LaneRetirer {
    pub spawn_trigger_x: f32,
}

impl Retirer for LaneRetirer {
    fn should_retire(&self, obstacle: &Obstacle) -> bool {
        obstacle.past_right_limit()
    }

    fn wants_company(&self, obstacle: &Obstacle) -> bool {
        obstacle.pos().x > self.spawn_trigger_x
    }
}

/// What a spawn attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    /// A parked obstacle went back on the field
    Reused(u32),
    /// A new obstacle was built
    Created(u32),
    /// Nothing parked and the creation budget is spent
    Throttled,
}

/// Signal raised by an active obstacle while advancing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolSignal {
    SpawnRequest { from: u32, lane: Lane },
    Retire(u32),
}

/// Active/inactive obstacle partition plus spawn bookkeeping
pub struct ObstaclePool {
    active: Vec<Obstacle>,
    inactive: Vec<Obstacle>,
    allowed_cap: usize,
    created: usize,
    next_lane: Lane,
    next_id: u32,
    broadcast_every: u32,
    spawner: Box<dyn Spawner>,
    retirer: Box<dyn Retirer>,
}

impl fmt::Debug for ObstaclePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObstaclePool")
            .field("active", &self.active)
            .field("inactive", &self.inactive)
            .field("allowed_cap", &self.allowed_cap)
            .field("created", &self.created)
            .field("next_lane", &self.next_lane)
            .finish_non_exhaustive()
    }
}

impl ObstaclePool {
    pub fn new(
        allowed_cap: usize,
        broadcast_every: u32,
        spawner: Box<dyn Spawner>,
        retirer: Box<dyn Retirer>,
    ) -> Self {
        Self {
            active: Vec::new(),
            inactive: Vec::new(),
            allowed_cap,
            created: 0,
            next_lane: Lane::Top,
            next_id: 1,
            broadcast_every: broadcast_every.max(1),
            spawner,
            retirer,
        }
    }

    /// Pool with the default lane strategies and the starting cap
    pub fn from_tuning(tuning: &Tuning) -> SimResult<Self> {
        Ok(Self::new(
            tuning.band_for(0).enemy_cap,
            tuning.step_broadcast,
            Box::new(LaneSpawner::new(tuning)?),
            Box::new(LaneRetirer {
                spawn_trigger_x: tuning.spawn_trigger_x,
            }),
        ))
    }

    pub fn active(&self) -> &[Obstacle] {
        &self.active
    }

    #[cfg(test)]
    pub(crate) fn active_mut(&mut self) -> &mut [Obstacle] {
        &mut self.active
    }

    pub fn inactive_len(&self) -> usize {
        self.inactive.len()
    }

    pub fn created_count(&self) -> usize {
        self.created
    }

    pub fn allowed_cap(&self) -> usize {
        self.allowed_cap
    }

    pub fn next_lane(&self) -> Lane {
        self.next_lane
    }

    pub fn set_allowed_cap(&mut self, cap: usize) {
        if cap != self.allowed_cap {
            log::debug!("Obstacle cap {} -> {}", self.allowed_cap, cap);
            self.allowed_cap = cap;
        }
    }

    fn take_lane(&mut self) -> Lane {
        let lane = self.next_lane;
        self.next_lane = lane.next();
        lane
    }

    fn create(&mut self, speed: f32) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        let lane = self.take_lane();
        let obstacle = self.spawner.create(id, lane, speed);
        self.active.push(obstacle);
        self.created += 1;
        id
    }

    fn reuse(&mut self, speed: f32) -> Option<u32> {
        let mut obstacle = self.inactive.pop()?;
        let lane = self.take_lane();
        self.spawner.refit(&mut obstacle, lane, speed);
        let id = obstacle.id;
        self.active.push(obstacle);
        Some(id)
    }

    /// Keep at least one obstacle on the field
    pub fn tick(&mut self, speed: f32) -> Option<SpawnOutcome> {
        if !self.active.is_empty() {
            return None;
        }
        let outcome = match self.reuse(speed) {
            Some(id) => SpawnOutcome::Reused(id),
            None => SpawnOutcome::Created(self.create(speed)),
        };
        log::debug!("Field empty, forced spawn: {:?}", outcome);
        Some(outcome)
    }

    /// Move every active obstacle and collect the signals they raise
    pub fn advance(&mut self, dt: f32) -> Vec<PoolSignal> {
        let mut signals = Vec::new();
        for obstacle in &mut self.active {
            if obstacle.advance(dt, self.broadcast_every) && self.retirer.wants_company(obstacle) {
                signals.push(PoolSignal::SpawnRequest {
                    from: obstacle.id,
                    lane: obstacle.lane,
                });
            }
            if self.retirer.should_retire(obstacle) {
                signals.push(PoolSignal::Retire(obstacle.id));
            }
        }
        signals
    }

    /// Put another obstacle on the field if the pool can.
    ///
    /// Parked obstacles are reused first. A new one is only built while
    /// fewer than `allowed_cap - 1` have been created this run, which keeps
    /// one slot for recycling.
    pub fn request_spawn(&mut self, trigger: Lane, speed: f32) -> SpawnOutcome {
        if let Some(id) = self.reuse(speed) {
            log::debug!("Spawn from {:?}: reused obstacle {}", trigger, id);
            return SpawnOutcome::Reused(id);
        }
        if self.created < self.allowed_cap.saturating_sub(1) {
            let id = self.create(speed);
            log::debug!("Spawn from {:?}: created obstacle {}", trigger, id);
            return SpawnOutcome::Created(id);
        }
        log::trace!("Spawn from {:?} throttled at cap {}", trigger, self.allowed_cap);
        SpawnOutcome::Throttled
    }

    /// Park an active obstacle
    pub fn retire(&mut self, id: u32) -> SimResult<()> {
        let idx = self
            .active
            .iter()
            .position(|o| o.id == id)
            .ok_or(SimError::ObstacleNotActive(id))?;
        let obstacle = self.active.remove(idx);
        self.inactive.push(obstacle);
        log::debug!("Retired obstacle {}", id);
        Ok(())
    }
}
