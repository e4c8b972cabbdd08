//! Snowflake emitter
//!
//! Two states, `Stopped` and `Running`. Every entry into `Running` opens a new
//! generation; spawn and retire timers carry the generation that scheduled
//! them, so leaving `Running` cancels both loops without touching the host's
//! timer queue. A stale spawn tick does not reschedule, which ends the loop.
//!
//! The first spawn tick is a 0ms timer like every later one, so spawn errors
//! always surface through the host's timer callback, never through `start`.

use std::collections::BTreeSet;

use crate::config::SnowSettings;
use crate::constants::MAX_SNOWFLAKES;
use crate::error::SnowError;
use crate::flake::{Flake, FlakeId};
use crate::stage::{Stage, Timer};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmitterState {
    Stopped,
    Running { generation: u64 },
}

/// What a delivered timer did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fired {
    Spawned(FlakeId),
    /// Admission cap reached; the loop keeps ticking.
    Saturated,
    Retired(FlakeId),
    /// Timer from a generation that is no longer running.
    Stale,
}

pub struct Emitter<S: Stage> {
    stage: S,
    state: EmitterState,
    generation: u64,
    next_flake: u64,
    live: BTreeSet<FlakeId>,
}

impl<S: Stage> Emitter<S> {
    pub fn new(stage: S) -> Self {
        Self {
            stage,
            state: EmitterState::Stopped,
            generation: 0,
            next_flake: 0,
            live: BTreeSet::new(),
        }
    }

    pub fn state(&self) -> EmitterState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, EmitterState::Running { .. })
    }

    pub fn active_count(&self) -> usize {
        self.live.len()
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut S {
        &mut self.stage
    }

    /// Starts emitting. Restarts with `settings` when already running.
    ///
    /// Fails only when the run could not begin; the emitter is then stopped.
    pub fn start(&mut self, settings: &SnowSettings) -> Result<(), SnowError> {
        if self.is_running() {
            return self.restart(settings);
        }
        self.enter_running(settings)
    }

    /// Tears down the current run, then starts a fresh one.
    pub fn restart(&mut self, settings: &SnowSettings) -> Result<(), SnowError> {
        self.halt();
        self.enter_running(settings)
    }

    /// Removes the overlay and every live flake. Returns `false` if already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.halt();
        true
    }

    /// Handles a timer scheduled by this emitter.
    pub fn fire(&mut self, timer: Timer, settings: &SnowSettings) -> Result<Fired, SnowError> {
        match timer {
            Timer::Spawn { generation } => self.spawn_tick(generation, settings),
            Timer::Retire { generation, flake } => Ok(self.retire(generation, flake)),
        }
    }

    fn enter_running(&mut self, settings: &SnowSettings) -> Result<(), SnowError> {
        self.live.clear();
        self.stage.mount_overlay(settings)?;

        self.generation += 1;
        let generation = self.generation;
        if let Err(err) = self.stage.schedule(0, Timer::Spawn { generation }) {
            self.stage.unmount_overlay();
            return Err(err);
        }

        self.state = EmitterState::Running { generation };
        Ok(())
    }

    fn halt(&mut self) {
        self.state = EmitterState::Stopped;
        self.stage.unmount_overlay();
        self.live.clear();
    }

    fn is_current(&self, generation: u64) -> bool {
        self.state == EmitterState::Running { generation }
    }

    fn spawn_tick(&mut self, generation: u64, settings: &SnowSettings) -> Result<Fired, SnowError> {
        if !self.is_current(generation) {
            return Ok(Fired::Stale);
        }

        let spawned = if self.live.len() >= MAX_SNOWFLAKES {
            Ok(Fired::Saturated)
        } else {
            self.spawn(generation, settings)
        };

        self.stage
            .schedule(settings.frequency, Timer::Spawn { generation })?;
        spawned
    }

    fn spawn(&mut self, generation: u64, settings: &SnowSettings) -> Result<Fired, SnowError> {
        let id = FlakeId(self.next_flake);
        self.next_flake += 1;

        let now = self.stage.now();
        let viewport = self.stage.viewport();
        let stage = &mut self.stage;
        let flake = Flake::roll(id, now, settings, viewport, || stage.random());

        self.live.insert(id);
        if let Err(err) = self.stage.add_flake(&flake, settings) {
            self.live.remove(&id);
            return Err(err);
        }

        let retire = Timer::Retire {
            generation,
            flake: id,
        };
        if let Err(err) = self.stage.schedule(flake.duration_ms, retire) {
            self.live.remove(&id);
            self.stage.remove_flake(id);
            return Err(err);
        }
        Ok(Fired::Spawned(id))
    }

    fn retire(&mut self, generation: u64, id: FlakeId) -> Fired {
        if !self.is_current(generation) || !self.live.remove(&id) {
            return Fired::Stale;
        }
        self.stage.remove_flake(id);
        Fired::Retired(id)
    }
}
