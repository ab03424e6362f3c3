#![allow(dead_code)]

use bevy_ecs::prelude::World;
use bevy_ecs::schedule::Schedule;
use signal_core::runner::{initialize_simulation, run_tick, run_ticks, tick_schedule};

/// Helper that owns a reusable tick `Schedule` so tests can step or drain a run.
pub struct ScheduleRunner {
    schedule: Schedule,
}

impl Default for ScheduleRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleRunner {
    /// Create a runner with the default tick schedule.
    pub fn new() -> Self {
        Self {
            schedule: tick_schedule(),
        }
    }

    /// Run tick 0 (first arrivals and the initial green).
    pub fn start(&mut self, world: &mut World) {
        initialize_simulation(world);
    }

    /// Run a single tick (returns `true` if the tick ran).
    pub fn run_one(&mut self, world: &mut World) -> bool {
        run_tick(world, &mut self.schedule)
    }

    /// Run up to `max_ticks`, returning the number of ticks executed.
    pub fn run_ticks(&mut self, world: &mut World, max_ticks: u64) -> u64 {
        run_ticks(world, &mut self.schedule, max_ticks)
    }

    /// Start the run and drive it to its end tick.
    pub fn run_full(&mut self, world: &mut World) -> u64 {
        self.start(world);
        self.run_ticks(world, u64::MAX)
    }
}
