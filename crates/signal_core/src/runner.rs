//! Simulation runner: advances the clock one tick at a time and runs the tick schedule.
//!
//! Clock progression happens here, outside systems. Each step advances the clock by one
//! second, then runs the systems in a fixed order on a single thread:
//! arrivals → incident injection → vehicle processing → phase transition → accident recovery.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bevy_ecs::prelude::{Schedule, World};
use bevy_ecs::schedule::{ExecutorKind, IntoSystemConfigs};

use crate::clock::SimulationClock;
use crate::queues::VehicleQueues;
use crate::scenario::SimulationEndTick;
use crate::strategy::ActiveStrategy;
use crate::systems::{
    arrivals::{arrivals_system, is_arrival_tick},
    incidents::{accident_recovery_system, has_incident_injector, incident_injection_system},
    phase::{is_phase_expired, phase_transition_system, signal_start_system},
    processing::vehicle_processing_system,
};
use crate::telemetry::{SignalView, SimTelemetry};

/// Builds the per-tick schedule. Systems are chained so their order is fixed.
pub fn tick_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            arrivals_system.run_if(is_arrival_tick),
            incident_injection_system.run_if(has_incident_injector),
            vehicle_processing_system,
            phase_transition_system.run_if(is_phase_expired),
            accident_recovery_system.run_if(has_incident_injector),
        )
            .chain(),
    );
    schedule
}

/// Tick 0: first arrivals, then the initial north-south green.
/// Call this after building the scenario and before running ticks.
pub fn initialize_simulation(world: &mut World) {
    let mut start = Schedule::default();
    start.set_executor_kind(ExecutorKind::SingleThreaded);
    start.add_systems(
        (
            arrivals_system.run_if(is_arrival_tick),
            signal_start_system,
        )
            .chain(),
    );
    start.run(world);
}

/// Runs one tick. Returns `false` without running when the clock has reached
/// [SimulationEndTick] (when that resource is present).
pub fn run_tick(world: &mut World, schedule: &mut Schedule) -> bool {
    run_tick_with_hook(world, schedule, |_| {})
}

/// Runs one tick and invokes `hook` after the schedule completes.
pub fn run_tick_with_hook<F>(world: &mut World, schedule: &mut Schedule, mut hook: F) -> bool
where
    F: FnMut(&World),
{
    if reached_end(world) {
        return false;
    }

    world.resource_mut::<SimulationClock>().advance();
    schedule.run(world);
    hook(world);
    true
}

fn reached_end(world: &World) -> bool {
    match world.get_resource::<SimulationEndTick>() {
        Some(end) => world.resource::<SimulationClock>().now() >= end.0,
        None => false,
    }
}

/// Runs ticks until the end tick or `max_ticks` is reached. Returns the number of ticks run.
pub fn run_ticks(world: &mut World, schedule: &mut Schedule, max_ticks: u64) -> u64 {
    let mut ticks = 0;
    while ticks < max_ticks && run_tick(world, schedule) {
        ticks += 1;
    }
    ticks
}

/// Cooperative cancellation flag, polled once per tick.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Sleep between ticks. Pacing only; results are identical without it.
    pub tick_delay: Option<Duration>,
    pub stop: StopSignal,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub ticks: u64,
    pub interrupted: bool,
}

/// Runs until the end tick, or until the stop signal is observed between ticks.
/// A tick that has started always completes, and a run that reached its end tick is
/// never reported as interrupted.
pub fn run_simulation<F>(
    world: &mut World,
    schedule: &mut Schedule,
    options: &RunOptions,
    mut observer: F,
) -> RunOutcome
where
    F: FnMut(&SignalView),
{
    let mut ticks = 0;
    let interrupted = loop {
        if reached_end(world) {
            break false;
        }
        if options.stop.is_stopped() {
            break true;
        }
        run_tick_with_hook(world, schedule, |world| {
            if let Some(view) = signal_view(world) {
                observer(&view);
            }
        });
        ticks += 1;
        if let Some(delay) = options.tick_delay {
            std::thread::sleep(delay);
        }
    };

    let now = world.resource::<SimulationClock>().now();
    if interrupted {
        log::warn!("Simulation interrupted after {now} ticks");
    } else {
        log::info!("Simulation finished at tick {now}");
    }
    RunOutcome { ticks, interrupted }
}

/// Read-only view of the current state, or `None` if the world was not built as a scenario.
pub fn signal_view(world: &World) -> Option<SignalView> {
    let clock = world.get_resource::<SimulationClock>()?;
    let strategy = world.get_resource::<ActiveStrategy>()?;
    let queues = world.get_resource::<VehicleQueues>()?;
    let telemetry = world.get_resource::<SimTelemetry>()?;
    Some(SignalView {
        strategy_name: strategy.kind().name().to_string(),
        elapsed_ticks: clock.now(),
        current_phase: clock.current_phase(),
        current_state: clock.current_state(),
        time_remaining_in_phase: clock.time_remaining(),
        queue_snapshot: queues.counts(),
        avg_wait_time: telemetry.average_wait_time(),
        throughput: telemetry.throughput(clock.now()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intersection::DirectionCounts;
    use crate::scenario::{build_scenario, ScenarioParams};
    use crate::snapshot::TrafficSourceKind;
    use crate::strategy::StrategyKind;
    use crate::telemetry::PhaseHistory;

    fn scenario(duration: u64) -> ScenarioParams {
        ScenarioParams::default()
            .with_strategy(StrategyKind::Fixed)
            .with_duration_secs(duration)
            .with_incidents(false)
            .with_traffic_source(TrafficSourceKind::Constant(DirectionCounts::splat(2)))
    }

    #[test]
    fn stops_at_end_tick() {
        let mut world = World::new();
        build_scenario(&mut world, scenario(50));
        initialize_simulation(&mut world);
        let mut schedule = tick_schedule();
        let ticks = run_ticks(&mut world, &mut schedule, 1000);
        assert_eq!(ticks, 50);
        assert_eq!(world.resource::<SimulationClock>().now(), 50);
        assert!(!run_tick(&mut world, &mut schedule));
    }

    #[test]
    fn stop_signal_ends_run_between_ticks() {
        let mut world = World::new();
        build_scenario(&mut world, scenario(500));
        initialize_simulation(&mut world);
        let mut schedule = tick_schedule();
        let options = RunOptions::default();
        let stop = options.stop.clone();
        let outcome = run_simulation(&mut world, &mut schedule, &options, |view| {
            if view.elapsed_ticks == 40 {
                stop.stop();
            }
        });
        assert_eq!(
            outcome,
            RunOutcome {
                ticks: 40,
                interrupted: true
            }
        );
        assert_eq!(world.resource::<SimulationClock>().now(), 40);
    }

    #[test]
    fn stop_during_final_tick_is_not_an_interruption() {
        let mut world = World::new();
        build_scenario(&mut world, scenario(30));
        initialize_simulation(&mut world);
        let mut schedule = tick_schedule();
        let options = RunOptions::default();
        let stop = options.stop.clone();
        let outcome = run_simulation(&mut world, &mut schedule, &options, |view| {
            if view.elapsed_ticks == 30 {
                stop.stop();
            }
        });
        assert_eq!(
            outcome,
            RunOutcome {
                ticks: 30,
                interrupted: false
            }
        );
    }

    #[test]
    fn tick_delay_does_not_change_results() {
        let run = |tick_delay: Option<Duration>| {
            let mut world = World::new();
            build_scenario(
                &mut world,
                ScenarioParams::default()
                    .with_seed(8)
                    .with_strategy(StrategyKind::Webster)
                    .with_duration_secs(20),
            );
            initialize_simulation(&mut world);
            let mut schedule = tick_schedule();
            let options = RunOptions {
                tick_delay,
                ..RunOptions::default()
            };
            let outcome = run_simulation(&mut world, &mut schedule, &options, |_| {});
            assert_eq!(outcome.ticks, 20);
            (
                world.resource::<VehicleQueues>().counts(),
                world.resource::<SimTelemetry>().processed_vehicles,
                world.resource::<SimTelemetry>().total_wait_time,
                world.resource::<PhaseHistory>().records().to_vec(),
            )
        };
        assert_eq!(run(Some(Duration::from_millis(1))), run(None));
    }

    #[test]
    fn observer_does_not_change_results() {
        let run = |observe: bool| {
            let mut world = World::new();
            build_scenario(
                &mut world,
                ScenarioParams::default()
                    .with_seed(3)
                    .with_strategy(StrategyKind::Adaptive)
                    .with_duration_secs(200),
            );
            initialize_simulation(&mut world);
            let mut schedule = tick_schedule();
            let mut seen = 0;
            run_simulation(&mut world, &mut schedule, &RunOptions::default(), |_| {
                if observe {
                    seen += 1;
                }
            });
            assert_eq!(seen, if observe { 200 } else { 0 });
            (
                world.resource::<SimTelemetry>().processed_vehicles,
                world.resource::<PhaseHistory>().records().to_vec(),
            )
        };
        assert_eq!(run(true), run(false));
    }
}
