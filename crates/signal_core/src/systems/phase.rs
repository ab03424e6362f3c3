//! Phase scheduler: the four-state signal machine
//! `NS green → NS yellow → EW green → EW yellow → NS green`.
//!
//! Every interval start appends one [PhaseRecord] carrying the queues at that instant.

use bevy_ecs::prelude::{Res, ResMut};

use crate::clock::SimulationClock;
use crate::intersection::{Phase, SignalState};
use crate::predictor::{PredictorResource, RecentSnapshots};
use crate::queues::VehicleQueues;
use crate::snapshot::{CurrentSnapshot, SnapshotSourceResource};
use crate::strategy::ActiveStrategy;
use crate::telemetry::{PhaseHistory, PhaseRecord, SimTelemetry};

fn record_interval(clock: &SimulationClock, queues: &VehicleQueues, history: &mut PhaseHistory) {
    history.push(PhaseRecord {
        timestamp: clock.now(),
        phase: clock.current_phase(),
        state: clock.current_state(),
        duration: clock.phase_duration(),
        vehicle_counts: queues.counts(),
    });
}

/// Enter the initial north-south green using the strategy's first calculation.
pub fn signal_start_system(
    mut clock: ResMut<SimulationClock>,
    mut strategy: ResMut<ActiveStrategy>,
    current: Res<CurrentSnapshot>,
    queues: Res<VehicleQueues>,
    mut history: ResMut<PhaseHistory>,
) {
    let times = strategy.calculate_phase_times(current.0.as_ref());
    let green = times.get(Phase::NorthSouth).green;
    clock.enter(Phase::NorthSouth, SignalState::Green, u64::from(green));
    record_interval(&clock, &queues, &mut history);
    log::info!(
        "Signal started: {} {} for {green}s ({} strategy)",
        Phase::NorthSouth.name(),
        SignalState::Green.name(),
        strategy.kind()
    );
}

/// Condition: the active interval has run its full duration.
pub fn is_phase_expired(clock: Option<Res<SimulationClock>>) -> bool {
    clock.map(|c| c.phase_expired()).unwrap_or(false)
}

/// Close the expired interval and open the next one.
///
/// Green closes into yellow for the same pair. Yellow closes into green for the other
/// pair, with a fresh snapshot observed from the source and the strategy consulted.
#[allow(clippy::too_many_arguments)]
pub fn phase_transition_system(
    mut clock: ResMut<SimulationClock>,
    mut strategy: ResMut<ActiveStrategy>,
    mut source: ResMut<SnapshotSourceResource>,
    mut current: ResMut<CurrentSnapshot>,
    mut recent: ResMut<RecentSnapshots>,
    predictor: Option<Res<PredictorResource>>,
    queues: Res<VehicleQueues>,
    mut history: ResMut<PhaseHistory>,
    mut telemetry: ResMut<SimTelemetry>,
) {
    if !clock.phase_expired() {
        return;
    }
    let now = clock.now();
    let phase = clock.current_phase();

    match clock.current_state() {
        SignalState::Green => {
            let yellow = strategy.yellow_time();
            clock.enter(phase, SignalState::Yellow, u64::from(yellow));
        }
        SignalState::Yellow => {
            let next = phase.other();
            let snapshot = source.next_snapshot(now);
            let prediction = match &predictor {
                Some(predictor) if strategy.uses_prediction() => {
                    predictor.predict(recent.as_slice())
                }
                _ => None,
            };
            let times =
                strategy.calculate_phase_times_with_prediction(Some(&snapshot), prediction.as_ref());
            current.0 = Some(snapshot);
            clock.enter(next, SignalState::Green, u64::from(times.get(next).green));
        }
    }

    record_interval(&clock, &queues, &mut history);
    telemetry.phase_changes += 1;
    log::info!(
        "Phase changed to {}, {} for {}s at tick {now}",
        clock.current_phase().name(),
        clock.current_state().name(),
        clock.phase_duration()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};

    use crate::intersection::DirectionCounts;
    use crate::snapshot::ConstantSnapshotSource;
    use crate::strategy::{StrategyConfig, StrategyKind, TimingStrategy};

    fn world(kind: StrategyKind) -> World {
        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        world.insert_resource(ActiveStrategy(TimingStrategy::new(
            kind,
            &StrategyConfig::default(),
        )));
        world.insert_resource(SnapshotSourceResource::new(Box::new(
            ConstantSnapshotSource::new(DirectionCounts::new(10, 10, 2, 2), 5),
        )));
        world.insert_resource(CurrentSnapshot::default());
        world.insert_resource(RecentSnapshots::default());
        world.insert_resource(VehicleQueues::default());
        world.insert_resource(PhaseHistory::default());
        world.insert_resource(SimTelemetry::default());
        world
    }

    #[test]
    fn cycles_through_four_states() {
        let mut world = world(StrategyKind::Fixed);
        let mut start = Schedule::default();
        start.add_systems(signal_start_system);
        start.run(&mut world);

        let mut schedule = Schedule::default();
        schedule.add_systems(phase_transition_system);
        for _ in 0..66 {
            world.resource_mut::<SimulationClock>().advance();
            schedule.run(&mut world);
        }

        let states: Vec<(Phase, SignalState, u64, u64)> = world
            .resource::<PhaseHistory>()
            .records()
            .iter()
            .map(|r| (r.phase, r.state, r.timestamp, r.duration))
            .collect();
        assert_eq!(
            states,
            vec![
                (Phase::NorthSouth, SignalState::Green, 0, 30),
                (Phase::NorthSouth, SignalState::Yellow, 30, 3),
                (Phase::EastWest, SignalState::Green, 33, 30),
                (Phase::EastWest, SignalState::Yellow, 63, 3),
                (Phase::NorthSouth, SignalState::Green, 66, 30),
            ]
        );
        assert_eq!(world.resource::<SimTelemetry>().phase_changes, 4);
    }

    #[test]
    fn yellow_boundary_observes_fresh_snapshot() {
        let mut world = world(StrategyKind::Proportional);
        let mut start = Schedule::default();
        start.add_systems(signal_start_system);
        start.run(&mut world);
        // No snapshot yet: proportional splits evenly.
        let first = world.resource::<SimulationClock>().phase_duration();
        assert_eq!(first, 42);

        let mut schedule = Schedule::default();
        schedule.add_systems(phase_transition_system);
        while world.resource::<PhaseHistory>().len() < 3 {
            world.resource_mut::<SimulationClock>().advance();
            schedule.run(&mut world);
        }
        let current = world.resource::<CurrentSnapshot>();
        assert!(current.0.is_some());
        // 20 vs 4 vehicles -> east-west gets the 0.3 floor of 84s.
        let last = world.resource::<PhaseHistory>().last().cloned().expect("record");
        assert_eq!(last.phase, Phase::EastWest);
        assert_eq!(last.duration, 25);
    }
}
