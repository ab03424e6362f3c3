use bevy_ecs::prelude::{Res, ResMut};

use crate::clock::SimulationClock;
use crate::queues::VehicleQueues;
use crate::telemetry::{FlowRates, SimTelemetry};

/// Drain the active pair at the state's flow rate and charge wait time to the inactive pair.
pub fn vehicle_processing_system(
    clock: Res<SimulationClock>,
    rates: Res<FlowRates>,
    mut queues: ResMut<VehicleQueues>,
    mut telemetry: ResMut<SimTelemetry>,
) {
    let phase = clock.current_phase();
    let rate = rates.for_state(clock.current_state());

    let mut processed = 0_u64;
    for direction in phase.directions() {
        processed += u64::from(queues.drain(direction, rate));
    }
    telemetry.processed_vehicles += processed;

    for direction in phase.other().directions() {
        telemetry.total_wait_time += u64::from(queues.get(direction));
    }

    log::trace!(
        "tick {}: processed {processed} on {} ({})",
        clock.now(),
        phase.name(),
        clock.current_state().name()
    );
}
