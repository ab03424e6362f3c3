use bevy_ecs::prelude::{Res, ResMut};

use crate::clock::SimulationClock;
use crate::incidents::{IncidentInjector, IncidentLog};
use crate::queues::VehicleQueues;

/// Condition: an injector is configured.
pub fn has_incident_injector(injector: Option<Res<IncidentInjector>>) -> bool {
    injector.is_some()
}

/// Roll for one incident this tick and apply it to the queues.
pub fn incident_injection_system(
    clock: Res<SimulationClock>,
    mut injector: ResMut<IncidentInjector>,
    mut queues: ResMut<VehicleQueues>,
    mut incident_log: ResMut<IncidentLog>,
) {
    let Some((kind, direction)) = injector.roll() else {
        return;
    };
    let record = injector.inject(kind, direction, &mut queues, clock.now());
    incident_log.records.push(record);
}

/// Apply every accident restore that has come due.
pub fn accident_recovery_system(
    clock: Res<SimulationClock>,
    mut injector: ResMut<IncidentInjector>,
    mut queues: ResMut<VehicleQueues>,
    mut incident_log: ResMut<IncidentLog>,
) {
    let cleared = injector.recover_due(&mut queues, clock.now());
    incident_log.records.extend(cleared);
}
