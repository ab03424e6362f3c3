use bevy_ecs::prelude::{Res, ResMut};

use crate::clock::SimulationClock;
use crate::incidents::{IncidentEvent, IncidentInjector, IncidentLog, IncidentRecord};
use crate::predictor::RecentSnapshots;
use crate::queues::VehicleQueues;
use crate::scenario::UpdateIntervalSecs;
use crate::snapshot::{CurrentSnapshot, SnapshotSourceResource};

/// Condition: the current tick is an arrival refresh tick.
pub fn is_arrival_tick(
    clock: Option<Res<SimulationClock>>,
    interval: Option<Res<UpdateIntervalSecs>>,
) -> bool {
    match (clock, interval) {
        (Some(clock), Some(interval)) => clock.now() % interval.0.max(1) == 0,
        _ => false,
    }
}

/// Pull a fresh snapshot and add its counts to the queues.
///
/// When an injector is present it may first open an ambient incident in the source.
pub fn arrivals_system(
    clock: Res<SimulationClock>,
    mut source: ResMut<SnapshotSourceResource>,
    mut queues: ResMut<VehicleQueues>,
    mut current: ResMut<CurrentSnapshot>,
    mut recent: ResMut<RecentSnapshots>,
    injector: Option<ResMut<IncidentInjector>>,
    log_res: Option<ResMut<IncidentLog>>,
) {
    let now = clock.now();

    if let Some(mut injector) = injector {
        if let Some(book) = source.ambient_incidents_mut() {
            if let Some(incident) = injector.maybe_open_ambient(book, now) {
                let queued = u32::try_from(queues.counts().total()).unwrap_or(u32::MAX);
                if let Some(mut incident_log) = log_res {
                    incident_log.records.push(IncidentRecord {
                        tick: now,
                        event: IncidentEvent::AmbientOpened,
                        direction: None,
                        queue_before: queued,
                        queue_after: queued,
                        ambient_id: Some(incident.id),
                    });
                }
            }
        }
    }

    let snapshot = source.next_snapshot(now);
    queues.add_arrivals(&snapshot.vehicle_counts);
    log::debug!(
        "tick {now}: arrivals {:?}, queues {:?}",
        snapshot.vehicle_counts,
        queues.counts()
    );
    recent.push(snapshot.clone());
    current.0 = Some(snapshot);
}
