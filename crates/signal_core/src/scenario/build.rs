use bevy_ecs::prelude::World;

use crate::clock::SimulationClock;
use crate::generator::TrafficGenerator;
use crate::incidents::{IncidentInjector, IncidentLog};
use crate::predictor::{MovingAveragePredictor, PredictorResource, RecentSnapshots};
use crate::queues::VehicleQueues;
use crate::scenario::params::{ScenarioParams, SimulationEndTick, UpdateIntervalSecs};
use crate::snapshot::{
    ConstantSnapshotSource, CurrentSnapshot, SnapshotSourceResource, TrafficSnapshotSource,
    TrafficSourceKind,
};
use crate::strategy::{ActiveStrategy, StrategyConfig, StrategyKind, TimingStrategy};
use crate::telemetry::{PhaseHistory, SimTelemetry};

/// Salt so the injector and the traffic source never share a random stream.
const INJECTOR_SEED_SALT: u64 = 0x5eed_1c1d;

pub fn create_strategy(kind: StrategyKind, config: &StrategyConfig) -> ActiveStrategy {
    ActiveStrategy(TimingStrategy::new(kind, config))
}

pub fn create_snapshot_source(params: &ScenarioParams) -> Box<dyn TrafficSnapshotSource> {
    let window_secs = params.update_interval_secs.max(1);
    match params.traffic_source {
        TrafficSourceKind::Generated => Box::new(TrafficGenerator::new(
            params.traffic.clone(),
            window_secs,
            params.epoch_ms,
            params.seed,
        )),
        TrafficSourceKind::Constant(counts) => {
            Box::new(ConstantSnapshotSource::new(counts, window_secs))
        }
    }
}

/// Insert every resource a run needs.
///
/// The injector is only inserted when incidents are enabled. A predictor is only
/// inserted when requested; it is consulted by the adaptive strategy alone.
pub fn build_scenario(world: &mut World, params: ScenarioParams) {
    let update_interval = params.update_interval_secs.max(1);

    world.insert_resource(SimulationClock::with_epoch(params.epoch_ms));
    world.insert_resource(SimulationEndTick(params.duration_secs));
    world.insert_resource(UpdateIntervalSecs(update_interval));
    world.insert_resource(create_strategy(params.strategy, &params.strategy_config));
    world.insert_resource(SnapshotSourceResource::new(create_snapshot_source(&params)));
    world.insert_resource(CurrentSnapshot::default());
    world.insert_resource(RecentSnapshots::default());
    world.insert_resource(VehicleQueues::default());
    world.insert_resource(params.flow_rates);
    world.insert_resource(PhaseHistory::default());
    world.insert_resource(SimTelemetry::default());
    world.insert_resource(IncidentLog::default());

    if params.incidents.enabled {
        world.insert_resource(IncidentInjector::new(
            params.incidents,
            params.seed ^ INJECTOR_SEED_SALT,
        ));
    } else {
        world.remove_resource::<IncidentInjector>();
    }

    if params.use_predictor {
        world.insert_resource(PredictorResource::new(Box::new(
            MovingAveragePredictor::default(),
        )));
    } else {
        world.remove_resource::<PredictorResource>();
    }

    log::info!(
        "Scenario built: {} strategy, {}s, update every {}s, incidents {}",
        params.strategy,
        params.duration_secs,
        update_interval,
        if params.incidents.enabled { "on" } else { "off" }
    );
}
