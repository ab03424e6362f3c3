//! Run result record handed to serializers at the end of a run.

use bevy_ecs::prelude::World;
use serde::{Deserialize, Serialize};

use crate::clock::SimulationClock;
use crate::incidents::{IncidentLog, IncidentRecord};
use crate::intersection::DirectionCounts;
use crate::queues::VehicleQueues;
use crate::strategy::{ActiveStrategy, StrategyInfo};
use crate::telemetry::{PhaseHistory, PhaseRecord, SimTelemetry};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub strategy_name: String,
    pub strategy: StrategyInfo,
    pub total_elapsed_ticks: u64,
    pub processed_vehicles: u64,
    pub final_queue_state: DirectionCounts,
    pub average_wait_time: f64,
    /// Vehicles per simulated minute.
    pub throughput: f64,
    pub interrupted: bool,
    pub phase_history: Vec<PhaseRecord>,
    #[serde(default)]
    pub incidents: Vec<IncidentRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultError {
    MissingResource(&'static str),
}

impl std::fmt::Display for ResultError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultError::MissingResource(name) => {
                write!(f, "world is missing the {name} resource")
            }
        }
    }
}

impl std::error::Error for ResultError {}

fn require<'w, T: bevy_ecs::prelude::Resource>(
    world: &'w World,
    name: &'static str,
) -> Result<&'w T, ResultError> {
    world
        .get_resource::<T>()
        .ok_or(ResultError::MissingResource(name))
}

/// Collect the result record from a built (and usually finished) world.
pub fn extract_result(world: &World, interrupted: bool) -> Result<SimulationResult, ResultError> {
    let clock = require::<SimulationClock>(world, "SimulationClock")?;
    let strategy = require::<ActiveStrategy>(world, "ActiveStrategy")?;
    let queues = require::<VehicleQueues>(world, "VehicleQueues")?;
    let telemetry = require::<SimTelemetry>(world, "SimTelemetry")?;
    let history = require::<PhaseHistory>(world, "PhaseHistory")?;
    let incidents = world
        .get_resource::<IncidentLog>()
        .map(|log| log.records.clone())
        .unwrap_or_default();

    let elapsed = clock.now();
    Ok(SimulationResult {
        strategy_name: strategy.kind().name().to_string(),
        strategy: strategy.info(),
        total_elapsed_ticks: elapsed,
        processed_vehicles: telemetry.processed_vehicles,
        final_queue_state: queues.counts(),
        average_wait_time: telemetry.average_wait_time(),
        throughput: telemetry.throughput(elapsed),
        interrupted,
        phase_history: history.records().to_vec(),
        incidents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_world_reports_missing_resource() {
        let world = World::new();
        let err = extract_result(&world, false).expect_err("missing");
        assert_eq!(err, ResultError::MissingResource("SimulationClock"));
        assert!(err.to_string().contains("SimulationClock"));
    }

    #[test]
    fn result_reflects_finished_run() {
        use crate::runner::{initialize_simulation, run_ticks, tick_schedule};
        use crate::test_helpers::create_test_world;

        let mut world = create_test_world();
        initialize_simulation(&mut world);
        let ticks = run_ticks(&mut world, &mut tick_schedule(), 100);
        assert_eq!(ticks, 100);

        let result = extract_result(&world, false).expect("result");
        assert_eq!(result.strategy_name, "fixed");
        assert_eq!(result.strategy.name, "Fixed Time");
        assert_eq!(result.total_elapsed_ticks, 100);
        assert_eq!(result.processed_vehicles, 0);
        assert_eq!(result.throughput, 0.0);
        assert_eq!(result.final_queue_state, DirectionCounts::default());
        // Intervals open at 0, 30, 33, 63, 66, 96 and 99.
        assert_eq!(result.phase_history.len(), 7);
        assert!(result.incidents.is_empty());
    }
}
