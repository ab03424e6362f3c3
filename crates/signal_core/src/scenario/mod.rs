//! Scenario setup: turn [ScenarioParams] into world resources.

mod build;
mod params;

pub use build::{build_scenario, create_snapshot_source, create_strategy};
pub use params::{ScenarioParams, SimulationEndTick, UpdateIntervalSecs};
