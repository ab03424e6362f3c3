#![allow(dead_code)]

use bevy_ecs::prelude::World;
use signal_core::incidents::IncidentConfig;
use signal_core::intersection::DirectionCounts;
use signal_core::scenario::{build_scenario, ScenarioParams};
use signal_core::snapshot::{SnapshotSourceResource, TrafficSourceKind};
use signal_core::strategy::{StrategyConfig, StrategyKind};
use signal_core::test_helpers::ScriptedSnapshotSource;

/// Builder configuration for reproducible test worlds.
#[derive(Clone, Debug)]
pub struct TestWorldConfig {
    pub seed: u64,
    pub strategy: StrategyKind,
    pub strategy_config: StrategyConfig,
    pub duration_secs: u64,
    pub update_interval_secs: u64,
    pub incidents: Option<IncidentConfig>,
    pub traffic: TrafficSourceKind,
    pub script: Option<Vec<DirectionCounts>>,
}

impl Default for TestWorldConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            strategy: StrategyKind::Fixed,
            strategy_config: StrategyConfig::default(),
            duration_secs: 300,
            update_interval_secs: 5,
            incidents: None,
            traffic: TrafficSourceKind::Constant(DirectionCounts::default()),
            script: None,
        }
    }
}

/// Helper that populates the ECS world with all resources used in integration tests.
#[derive(Debug, Default)]
pub struct TestWorldBuilder {
    config: TestWorldConfig,
}

impl TestWorldBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn with_strategy_config(mut self, config: StrategyConfig) -> Self {
        self.config.strategy_config = config;
        self
    }

    pub fn with_duration_secs(mut self, secs: u64) -> Self {
        self.config.duration_secs = secs;
        self
    }

    pub fn with_update_interval_secs(mut self, secs: u64) -> Self {
        self.config.update_interval_secs = secs;
        self
    }

    /// Enable incident injection with the given configuration.
    pub fn with_incidents(mut self, config: IncidentConfig) -> Self {
        self.config.incidents = Some(config);
        self
    }

    /// Use the seeded traffic generator instead of constant counts.
    pub fn with_generated_traffic(mut self) -> Self {
        self.config.traffic = TrafficSourceKind::Generated;
        self
    }

    pub fn with_constant_traffic(mut self, counts: DirectionCounts) -> Self {
        self.config.traffic = TrafficSourceKind::Constant(counts);
        self
    }

    /// Replay `script` one entry per snapshot draw, repeating the last entry.
    pub fn with_scripted_traffic(mut self, script: Vec<DirectionCounts>) -> Self {
        self.config.script = Some(script);
        self
    }

    pub fn build(self) -> World {
        let config = self.config;
        let mut params = ScenarioParams::default()
            .with_seed(config.seed)
            .with_strategy(config.strategy)
            .with_strategy_config(config.strategy_config)
            .with_duration_secs(config.duration_secs)
            .with_update_interval_secs(config.update_interval_secs)
            .with_traffic_source(config.traffic);
        match config.incidents {
            Some(incidents) => params = params.with_incident_config(incidents),
            None => params = params.with_incidents(false),
        }

        let mut world = World::new();
        build_scenario(&mut world, params);

        if let Some(script) = config.script {
            world.insert_resource(SnapshotSourceResource::new(Box::new(
                ScriptedSnapshotSource::new(script, config.update_interval_secs),
            )));
        }
        world
    }
}
