use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::generator::TrafficGeneratorConfig;
use crate::incidents::IncidentConfig;
use crate::snapshot::TrafficSourceKind;
use crate::strategy::{StrategyConfig, StrategyKind};
use crate::telemetry::FlowRates;

/// Default run length: 5 minutes.
const DEFAULT_DURATION_SECS: u64 = 300;

/// Default arrival refresh interval.
const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 5;

/// Monday 2024-01-01 08:00 UTC: a weekday morning rush.
const DEFAULT_EPOCH_MS: i64 = 1_704_096_000_000;

/// Tick at which the run ends. The runner stops once the clock reaches it.
#[derive(Debug, Clone, Copy, Resource)]
pub struct SimulationEndTick(pub u64);

/// Ticks between arrival snapshots.
#[derive(Debug, Clone, Copy, Resource)]
pub struct UpdateIntervalSecs(pub u64);

/// Everything needed to build one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioParams {
    /// Seed for the traffic source and incident injector.
    pub seed: u64,
    pub strategy: StrategyKind,
    pub strategy_config: StrategyConfig,
    pub duration_secs: u64,
    pub update_interval_secs: u64,
    pub incidents: IncidentConfig,
    pub traffic_source: TrafficSourceKind,
    pub traffic: TrafficGeneratorConfig,
    pub flow_rates: FlowRates,
    /// Real-world epoch (Unix ms) of tick 0, for time-of-day demand.
    pub epoch_ms: i64,
    /// Feed a moving-average forecast into the adaptive strategy.
    pub use_predictor: bool,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            seed: 0,
            strategy: StrategyKind::default(),
            strategy_config: StrategyConfig::default(),
            duration_secs: DEFAULT_DURATION_SECS,
            update_interval_secs: DEFAULT_UPDATE_INTERVAL_SECS,
            incidents: IncidentConfig::default(),
            traffic_source: TrafficSourceKind::default(),
            traffic: TrafficGeneratorConfig::default(),
            flow_rates: FlowRates::default(),
            epoch_ms: DEFAULT_EPOCH_MS,
            use_predictor: false,
        }
    }
}

impl ScenarioParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// Select a strategy by name; unknown names fall back to proportional.
    pub fn with_strategy_name(self, name: &str) -> Self {
        self.with_strategy(StrategyKind::from_name(name))
    }

    pub fn with_strategy_config(mut self, config: StrategyConfig) -> Self {
        self.strategy_config = config;
        self
    }

    pub fn with_duration_secs(mut self, secs: u64) -> Self {
        self.duration_secs = secs;
        self
    }

    pub fn with_update_interval_secs(mut self, secs: u64) -> Self {
        if secs == 0 {
            log::warn!("update interval 0 is invalid; using 1s");
        }
        self.update_interval_secs = secs.max(1);
        self
    }

    /// Enable or disable per-tick incident injection.
    pub fn with_incidents(mut self, enabled: bool) -> Self {
        self.incidents.enabled = enabled;
        self
    }

    pub fn with_incident_config(mut self, config: IncidentConfig) -> Self {
        self.incidents = config;
        self
    }

    pub fn with_traffic_source(mut self, source: TrafficSourceKind) -> Self {
        self.traffic_source = source;
        self
    }

    pub fn with_traffic_config(mut self, config: TrafficGeneratorConfig) -> Self {
        self.traffic = config;
        self
    }

    pub fn with_epoch_ms(mut self, epoch_ms: i64) -> Self {
        self.epoch_ms = epoch_ms;
        self
    }

    pub fn with_predictor(mut self, enabled: bool) -> Self {
        self.use_predictor = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let params: ScenarioParams =
            serde_json::from_str(r#"{"strategy":"webster","duration_secs":60}"#).expect("json");
        assert_eq!(params.strategy, StrategyKind::Webster);
        assert_eq!(params.duration_secs, 60);
        assert_eq!(params.update_interval_secs, 5);
        assert!(params.incidents.enabled);
    }

    #[test]
    fn builders_chain() {
        let params = ScenarioParams::default()
            .with_seed(9)
            .with_strategy_name("nope")
            .with_update_interval_secs(0)
            .with_incidents(false);
        assert_eq!(params.seed, 9);
        assert_eq!(params.strategy, StrategyKind::Proportional);
        assert_eq!(params.update_interval_secs, 1);
        assert!(!params.incidents.enabled);
    }
}
