//! Fixed-time control: the same green split on every cycle, whatever the traffic.

use serde::{Deserialize, Serialize};

use super::{PhaseTimes, StrategyInfo, StrategyParameters, TimingBounds};
use crate::snapshot::TrafficSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedConfig {
    pub bounds: TimingBounds,
    pub north_south_green: u32,
    pub east_west_green: u32,
}

impl Default for FixedConfig {
    fn default() -> Self {
        Self {
            bounds: TimingBounds::default(),
            north_south_green: 30,
            east_west_green: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FixedTimeStrategy {
    bounds: TimingBounds,
    ns_green: u32,
    ew_green: u32,
}

impl Default for FixedTimeStrategy {
    fn default() -> Self {
        Self::new(FixedConfig::default())
    }
}

impl FixedTimeStrategy {
    pub fn new(config: FixedConfig) -> Self {
        let mut strategy = Self {
            bounds: config.bounds.sanitized(),
            ns_green: 0,
            ew_green: 0,
        };
        strategy.set_times(config.north_south_green, config.east_west_green);
        strategy
    }

    pub fn bounds(&self) -> &TimingBounds {
        &self.bounds
    }

    /// Set both green times, clamped into the bounds.
    pub fn set_times(&mut self, ns_green: u32, ew_green: u32) {
        let bounds = self.bounds;
        let clamp = |green: u32| green.clamp(bounds.min_green_time, bounds.max_green_time);
        if !bounds.contains(ns_green) || !bounds.contains(ew_green) {
            log::warn!(
                "fixed green times {ns_green}/{ew_green} outside [{}, {}]; clamping",
                bounds.min_green_time,
                bounds.max_green_time
            );
        }
        self.ns_green = clamp(ns_green);
        self.ew_green = clamp(ew_green);
    }

    pub fn calculate_phase_times(&self, _snapshot: Option<&TrafficSnapshot>) -> PhaseTimes {
        PhaseTimes::new(self.ns_green, self.ew_green, self.bounds.yellow_time)
    }

    pub fn info(&self) -> StrategyInfo {
        StrategyInfo::new(
            "Fixed Time",
            "Uses predetermined fixed timing for traffic signals",
            &self.bounds,
            StrategyParameters::Fixed {
                north_south_green_time: self.ns_green,
                east_west_green_time: self.ew_green,
            },
        )
    }
}
