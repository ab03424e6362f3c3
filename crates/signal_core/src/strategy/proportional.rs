//! Proportional control: split the cycle's green time by the volume ratio of the two
//! phase pairs, with a minimum share guaranteed to the quieter pair.

use serde::{Deserialize, Serialize};

use super::{
    clamp_setting, demand_ratios, PhaseTimes, StrategyInfo, StrategyParameters, TimingBounds,
};
use crate::intersection::Phase;
use crate::snapshot::TrafficSnapshot;

const MIN_CYCLE_LENGTH: u32 = 30;
const MAX_CYCLE_LENGTH: u32 = 180;
const MAX_MIN_GREEN_RATIO: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProportionalConfig {
    pub bounds: TimingBounds,
    /// Full cycle (both greens and both yellows), seconds.
    pub cycle_length: u32,
    /// Minimum share of green time for either pair.
    pub min_green_ratio: f64,
}

impl Default for ProportionalConfig {
    fn default() -> Self {
        Self {
            bounds: TimingBounds::default(),
            cycle_length: 90,
            min_green_ratio: 0.3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProportionalStrategy {
    bounds: TimingBounds,
    cycle_length: u32,
    min_green_ratio: f64,
}

impl Default for ProportionalStrategy {
    fn default() -> Self {
        Self::new(ProportionalConfig::default())
    }
}

impl ProportionalStrategy {
    pub fn new(config: ProportionalConfig) -> Self {
        let mut strategy = Self {
            bounds: config.bounds.sanitized(),
            cycle_length: 90,
            min_green_ratio: 0.3,
        };
        strategy.set_cycle_length(config.cycle_length);
        strategy.set_min_green_ratio(config.min_green_ratio);
        strategy
    }

    pub fn bounds(&self) -> &TimingBounds {
        &self.bounds
    }

    pub fn cycle_length(&self) -> u32 {
        self.cycle_length
    }

    pub fn set_cycle_length(&mut self, cycle_length: u32) {
        self.cycle_length = clamp_setting(
            "cycle_length",
            cycle_length,
            MIN_CYCLE_LENGTH,
            MAX_CYCLE_LENGTH,
        );
    }

    pub fn set_min_green_ratio(&mut self, ratio: f64) {
        self.min_green_ratio = clamp_setting("min_green_ratio", ratio, 0.0, MAX_MIN_GREEN_RATIO);
    }

    /// Green seconds available per cycle once both yellows are taken out.
    pub fn available_green(&self) -> u32 {
        self.cycle_length.saturating_sub(self.bounds.both_yellows())
    }

    pub fn calculate_phase_times(&self, snapshot: Option<&TrafficSnapshot>) -> PhaseTimes {
        let available = self.available_green();
        let yellow = self.bounds.yellow_time;

        let Some(snapshot) = snapshot else {
            let half = self.bounds.clamp_green(f64::from(available) / 2.0);
            return PhaseTimes::new(half, half, yellow);
        };

        let counts = &snapshot.vehicle_counts;
        let ns_count = counts.pair_total(Phase::NorthSouth) as f64;
        let ew_count = counts.pair_total(Phase::EastWest) as f64;

        let Some((mut ns_ratio, mut ew_ratio)) = demand_ratios(ns_count, ew_count) else {
            let half = self.bounds.clamp_green(f64::from(available / 2));
            return PhaseTimes::new(half, half, yellow);
        };

        if ns_ratio < self.min_green_ratio {
            ns_ratio = self.min_green_ratio;
            ew_ratio = 1.0 - self.min_green_ratio;
        } else if ew_ratio < self.min_green_ratio {
            ew_ratio = self.min_green_ratio;
            ns_ratio = 1.0 - self.min_green_ratio;
        }

        let min_green = self.bounds.min_green_time;
        let mut ns_green = ((f64::from(available) * ns_ratio).floor() as u32).max(min_green);
        let mut ew_green = ((f64::from(available) * ew_ratio).floor() as u32).max(min_green);

        let total = u64::from(ns_green) + u64::from(ew_green);
        if total > u64::from(available) {
            let scale = |green: u32| (u64::from(green) * u64::from(available) / total) as u32;
            ns_green = scale(ns_green).max(min_green);
            ew_green = scale(ew_green).max(min_green);
        }

        PhaseTimes::new(
            self.bounds.clamp_green(f64::from(ns_green)),
            self.bounds.clamp_green(f64::from(ew_green)),
            yellow,
        )
    }

    pub fn info(&self) -> StrategyInfo {
        StrategyInfo::new(
            "Proportional",
            "Allocates green time proportionally to traffic volume",
            &self.bounds,
            StrategyParameters::Proportional {
                cycle_length: self.cycle_length,
                min_green_ratio: self.min_green_ratio,
            },
        )
    }
}
