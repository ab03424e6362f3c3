//! Webster's delay-minimising cycle.
//!
//! Counts are converted to hourly flows using the snapshot window
//! (`3600 / window_secs`), each pair's critical ratio is the larger
//! `flow / (saturation_flow * lanes)` of its two directions, and the optimal cycle is
//! `C = (1.5 L + 5) / (1 - Y)` with `L = 2 * lost_time`. Effective green `C - L` is
//! shared in proportion to the critical ratios.

use serde::{Deserialize, Serialize};

use super::{clamp_setting, PhaseTimes, StrategyInfo, StrategyParameters, TimingBounds};
use crate::intersection::{Direction, Phase, PerDirection};
use crate::snapshot::TrafficSnapshot;

const SECS_PER_HOUR: f64 = 3600.0;
const MIN_SATURATION_FLOW: f64 = 600.0;
const MAX_SATURATION_FLOW: f64 = 2400.0;
/// Critical ratio sum at which the formula is skipped and the maximum cycle used.
const CAPACITY_THRESHOLD: f64 = 0.95;
/// Critical ratio sum below which there is no meaningful demand.
const NO_DEMAND_THRESHOLD: f64 = 0.001;
const FALLBACK_GREEN: f64 = 30.0;
const MIN_LOST_TIME: u32 = 1;
const MAX_LOST_TIME: u32 = 10;
const MIN_CYCLE_LENGTH: u32 = 30;
const MAX_CYCLE_LENGTH: u32 = 180;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebsterConfig {
    pub bounds: TimingBounds,
    /// Vehicles per hour of green per lane.
    pub saturation_flow: f64,
    pub lanes: PerDirection<u32>,
    /// Lost time per phase, seconds.
    pub lost_time: u32,
    pub min_cycle_length: u32,
    pub max_cycle_length: u32,
}

impl Default for WebsterConfig {
    fn default() -> Self {
        Self {
            bounds: TimingBounds::default(),
            saturation_flow: 1800.0,
            lanes: PerDirection::splat(1),
            lost_time: 4,
            min_cycle_length: 30,
            max_cycle_length: 180,
        }
    }
}

/// Intermediate result of one Webster computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebsterPlan {
    pub ns_ratio: f64,
    pub ew_ratio: f64,
    /// Sum of critical ratios (Y).
    pub total_ratio: f64,
    /// Cycle length used, seconds. `None` when demand is negligible.
    pub cycle_length: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct WebsterStrategy {
    bounds: TimingBounds,
    saturation_flow: f64,
    lanes: PerDirection<u32>,
    lost_time: u32,
    min_cycle_length: u32,
    max_cycle_length: u32,
}

impl Default for WebsterStrategy {
    fn default() -> Self {
        Self::new(WebsterConfig::default())
    }
}

impl WebsterStrategy {
    pub fn new(config: WebsterConfig) -> Self {
        let min_cycle_length = clamp_setting(
            "min_cycle_length",
            config.min_cycle_length,
            MIN_CYCLE_LENGTH,
            MAX_CYCLE_LENGTH,
        );
        let max_cycle_length = clamp_setting(
            "max_cycle_length",
            config.max_cycle_length,
            min_cycle_length,
            MAX_CYCLE_LENGTH,
        );
        let mut strategy = Self {
            bounds: config.bounds.sanitized(),
            saturation_flow: 1800.0,
            lanes: PerDirection::splat(1),
            lost_time: clamp_setting(
                "lost_time",
                config.lost_time,
                MIN_LOST_TIME,
                MAX_LOST_TIME,
            ),
            min_cycle_length,
            max_cycle_length,
        };
        strategy.set_saturation_flow(config.saturation_flow);
        strategy.set_lanes(config.lanes);
        strategy
    }

    pub fn bounds(&self) -> &TimingBounds {
        &self.bounds
    }

    pub fn max_cycle_length(&self) -> u32 {
        self.max_cycle_length
    }

    pub fn set_saturation_flow(&mut self, flow: f64) {
        self.saturation_flow = clamp_setting(
            "saturation_flow",
            flow,
            MIN_SATURATION_FLOW,
            MAX_SATURATION_FLOW,
        );
    }

    /// Lane counts per direction; zero becomes one.
    pub fn set_lanes(&mut self, lanes: PerDirection<u32>) {
        self.lanes = lanes.map(|_, n| (*n).max(1));
    }

    /// Lost time over the whole cycle (L), seconds.
    fn total_lost_time(&self) -> f64 {
        2.0 * f64::from(self.lost_time)
    }

    fn critical_ratio(&self, phase: Phase, counts: &PerDirection<u32>, scale: f64) -> f64 {
        phase
            .directions()
            .iter()
            .map(|d| self.flow_ratio(*d, counts, scale))
            .fold(0.0, f64::max)
    }

    fn flow_ratio(&self, direction: Direction, counts: &PerDirection<u32>, scale: f64) -> f64 {
        let flow = f64::from(*counts.get(direction)) * scale;
        flow / (self.saturation_flow * f64::from(*self.lanes.get(direction)))
    }

    /// Critical ratios and cycle length for a snapshot.
    pub fn plan(&self, snapshot: &TrafficSnapshot) -> WebsterPlan {
        let scale = SECS_PER_HOUR / snapshot.window_secs.max(1) as f64;
        let ns_ratio = self.critical_ratio(Phase::NorthSouth, &snapshot.vehicle_counts, scale);
        let ew_ratio = self.critical_ratio(Phase::EastWest, &snapshot.vehicle_counts, scale);
        let total_ratio = ns_ratio + ew_ratio;

        let cycle_length = if total_ratio < NO_DEMAND_THRESHOLD {
            None
        } else if total_ratio >= CAPACITY_THRESHOLD {
            Some(f64::from(self.max_cycle_length))
        } else {
            let optimal = (1.5 * self.total_lost_time() + 5.0) / (1.0 - total_ratio);
            Some(optimal.clamp(
                f64::from(self.min_cycle_length),
                f64::from(self.max_cycle_length),
            ))
        };

        WebsterPlan {
            ns_ratio,
            ew_ratio,
            total_ratio,
            cycle_length,
        }
    }

    pub fn calculate_phase_times(&self, snapshot: Option<&TrafficSnapshot>) -> PhaseTimes {
        let yellow = self.bounds.yellow_time;
        let fallback = || {
            let green = self.bounds.clamp_green(FALLBACK_GREEN);
            PhaseTimes::new(green, green, yellow)
        };

        let Some(snapshot) = snapshot else {
            return fallback();
        };
        let plan = self.plan(snapshot);
        let Some(cycle_length) = plan.cycle_length else {
            return fallback();
        };

        let effective_green = (cycle_length - self.total_lost_time()).max(0.0);
        let ns_green = effective_green * (plan.ns_ratio / plan.total_ratio);
        let ew_green = effective_green * (plan.ew_ratio / plan.total_ratio);

        PhaseTimes::new(
            self.bounds.clamp_green(ns_green),
            self.bounds.clamp_green(ew_green),
            yellow,
        )
    }

    pub fn info(&self) -> StrategyInfo {
        StrategyInfo::new(
            "Webster",
            "Uses Webster's method to minimize overall vehicle delay",
            &self.bounds,
            StrategyParameters::Webster {
                saturation_flow: self.saturation_flow,
                lanes: self.lanes,
                lost_time: self.lost_time,
                min_cycle_length: self.min_cycle_length,
                max_cycle_length: self.max_cycle_length,
            },
        )
    }
}
