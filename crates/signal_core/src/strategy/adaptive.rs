//! Trend-adaptive control.
//!
//! Keeps the last few counts per direction, scales each pair's demand by its average
//! trend factor, splits a `max_cycle_length` budget proportionally, then blends the
//! target with the previous result: `responsiveness * target + historical_weight * previous`.
//! `responsiveness + historical_weight == 1` always holds.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::{
    clamp_setting, demand_ratios, PhaseTimes, StrategyInfo, StrategyParameters, TimingBounds,
};
use crate::intersection::{Direction, DirectionCounts, Phase, PerDirection};
use crate::snapshot::TrafficSnapshot;

const MIN_RESPONSIVENESS: f64 = 0.1;
const MAX_RESPONSIVENESS: f64 = 1.0;
const MIN_TREND: f64 = 0.8;
const MAX_TREND: f64 = 1.5;
/// Trend assumed when a direction goes from no traffic to some traffic.
const EMERGING_TREND: f64 = 1.2;
const INITIAL_GREEN: u32 = 30;
const MIN_CYCLE_LENGTH: u32 = 30;
const MAX_CYCLE_LENGTH: u32 = 180;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    pub bounds: TimingBounds,
    pub max_cycle_length: u32,
    pub responsiveness: f64,
    pub trend_points: usize,
    /// Weight of a predictor's forecast in the demand estimate, when one is configured.
    pub prediction_weight: f64,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            bounds: TimingBounds::default(),
            max_cycle_length: 120,
            responsiveness: 0.7,
            trend_points: 5,
            prediction_weight: 0.3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdaptiveStrategy {
    bounds: TimingBounds,
    max_cycle_length: u32,
    responsiveness: f64,
    historical_weight: f64,
    prediction_weight: f64,
    trend_points: usize,
    trends: PerDirection<VecDeque<u32>>,
    previous: PhaseTimes,
    last_target: Option<PhaseTimes>,
}

impl Default for AdaptiveStrategy {
    fn default() -> Self {
        Self::new(AdaptiveConfig::default())
    }
}

impl AdaptiveStrategy {
    pub fn new(config: AdaptiveConfig) -> Self {
        let bounds = config.bounds.sanitized();
        let trend_points = config.trend_points.max(2);
        let mut strategy = Self {
            bounds,
            max_cycle_length: clamp_setting(
                "max_cycle_length",
                config.max_cycle_length,
                MIN_CYCLE_LENGTH,
                MAX_CYCLE_LENGTH,
            ),
            responsiveness: 0.7,
            historical_weight: 0.3,
            prediction_weight: clamp_setting("prediction_weight", config.prediction_weight, 0.0, 1.0),
            trend_points,
            trends: PerDirection::from_fn(|_| VecDeque::with_capacity(trend_points)),
            previous: PhaseTimes::new(
                bounds.clamp_green(f64::from(INITIAL_GREEN)),
                bounds.clamp_green(f64::from(INITIAL_GREEN)),
                bounds.yellow_time,
            ),
            last_target: None,
        };
        strategy.set_responsiveness(config.responsiveness);
        strategy
    }

    pub fn bounds(&self) -> &TimingBounds {
        &self.bounds
    }

    pub fn responsiveness(&self) -> f64 {
        self.responsiveness
    }

    pub fn historical_weight(&self) -> f64 {
        self.historical_weight
    }

    /// Target times of the most recent calculation before blending, clamped into the bounds.
    pub fn last_target(&self) -> Option<PhaseTimes> {
        self.last_target
    }

    pub fn previous(&self) -> PhaseTimes {
        self.previous
    }

    pub fn set_responsiveness(&mut self, value: f64) {
        self.responsiveness = clamp_setting(
            "responsiveness",
            value,
            MIN_RESPONSIVENESS,
            MAX_RESPONSIVENESS,
        );
        self.historical_weight = 1.0 - self.responsiveness;
    }

    fn record_trends(&mut self, counts: &DirectionCounts) {
        for direction in Direction::ALL {
            let buffer = self.trends.get_mut(direction);
            buffer.push_back(*counts.get(direction));
            while buffer.len() > self.trend_points {
                buffer.pop_front();
            }
        }
    }

    /// Ratio of the latest two points' mean to the earliest two points' mean, clamped.
    pub fn trend_factor(&self, direction: Direction) -> f64 {
        let data = self.trends.get(direction);
        if data.len() < 2 {
            return 1.0;
        }
        let mean = |a: u32, b: u32| (f64::from(a) + f64::from(b)) / 2.0;
        let earliest = mean(data[0], data[1]);
        let latest = mean(data[data.len() - 2], data[data.len() - 1]);
        if earliest == 0.0 {
            return if latest == 0.0 { 1.0 } else { EMERGING_TREND };
        }
        (latest / earliest).clamp(MIN_TREND, MAX_TREND)
    }

    fn pair_trend(&self, phase: Phase) -> f64 {
        let [a, b] = phase.directions();
        (self.trend_factor(a) + self.trend_factor(b)) / 2.0
    }

    fn pair_demand(
        &self,
        phase: Phase,
        counts: &DirectionCounts,
        prediction: Option<&DirectionCounts>,
    ) -> f64 {
        let adjusted = counts.pair_total(phase) as f64 * self.pair_trend(phase);
        match prediction {
            Some(predicted) => {
                let w = self.prediction_weight;
                (1.0 - w) * adjusted + w * predicted.pair_total(phase) as f64
            }
            None => adjusted,
        }
    }

    pub fn calculate_phase_times(
        &mut self,
        snapshot: Option<&TrafficSnapshot>,
        prediction: Option<&DirectionCounts>,
    ) -> PhaseTimes {
        let Some(snapshot) = snapshot else {
            return self.previous;
        };
        let counts = snapshot.vehicle_counts;
        self.record_trends(&counts);

        let ns_demand = self.pair_demand(Phase::NorthSouth, &counts, prediction);
        let ew_demand = self.pair_demand(Phase::EastWest, &counts, prediction);

        let available = f64::from(
            self.max_cycle_length
                .saturating_sub(self.bounds.both_yellows()),
        );
        let (ns_share, ew_share) = demand_ratios(ns_demand, ew_demand).unwrap_or((0.5, 0.5));
        // Only the minimum is enforced before blending; the full clamp applies to the blend.
        let min_green = f64::from(self.bounds.min_green_time);
        let ns_target = (available * ns_share).max(min_green);
        let ew_target = (available * ew_share).max(min_green);

        let blend = |target: f64, previous: u32| {
            self.responsiveness * target + self.historical_weight * f64::from(previous)
        };
        let times = PhaseTimes::new(
            self.bounds
                .clamp_green(blend(ns_target, self.previous.north_south.green)),
            self.bounds
                .clamp_green(blend(ew_target, self.previous.east_west.green)),
            self.bounds.yellow_time,
        );
        let target = PhaseTimes::new(
            self.bounds.clamp_green(ns_target),
            self.bounds.clamp_green(ew_target),
            self.bounds.yellow_time,
        );

        log::debug!(
            "adaptive: trend ns={:.2} ew={:.2} target {:.1}/{:.1} -> {}/{}",
            self.pair_trend(Phase::NorthSouth),
            self.pair_trend(Phase::EastWest),
            ns_target,
            ew_target,
            times.north_south.green,
            times.east_west.green
        );

        self.last_target = Some(target);
        self.previous = times;
        times
    }

    pub fn info(&self) -> StrategyInfo {
        StrategyInfo::new(
            "Adaptive",
            "Dynamically adjusts signal timing based on current and historical traffic patterns",
            &self.bounds,
            StrategyParameters::Adaptive {
                responsiveness: self.responsiveness,
                historical_weight: self.historical_weight,
                max_cycle_length: self.max_cycle_length,
                trend_points: self.trend_points,
                prediction_weight: self.prediction_weight,
            },
        )
    }
}
