//! Phase timing strategies.
//!
//! The closed set of strategies is modelled as the [TimingStrategy] enum; each variant
//! owns its configuration and any state it carries across calls. The active strategy is
//! stored in the world as [ActiveStrategy] and consulted only at yellow → green boundaries.
//!
//! Every strategy clamps green times into `[min_green_time, max_green_time]` of its
//! [TimingBounds] and returns its configured yellow time unchanged.

mod adaptive;
mod fixed;
mod proportional;
mod webster;

pub use adaptive::{AdaptiveConfig, AdaptiveStrategy};
pub use fixed::{FixedConfig, FixedTimeStrategy};
pub use proportional::{ProportionalConfig, ProportionalStrategy};
pub use webster::{WebsterConfig, WebsterPlan, WebsterStrategy};

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::intersection::{DirectionCounts, Phase, PerDirection};
use crate::snapshot::TrafficSnapshot;

/// Green bounds and yellow duration shared by all strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingBounds {
    pub min_green_time: u32,
    pub max_green_time: u32,
    pub yellow_time: u32,
}

impl Default for TimingBounds {
    fn default() -> Self {
        Self {
            min_green_time: 5,
            max_green_time: 60,
            yellow_time: 3,
        }
    }
}

impl TimingBounds {
    /// Repair inconsistent bounds: min green ≥ 1, max ≥ min, `1 ≤ yellow ≤ max green`.
    pub fn sanitized(self) -> Self {
        let min_green_time = self.min_green_time.max(1);
        let max_green_time = self.max_green_time.max(min_green_time);
        let yellow_time = self.yellow_time.clamp(1, max_green_time);
        let fixed = Self {
            min_green_time,
            max_green_time,
            yellow_time,
        };
        if fixed != self {
            log::warn!("timing bounds {self:?} are inconsistent; using {fixed:?}");
        }
        fixed
    }

    /// Floor `seconds` and clamp it into the green bounds.
    pub fn clamp_green(&self, seconds: f64) -> u32 {
        if !seconds.is_finite() || seconds <= 0.0 {
            return self.min_green_time;
        }
        let floored = seconds.floor().min(f64::from(u32::MAX)) as u32;
        floored.clamp(self.min_green_time, self.max_green_time)
    }

    /// Seconds of yellow in one full cycle.
    pub fn both_yellows(&self) -> u32 {
        self.yellow_time.saturating_mul(2)
    }

    pub fn contains(&self, green: u32) -> bool {
        (self.min_green_time..=self.max_green_time).contains(&green)
    }
}

/// Green and yellow duration for one phase pair, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTiming {
    pub green: u32,
    pub yellow: u32,
}

/// Durations for both phase pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTimes {
    pub north_south: PhaseTiming,
    pub east_west: PhaseTiming,
}

impl PhaseTimes {
    pub fn new(ns_green: u32, ew_green: u32, yellow: u32) -> Self {
        Self {
            north_south: PhaseTiming {
                green: ns_green,
                yellow,
            },
            east_west: PhaseTiming {
                green: ew_green,
                yellow,
            },
        }
    }

    pub fn get(&self, phase: Phase) -> PhaseTiming {
        match phase {
            Phase::NorthSouth => self.north_south,
            Phase::EastWest => self.east_west,
        }
    }
}

/// Strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Fixed,
    #[default]
    Proportional,
    Webster,
    Adaptive,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Fixed,
        StrategyKind::Proportional,
        StrategyKind::Webster,
        StrategyKind::Adaptive,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::Fixed => "fixed",
            StrategyKind::Proportional => "proportional",
            StrategyKind::Webster => "webster",
            StrategyKind::Adaptive => "adaptive",
        }
    }

    /// Case-insensitive lookup. Unknown names fall back to proportional with a warning.
    pub fn from_name(name: &str) -> Self {
        let wanted = name.trim().to_ascii_lowercase();
        match Self::ALL.into_iter().find(|kind| kind.name() == wanted) {
            Some(kind) => kind,
            None => {
                log::warn!("Unknown strategy '{name}'. Using proportional strategy instead.");
                StrategyKind::Proportional
            }
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Configuration for every strategy; only the selected one is used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub fixed: FixedConfig,
    pub proportional: ProportionalConfig,
    pub webster: WebsterConfig,
    pub adaptive: AdaptiveConfig,
}

/// Strategy-specific parameters reported by [TimingStrategy::info].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyParameters {
    Fixed {
        north_south_green_time: u32,
        east_west_green_time: u32,
    },
    Proportional {
        cycle_length: u32,
        min_green_ratio: f64,
    },
    Webster {
        saturation_flow: f64,
        lanes: PerDirection<u32>,
        lost_time: u32,
        min_cycle_length: u32,
        max_cycle_length: u32,
    },
    Adaptive {
        responsiveness: f64,
        historical_weight: f64,
        max_cycle_length: u32,
        trend_points: usize,
        prediction_weight: f64,
    },
}

/// Read-only description of a configured strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyInfo {
    pub name: String,
    pub description: String,
    pub min_green_time: u32,
    pub max_green_time: u32,
    pub yellow_time: u32,
    pub parameters: StrategyParameters,
}

impl StrategyInfo {
    fn new(
        name: &str,
        description: &str,
        bounds: &TimingBounds,
        parameters: StrategyParameters,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            min_green_time: bounds.min_green_time,
            max_green_time: bounds.max_green_time,
            yellow_time: bounds.yellow_time,
            parameters,
        }
    }
}

/// The active timing strategy and its private state.
#[derive(Debug, Clone)]
pub enum TimingStrategy {
    Fixed(FixedTimeStrategy),
    Proportional(ProportionalStrategy),
    Webster(WebsterStrategy),
    Adaptive(AdaptiveStrategy),
}

impl TimingStrategy {
    pub fn new(kind: StrategyKind, config: &StrategyConfig) -> Self {
        match kind {
            StrategyKind::Fixed => Self::Fixed(FixedTimeStrategy::new(config.fixed.clone())),
            StrategyKind::Proportional => {
                Self::Proportional(ProportionalStrategy::new(config.proportional.clone()))
            }
            StrategyKind::Webster => Self::Webster(WebsterStrategy::new(config.webster.clone())),
            StrategyKind::Adaptive => {
                Self::Adaptive(AdaptiveStrategy::new(config.adaptive.clone()))
            }
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Fixed(_) => StrategyKind::Fixed,
            Self::Proportional(_) => StrategyKind::Proportional,
            Self::Webster(_) => StrategyKind::Webster,
            Self::Adaptive(_) => StrategyKind::Adaptive,
        }
    }

    pub fn bounds(&self) -> &TimingBounds {
        match self {
            Self::Fixed(s) => s.bounds(),
            Self::Proportional(s) => s.bounds(),
            Self::Webster(s) => s.bounds(),
            Self::Adaptive(s) => s.bounds(),
        }
    }

    pub fn yellow_time(&self) -> u32 {
        self.bounds().yellow_time
    }

    /// Durations for both phase pairs given the latest snapshot, if any.
    pub fn calculate_phase_times(&mut self, snapshot: Option<&TrafficSnapshot>) -> PhaseTimes {
        self.calculate_phase_times_with_prediction(snapshot, None)
    }

    /// As [Self::calculate_phase_times]; the prediction is only used by the adaptive strategy.
    pub fn calculate_phase_times_with_prediction(
        &mut self,
        snapshot: Option<&TrafficSnapshot>,
        prediction: Option<&DirectionCounts>,
    ) -> PhaseTimes {
        match self {
            Self::Fixed(s) => s.calculate_phase_times(snapshot),
            Self::Proportional(s) => s.calculate_phase_times(snapshot),
            Self::Webster(s) => s.calculate_phase_times(snapshot),
            Self::Adaptive(s) => s.calculate_phase_times(snapshot, prediction),
        }
    }

    pub fn info(&self) -> StrategyInfo {
        match self {
            Self::Fixed(s) => s.info(),
            Self::Proportional(s) => s.info(),
            Self::Webster(s) => s.info(),
            Self::Adaptive(s) => s.info(),
        }
    }

    pub fn uses_prediction(&self) -> bool {
        matches!(self, Self::Adaptive(_))
    }
}

#[derive(Debug, Resource)]
pub struct ActiveStrategy(pub TimingStrategy);

impl std::ops::Deref for ActiveStrategy {
    type Target = TimingStrategy;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for ActiveStrategy {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Share of total demand for each phase pair, or `None` when there is no demand.
pub(crate) fn demand_ratios(ns_demand: f64, ew_demand: f64) -> Option<(f64, f64)> {
    let total = ns_demand + ew_demand;
    if !total.is_finite() || total <= 0.0 {
        return None;
    }
    Some((ns_demand / total, ew_demand / total))
}

/// Clamp a configured value into `[lo, hi]`, warning when it had to move.
pub(crate) fn clamp_setting<T>(name: &str, value: T, lo: T, hi: T) -> T
where
    T: PartialOrd + Copy + std::fmt::Debug,
{
    use std::cmp::Ordering;

    let clamped = match (value.partial_cmp(&lo), value.partial_cmp(&hi)) {
        (Some(Ordering::Less), _) => lo,
        (_, Some(Ordering::Greater)) => hi,
        (Some(_), Some(_)) => value,
        // NaN
        _ => lo,
    };
    if value.partial_cmp(&clamped) != Some(Ordering::Equal) {
        log::warn!("{name} {value:?} out of range [{lo:?}, {hi:?}]; using {clamped:?}");
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_strategy_name_falls_back_to_proportional() {
        assert_eq!(StrategyKind::from_name("Webster"), StrategyKind::Webster);
        assert_eq!(StrategyKind::from_name(" fixed "), StrategyKind::Fixed);
        assert_eq!(StrategyKind::from_name("genetic"), StrategyKind::Proportional);
    }

    #[test]
    fn clamp_green_floors_and_bounds() {
        let bounds = TimingBounds::default();
        assert_eq!(bounds.clamp_green(41.9), 41);
        assert_eq!(bounds.clamp_green(2.0), 5);
        assert_eq!(bounds.clamp_green(400.0), 60);
        assert_eq!(bounds.clamp_green(f64::NAN), 5);
    }

    #[test]
    fn inconsistent_bounds_are_repaired() {
        let bounds = TimingBounds {
            min_green_time: 20,
            max_green_time: 10,
            yellow_time: 0,
        }
        .sanitized();
        assert_eq!(bounds.max_green_time, 20);
        assert_eq!(bounds.yellow_time, 1);
    }

    #[test]
    fn yellow_is_capped_at_max_green() {
        let bounds = TimingBounds {
            yellow_time: u32::MAX,
            ..TimingBounds::default()
        }
        .sanitized();
        assert_eq!(bounds.yellow_time, 60);
        assert_eq!(bounds.both_yellows(), 120);

        let unchecked = TimingBounds {
            yellow_time: u32::MAX,
            ..TimingBounds::default()
        };
        assert_eq!(unchecked.both_yellows(), u32::MAX);
    }

    #[test]
    fn clamp_setting_handles_nan() {
        assert_eq!(clamp_setting("ratio", f64::NAN, 0.0, 0.5), 0.0);
        assert_eq!(clamp_setting("ratio", 0.7, 0.0, 0.5), 0.5);
        assert_eq!(clamp_setting("cycle", 90_u32, 30, 180), 90);
    }

    #[test]
    fn info_serializes_with_parameter_tag() {
        let strategy = TimingStrategy::new(StrategyKind::Webster, &StrategyConfig::default());
        let json = serde_json::to_value(strategy.info()).expect("json");
        assert_eq!(json["parameters"]["kind"], "webster");
        assert_eq!(json["min_green_time"], 5);
    }
}
