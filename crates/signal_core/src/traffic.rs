//! Demand model: time-of-day and weekday volume factors per approach direction.
//!
//! Factors multiply the generator's base volumes. They depend only on the wall-clock
//! time derived from the scenario epoch plus the simulated seconds elapsed.

use serde::{Deserialize, Serialize};

use crate::clock::ONE_SEC_MS;
use crate::intersection::{Direction, PerDirection};

const MS_PER_HOUR: i64 = 3_600_000;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

// ---------------------------------------------------------------------------
// Demand profile
// ---------------------------------------------------------------------------

/// Pre-defined demand profiles.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DemandProfileKind {
    /// No time-of-day effect; every factor is 1.0.
    Flat,
    /// Commuter city: directional rush hours on weekdays, quiet nights, leisure weekends.
    #[default]
    Commuter,
}

impl DemandProfileKind {
    /// Per-direction volume factors at a simulation time.
    ///
    /// `sim_secs` is the current tick, `epoch_ms` the real-world Unix epoch (ms) of tick 0.
    pub fn factors_at(self, sim_secs: u64, epoch_ms: i64) -> PerDirection<f64> {
        match self {
            DemandProfileKind::Flat => PerDirection::splat(1.0),
            DemandProfileKind::Commuter => {
                let (weekday, hour) = weekday_and_hour(sim_secs, epoch_ms);
                commuter_factors(weekday, hour)
            }
        }
    }
}

/// Day of week (0 = Monday) and hour of day (UTC) for a simulation time.
pub fn weekday_and_hour(sim_secs: u64, epoch_ms: i64) -> (u32, u32) {
    let real_ms = epoch_ms.saturating_add((sim_secs.saturating_mul(ONE_SEC_MS)) as i64);
    let days_since_epoch = real_ms.div_euclid(MS_PER_DAY);
    // 1970-01-01 was a Thursday.
    let weekday = (days_since_epoch + 3).rem_euclid(7) as u32;
    let hour = (real_ms.rem_euclid(MS_PER_DAY) / MS_PER_HOUR) as u32;
    (weekday, hour)
}

fn commuter_factors(weekday: u32, hour: u32) -> PerDirection<f64> {
    let weekend = weekday >= 5;
    let mut factors = PerDirection::splat(1.0);

    if (7..9).contains(&hour) {
        if !weekend {
            // Inbound morning rush.
            scale(&mut factors, Direction::South, 1.8);
            scale(&mut factors, Direction::East, 1.5);
            scale(&mut factors, Direction::North, 0.9);
            scale(&mut factors, Direction::West, 0.8);
        }
    } else if (16..18).contains(&hour) {
        if !weekend {
            scale(&mut factors, Direction::North, 1.8);
            scale(&mut factors, Direction::West, 1.6);
            scale(&mut factors, Direction::South, 0.8);
            scale(&mut factors, Direction::East, 0.9);
        }
    } else if hour >= 22 || hour < 5 {
        factors = factors.map(|_, f| f * 0.3);
    }

    if weekend {
        if (10..20).contains(&hour) {
            scale(&mut factors, Direction::North, 1.3);
            scale(&mut factors, Direction::West, 1.2);
        } else {
            factors = factors.map(|_, f| f * 0.7);
        }
    }

    factors
}

fn scale(factors: &mut PerDirection<f64>, direction: Direction, by: f64) {
    *factors.get_mut(direction) *= by;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Monday 2024-01-01 00:00 UTC.
    const MONDAY_MS: i64 = 1_704_067_200_000;

    fn at(day: i64, hour: i64) -> i64 {
        MONDAY_MS + day * MS_PER_DAY + hour * MS_PER_HOUR
    }

    #[test]
    fn weekday_and_hour_follow_epoch() {
        assert_eq!(weekday_and_hour(0, MONDAY_MS), (0, 0));
        assert_eq!(weekday_and_hour(3600 * 30, MONDAY_MS), (1, 6));
        assert_eq!(weekday_and_hour(0, 0), (3, 0));
    }

    #[test]
    fn weekday_morning_rush_favours_inbound_directions() {
        let f = DemandProfileKind::Commuter.factors_at(0, at(2, 8));
        assert!((f.south - 1.8).abs() < 1e-9);
        assert!((f.east - 1.5).abs() < 1e-9);
        assert!((f.north - 0.9).abs() < 1e-9);
        assert!((f.west - 0.8).abs() < 1e-9);
    }

    #[test]
    fn weekend_night_stacks_quiet_factors() {
        let f = DemandProfileKind::Commuter.factors_at(0, at(5, 23));
        assert!((f.north - 0.21).abs() < 1e-9);
        let midday = DemandProfileKind::Commuter.factors_at(0, at(6, 12));
        assert!((midday.north - 1.3).abs() < 1e-9);
        assert!((midday.south - 1.0).abs() < 1e-9);
    }

    #[test]
    fn flat_profile_is_neutral() {
        let f = DemandProfileKind::Flat.factors_at(12_345, at(0, 8));
        assert_eq!(f, PerDirection::splat(1.0));
    }
}
