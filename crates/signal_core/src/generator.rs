//! Seeded traffic generator: the default [TrafficSnapshotSource].
//!
//! Mean volume per direction is the base volume scaled to the snapshot window, times the
//! demand-profile factor, times the combined impact of active ambient incidents, times
//! uniform noise. Counts are Poisson draws around that mean.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Poisson, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::incidents::{AmbientIncident, AmbientIncidents};
use crate::intersection::{Direction, DirectionCounts, PerDirection};
use crate::snapshot::{TrafficSnapshot, TrafficSnapshotSource, VehicleTypeBreakdown};
use crate::traffic::DemandProfileKind;

/// Window the base volumes are expressed in (5 minutes).
pub const REFERENCE_WINDOW_SECS: u64 = 300;

const MEAN_SPEED_KMH: f64 = 40.0;
const SPEED_STD_DEV_KMH: f64 = 10.0;
const MIN_SPEED_KMH: f64 = 10.0;
/// Vehicles per reference window a direction handles before it counts as congested.
const REFERENCE_CAPACITY: f64 = 20.0;
const INCIDENT_CONGESTION_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficGeneratorConfig {
    /// Mean vehicles per direction per reference window.
    pub base_volumes: PerDirection<f64>,
    pub profile: DemandProfileKind,
    /// Multiplicative noise range applied to each mean.
    pub noise_min: f64,
    pub noise_max: f64,
}

impl Default for TrafficGeneratorConfig {
    fn default() -> Self {
        Self {
            base_volumes: PerDirection::new(10.0, 12.0, 8.0, 9.0),
            profile: DemandProfileKind::default(),
            noise_min: 0.8,
            noise_max: 1.2,
        }
    }
}

#[derive(Debug)]
pub struct TrafficGenerator {
    config: TrafficGeneratorConfig,
    window_secs: u64,
    epoch_ms: i64,
    rng: StdRng,
    ambient: AmbientIncidents,
}

impl TrafficGenerator {
    /// `window_secs` is the interval each snapshot covers (the arrival update interval).
    pub fn new(config: TrafficGeneratorConfig, window_secs: u64, epoch_ms: i64, seed: u64) -> Self {
        let mut config = config;
        if !(config.noise_min > 0.0 && config.noise_min <= config.noise_max) {
            log::warn!(
                "noise range {}..{} is invalid; using 0.8..1.2",
                config.noise_min,
                config.noise_max
            );
            config.noise_min = 0.8;
            config.noise_max = 1.2;
        }
        config.base_volumes = config.base_volumes.map(|_, v| {
            if v.is_finite() {
                v.max(0.0)
            } else {
                0.0
            }
        });
        Self {
            config,
            window_secs: window_secs.max(1),
            epoch_ms,
            rng: StdRng::seed_from_u64(seed),
            ambient: AmbientIncidents::default(),
        }
    }

    pub fn window_secs(&self) -> u64 {
        self.window_secs
    }

    pub fn ambient(&self) -> &AmbientIncidents {
        &self.ambient
    }

    /// Open a random ambient incident starting at `now`.
    pub fn add_ambient_incident(&mut self, now: u64, duration_secs: u64) -> AmbientIncident {
        self.ambient.open_random(&mut self.rng, now, duration_secs)
    }

    fn window_scale(&self) -> f64 {
        self.window_secs as f64 / REFERENCE_WINDOW_SECS as f64
    }

    /// Expected count for a direction before noise.
    pub fn mean_volume(&self, direction: Direction, timestamp: u64) -> f64 {
        let factors = self.config.profile.factors_at(timestamp, self.epoch_ms);
        self.config.base_volumes.get(direction)
            * self.window_scale()
            * factors.get(direction)
            * self.ambient.impact_on(direction)
    }

    fn sample_count(&mut self, mean: f64) -> u32 {
        let noise = self.rng.gen_range(self.config.noise_min..=self.config.noise_max);
        let lambda = mean * noise;
        if lambda <= 0.0 {
            return 0;
        }
        match Poisson::new(lambda) {
            Ok(poisson) => {
                let draw: f64 = poisson.sample(&mut self.rng);
                draw.max(0.0).min(f64::from(u32::MAX)) as u32
            }
            Err(_) => lambda.round() as u32,
        }
    }

    fn sample_types(&mut self) -> VehicleTypeBreakdown {
        let cars = self.rng.gen_range(0.70..0.80);
        let trucks = self.rng.gen_range(0.10..0.15);
        let buses = self.rng.gen_range(0.03..0.07);
        VehicleTypeBreakdown {
            cars,
            trucks,
            buses,
            motorcycles: (1.0 - cars - trucks - buses).max(0.0),
        }
    }

    fn sample_speed(&mut self) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        (MEAN_SPEED_KMH + SPEED_STD_DEV_KMH * z).max(MIN_SPEED_KMH)
    }

    fn congestion(&self, counts: &DirectionCounts) -> PerDirection<f64> {
        let capacity = (REFERENCE_CAPACITY * self.window_scale()).max(1.0);
        counts.map(|direction, count| {
            let mut level = (f64::from(*count) / capacity).min(1.0);
            if self.ambient.affects(direction) {
                level = (level * INCIDENT_CONGESTION_FACTOR).min(1.0);
            }
            level
        })
    }
}

impl TrafficSnapshotSource for TrafficGenerator {
    fn next_snapshot(&mut self, timestamp: u64) -> TrafficSnapshot {
        let expired = self.ambient.expire(timestamp);
        if !expired.is_empty() {
            log::info!("Ambient incidents expired at tick {timestamp}: {expired:?}");
        }

        let means = PerDirection::from_fn(|d| self.mean_volume(d, timestamp));
        let mut counts = DirectionCounts::default();
        for direction in Direction::ALL {
            *counts.get_mut(direction) = self.sample_count(*means.get(direction));
        }

        let mut snapshot = TrafficSnapshot::new(timestamp, self.window_secs, counts);
        snapshot.vehicle_types = Some(self.sample_types());
        snapshot.avg_speeds = Some(PerDirection::from_fn(|_| self.sample_speed()));
        if !self.ambient.is_empty() {
            snapshot.congestion = Some(self.congestion(&counts));
            snapshot.active_incidents = self.ambient.active_ids();
        }
        log::trace!("snapshot at {timestamp}: {counts:?}");
        snapshot
    }

    fn ambient_incidents_mut(&mut self) -> Option<&mut AmbientIncidents> {
        Some(&mut self.ambient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Wednesday 2024-01-03 12:00 UTC (no rush, no night).
    const MIDDAY_MS: i64 = 1_704_283_200_000;

    #[test]
    fn same_seed_same_snapshots() {
        let mut a = TrafficGenerator::new(TrafficGeneratorConfig::default(), 30, MIDDAY_MS, 7);
        let mut b = TrafficGenerator::new(TrafficGeneratorConfig::default(), 30, MIDDAY_MS, 7);
        for t in (0..300).step_by(30) {
            assert_eq!(a.next_snapshot(t), b.next_snapshot(t));
        }
    }

    #[test]
    fn mean_tracks_window_and_base() {
        let generator = TrafficGenerator::new(TrafficGeneratorConfig::default(), 300, MIDDAY_MS, 0);
        assert!((generator.mean_volume(Direction::South, 0) - 12.0).abs() < 1e-9);
        let short = TrafficGenerator::new(TrafficGeneratorConfig::default(), 30, MIDDAY_MS, 0);
        assert!((short.mean_volume(Direction::South, 0) - 1.2).abs() < 1e-9);
    }

    #[test]
    fn long_run_average_is_near_mean() {
        let mut generator =
            TrafficGenerator::new(TrafficGeneratorConfig::default(), 300, MIDDAY_MS, 11);
        let draws = 400;
        let total: u64 = (0..draws)
            .map(|_| u64::from(generator.next_snapshot(0).vehicle_counts.north))
            .sum();
        let mean = total as f64 / draws as f64;
        assert!((mean - 10.0).abs() < 1.5, "mean {mean}");
    }

    #[test]
    fn metadata_is_populated() {
        let mut generator =
            TrafficGenerator::new(TrafficGeneratorConfig::default(), 300, MIDDAY_MS, 2);
        let snapshot = generator.next_snapshot(0);
        let types = snapshot.vehicle_types.expect("types");
        assert!((types.cars + types.trucks + types.buses + types.motorcycles - 1.0).abs() < 1e-9);
        let speeds = snapshot.avg_speeds.expect("speeds");
        assert!(speeds.iter().all(|(_, s)| *s >= 10.0));
        assert!(snapshot.congestion.is_none());
        assert!(snapshot.active_incidents.is_empty());
    }

    #[test]
    fn ambient_incident_reports_congestion_until_expiry() {
        let mut generator =
            TrafficGenerator::new(TrafficGeneratorConfig::default(), 300, MIDDAY_MS, 3);
        let incident = generator.add_ambient_incident(0, 600);
        let during = generator.next_snapshot(300);
        assert!(during.active_incidents.contains(&incident.id));
        let congestion = during.congestion.expect("congestion");
        assert!(congestion.iter().all(|(_, c)| (0.0..=1.0).contains(c)));

        let after = generator.next_snapshot(601);
        assert!(after.active_incidents.is_empty());
        assert!(generator.ambient().is_empty());
    }
}
