//! Traffic snapshots and the pull source that produces them.
//!
//! A [TrafficSnapshot] is immutable once produced. The scheduler pulls a fresh one every
//! update interval (arrivals) and again at every yellow → green boundary (observation for
//! the timing strategy).

use std::collections::BTreeSet;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::incidents::AmbientIncidents;
use crate::intersection::{DirectionCounts, PerDirection};

/// Share of vehicle types in a snapshot (fractions, sum to 1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleTypeBreakdown {
    pub cars: f64,
    pub trucks: f64,
    pub buses: f64,
    pub motorcycles: f64,
}

/// Per-direction traffic observation for one timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficSnapshot {
    /// Tick the snapshot was drawn for.
    pub timestamp: u64,
    /// Length of the observation window the counts cover, in seconds.
    pub window_secs: u64,
    pub vehicle_counts: DirectionCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_types: Option<VehicleTypeBreakdown>,
    /// Average speed per direction (km/h).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_speeds: Option<PerDirection<f64>>,
    /// Congestion level per direction in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub congestion: Option<PerDirection<f64>>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub active_incidents: BTreeSet<u32>,
}

impl TrafficSnapshot {
    /// A bare snapshot carrying only counts.
    pub fn new(timestamp: u64, window_secs: u64, vehicle_counts: DirectionCounts) -> Self {
        Self {
            timestamp,
            window_secs,
            vehicle_counts,
            vehicle_types: None,
            avg_speeds: None,
            congestion: None,
            active_incidents: BTreeSet::new(),
        }
    }
}

/// Produces snapshots on demand.
///
/// Implementations must return non-negative counts for all four directions.
pub trait TrafficSnapshotSource: Send + Sync {
    fn next_snapshot(&mut self, timestamp: u64) -> TrafficSnapshot;

    /// Ambient incident book, for sources that model long-running incidents.
    fn ambient_incidents_mut(&mut self) -> Option<&mut AmbientIncidents> {
        None
    }
}

#[derive(Resource)]
pub struct SnapshotSourceResource(pub Box<dyn TrafficSnapshotSource>);

impl SnapshotSourceResource {
    pub fn new(source: Box<dyn TrafficSnapshotSource>) -> Self {
        Self(source)
    }
}

impl std::ops::Deref for SnapshotSourceResource {
    type Target = dyn TrafficSnapshotSource;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl std::ops::DerefMut for SnapshotSourceResource {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.as_mut()
    }
}

/// Source that returns the same counts every time.
#[derive(Debug, Clone)]
pub struct ConstantSnapshotSource {
    counts: DirectionCounts,
    window_secs: u64,
}

impl ConstantSnapshotSource {
    pub fn new(counts: DirectionCounts, window_secs: u64) -> Self {
        Self {
            counts,
            window_secs: window_secs.max(1),
        }
    }
}

impl TrafficSnapshotSource for ConstantSnapshotSource {
    fn next_snapshot(&mut self, timestamp: u64) -> TrafficSnapshot {
        TrafficSnapshot::new(timestamp, self.window_secs, self.counts)
    }
}

/// Most recent snapshot pulled by the scheduler.
#[derive(Debug, Default, Resource)]
pub struct CurrentSnapshot(pub Option<TrafficSnapshot>);

/// Which snapshot source a scenario uses.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficSourceKind {
    /// Seeded generator with time-of-day patterns and ambient incidents.
    #[default]
    Generated,
    /// Fixed counts on every draw.
    Constant(DirectionCounts),
}
