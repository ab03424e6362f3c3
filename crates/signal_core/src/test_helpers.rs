//! Test helpers for common test setup and utilities.
//!
//! Shared by unit tests, integration tests and benches.

use std::collections::VecDeque;

use bevy_ecs::prelude::World;

use crate::intersection::DirectionCounts;
use crate::snapshot::{TrafficSnapshot, TrafficSnapshotSource};

/// Snapshot with only counts, covering a 5-minute window.
pub fn snapshot(north: u32, south: u32, east: u32, west: u32) -> TrafficSnapshot {
    TrafficSnapshot::new(0, 300, DirectionCounts::new(north, south, east, west))
}

/// Source that replays a fixed script of counts, then repeats the last entry
/// (or zeros when the script is empty).
#[derive(Debug, Clone)]
pub struct ScriptedSnapshotSource {
    script: VecDeque<DirectionCounts>,
    last: DirectionCounts,
    window_secs: u64,
}

impl ScriptedSnapshotSource {
    pub fn new(script: impl IntoIterator<Item = DirectionCounts>, window_secs: u64) -> Self {
        Self {
            script: script.into_iter().collect(),
            last: DirectionCounts::default(),
            window_secs: window_secs.max(1),
        }
    }
}

impl TrafficSnapshotSource for ScriptedSnapshotSource {
    fn next_snapshot(&mut self, timestamp: u64) -> TrafficSnapshot {
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        TrafficSnapshot::new(timestamp, self.window_secs, self.last)
    }
}

/// Create a basic test world with every scenario resource, using constant zero traffic,
/// the fixed strategy and no incidents.
///
/// For other setups use [crate::scenario::build_scenario] directly.
pub fn create_test_world() -> World {
    let mut world = World::new();
    crate::scenario::build_scenario(
        &mut world,
        crate::scenario::ScenarioParams::default()
            .with_strategy(crate::strategy::StrategyKind::Fixed)
            .with_incidents(false)
            .with_traffic_source(crate::snapshot::TrafficSourceKind::Constant(
                DirectionCounts::default(),
            )),
    );
    world
}
