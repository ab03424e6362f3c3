//! Telemetry / KPIs: the append-only phase history, running counters, and the
//! read-only per-tick view handed to observers.

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::intersection::{DirectionCounts, Phase, SignalState};

/// One signal interval, recorded when the interval begins.
/// `vehicle_counts` is the queue snapshot at the transition instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub timestamp: u64,
    pub phase: Phase,
    pub state: SignalState,
    /// Interval length in seconds.
    pub duration: u64,
    pub vehicle_counts: DirectionCounts,
}

/// Ordered history of every interval in the run. Records are never mutated.
#[derive(Debug, Default, Resource)]
pub struct PhaseHistory {
    records: Vec<PhaseRecord>,
}

impl PhaseHistory {
    pub fn push(&mut self, record: PhaseRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[PhaseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&PhaseRecord> {
        self.records.last()
    }

    /// Green records only, in order.
    pub fn greens(&self) -> impl Iterator<Item = &PhaseRecord> {
        self.records
            .iter()
            .filter(|record| record.state == SignalState::Green)
    }
}

/// Vehicles discharged per direction per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct FlowRates {
    pub green: u32,
    pub yellow: u32,
}

impl Default for FlowRates {
    fn default() -> Self {
        Self {
            green: 3,
            yellow: 1,
        }
    }
}

impl FlowRates {
    pub fn for_state(&self, state: SignalState) -> u32 {
        match state {
            SignalState::Green => self.green,
            SignalState::Yellow => self.yellow,
        }
    }
}

/// Running counters. Insert as a resource; the processing system updates it every tick.
#[derive(Debug, Default, Clone, Resource)]
pub struct SimTelemetry {
    pub processed_vehicles: u64,
    /// Sum over ticks of vehicles queued on the inactive pair (vehicle-seconds).
    pub total_wait_time: u64,
    pub phase_changes: u64,
}

impl SimTelemetry {
    /// Accumulated wait per processed vehicle; 0 before anything is processed.
    pub fn average_wait_time(&self) -> f64 {
        if self.processed_vehicles == 0 {
            return 0.0;
        }
        self.total_wait_time as f64 / self.processed_vehicles as f64
    }

    /// Vehicles processed per simulated minute.
    pub fn throughput(&self, elapsed_ticks: u64) -> f64 {
        self.processed_vehicles as f64 / elapsed_ticks.max(1) as f64 * 60.0
    }
}

/// Read-only state of the intersection after a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalView {
    pub strategy_name: String,
    pub elapsed_ticks: u64,
    pub current_phase: Phase,
    pub current_state: SignalState,
    pub time_remaining_in_phase: u64,
    pub queue_snapshot: DirectionCounts,
    pub avg_wait_time: f64,
    pub throughput: f64,
}

impl SignalView {
    /// One-line status for terminal output.
    pub fn status_line(&self) -> String {
        let q = &self.queue_snapshot;
        format!(
            "[{}] t={}s {} {} ({}s left) queues N={} S={} E={} W={} wait={:.2}s throughput={:.2}/min",
            self.strategy_name,
            self.elapsed_ticks,
            self.current_phase.name(),
            self.current_state.name(),
            self.time_remaining_in_phase,
            q.north,
            q.south,
            q.east,
            q.west,
            self.avg_wait_time,
            self.throughput
        )
    }
}
