//! Per-direction vehicle queues with a ledger of every vehicle added or removed
//! outside the drain path.

use bevy_ecs::prelude::Resource;

use crate::intersection::{Direction, DirectionCounts};

/// Vehicles waiting per direction. Counts never go negative.
#[derive(Debug, Clone, Default, Resource)]
pub struct VehicleQueues {
    counts: DirectionCounts,
    arrived_from_snapshots: u64,
    added_by_incidents: u64,
    removed_by_incidents: u64,
}

impl VehicleQueues {
    pub fn counts(&self) -> DirectionCounts {
        self.counts
    }

    pub fn get(&self, direction: Direction) -> u32 {
        *self.counts.get(direction)
    }

    pub fn add_arrivals(&mut self, arrivals: &DirectionCounts) {
        for (direction, count) in arrivals.iter() {
            *self.counts.get_mut(direction) += count;
            self.arrived_from_snapshots += u64::from(*count);
        }
    }

    pub fn add_incident(&mut self, direction: Direction, amount: u32) {
        *self.counts.get_mut(direction) += amount;
        self.added_by_incidents += u64::from(amount);
    }

    /// Overwrite one direction's queue, booking the difference against incidents.
    pub fn set_by_incident(&mut self, direction: Direction, value: u32) {
        let slot = self.counts.get_mut(direction);
        if value >= *slot {
            self.added_by_incidents += u64::from(value - *slot);
        } else {
            self.removed_by_incidents += u64::from(*slot - value);
        }
        *slot = value;
    }

    /// Remove up to `max` vehicles; returns how many left the queue.
    pub fn drain(&mut self, direction: Direction, max: u32) -> u32 {
        let slot = self.counts.get_mut(direction);
        let drained = (*slot).min(max);
        *slot -= drained;
        drained
    }

    pub fn arrived_from_snapshots(&self) -> u64 {
        self.arrived_from_snapshots
    }

    pub fn added_by_incidents(&self) -> u64 {
        self.added_by_incidents
    }

    pub fn removed_by_incidents(&self) -> u64 {
        self.removed_by_incidents
    }

    /// Vehicles that entered the system minus those removed by incidents.
    ///
    /// Over a run, processed vehicles plus the final queue total equals this value.
    pub fn net_added(&self) -> u64 {
        (self.arrived_from_snapshots + self.added_by_incidents)
            .saturating_sub(self.removed_by_incidents)
    }
}
