//! Demand prediction seam.
//!
//! A [Predictor] turns recent snapshots into a forecast of per-direction counts. The
//! adaptive strategy blends the forecast into its demand estimate when a
//! [PredictorResource] is present; without one it runs on observed trends alone.

use std::collections::VecDeque;

use bevy_ecs::prelude::Resource;

use crate::intersection::{DirectionCounts, PerDirection};
use crate::snapshot::TrafficSnapshot;

/// Number of arrival snapshots retained for prediction.
pub const RECENT_SNAPSHOT_CAPACITY: usize = 12;

pub trait Predictor: Send + Sync {
    /// Forecast for the next window, or `None` when there is too little history.
    fn predict(&self, recent: &[TrafficSnapshot]) -> Option<DirectionCounts>;
}

#[derive(Resource)]
pub struct PredictorResource(pub Box<dyn Predictor>);

impl PredictorResource {
    pub fn new(predictor: Box<dyn Predictor>) -> Self {
        Self(predictor)
    }
}

impl std::ops::Deref for PredictorResource {
    type Target = dyn Predictor;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

/// Mean of the last `window` snapshots, rounded to the nearest vehicle.
#[derive(Debug, Clone, Copy)]
pub struct MovingAveragePredictor {
    pub window: usize,
}

impl Default for MovingAveragePredictor {
    fn default() -> Self {
        Self { window: 3 }
    }
}

impl Predictor for MovingAveragePredictor {
    fn predict(&self, recent: &[TrafficSnapshot]) -> Option<DirectionCounts> {
        let window = self.window.max(1);
        if recent.is_empty() {
            return None;
        }
        let tail = &recent[recent.len().saturating_sub(window)..];
        let n = tail.len() as f64;
        Some(PerDirection::from_fn(|direction| {
            let sum: u64 = tail
                .iter()
                .map(|s| u64::from(*s.vehicle_counts.get(direction)))
                .sum();
            (sum as f64 / n).round() as u32
        }))
    }
}

/// Most recent arrival snapshots, oldest first.
#[derive(Debug, Default, Resource)]
pub struct RecentSnapshots {
    buffer: VecDeque<TrafficSnapshot>,
}

impl RecentSnapshots {
    pub fn push(&mut self, snapshot: TrafficSnapshot) {
        self.buffer.push_back(snapshot);
        while self.buffer.len() > RECENT_SNAPSHOT_CAPACITY {
            self.buffer.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Contiguous view, oldest first.
    pub fn as_slice(&mut self) -> &[TrafficSnapshot] {
        self.buffer.make_contiguous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(t: u64, n: u32) -> TrafficSnapshot {
        TrafficSnapshot::new(t, 30, DirectionCounts::new(n, 0, 2, 0))
    }

    #[test]
    fn moving_average_uses_tail() {
        let predictor = MovingAveragePredictor { window: 2 };
        assert!(predictor.predict(&[]).is_none());
        let history = [snapshot(0, 100), snapshot(30, 4), snapshot(60, 7)];
        let forecast = predictor.predict(&history).expect("forecast");
        assert_eq!(forecast.north, 6);
        assert_eq!(forecast.east, 2);
    }

    #[test]
    fn recent_snapshots_are_capped() {
        let mut recent = RecentSnapshots::default();
        for t in 0..20 {
            recent.push(snapshot(t, t as u32));
        }
        assert_eq!(recent.len(), RECENT_SNAPSHOT_CAPACITY);
        assert_eq!(recent.as_slice()[0].timestamp, 8);
    }
}
