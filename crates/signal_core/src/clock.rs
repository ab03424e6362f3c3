//! Tick clock and the signal's current interval.
//!
//! One tick is one simulated second. The clock owns the active (phase, state) pair
//! together with the tick the interval started at and its duration.

use bevy_ecs::prelude::Resource;

use crate::intersection::{Phase, SignalState};

/// Milliseconds in one simulated second (one tick).
pub const ONE_SEC_MS: u64 = 1000;

#[derive(Debug, Default, Resource)]
pub struct SimulationClock {
    now: u64,
    /// Real-world epoch (ms) that maps to tick 0; used for time-of-day patterns.
    epoch_ms: i64,
    current_phase: Phase,
    current_state: SignalState,
    phase_start_tick: u64,
    phase_duration: u64,
}

impl SimulationClock {
    pub fn with_epoch(epoch_ms: i64) -> Self {
        Self {
            epoch_ms,
            ..Self::default()
        }
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn epoch_ms(&self) -> i64 {
        self.epoch_ms
    }

    pub fn set_epoch_ms(&mut self, epoch_ms: i64) {
        self.epoch_ms = epoch_ms;
    }

    /// Move to the next tick and return it.
    pub fn advance(&mut self) -> u64 {
        self.now += 1;
        self.now
    }

    pub fn current_phase(&self) -> Phase {
        self.current_phase
    }

    pub fn current_state(&self) -> SignalState {
        self.current_state
    }

    pub fn phase_start_tick(&self) -> u64 {
        self.phase_start_tick
    }

    pub fn phase_duration(&self) -> u64 {
        self.phase_duration
    }

    pub fn elapsed_in_phase(&self) -> u64 {
        self.now.saturating_sub(self.phase_start_tick)
    }

    pub fn time_remaining(&self) -> u64 {
        self.phase_duration.saturating_sub(self.elapsed_in_phase())
    }

    pub fn phase_expired(&self) -> bool {
        self.elapsed_in_phase() >= self.phase_duration
    }

    /// Start a new interval at the current tick.
    pub fn enter(&mut self, phase: Phase, state: SignalState, duration: u64) {
        self.current_phase = phase;
        self.current_state = state;
        self.phase_start_tick = self.now;
        self.phase_duration = duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_expires_after_its_duration() {
        let mut clock = SimulationClock::default();
        clock.enter(Phase::NorthSouth, SignalState::Green, 3);
        assert!(!clock.phase_expired());
        clock.advance();
        clock.advance();
        assert_eq!(clock.time_remaining(), 1);
        assert!(!clock.phase_expired());
        clock.advance();
        assert!(clock.phase_expired());
        assert_eq!(clock.time_remaining(), 0);

        clock.enter(Phase::NorthSouth, SignalState::Yellow, 3);
        assert_eq!(clock.phase_start_tick(), 3);
        assert_eq!(clock.elapsed_in_phase(), 0);
    }
}
