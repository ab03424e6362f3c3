//! Incidents: transient queue perturbations injected per tick, and long-running
//! ambient incidents that scale every snapshot drawn while they are active.
//!
//! Injected incidents act on the queues directly:
//! - surge adds vehicles to one direction
//! - roadblock scales one direction's queue down (floor), with no recovery
//! - accident zeroes one direction and schedules a single restore of the pre-incident count
//!
//! Scheduled restores are kept as [PendingRecovery] entries on the injector and removed
//! once fired. The [IncidentLog] is append-only.

use std::collections::{BTreeMap, BTreeSet};

use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::intersection::{Direction, PerDirection};
use crate::queues::VehicleQueues;

// ---------------------------------------------------------------------------
// Ambient incidents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbientIncidentKind {
    Accident,
    Construction,
    Weather,
    Event,
}

impl AmbientIncidentKind {
    pub const ALL: [AmbientIncidentKind; 4] = [
        AmbientIncidentKind::Accident,
        AmbientIncidentKind::Construction,
        AmbientIncidentKind::Weather,
        AmbientIncidentKind::Event,
    ];
}

/// A long-running incident affecting one or more directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbientIncident {
    pub id: u32,
    pub kind: AmbientIncidentKind,
    pub affected: Vec<Direction>,
    /// Multiplicative volume impact per direction.
    pub impact: PerDirection<f64>,
    pub start_tick: u64,
    pub end_tick: u64,
}

impl AmbientIncident {
    pub fn affects(&self, direction: Direction) -> bool {
        self.affected.contains(&direction)
    }
}

/// Active ambient incidents keyed by id.
#[derive(Debug, Clone, Default)]
pub struct AmbientIncidents {
    active: BTreeMap<u32, AmbientIncident>,
}

impl AmbientIncidents {
    /// Open an incident of random kind on 1–4 random directions.
    ///
    /// Affected directions get an impact in `[0.3, 0.7)`, the others in `[1.0, 1.2)`.
    pub fn open_random<R: Rng>(&mut self, rng: &mut R, now: u64, duration_secs: u64) -> AmbientIncident {
        let kind = *AmbientIncidentKind::ALL
            .choose(rng)
            .unwrap_or(&AmbientIncidentKind::Accident);
        let affected_count = rng.gen_range(1..=Direction::ALL.len());
        let mut affected: Vec<Direction> = Direction::ALL
            .choose_multiple(rng, affected_count)
            .copied()
            .collect();
        affected.sort();
        let impact = PerDirection::from_fn(|d| {
            if affected.contains(&d) {
                rng.gen_range(0.3..0.7)
            } else {
                rng.gen_range(1.0..1.2)
            }
        });

        let mut id = rng.gen_range(10_000..=99_999);
        while self.active.contains_key(&id) {
            id = rng.gen_range(10_000..=99_999);
        }

        let incident = AmbientIncident {
            id,
            kind,
            affected,
            impact,
            start_tick: now,
            end_tick: now + duration_secs,
        };
        self.insert(incident.clone());
        incident
    }

    pub fn insert(&mut self, incident: AmbientIncident) {
        self.active.insert(incident.id, incident);
    }

    /// Drop incidents whose end lies strictly before `now`; returns the removed ids.
    pub fn expire(&mut self, now: u64) -> Vec<u32> {
        let expired: Vec<u32> = self
            .active
            .values()
            .filter(|incident| incident.end_tick < now)
            .map(|incident| incident.id)
            .collect();
        for id in &expired {
            self.active.remove(id);
        }
        expired
    }

    /// Combined impact of all active incidents on a direction.
    pub fn impact_on(&self, direction: Direction) -> f64 {
        self.active
            .values()
            .map(|incident| *incident.impact.get(direction))
            .product()
    }

    pub fn affects(&self, direction: Direction) -> bool {
        self.active.values().any(|incident| incident.affects(direction))
    }

    pub fn active_ids(&self) -> BTreeSet<u32> {
        self.active.keys().copied().collect()
    }

    pub fn get(&self, id: u32) -> Option<&AmbientIncident> {
        self.active.get(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }
}

// ---------------------------------------------------------------------------
// Injected incidents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentKind {
    Surge,
    Roadblock,
    Accident,
}

impl IncidentKind {
    pub const ALL: [IncidentKind; 3] = [
        IncidentKind::Surge,
        IncidentKind::Roadblock,
        IncidentKind::Accident,
    ];
}

/// Incident injection behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentConfig {
    pub enabled: bool,
    /// Chance per tick that one incident fires.
    pub probability: f64,
    pub surge_min: u32,
    pub surge_max: u32,
    /// Queue multiplier applied by a roadblock (result floored).
    pub roadblock_factor: f64,
    /// Ticks until an accident's queue is restored.
    pub accident_recovery_ticks: u64,
    /// Chance per snapshot refresh that an ambient incident opens. 0 disables.
    pub ambient_probability: f64,
    pub ambient_min_secs: u64,
    pub ambient_max_secs: u64,
}

impl Default for IncidentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probability: 0.10,
            surge_min: 10,
            surge_max: 30,
            roadblock_factor: 0.5,
            accident_recovery_ticks: 20,
            ambient_probability: 0.0,
            ambient_min_secs: 600,
            ambient_max_secs: 1800,
        }
    }
}

/// What an [IncidentRecord] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentEvent {
    Surge,
    Roadblock,
    Accident,
    AccidentCleared,
    AmbientOpened,
}

impl From<IncidentKind> for IncidentEvent {
    fn from(kind: IncidentKind) -> Self {
        match kind {
            IncidentKind::Surge => IncidentEvent::Surge,
            IncidentKind::Roadblock => IncidentEvent::Roadblock,
            IncidentKind::Accident => IncidentEvent::Accident,
        }
    }
}

/// One entry of the incident log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub tick: u64,
    pub event: IncidentEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    pub queue_before: u32,
    pub queue_after: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambient_id: Option<u32>,
}

/// Append-only log of every incident applied during a run.
#[derive(Debug, Default, Resource)]
pub struct IncidentLog {
    pub records: Vec<IncidentRecord>,
}

/// An accident restore waiting for its due tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRecovery {
    pub direction: Direction,
    pub restore_to: u32,
    pub due_tick: u64,
}

#[derive(Debug, Resource)]
pub struct IncidentInjector {
    config: IncidentConfig,
    rng: StdRng,
    pending: Vec<PendingRecovery>,
}

impl IncidentInjector {
    pub fn new(config: IncidentConfig, seed: u64) -> Self {
        Self {
            config: sanitize(config),
            rng: StdRng::seed_from_u64(seed),
            pending: Vec::new(),
        }
    }

    pub fn config(&self) -> &IncidentConfig {
        &self.config
    }

    pub fn pending(&self) -> &[PendingRecovery] {
        &self.pending
    }

    /// Decide whether an incident fires this tick, and which one where.
    pub fn roll(&mut self) -> Option<(IncidentKind, Direction)> {
        if !self.config.enabled || !self.rng.gen_bool(self.config.probability) {
            return None;
        }
        let kind = *IncidentKind::ALL.choose(&mut self.rng)?;
        let direction = *Direction::ALL.choose(&mut self.rng)?;
        Some((kind, direction))
    }

    /// Apply one incident to `direction`'s queue immediately.
    pub fn inject(
        &mut self,
        kind: IncidentKind,
        direction: Direction,
        queues: &mut VehicleQueues,
        now: u64,
    ) -> IncidentRecord {
        let queue_before = queues.get(direction);
        match kind {
            IncidentKind::Surge => {
                let amount = self
                    .rng
                    .gen_range(self.config.surge_min..=self.config.surge_max);
                queues.add_incident(direction, amount);
            }
            IncidentKind::Roadblock => {
                let reduced = (f64::from(queue_before) * self.config.roadblock_factor).floor() as u32;
                queues.set_by_incident(direction, reduced);
            }
            IncidentKind::Accident => {
                queues.set_by_incident(direction, 0);
                self.pending.push(PendingRecovery {
                    direction,
                    restore_to: queue_before,
                    due_tick: now + self.config.accident_recovery_ticks,
                });
            }
        }
        let queue_after = queues.get(direction);
        log::info!(
            "Incident at tick {now}: {kind:?} on {} ({queue_before} -> {queue_after})",
            direction.name()
        );
        IncidentRecord {
            tick: now,
            event: kind.into(),
            direction: Some(direction),
            queue_before,
            queue_after,
            ambient_id: None,
        }
    }

    /// Fire every restore due at or before `now`. Each fires once and is removed.
    pub fn recover_due(&mut self, queues: &mut VehicleQueues, now: u64) -> Vec<IncidentRecord> {
        let (due, waiting): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|pending| pending.due_tick <= now);
        self.pending = waiting;

        due.into_iter()
            .map(|pending| {
                let queue_before = queues.get(pending.direction);
                queues.set_by_incident(pending.direction, pending.restore_to);
                log::info!("Accident cleared on {} at tick {now}", pending.direction.name());
                IncidentRecord {
                    tick: now,
                    event: IncidentEvent::AccidentCleared,
                    direction: Some(pending.direction),
                    queue_before,
                    queue_after: pending.restore_to,
                    ambient_id: None,
                }
            })
            .collect()
    }

    /// Possibly open an ambient incident in `book`; called once per snapshot refresh.
    pub fn maybe_open_ambient(
        &mut self,
        book: &mut AmbientIncidents,
        now: u64,
    ) -> Option<AmbientIncident> {
        if !self.config.enabled
            || self.config.ambient_probability <= 0.0
            || !self.rng.gen_bool(self.config.ambient_probability)
        {
            return None;
        }
        let duration = self
            .rng
            .gen_range(self.config.ambient_min_secs..=self.config.ambient_max_secs);
        let incident = book.open_random(&mut self.rng, now, duration);
        log::info!(
            "Ambient incident {} ({:?}) opened at tick {now} for {duration}s",
            incident.id,
            incident.kind
        );
        Some(incident)
    }
}

fn sanitize(mut config: IncidentConfig) -> IncidentConfig {
    let clamp_probability = |p: f64, field: &str| {
        let clamped = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
        if clamped != p {
            log::warn!("incident {field} {p} out of range; using {clamped}");
        }
        clamped
    };
    config.probability = clamp_probability(config.probability, "probability");
    config.ambient_probability = clamp_probability(config.ambient_probability, "ambient_probability");
    if config.surge_min > config.surge_max {
        log::warn!(
            "surge range {}..={} is inverted; swapping",
            config.surge_min,
            config.surge_max
        );
        std::mem::swap(&mut config.surge_min, &mut config.surge_max);
    }
    if config.ambient_min_secs > config.ambient_max_secs {
        std::mem::swap(&mut config.ambient_min_secs, &mut config.ambient_max_secs);
    }
    if !config.roadblock_factor.is_finite() || !(0.0..=1.0).contains(&config.roadblock_factor) {
        log::warn!(
            "roadblock factor {} out of range; using 0.5",
            config.roadblock_factor
        );
        config.roadblock_factor = 0.5;
    }
    config
}
