//! The event envelope and typed payloads carried through the dispatcher.
//!
//! Events are immutable once published. The envelope carries both the
//! simulation time at publication (`sim_time`, world-seconds) and a real
//! wall-clock timestamp (`published_at`) for diagnostics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{EventType, Season, WarOutcome};
use crate::ids::{EntityId, EventId, FactionId, PoiId, RumorId};
use crate::structs::{FactionPairKey, Motif, StateEntry};

/// An immutable event flowing through the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event id.
    pub id: EventId,
    /// The subscription key for this event.
    pub event_type: EventType,
    /// Simulation time (world-seconds) at publication.
    pub sim_time: u64,
    /// Wall-clock timestamp at publication.
    pub published_at: DateTime<Utc>,
    /// The typed payload.
    pub payload: EventPayload,
    /// Publisher-assigned priority, carried for middleware and consumers.
    /// Handler ordering uses *subscription* priority, not this field.
    pub priority: i32,
    /// The component that published the event (e.g. `"scheduler"`).
    pub source: String,
}

impl Event {
    /// Build an event from a payload, deriving the event type.
    pub fn new(sim_time: u64, payload: EventPayload, source: impl Into<String>) -> Self {
        Self {
            id: EventId::new(),
            event_type: payload.event_type(),
            sim_time,
            published_at: Utc::now(),
            payload,
            priority: 0,
            source: source.into(),
        }
    }

    /// Set the publisher-assigned priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Typed payloads, one variant per domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    /// The clock advanced.
    TimeAdvanced {
        /// New current simulation time.
        sim_time: u64,
        /// World-seconds added this tick.
        delta: u64,
    },
    /// A day boundary was crossed.
    DayPassed {
        /// Absolute world-day number (0-based).
        day: u64,
    },
    /// A month boundary was crossed.
    MonthPassed {
        /// Calendar year (0-based).
        year: u64,
        /// Month within the year (0-based).
        month: u64,
    },
    /// A year boundary was crossed.
    YearPassed {
        /// Calendar year just entered (0-based).
        year: u64,
    },
    /// The season changed.
    SeasonChanged {
        /// The season just left.
        old: Season,
        /// The season just entered.
        new: Season,
    },
    /// A scheduled trigger fired.
    TriggerFired {
        /// The trigger's designer-assigned label.
        label: String,
    },
    /// A new entry was appended to the world state store.
    WorldStateChanged {
        /// The entry just written.
        entry: StateEntry,
    },
    /// A POI's population changed.
    PopulationChanged {
        /// The POI.
        poi_id: PoiId,
        /// Population before.
        old: u32,
        /// Population after.
        new: u32,
    },
    /// A POI transitioned to a new lifecycle state.
    PoiStateChanged {
        /// The POI.
        poi_id: PoiId,
        /// State before.
        old_state: crate::enums::PoiState,
        /// State after.
        new_state: crate::enums::PoiState,
    },
    /// A faction pair crossed the war threshold.
    WarDeclared {
        /// The normalized pair.
        pair: FactionPairKey,
        /// Tension at declaration.
        tension: f64,
    },
    /// A faction captured territory during a war.
    TerritoryCaptured {
        /// The normalized pair of the war.
        pair: FactionPairKey,
        /// The capturing faction.
        captor: FactionId,
        /// The POI captured.
        poi_id: PoiId,
    },
    /// A war was resolved.
    WarResolved {
        /// The normalized pair.
        pair: FactionPairKey,
        /// The outcome.
        outcome: WarOutcome,
    },
    /// A faction pair crossed the alliance threshold.
    AllianceFormed {
        /// The normalized pair.
        pair: FactionPairKey,
        /// Tension at formation.
        tension: f64,
    },
    /// A motif expired and a replacement was drawn.
    MotifRotated {
        /// The newly active motif.
        motif: Motif,
    },
    /// An origin rumor was created.
    RumorCreated {
        /// The new rumor.
        rumor_id: RumorId,
    },
    /// A rumor was passed between entities.
    RumorPropagated {
        /// The rumor that was told.
        rumor_id: RumorId,
        /// The transmitting entity.
        from: EntityId,
        /// The receiving entity.
        to: EntityId,
        /// The child variant, if the hop mutated.
        variant_id: Option<RumorId>,
    },
    /// An application-defined event.
    Custom(serde_json::Value),
}

impl EventPayload {
    /// The [`EventType`] this payload dispatches under.
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::TimeAdvanced { .. } => EventType::TimeAdvanced,
            Self::DayPassed { .. } => EventType::DayPassed,
            Self::MonthPassed { .. } => EventType::MonthPassed,
            Self::YearPassed { .. } => EventType::YearPassed,
            Self::SeasonChanged { .. } => EventType::SeasonChanged,
            Self::TriggerFired { .. } => EventType::TriggerFired,
            Self::WorldStateChanged { .. } => EventType::WorldStateChanged,
            Self::PopulationChanged { .. } => EventType::PopulationChanged,
            Self::PoiStateChanged { .. } => EventType::PoiStateChanged,
            Self::WarDeclared { .. } => EventType::WarDeclared,
            Self::TerritoryCaptured { .. } => EventType::TerritoryCaptured,
            Self::WarResolved { .. } => EventType::WarResolved,
            Self::AllianceFormed { .. } => EventType::AllianceFormed,
            Self::MotifRotated { .. } => EventType::MotifRotated,
            Self::RumorCreated { .. } => EventType::RumorCreated,
            Self::RumorPropagated { .. } => EventType::RumorPropagated,
            Self::Custom(_) => EventType::Custom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_maps_to_event_type() {
        let payload = EventPayload::DayPassed { day: 3 };
        assert_eq!(payload.event_type(), EventType::DayPassed);

        let event = Event::new(259_200, payload, "scheduler");
        assert_eq!(event.event_type, EventType::DayPassed);
        assert_eq!(event.sim_time, 259_200);
        assert_eq!(event.priority, 0);
    }

    #[test]
    fn priority_builder() {
        let event = Event::new(
            0,
            EventPayload::Custom(serde_json::Value::Null),
            "test",
        )
        .with_priority(10);
        assert_eq!(event.priority, 10);
    }
}
