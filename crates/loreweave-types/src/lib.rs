//! Shared type definitions for the Loreweave narrative substrate.
//!
//! This crate is the single source of truth for types that cross crate
//! boundaries in the Loreweave workspace.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Enumeration types (events, catalogs, states, outcomes)
//! - [`structs`] -- Core entity structs (state entries, motifs, rumors,
//!   POIs, faction pairs)
//! - [`events`] -- The event envelope and typed payloads

pub mod enums;
pub mod events;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    EffectDimension, EventType, MotifCatalog, MotifScope, MutationKind, PoiState, PoiType,
    RelationState, RumorCatalog, Season, WarDamage, WarOutcome,
};
pub use events::{Event, EventPayload};
pub use ids::{
    EntityId, EventId, FactionId, MotifId, PoiId, RegionId, RumorId, SubscriptionId, TriggerId,
};
pub use structs::{
    Believability, EffectVector, FactionPair, FactionPairKey, Motif, Poi, Rumor, StateEntry,
};
