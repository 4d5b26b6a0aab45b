//! Enumeration types for the Loreweave narrative substrate.
//!
//! Catalog enumerations (motifs, rumors, POI types) are deliberately closed
//! sets: the engines draw from them uniformly or by configured weights, and
//! adding a variant is a content decision, not a code change elsewhere.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Event Types
// ---------------------------------------------------------------------------

/// The category of a published event, used as the subscription key.
///
/// Ordering guarantees exist only *within* one event type (by handler
/// priority, then registration order); ordering across types within the
/// same tick is unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// The clock advanced by some amount of world time.
    TimeAdvanced,
    /// A day boundary was crossed.
    DayPassed,
    /// A month boundary was crossed.
    MonthPassed,
    /// A year boundary was crossed.
    YearPassed,
    /// The season changed.
    SeasonChanged,
    /// A scheduled trigger fired.
    TriggerFired,
    /// A new entry was appended to the world state store.
    WorldStateChanged,
    /// A POI's population changed.
    PopulationChanged,
    /// A POI transitioned to a new lifecycle state.
    PoiStateChanged,
    /// A faction pair crossed the war threshold.
    WarDeclared,
    /// A faction captured territory during a war.
    TerritoryCaptured,
    /// A war was resolved into an outcome.
    WarResolved,
    /// A faction pair crossed the alliance threshold.
    AllianceFormed,
    /// A motif expired and a replacement was drawn.
    MotifRotated,
    /// An origin rumor was created.
    RumorCreated,
    /// A rumor was passed from one entity to another.
    RumorPropagated,
    /// An application-defined event carrying an opaque payload.
    Custom,
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// A season of the configured calendar year.
///
/// The year is split evenly into four bands by month index regardless of
/// how many months the calendar defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Season {
    /// First quarter of the year.
    Spring,
    /// Second quarter of the year.
    Summer,
    /// Third quarter of the year.
    Autumn,
    /// Fourth quarter of the year.
    Winter,
}

// ---------------------------------------------------------------------------
// Motifs
// ---------------------------------------------------------------------------

/// The catalog of hidden narrative moods a motif can carry.
///
/// Selection is uniform over the whole catalog; no catalog type is ever
/// locked or excluded, and repeats are permitted across rotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MotifCatalog {
    /// Trust erodes; betrayals and double-dealing color interactions.
    Betrayal,
    /// Portents, omens, and unease about what is coming.
    Omen,
    /// Celebration, spectacle, and loosened purse strings.
    Festival,
    /// Sickness spreads in whispers and closed doors.
    Plague,
    /// Trade flows and ambitions swell.
    Prosperity,
    /// The dead and the past refuse to stay buried.
    Haunting,
    /// Something new has been found, and everyone wants a piece.
    Discovery,
    /// Old grievances sharpen into open friction.
    Strife,
    /// Fields, larders, and the rhythm of honest work.
    Harvest,
    /// Roads call; strangers arrive and locals leave.
    Wanderlust,
    /// Collective grief after loss on a large scale.
    Mourning,
    /// Hidden dealings, codes, and things unsaid.
    Conspiracy,
}

impl MotifCatalog {
    /// All catalog entries, in declaration order.
    ///
    /// Uniform draws index into this slice.
    pub const ALL: [Self; 12] = [
        Self::Betrayal,
        Self::Omen,
        Self::Festival,
        Self::Plague,
        Self::Prosperity,
        Self::Haunting,
        Self::Discovery,
        Self::Strife,
        Self::Harvest,
        Self::Wanderlust,
        Self::Mourning,
        Self::Conspiracy,
    ];
}

/// Where a motif applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotifScope {
    /// The single world-wide motif.
    Global,
    /// A motif bound to one region.
    Regional(crate::ids::RegionId),
}

/// A dimension of a motif effect vector.
///
/// Synthesis sums contributions per dimension, so merge order never
/// matters (commutative and associative by construction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EffectDimension {
    /// Pressure toward conflict and suspicion.
    Tension,
    /// Physical danger in the world.
    Danger,
    /// Festivity, warmth, and social openness.
    Festivity,
    /// The unexplained and the uncanny.
    Mystery,
    /// Grief, dread, and heaviness.
    Gloom,
    /// Optimism and forward motion.
    Hope,
}

// ---------------------------------------------------------------------------
// Rumors
// ---------------------------------------------------------------------------

/// The catalog of rumor subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RumorCatalog {
    /// Someone was seen somewhere they should not have been.
    Sighting,
    /// A crime, real or imagined.
    Crime,
    /// Treasure, windfalls, and opportunity.
    Fortune,
    /// Threats approaching from outside.
    Threat,
    /// Scandal among the notable.
    Scandal,
    /// Strange happenings with no explanation.
    Portent,
}

/// The single mutation operator applied when a propagation hop mutates
/// a rumor into a child variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    /// Quantities and stakes grow in the telling.
    Exaggeration,
    /// The teller plays the matter down.
    Minimization,
    /// A plausible invented detail is added.
    DetailAddition,
    /// A detail is dropped.
    DetailLoss,
    /// The subject of the rumor shifts to someone else. Proper nouns are
    /// preserved with high probability.
    SubjectShift,
}

impl MutationKind {
    /// All mutation operators, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Exaggeration,
        Self::Minimization,
        Self::DetailAddition,
        Self::DetailLoss,
        Self::SubjectShift,
    ];
}

// ---------------------------------------------------------------------------
// Points of Interest
// ---------------------------------------------------------------------------

/// The kind of settlement or site a POI represents.
///
/// Population base rates are configured per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PoiType {
    /// A small farming or fishing settlement.
    Village,
    /// A market town.
    Town,
    /// A walled city.
    City,
    /// A military outpost.
    Fortress,
    /// A religious site.
    Temple,
}

/// Lifecycle state of a POI.
///
/// Transitions pass through the POI state machine only; no other code
/// assigns this field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PoiState {
    /// Healthy and populated.
    Normal,
    /// Population falling below sustainable levels.
    Declining,
    /// Effectively empty but intact.
    Abandoned,
    /// Collapsed; a terminal-like state.
    Ruins,
    /// Overrun and hostile; a terminal-like state.
    Dungeon,
    /// Recovering from abandonment.
    Repopulating,
    /// Designer-controlled; exempt from automatic evaluation.
    Special,
}

impl PoiState {
    /// Whether this state is terminal-like: population mechanics and
    /// automatic transitions no longer apply.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ruins | Self::Dungeon | Self::Special)
    }
}

/// Severity of war damage applied to a POI, used by the faction engine
/// to force lifecycle transitions outside the population-threshold path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WarDamage {
    /// Raids and skirmishes; forces `Declining`.
    Moderate,
    /// Sacking; forces `Abandoned`.
    Heavy,
    /// Razing; forces `Ruins`.
    Devastating,
}

// ---------------------------------------------------------------------------
// Factions
// ---------------------------------------------------------------------------

/// Relationship state of an unordered faction pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RelationState {
    /// Formal allies (tension at or below the alliance threshold).
    Alliance,
    /// No strong relationship either way.
    Neutral,
    /// Competing interests, short of open hostility.
    Rivalry,
    /// Open hostility, short of war.
    Hostile,
    /// At war.
    War,
    /// A war recently ended; tensions are suspended, not resolved.
    Truce,
}

/// How a war concluded.
///
/// Each outcome maps to a deterministic consequence bundle (population
/// shift, resource penalty, aftermath motif, tension reset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WarOutcome {
    /// One side wins cleanly.
    DecisiveVictory,
    /// One side wins at ruinous cost.
    PyrrhicVictory,
    /// Neither side prevails.
    Stalemate,
    /// The war ends at the table, not the field.
    NegotiatedSettlement,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motif_catalog_is_complete() {
        // The uniform draw depends on ALL covering every variant.
        assert_eq!(MotifCatalog::ALL.len(), 12);
    }

    #[test]
    fn terminal_states() {
        assert!(PoiState::Ruins.is_terminal());
        assert!(PoiState::Dungeon.is_terminal());
        assert!(PoiState::Special.is_terminal());
        assert!(!PoiState::Normal.is_terminal());
        assert!(!PoiState::Abandoned.is_terminal());
    }

    #[test]
    fn enums_roundtrip_serde() {
        let json = serde_json::to_string(&EventType::PoiStateChanged).ok();
        assert!(json.is_some());
        let back: Result<EventType, _> = serde_json::from_str(json.as_deref().unwrap_or(""));
        assert!(matches!(back, Ok(EventType::PoiStateChanged)));
    }
}
