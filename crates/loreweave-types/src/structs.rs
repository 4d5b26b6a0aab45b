//! Core entity structs for the Loreweave narrative substrate.
//!
//! These are the shared shapes that cross crate boundaries: world-state
//! entries, motifs, rumors and believability records, POIs, and faction
//! pair records. Engine-internal state lives with its engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::{
    EffectDimension, MotifCatalog, MotifScope, PoiState, PoiType, RelationState, RumorCatalog,
};
use crate::ids::{EntityId, FactionId, MotifId, PoiId, RegionId, RumorId};

// ---------------------------------------------------------------------------
// World State
// ---------------------------------------------------------------------------

/// One immutable entry in the append-only world-state history.
///
/// For a given key, `version` is strictly increasing and entries are never
/// mutated or deleted -- later versions supersede, nothing erases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEntry {
    /// The hierarchical key (dot-separated, e.g. `population.millbrook`).
    pub key: String,
    /// The stored value, opaque to the store.
    pub value: serde_json::Value,
    /// Per-key monotonically increasing version, starting at 1.
    pub version: u64,
    /// Simulation time (world-seconds) when the entry was written.
    pub sim_time: u64,
    /// Designer-chosen grouping (e.g. `"population"`, `"war"`).
    pub category: String,
    /// The region the entry concerns, if it is regional.
    pub region: Option<RegionId>,
}

// ---------------------------------------------------------------------------
// Motifs
// ---------------------------------------------------------------------------

/// A hidden narrative mood, active globally or in one region.
///
/// Motifs are created at rotation time and forgotten on expiry -- no
/// history is retained. They never conflict; concurrently active motifs
/// synthesize through [`EffectVector`] summation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Motif {
    /// Unique id of this motif instance.
    pub id: MotifId,
    /// Which catalog entry this motif carries.
    pub catalog_type: MotifCatalog,
    /// Intensity: fixed at 7 for the global motif, 1..=6 for regional.
    pub intensity: u8,
    /// How many days the motif stays active.
    pub duration_days: u64,
    /// Global or bound to a region.
    pub scope: MotifScope,
    /// The world-day on which the motif became active.
    pub started_on_day: u64,
}

impl Motif {
    /// The first world-day on which this motif is no longer active.
    pub const fn expires_on_day(&self) -> u64 {
        self.started_on_day.saturating_add(self.duration_days)
    }
}

/// A synthesis of motif effects: one `f64` per [`EffectDimension`].
///
/// Merging sums per dimension, which is commutative and associative, so
/// the order in which active motifs are combined never matters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectVector {
    /// Per-dimension magnitudes. Absent dimensions are zero.
    dimensions: BTreeMap<EffectDimension, f64>,
}

impl EffectVector {
    /// An empty (all-zero) effect vector.
    pub const fn new() -> Self {
        Self {
            dimensions: BTreeMap::new(),
        }
    }

    /// Build a vector from explicit `(dimension, magnitude)` pairs.
    pub fn from_pairs(pairs: &[(EffectDimension, f64)]) -> Self {
        let mut v = Self::new();
        for &(dim, magnitude) in pairs {
            v.add(dim, magnitude);
        }
        v
    }

    /// Add `magnitude` to one dimension.
    pub fn add(&mut self, dimension: EffectDimension, magnitude: f64) {
        let slot = self.dimensions.entry(dimension).or_insert(0.0);
        *slot += magnitude;
    }

    /// Fold another vector into this one (per-dimension summation).
    pub fn merge(&mut self, other: &Self) {
        for (&dim, &magnitude) in &other.dimensions {
            self.add(dim, magnitude);
        }
    }

    /// Return a copy of this vector with every dimension scaled by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        let dimensions = self
            .dimensions
            .iter()
            .map(|(&dim, &magnitude)| (dim, magnitude * factor))
            .collect();
        Self { dimensions }
    }

    /// The magnitude for one dimension (zero if absent).
    pub fn get(&self, dimension: EffectDimension) -> f64 {
        self.dimensions.get(&dimension).copied().unwrap_or(0.0)
    }

    /// Iterate over the non-zero dimensions.
    pub fn iter(&self) -> impl Iterator<Item = (EffectDimension, f64)> + '_ {
        self.dimensions.iter().map(|(&dim, &magnitude)| (dim, magnitude))
    }

    /// The dimension with the largest magnitude, if any.
    pub fn dominant(&self) -> Option<(EffectDimension, f64)> {
        self.iter()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
    }
}

// ---------------------------------------------------------------------------
// Rumors
// ---------------------------------------------------------------------------

/// An information item diffusing between entities.
///
/// `truth_value` is immutable after creation and copied unchanged into
/// every variant. Variants link to the rumor they were told from via
/// `parent_id`, forming a DAG rooted at a parentless origin; `origin_id`
/// short-circuits the walk to the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rumor {
    /// Unique id of this rumor or variant.
    pub id: RumorId,
    /// The rumor this variant was told from; `None` for origins.
    pub parent_id: Option<RumorId>,
    /// The root of this rumor's ancestry chain (itself, for origins).
    pub origin_id: RumorId,
    /// Which catalog entry the rumor belongs to.
    pub catalog_type: RumorCatalog,
    /// How true the rumor is, in `[0, 1]`. Never changes across variants.
    pub truth_value: f64,
    /// Severity 1 (minor) to 5 (major); drives emotional weight.
    pub severity: u8,
    /// Free-form designer category (e.g. `"politics"`).
    pub category: String,
    /// The rumor text as currently told.
    pub text: String,
    /// Simulation time the rumor (or variant) came into being.
    pub created_at_sim: u64,
}

impl Rumor {
    /// Whether this rumor is an origin (no parent).
    pub const fn is_origin(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// How strongly one entity believes one rumor.
///
/// Strength decays over time unless any variant sharing the same origin
/// is heard again, which refreshes `last_reinforced_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Believability {
    /// The believing entity.
    pub entity_id: EntityId,
    /// The specific rumor variant the entity heard.
    pub rumor_id: RumorId,
    /// The origin shared by all variants of the rumor.
    pub origin_id: RumorId,
    /// Belief strength in `[0, 1]`.
    pub strength: f64,
    /// Simulation time of the most recent reinforcement.
    pub last_reinforced_at: u64,
}

// ---------------------------------------------------------------------------
// Points of Interest
// ---------------------------------------------------------------------------

/// A settlement, dungeon, or other populated site.
///
/// Created at world-generation time, mutated in place by the population
/// controller and the POI state machine, never deleted -- only
/// transitioned to terminal-like states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poi {
    /// Unique id.
    pub id: PoiId,
    /// Display name.
    pub name: String,
    /// Settlement kind; selects the population base rate.
    pub poi_type: PoiType,
    /// The region this POI belongs to.
    pub region: RegionId,
    /// Current lifecycle state. Assigned by the state machine only.
    pub state: PoiState,
    /// Current resident population.
    pub current_population: u32,
    /// The population this POI grows toward.
    pub target_population: u32,
    /// Ghost-town floor: population never drops below this.
    pub min_population: u32,
    /// Absolute ceiling, at or above `target_population`.
    pub max_population: u32,
    /// Resident NPCs generated for this POI.
    pub npc_count: u32,
    /// Manual override: suppresses automatic state evaluation.
    pub manual_override: bool,
}

// ---------------------------------------------------------------------------
// Factions
// ---------------------------------------------------------------------------

/// The normalized key for an unordered faction pair.
///
/// The two ids are stored in ascending order so each unordered pair has
/// exactly one record regardless of argument order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FactionPairKey {
    /// The lesser faction id.
    pub a: FactionId,
    /// The greater faction id.
    pub b: FactionId,
}

impl FactionPairKey {
    /// Build the normalized key for two factions, in either order.
    pub fn new(x: FactionId, y: FactionId) -> Self {
        if x <= y { Self { a: x, b: y } } else { Self { a: y, b: x } }
    }
}

/// The decaying scalar relationship between two factions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactionPair {
    /// Normalized pair key.
    pub key: FactionPairKey,
    /// Signed tension in `[-100, 100]`: negative toward alliance,
    /// positive toward war.
    pub tension: f64,
    /// Current relationship band.
    pub relation: RelationState,
    /// Whether the pair is at war. Redundant with `relation == War` but
    /// kept explicit for consumers that only care about this bit.
    pub is_at_war: bool,
    /// Simulation time the current war started, if any.
    pub war_started_at: Option<u64>,
    /// Days remaining until the current war auto-resolves, if any.
    pub war_countdown_days: Option<u64>,
}

impl FactionPair {
    /// A fresh neutral pair record.
    pub fn new(x: FactionId, y: FactionId) -> Self {
        Self {
            key: FactionPairKey::new(x, y),
            tension: 0.0,
            relation: RelationState::Neutral,
            is_at_war: false,
            war_started_at: None,
            war_countdown_days: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::enums::EffectDimension;

    #[test]
    fn effect_vector_merge_is_order_independent() {
        let a = EffectVector::from_pairs(&[
            (EffectDimension::Tension, 2.0),
            (EffectDimension::Gloom, 1.0),
        ]);
        let b = EffectVector::from_pairs(&[
            (EffectDimension::Tension, -0.5),
            (EffectDimension::Hope, 3.0),
        ]);
        let c = EffectVector::from_pairs(&[(EffectDimension::Gloom, 0.25)]);

        let mut ab_c = a.clone();
        ab_c.merge(&b);
        ab_c.merge(&c);

        let mut c_ba = c.clone();
        c_ba.merge(&b);
        c_ba.merge(&a);

        assert_eq!(ab_c, c_ba);
        assert!((ab_c.get(EffectDimension::Tension) - 1.5).abs() < 1e-9);
        assert!((ab_c.get(EffectDimension::Gloom) - 1.25).abs() < 1e-9);
    }

    #[test]
    fn effect_vector_dominant_dimension() {
        let v = EffectVector::from_pairs(&[
            (EffectDimension::Mystery, 1.0),
            (EffectDimension::Danger, -4.0),
        ]);
        let (dim, magnitude) = v.dominant().unwrap();
        assert_eq!(dim, EffectDimension::Danger);
        assert!((magnitude - -4.0).abs() < 1e-9);
    }

    #[test]
    fn faction_pair_key_is_symmetric() {
        let x = FactionId::new();
        let y = FactionId::new();
        assert_eq!(FactionPairKey::new(x, y), FactionPairKey::new(y, x));
    }

    #[test]
    fn motif_expiry_day() {
        let motif = Motif {
            id: MotifId::new(),
            catalog_type: MotifCatalog::Omen,
            intensity: 7,
            duration_days: 30,
            scope: MotifScope::Global,
            started_on_day: 12,
        };
        assert_eq!(motif.expires_on_day(), 42);
    }
}
