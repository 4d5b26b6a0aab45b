//! The rumor engine: information diffusion with mutation and belief.
//!
//! Origin rumors are created whole; propagation hops may mutate the text
//! into child variants, each applying exactly one operator. Variants link
//! to the rumor they were told from by `parent_id`, forming a DAG rooted
//! at a parentless origin. `truth_value` is copied unchanged across every
//! hop.
//!
//! Believability is tracked per `(entity, origin)` pair, so hearing any
//! variant of a rumor reinforces belief in the whole family. Unreinforced
//! belief decays daily.
//!
//! Rumors are never written into the world-state store or promoted to
//! permanent memory. This is an invariant, not a tuning choice.
//!
//! # Events
//!
//! - `RumorCreated` -- emitted once per origin rumor.
//! - `RumorPropagated` -- emitted once per hop, carrying the child
//!   variant id if the hop mutated.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use loreweave_events::EventDispatcher;
use loreweave_types::{
    EntityId, Event, EventPayload, MutationKind, Believability, Rumor, RumorCatalog, RumorId,
};

use crate::config::RumorConfig;
use crate::error::NarrativeError;

/// Belief strength at or above which an entity treats a rumor as fact.
const FIRM_BELIEF: f64 = 0.8;

/// Belief strength at or above which an entity repeats a rumor.
const CASUAL_BELIEF: f64 = 0.5;

/// Belief strength below which an entity has effectively dismissed it.
const DOUBT_FLOOR: f64 = 0.2;

/// How strongly an entity holds a rumor, as the content layer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeliefLabel {
    /// Treated as established fact.
    Firm,
    /// Believed and repeated.
    Believes,
    /// Heard, but doubted.
    Doubtful,
    /// Effectively rejected.
    Dismissive,
}

impl BeliefLabel {
    /// Classify a belief strength into a qualitative tier.
    fn for_strength(strength: f64) -> Self {
        if strength >= FIRM_BELIEF {
            Self::Firm
        } else if strength >= CASUAL_BELIEF {
            Self::Believes
        } else if strength >= DOUBT_FLOOR {
            Self::Doubtful
        } else {
            Self::Dismissive
        }
    }
}

/// An entity participating in rumor diffusion.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityProfile {
    /// The entity's id.
    pub id: EntityId,
    /// Display name, used by subject-shift text mutation.
    pub name: String,
    /// How accurately this entity retells things, in `[0, 1]`.
    pub reliability: f64,
    /// How hard this entity is to convince, in `[0, 1]`.
    pub skepticism: f64,
    /// Affinity toward other entities, in `[-1, 1]`. Missing pairs are 0.
    pub relationships: BTreeMap<EntityId, f64>,
}

/// What one propagation hop produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationOutcome {
    /// The rumor the receiver actually heard (the variant if one formed).
    pub heard: RumorId,
    /// The child variant, if the hop mutated.
    pub variant: Option<RumorId>,
    /// The mutation operator applied, if any.
    pub mutation: Option<MutationKind>,
    /// The receiver's belief strength after the hop.
    pub belief: f64,
}

/// One entry in a [`RumorContext`] snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct BelievedRumor {
    /// The variant the entity most recently heard.
    pub rumor_id: RumorId,
    /// The rumor's catalog type.
    pub catalog_type: RumorCatalog,
    /// The text as the entity heard it.
    pub text: String,
    /// Belief strength in `[0, 1]`.
    pub strength: f64,
    /// Qualitative tier for the content layer.
    pub label: BeliefLabel,
}

/// Read-only snapshot of what one entity currently believes, strongest
/// first.
#[derive(Debug, Clone, PartialEq)]
pub struct RumorContext {
    /// The entity the snapshot describes.
    pub entity_id: EntityId,
    /// Believed rumors, sorted by descending strength.
    pub rumors: Vec<BelievedRumor>,
}

/// Creates, propagates, and decays rumors.
pub struct RumorEngine {
    config: RumorConfig,
    rng: SmallRng,
    rumors: BTreeMap<RumorId, Rumor>,
    entities: BTreeMap<EntityId, EntityProfile>,
    /// Belief keyed by (believer, origin): any variant of one origin
    /// reinforces the same record.
    beliefs: BTreeMap<(EntityId, RumorId), Believability>,
    /// Sim time of the last decay pass; beliefs reinforced since then
    /// sit out the next one.
    last_decay_at: u64,
    dispatcher: Arc<EventDispatcher>,
}

impl RumorEngine {
    /// Build an empty engine with a seeded generator.
    pub fn new(config: RumorConfig, seed: u64, dispatcher: Arc<EventDispatcher>) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
            rumors: BTreeMap::new(),
            entities: BTreeMap::new(),
            beliefs: BTreeMap::new(),
            last_decay_at: 0,
            dispatcher,
        }
    }

    /// Register an entity that can transmit and receive rumors.
    pub fn register_entity(&mut self, profile: EntityProfile) {
        self.entities.insert(profile.id, profile);
    }

    /// Set the affinity `from` feels toward `to`, clamped to `[-1, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`NarrativeError::EntityNotFound`] for an unknown `from`.
    pub fn set_relationship(
        &mut self,
        from: EntityId,
        to: EntityId,
        affinity: f64,
    ) -> Result<(), NarrativeError> {
        let profile = self
            .entities
            .get_mut(&from)
            .ok_or(NarrativeError::EntityNotFound(from))?;
        profile.relationships.insert(to, affinity.clamp(-1.0, 1.0));
        Ok(())
    }

    /// Look up a rumor.
    ///
    /// # Errors
    ///
    /// Returns [`NarrativeError::RumorNotFound`] for an unknown id.
    pub fn rumor(&self, id: RumorId) -> Result<&Rumor, NarrativeError> {
        self.rumors.get(&id).ok_or(NarrativeError::RumorNotFound(id))
    }

    /// Create an origin rumor.
    ///
    /// # Errors
    ///
    /// Returns [`NarrativeError::InvalidParameter`] if `truth_value` is
    /// outside `[0, 1]` or `severity` outside `1..=5`.
    pub fn create_rumor(
        &mut self,
        catalog_type: RumorCatalog,
        truth_value: f64,
        severity: u8,
        category: impl Into<String>,
        text: impl Into<String>,
        sim_time: u64,
    ) -> Result<RumorId, NarrativeError> {
        if !(0.0..=1.0).contains(&truth_value) {
            return Err(NarrativeError::InvalidParameter {
                name: "truth_value",
                reason: format!("must be in [0, 1], got {truth_value}"),
            });
        }
        if !(1..=5).contains(&severity) {
            return Err(NarrativeError::InvalidParameter {
                name: "severity",
                reason: format!("must be in 1..=5, got {severity}"),
            });
        }
        let id = RumorId::new();
        let rumor = Rumor {
            id,
            parent_id: None,
            origin_id: id,
            catalog_type,
            truth_value,
            severity,
            category: category.into(),
            text: text.into(),
            created_at_sim: sim_time,
        };
        debug!(rumor = %id, ?catalog_type, severity, "origin rumor created");
        self.rumors.insert(id, rumor);
        let _ = self.dispatcher.publish_sync(Event::new(
            sim_time,
            EventPayload::RumorCreated { rumor_id: id },
            "rumor-engine",
        ))?;
        Ok(id)
    }

    /// Propagate a rumor from one entity to another.
    ///
    /// Rolls the mutation chance; on mutation, applies exactly one
    /// operator to produce a child variant whose `truth_value` is copied
    /// unchanged and whose parent is the rumor just told. Updates the
    /// receiver's believability either way.
    ///
    /// # Errors
    ///
    /// Returns `RumorNotFound` / `EntityNotFound` for unknown ids.
    pub fn propagate(
        &mut self,
        rumor_id: RumorId,
        from: EntityId,
        to: EntityId,
        sim_time: u64,
    ) -> Result<PropagationOutcome, NarrativeError> {
        let rumor = self
            .rumors
            .get(&rumor_id)
            .ok_or(NarrativeError::RumorNotFound(rumor_id))?
            .clone();
        let reliability = self
            .entities
            .get(&from)
            .ok_or(NarrativeError::EntityNotFound(from))?
            .reliability;
        let receiver = self
            .entities
            .get(&to)
            .ok_or(NarrativeError::EntityNotFound(to))?;
        let skepticism = receiver.skepticism;
        let affinity = receiver.relationships.get(&from).copied().unwrap_or(0.0);

        let chance = mutation_chance(&self.config, reliability, skepticism, rumor.severity);
        let (heard, mutation) = if self.rng.random_range(0.0..1.0) < chance {
            let kind = draw_mutation(&mut self.rng);
            let text = self.mutate_text(&rumor.text, kind);
            let child = Rumor {
                id: RumorId::new(),
                parent_id: Some(rumor.id),
                origin_id: rumor.origin_id,
                catalog_type: rumor.catalog_type,
                truth_value: rumor.truth_value,
                severity: rumor.severity,
                category: rumor.category.clone(),
                text,
                created_at_sim: sim_time,
            };
            let child_id = child.id;
            debug!(parent = %rumor.id, child = %child_id, ?kind, "rumor mutated in the telling");
            self.rumors.insert(child_id, child);
            (child_id, Some(kind))
        } else {
            (rumor.id, None)
        };

        let belief = self.reinforce(to, &rumor, heard, affinity, skepticism, sim_time);

        let _ = self.dispatcher.publish_sync(Event::new(
            sim_time,
            EventPayload::RumorPropagated {
                rumor_id,
                from,
                to,
                variant_id: mutation.map(|_| heard),
            },
            "rumor-engine",
        ))?;

        Ok(PropagationOutcome {
            heard,
            variant: mutation.map(|_| heard),
            mutation,
            belief,
        })
    }

    /// Decay belief records by the configured daily rate. Evaluated once
    /// per day boundary; a belief reinforced during the day that just
    /// ended sits this pass out and starts decaying from the next one.
    pub fn on_day_passed(&mut self, sim_time: u64) {
        let rate = self.config.decay_per_day;
        let since = self.last_decay_at;
        for belief in self.beliefs.values_mut() {
            if belief.last_reinforced_at >= since {
                continue;
            }
            belief.strength = (belief.strength - rate).max(0.0);
        }
        self.beliefs.retain(|_, belief| belief.strength > 0.0);
        self.last_decay_at = sim_time;
    }

    /// Walk a rumor's ancestry from `id` up to its parentless origin.
    ///
    /// # Errors
    ///
    /// Returns [`NarrativeError::RumorNotFound`] if the chain breaks.
    pub fn ancestry(&self, id: RumorId) -> Result<Vec<RumorId>, NarrativeError> {
        let mut chain = vec![id];
        let mut cursor = self.rumor(id)?;
        while let Some(parent_id) = cursor.parent_id {
            chain.push(parent_id);
            cursor = self.rumor(parent_id)?;
        }
        Ok(chain)
    }

    /// Snapshot what `entity` currently believes, strongest first.
    ///
    /// # Errors
    ///
    /// Returns [`NarrativeError::EntityNotFound`] for an unknown entity.
    pub fn rumor_context(&self, entity: EntityId) -> Result<RumorContext, NarrativeError> {
        if !self.entities.contains_key(&entity) {
            return Err(NarrativeError::EntityNotFound(entity));
        }
        let mut rumors: Vec<BelievedRumor> = self
            .beliefs
            .iter()
            .filter(|((believer, _), _)| *believer == entity)
            .filter_map(|(_, belief)| {
                self.rumors.get(&belief.rumor_id).map(|rumor| BelievedRumor {
                    rumor_id: rumor.id,
                    catalog_type: rumor.catalog_type,
                    text: rumor.text.clone(),
                    strength: belief.strength,
                    label: BeliefLabel::for_strength(belief.strength),
                })
            })
            .collect();
        rumors.sort_by(|a, b| b.strength.total_cmp(&a.strength));
        Ok(RumorContext {
            entity_id: entity,
            rumors,
        })
    }

    /// The believer's current strength for a rumor family, zero if none.
    pub fn belief_strength(&self, entity: EntityId, origin: RumorId) -> f64 {
        self.beliefs
            .get(&(entity, origin))
            .map_or(0.0, |belief| belief.strength)
    }

    /// Update the receiver's belief record for the rumor's origin family.
    ///
    /// The gain grows with severity, shrinks with skepticism, and is
    /// tilted by affinity toward the transmitter. Prior belief bounds the
    /// headroom, so repeated hops converge rather than overshoot.
    fn reinforce(
        &mut self,
        entity: EntityId,
        rumor: &Rumor,
        heard: RumorId,
        affinity: f64,
        skepticism: f64,
        sim_time: u64,
    ) -> f64 {
        let prior = self.belief_strength(entity, rumor.origin_id);
        let emotional = f64::from(rumor.severity) / 5.0;
        let gain = emotional * (1.0 - skepticism) * affinity.mul_add(0.25, 0.5);
        let strength = ((1.0 - prior).mul_add(gain.max(0.0), prior)).clamp(0.0, 1.0);

        self.beliefs.insert(
            (entity, rumor.origin_id),
            Believability {
                entity_id: entity,
                rumor_id: heard,
                origin_id: rumor.origin_id,
                strength,
                last_reinforced_at: sim_time,
            },
        );
        strength
    }

    /// Apply one mutation operator to a rumor's text.
    fn mutate_text(&mut self, text: &str, kind: MutationKind) -> String {
        match kind {
            MutationKind::Exaggeration => exaggerate(text, &mut self.rng),
            MutationKind::Minimization => {
                let softener = pick(&MINIMIZERS, &mut self.rng);
                format!("{softener} {text}")
            }
            MutationKind::DetailAddition => {
                let detail = pick(&ADDED_DETAILS, &mut self.rng);
                format!("{text}, {detail}")
            }
            MutationKind::DetailLoss => drop_detail(text),
            MutationKind::SubjectShift => self.shift_subject(text),
        }
    }

    /// Shift the rumor's subject to someone else. Words that look like
    /// proper nouns are preserved with high probability.
    fn shift_subject(&mut self, text: &str) -> String {
        let replacement = pick(&SHIFTED_SUBJECTS, &mut self.rng);
        let mut shifted = false;
        let words: Vec<String> = text
            .split(' ')
            .map(|word| {
                if shifted {
                    return word.to_owned();
                }
                let is_proper = word.chars().next().is_some_and(char::is_uppercase);
                if is_proper && self.rng.random_range(0.0..1.0) < self.config.proper_noun_skip_chance {
                    return word.to_owned();
                }
                if is_proper || word.eq_ignore_ascii_case("someone") {
                    shifted = true;
                    return replacement.to_owned();
                }
                word.to_owned()
            })
            .collect();
        if shifted {
            words.join(" ")
        } else {
            // Nothing shiftable found; recast the whole telling.
            format!("{replacement} was behind it, they say: {text}")
        }
    }
}

/// Mutation chance for one hop, clamped to `[0, 1]`.
fn mutation_chance(config: &RumorConfig, reliability: f64, skepticism: f64, severity: u8) -> f64 {
    let weights = config.weights;
    let suppressed = config.base_mutation_chance
        * weights.reliability.mul_add(-reliability.clamp(0.0, 1.0), 1.0)
        * weights.skepticism.mul_add(-skepticism.clamp(0.0, 1.0), 1.0);
    let emotional = f64::from(severity) / 5.0;
    emotional.mul_add(weights.severity, suppressed).clamp(0.0, 1.0)
}

/// Uniform draw over the mutation operators.
fn draw_mutation(rng: &mut impl Rng) -> MutationKind {
    let index = rng.random_range(0..MutationKind::ALL.len());
    MutationKind::ALL
        .get(index)
        .copied()
        .unwrap_or(MutationKind::Exaggeration)
}

const MINIMIZERS: [&str; 3] = [
    "Some doubt it, but supposedly",
    "It was probably nothing, still",
    "Hardly worth repeating, yet",
];

const ADDED_DETAILS: [&str; 4] = [
    "or so it went at the tavern",
    "on a moonless night no less",
    "and the guard said nothing of it",
    "though nobody will say where",
];

const SHIFTED_SUBJECTS: [&str; 3] = ["a stranger", "one of the old families", "a hooded traveler"];

const INTENSIFIERS: [&str; 3] = ["far worse than anyone admits:", "they say it was catastrophic:", "everyone is talking about it:"];

fn pick<'a>(options: &[&'a str], rng: &mut impl Rng) -> &'a str {
    let index = rng.random_range(0..options.len());
    options.get(index).copied().unwrap_or("")
}

/// Exaggeration doubles any number in the telling; failing that, it
/// prepends an intensifier.
fn exaggerate(text: &str, rng: &mut impl Rng) -> String {
    let mut doubled = false;
    let words: Vec<String> = text
        .split(' ')
        .map(|word| {
            if !doubled {
                if let Ok(n) = word.trim_end_matches([',', '.', '!']).parse::<u64>() {
                    doubled = true;
                    let suffix: String = word.chars().filter(|c| !c.is_ascii_digit()).collect();
                    return format!("{}{suffix}", n.saturating_mul(2));
                }
            }
            word.to_owned()
        })
        .collect();
    if doubled {
        words.join(" ")
    } else {
        let prefix = pick(&INTENSIFIERS, rng);
        format!("{prefix} {text}")
    }
}

/// Detail loss drops the final clause, or the last word when the telling
/// has no clauses left.
fn drop_detail(text: &str) -> String {
    if let Some((kept, _)) = text.rsplit_once(", ") {
        return kept.to_owned();
    }
    text.rsplit_once(' ')
        .map_or_else(|| text.to_owned(), |(kept, _)| kept.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::MutationWeights;

    fn profile(name: &str, reliability: f64, skepticism: f64) -> EntityProfile {
        EntityProfile {
            id: EntityId::new(),
            name: name.to_owned(),
            reliability,
            skepticism,
            relationships: BTreeMap::new(),
        }
    }

    fn make_engine(config: RumorConfig) -> RumorEngine {
        RumorEngine::new(config, 42, Arc::new(EventDispatcher::new()))
    }

    /// A config whose mutation chance is exactly 1 for every hop.
    fn always_mutate() -> RumorConfig {
        RumorConfig {
            base_mutation_chance: 1.0,
            weights: MutationWeights {
                reliability: 0.0,
                skepticism: 0.0,
                severity: 0.0,
            },
            ..RumorConfig::default()
        }
    }

    fn never_mutate() -> RumorConfig {
        RumorConfig {
            base_mutation_chance: 0.0,
            weights: MutationWeights {
                reliability: 0.0,
                skepticism: 0.0,
                severity: 0.0,
            },
            ..RumorConfig::default()
        }
    }

    #[test]
    fn origin_rumor_is_its_own_origin() {
        let mut engine = make_engine(RumorConfig::default());
        let id = engine
            .create_rumor(RumorCatalog::Crime, 0.8, 5, "politics", "The reeve stole 40 coins", 0)
            .unwrap();
        let rumor = engine.rumor(id).unwrap();
        assert!(rumor.is_origin());
        assert_eq!(rumor.origin_id, id);
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        let mut engine = make_engine(RumorConfig::default());
        assert!(engine
            .create_rumor(RumorCatalog::Crime, 1.5, 3, "c", "t", 0)
            .is_err());
        assert!(engine
            .create_rumor(RumorCatalog::Crime, 0.5, 0, "c", "t", 0)
            .is_err());
        assert!(engine
            .create_rumor(RumorCatalog::Crime, 0.5, 6, "c", "t", 0)
            .is_err());
    }

    #[test]
    fn forced_mutation_yields_distinct_variants_with_shared_truth() {
        let mut engine = make_engine(always_mutate());
        let teller = profile("Maren", 0.5, 0.5);
        let teller_id = teller.id;
        engine.register_entity(teller);

        let origin = engine
            .create_rumor(RumorCatalog::Threat, 0.8, 5, "war", "Raiders took 12 horses from Maren", 0)
            .unwrap();

        let mut variants = Vec::new();
        for name in ["Odo", "Petra", "Sel"] {
            let listener = profile(name, 0.5, 0.5);
            let listener_id = listener.id;
            engine.register_entity(listener);
            let outcome = engine.propagate(origin, teller_id, listener_id, 10).unwrap();
            let variant = outcome.variant.unwrap();
            variants.push(variant);

            let child = engine.rumor(variant).unwrap();
            assert_eq!(child.parent_id, Some(origin));
            assert_eq!(child.origin_id, origin);
            assert!((child.truth_value - 0.8).abs() < f64::EPSILON);
        }
        variants.sort_unstable();
        variants.dedup();
        assert_eq!(variants.len(), 3);
    }

    #[test]
    fn unmutated_hop_reuses_the_parent() {
        let mut engine = make_engine(never_mutate());
        let teller = profile("Brint", 0.9, 0.1);
        let listener = profile("Cass", 0.5, 0.5);
        let (from, to) = (teller.id, listener.id);
        engine.register_entity(teller);
        engine.register_entity(listener);

        let origin = engine
            .create_rumor(RumorCatalog::Fortune, 0.4, 2, "trade", "A caravan pays double", 0)
            .unwrap();
        let outcome = engine.propagate(origin, from, to, 5).unwrap();
        assert_eq!(outcome.heard, origin);
        assert!(outcome.variant.is_none());
        assert!(outcome.mutation.is_none());
    }

    #[test]
    fn ancestry_terminates_at_the_origin() {
        let mut engine = make_engine(always_mutate());
        let a = profile("Anse", 0.5, 0.2);
        let b = profile("Bragi", 0.5, 0.2);
        let c = profile("Corin", 0.5, 0.2);
        let (ia, ib, ic) = (a.id, b.id, c.id);
        engine.register_entity(a);
        engine.register_entity(b);
        engine.register_entity(c);

        let origin = engine
            .create_rumor(RumorCatalog::Portent, 0.1, 4, "omens", "A second moon rose over the fen", 0)
            .unwrap();
        let hop1 = engine.propagate(origin, ia, ib, 1).unwrap();
        let hop2 = engine
            .propagate(hop1.variant.unwrap(), ib, ic, 2)
            .unwrap();

        let chain = engine.ancestry(hop2.variant.unwrap()).unwrap();
        assert_eq!(chain.last().copied(), Some(origin));
        assert_eq!(chain.len(), 3);
        assert!(engine.rumor(origin).unwrap().is_origin());
    }

    #[test]
    fn belief_reinforces_and_decays() {
        let mut engine = make_engine(never_mutate());
        let teller = profile("Dara", 0.8, 0.0);
        let listener = profile("Edda", 0.0, 0.2);
        let (from, to) = (teller.id, listener.id);
        engine.register_entity(teller);
        engine.register_entity(listener);

        let origin = engine
            .create_rumor(RumorCatalog::Scandal, 0.6, 4, "court", "The magistrate never paid", 0)
            .unwrap();
        let first = engine.propagate(origin, from, to, 1).unwrap().belief;
        assert!(first > 0.0);

        // Repetition of the same family reinforces toward 1.
        let second = engine.propagate(origin, from, to, 2).unwrap().belief;
        assert!(second > first);

        // A belief reinforced during the day that just ended is spared.
        engine.on_day_passed(86_400);
        let spared = engine.belief_strength(to, origin);
        assert!((spared - second).abs() < f64::EPSILON);

        // The next boundary pulls unreinforced belief back down.
        engine.on_day_passed(172_800);
        let decayed = engine.belief_strength(to, origin);
        assert!(decayed < second);
        let drop = second - decayed;
        assert!(drop > 0.09 && drop < 0.11);
    }

    #[test]
    fn context_sorts_by_strength_and_labels_tiers() {
        let mut engine = make_engine(never_mutate());
        let teller = profile("Fen", 0.5, 0.0);
        let listener = profile("Gail", 0.0, 0.0);
        let (from, to) = (teller.id, listener.id);
        engine.register_entity(teller);
        engine.register_entity(listener);

        let strong = engine
            .create_rumor(RumorCatalog::Threat, 0.9, 5, "war", "An army musters east", 0)
            .unwrap();
        let weak = engine
            .create_rumor(RumorCatalog::Sighting, 0.2, 1, "idle", "A grey cat crossed twice", 0)
            .unwrap();
        let _ = engine.propagate(strong, from, to, 1).unwrap();
        let _ = engine.propagate(strong, from, to, 2).unwrap();
        let _ = engine.propagate(weak, from, to, 3).unwrap();

        let context = engine.rumor_context(to).unwrap();
        assert_eq!(context.rumors.len(), 2);
        let first = context.rumors.first().unwrap();
        let second = context.rumors.get(1).unwrap();
        assert!(first.strength >= second.strength);
        assert_eq!(first.catalog_type, RumorCatalog::Threat);
        assert_eq!(second.label, BeliefLabel::Dismissive);
    }

    #[test]
    fn mutation_chance_is_clamped_and_monotone() {
        let config = RumorConfig::default();
        let reliable = mutation_chance(&config, 1.0, 0.0, 3);
        let unreliable = mutation_chance(&config, 0.0, 0.0, 3);
        assert!(unreliable > reliable);

        let skeptical = mutation_chance(&config, 0.5, 1.0, 3);
        let credulous = mutation_chance(&config, 0.5, 0.0, 3);
        assert!(credulous > skeptical);

        for severity in 1..=5 {
            let chance = mutation_chance(&config, 0.0, 0.0, severity);
            assert!((0.0..=1.0).contains(&chance));
        }
    }

    #[test]
    fn detail_loss_never_empties_the_text() {
        assert_eq!(drop_detail("The well ran dry, they say"), "The well ran dry");
        assert_eq!(drop_detail("The well ran dry"), "The well ran");
        assert_eq!(drop_detail("well"), "well");
    }
}
