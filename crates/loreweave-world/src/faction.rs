//! The faction tension / war engine.
//!
//! Every unordered faction pair carries a signed tension in
//! `[-100, 100]`: positive pressure toward war, negative toward
//! alliance. Tension decays toward zero daily, at independently
//! configurable rates above and below zero.
//!
//! Threshold crossings are idempotent: crossing the war threshold fires
//! `WarDeclared` exactly once, and the pair stays at war until the
//! countdown expires or the war is resolved explicitly. Resolution maps
//! the outcome to deterministic consequences; cross-engine effects (war
//! damage on the loser's POIs, an aftermath motif) are returned in the
//! [`WarResolution`] plan for the wiring layer to apply.
//!
//! # Events
//!
//! - `WarDeclared`, `AllianceFormed`, `TerritoryCaptured`, `WarResolved`
//!
//! # State keys
//!
//! - `faction.<a>.<b>.resource_penalty` -- written on resolution.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use loreweave_events::EventDispatcher;
use loreweave_state::WorldStateStore;
use loreweave_types::{
    Event, EventPayload, FactionId, FactionPair, FactionPairKey, MotifCatalog, PoiId,
    RelationState, WarDamage, WarOutcome,
};

use crate::config::{FactionConfig, OutcomeConsequences};
use crate::error::WorldError;

/// The deterministic consequence plan of one resolved war.
///
/// The engine applies the tension reset and resource penalty itself; the
/// wiring layer feeds `damage` to the POI registry for the loser's POIs
/// and `aftermath_motif` to the motif engine.
#[derive(Debug, Clone, PartialEq)]
pub struct WarResolution {
    /// The pair whose war resolved.
    pub pair: FactionPairKey,
    /// How the war ended.
    pub outcome: WarOutcome,
    /// The losing faction; `None` when the outcome names no loser.
    pub loser: Option<FactionId>,
    /// War damage to apply to the loser's POIs, if any.
    pub damage: Option<WarDamage>,
    /// Fraction of the loser's POI populations displaced.
    pub population_shift: f64,
    /// The motif seeded in the aftermath.
    pub aftermath_motif: MotifCatalog,
}

/// Tracks tension for every registered faction pair.
pub struct FactionEngine {
    config: FactionConfig,
    rng: SmallRng,
    pairs: BTreeMap<FactionPairKey, FactionPair>,
    store: Arc<WorldStateStore>,
    dispatcher: Arc<EventDispatcher>,
}

impl FactionEngine {
    /// Build an engine with a seeded generator for outcome draws.
    pub fn new(
        config: FactionConfig,
        seed: u64,
        store: Arc<WorldStateStore>,
        dispatcher: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
            pairs: BTreeMap::new(),
            store,
            dispatcher,
        }
    }

    /// Register a faction pair at world-generation time. Registering the
    /// same unordered pair twice is a no-op.
    pub fn register_pair(&mut self, x: FactionId, y: FactionId) -> FactionPairKey {
        let key = FactionPairKey::new(x, y);
        self.pairs.entry(key).or_insert_with(|| FactionPair::new(x, y));
        key
    }

    /// Look up a pair record.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::PairNotFound`] for an unregistered pair.
    pub fn pair(&self, x: FactionId, y: FactionId) -> Result<&FactionPair, WorldError> {
        let key = FactionPairKey::new(x, y);
        self.pairs.get(&key).ok_or(WorldError::PairNotFound(key))
    }

    /// Iterate over every pair record.
    pub fn iter(&self) -> impl Iterator<Item = &FactionPair> {
        self.pairs.values()
    }

    /// Shift a pair's tension by `delta`, clamped to `[-100, 100]`, and
    /// evaluate threshold crossings.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::PairNotFound`] for an unregistered pair;
    /// publish failures propagate.
    pub fn adjust_tension(
        &mut self,
        x: FactionId,
        y: FactionId,
        delta: f64,
        reason: &str,
        sim_time: u64,
    ) -> Result<(), WorldError> {
        let key = FactionPairKey::new(x, y);
        let pair = self.pairs.get_mut(&key).ok_or(WorldError::PairNotFound(key))?;
        pair.tension = (pair.tension + delta).clamp(-100.0, 100.0);
        debug!(?key, delta, tension = pair.tension, reason, "tension adjusted");
        self.evaluate_thresholds(key, sim_time)
    }

    /// Reset the war countdown after a territory capture. Publishes
    /// `TerritoryCaptured`. No-op for pairs not at war.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::PairNotFound`] for an unregistered pair;
    /// publish failures propagate.
    pub fn capture_territory(
        &mut self,
        x: FactionId,
        y: FactionId,
        captor: FactionId,
        poi_id: PoiId,
        sim_time: u64,
    ) -> Result<(), WorldError> {
        let key = FactionPairKey::new(x, y);
        let pair = self.pairs.get_mut(&key).ok_or(WorldError::PairNotFound(key))?;
        if !pair.is_at_war {
            return Ok(());
        }
        pair.war_countdown_days = Some(self.config.war_countdown_days);
        info!(?key, %captor, poi = %poi_id, "territory captured, war prolonged");
        let _ = self.dispatcher.publish_sync(Event::new(
            sim_time,
            EventPayload::TerritoryCaptured {
                pair: key,
                captor,
                poi_id,
            },
            "faction-engine",
        ))?;
        Ok(())
    }

    /// Daily step: decay tension toward zero, re-band relations, and
    /// decrement war countdowns. Wars whose countdown reaches zero
    /// resolve; their consequence plans are returned for the wiring
    /// layer.
    ///
    /// # Errors
    ///
    /// Publish and state-write failures propagate.
    pub fn on_day_passed(&mut self, sim_time: u64) -> Result<Vec<WarResolution>, WorldError> {
        let mut expired: Vec<FactionPairKey> = Vec::new();
        for (key, pair) in &mut self.pairs {
            if pair.tension > 0.0 {
                pair.tension = (pair.tension - self.config.decay_positive_per_day).max(0.0);
            } else if pair.tension < 0.0 {
                pair.tension = (pair.tension + self.config.decay_negative_per_day).min(0.0);
            }

            if pair.is_at_war {
                let remaining = pair.war_countdown_days.unwrap_or(0).saturating_sub(1);
                if remaining == 0 {
                    expired.push(*key);
                } else {
                    pair.war_countdown_days = Some(remaining);
                }
            }
        }

        let keys: Vec<FactionPairKey> = self.pairs.keys().copied().collect();
        for key in keys {
            self.evaluate_thresholds(key, sim_time)?;
        }

        let mut resolutions = Vec::with_capacity(expired.len());
        for key in expired {
            resolutions.push(self.resolve_pair(key, sim_time)?);
        }
        Ok(resolutions)
    }

    /// Resolve a pair's war explicitly (e.g. from a surrender trigger).
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::PairNotFound`] for an unregistered pair and
    /// [`WorldError::InvalidParameter`] if the pair is not at war.
    pub fn resolve_war(
        &mut self,
        x: FactionId,
        y: FactionId,
        sim_time: u64,
    ) -> Result<WarResolution, WorldError> {
        let key = FactionPairKey::new(x, y);
        let at_war = self
            .pairs
            .get(&key)
            .ok_or(WorldError::PairNotFound(key))?
            .is_at_war;
        if !at_war {
            return Err(WorldError::InvalidParameter {
                name: "pair",
                reason: "cannot resolve a war for a pair not at war".to_owned(),
            });
        }
        self.resolve_pair(key, sim_time)
    }

    /// Evaluate war/alliance thresholds and relation bands for one pair.
    ///
    /// Transitions fire exactly once per crossing: a pair already at war
    /// (or allied) stays silent while tension remains past the
    /// threshold.
    fn evaluate_thresholds(&mut self, key: FactionPairKey, sim_time: u64) -> Result<(), WorldError> {
        let config = &self.config;
        let Some(pair) = self.pairs.get_mut(&key) else {
            return Err(WorldError::PairNotFound(key));
        };

        if pair.tension >= config.war_threshold {
            if !pair.is_at_war {
                pair.is_at_war = true;
                pair.relation = RelationState::War;
                pair.war_started_at = Some(sim_time);
                pair.war_countdown_days = Some(config.war_countdown_days);
                let tension = pair.tension;
                info!(?key, tension, "war declared");
                let _ = self.dispatcher.publish_sync(Event::new(
                    sim_time,
                    EventPayload::WarDeclared { pair: key, tension },
                    "faction-engine",
                ))?;
            }
            return Ok(());
        }
        if pair.is_at_war {
            // A war persists until resolved, even if tension decays
            // below the declaration threshold.
            return Ok(());
        }

        if pair.tension <= config.alliance_threshold {
            if pair.relation != RelationState::Alliance {
                pair.relation = RelationState::Alliance;
                let tension = pair.tension;
                info!(?key, tension, "alliance formed");
                let _ = self.dispatcher.publish_sync(Event::new(
                    sim_time,
                    EventPayload::AllianceFormed { pair: key, tension },
                    "faction-engine",
                ))?;
            }
            return Ok(());
        }

        pair.relation = match pair.relation {
            // Alliances and truces persist until tension climbs again.
            RelationState::Alliance | RelationState::Truce
                if pair.tension < config.rivalry_threshold =>
            {
                pair.relation
            }
            _ if pair.tension >= config.hostile_threshold => RelationState::Hostile,
            _ if pair.tension >= config.rivalry_threshold => RelationState::Rivalry,
            _ => RelationState::Neutral,
        };
        Ok(())
    }

    /// Apply a war's resolution: outcome draw, tension reset, truce,
    /// resource penalty write, `WarResolved` event.
    fn resolve_pair(&mut self, key: FactionPairKey, sim_time: u64) -> Result<WarResolution, WorldError> {
        let outcome = draw_outcome(&mut self.rng);
        let consequences: OutcomeConsequences = self.config.consequences(outcome);
        let loser = self.draw_loser(key, outcome);

        {
            let Some(pair) = self.pairs.get_mut(&key) else {
                return Err(WorldError::PairNotFound(key));
            };
            pair.is_at_war = false;
            pair.relation = RelationState::Truce;
            pair.war_started_at = None;
            pair.war_countdown_days = None;
            pair.tension = consequences.tension_after.clamp(-100.0, 100.0);
        }
        info!(?key, ?outcome, ?loser, "war resolved");

        let penalty_key = format!("faction.{}.{}.resource_penalty", key.a, key.b);
        let _ = self.store.set(
            &penalty_key,
            serde_json::json!(consequences.resource_penalty),
            "faction",
            None,
            sim_time,
        )?;
        let _ = self.dispatcher.publish_sync(Event::new(
            sim_time,
            EventPayload::WarResolved { pair: key, outcome },
            "faction-engine",
        ))?;

        Ok(WarResolution {
            pair: key,
            outcome,
            loser,
            damage: damage_for(outcome),
            population_shift: consequences.population_shift,
            aftermath_motif: MotifCatalog::Mourning,
        })
    }

    /// Pick the losing side for outcomes that name one.
    fn draw_loser(&mut self, key: FactionPairKey, outcome: WarOutcome) -> Option<FactionId> {
        match outcome {
            WarOutcome::DecisiveVictory | WarOutcome::PyrrhicVictory => {
                Some(if self.rng.random_range(0..2) == 0 { key.a } else { key.b })
            }
            WarOutcome::Stalemate | WarOutcome::NegotiatedSettlement => None,
        }
    }
}

/// War damage the loser's POIs suffer under each outcome.
const fn damage_for(outcome: WarOutcome) -> Option<WarDamage> {
    match outcome {
        WarOutcome::DecisiveVictory => Some(WarDamage::Devastating),
        WarOutcome::PyrrhicVictory => Some(WarDamage::Heavy),
        WarOutcome::Stalemate => Some(WarDamage::Moderate),
        WarOutcome::NegotiatedSettlement => None,
    }
}

/// Uniform draw over the four outcomes.
fn draw_outcome(rng: &mut impl Rng) -> WarOutcome {
    match rng.random_range(0..4) {
        0 => WarOutcome::DecisiveVictory,
        1 => WarOutcome::PyrrhicVictory,
        2 => WarOutcome::Stalemate,
        _ => WarOutcome::NegotiatedSettlement,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use loreweave_types::EventType;

    fn make_engine() -> (FactionEngine, Arc<EventDispatcher>) {
        let dispatcher = Arc::new(EventDispatcher::new());
        let store = Arc::new(WorldStateStore::new(Arc::clone(&dispatcher)));
        (
            FactionEngine::new(FactionConfig::default(), 42, store, Arc::clone(&dispatcher)),
            dispatcher,
        )
    }

    fn count_events(dispatcher: &EventDispatcher, event_type: EventType) -> Arc<AtomicUsize> {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&counter);
        dispatcher
            .subscribe(
                event_type,
                0,
                Arc::new(move |_event| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            )
            .unwrap();
        counter
    }

    #[test]
    fn pair_key_is_normalized() {
        let (mut engine, _dispatcher) = make_engine();
        let (x, y) = (FactionId::new(), FactionId::new());
        let forward = engine.register_pair(x, y);
        let backward = engine.register_pair(y, x);
        assert_eq!(forward, backward);
        assert_eq!(engine.iter().count(), 1);
    }

    #[test]
    fn war_declaration_fires_exactly_once() {
        let (mut engine, dispatcher) = make_engine();
        let declared = count_events(&dispatcher, EventType::WarDeclared);
        let (x, y) = (FactionId::new(), FactionId::new());
        engine.register_pair(x, y);

        engine.adjust_tension(x, y, 80.0, "border raid", 0).unwrap();
        assert!(engine.pair(x, y).unwrap().is_at_war);
        assert_eq!(engine.pair(x, y).unwrap().relation, RelationState::War);
        assert_eq!(declared.load(Ordering::SeqCst), 1);

        // Staying above the threshold must not re-fire.
        engine.adjust_tension(x, y, 10.0, "skirmish", 1).unwrap();
        let _ = engine.on_day_passed(2).unwrap();
        assert_eq!(declared.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn alliance_formation_is_idempotent() {
        let (mut engine, dispatcher) = make_engine();
        let formed = count_events(&dispatcher, EventType::AllianceFormed);
        let (x, y) = (FactionId::new(), FactionId::new());
        engine.register_pair(x, y);

        engine.adjust_tension(x, y, -80.0, "royal marriage", 0).unwrap();
        assert_eq!(engine.pair(x, y).unwrap().relation, RelationState::Alliance);
        engine.adjust_tension(x, y, -10.0, "trade pact", 1).unwrap();
        assert_eq!(formed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn tension_decays_toward_zero_asymmetrically() {
        let (mut engine, _dispatcher) = make_engine();
        let (x, y) = (FactionId::new(), FactionId::new());
        engine.register_pair(x, y);

        engine.adjust_tension(x, y, 30.0, "insult", 0).unwrap();
        let _ = engine.on_day_passed(86_400).unwrap();
        assert!((engine.pair(x, y).unwrap().tension - 28.5).abs() < f64::EPSILON);

        engine.adjust_tension(x, y, -58.5, "apology", 1).unwrap();
        let _ = engine.on_day_passed(172_800).unwrap();
        assert!((engine.pair(x, y).unwrap().tension + 29.0).abs() < f64::EPSILON);
    }

    #[test]
    fn relation_bands_follow_tension() {
        let (mut engine, _dispatcher) = make_engine();
        let (x, y) = (FactionId::new(), FactionId::new());
        engine.register_pair(x, y);

        engine.adjust_tension(x, y, 20.0, "dispute", 0).unwrap();
        assert_eq!(engine.pair(x, y).unwrap().relation, RelationState::Rivalry);

        engine.adjust_tension(x, y, 25.0, "sabotage", 1).unwrap();
        assert_eq!(engine.pair(x, y).unwrap().relation, RelationState::Hostile);

        engine.adjust_tension(x, y, -40.0, "mediation", 2).unwrap();
        assert_eq!(engine.pair(x, y).unwrap().relation, RelationState::Neutral);
    }

    #[test]
    fn countdown_expiry_resolves_the_war() {
        let (mut engine, dispatcher) = make_engine();
        let resolved = count_events(&dispatcher, EventType::WarResolved);
        let (x, y) = (FactionId::new(), FactionId::new());
        engine.register_pair(x, y);
        engine.adjust_tension(x, y, 100.0, "invasion", 0).unwrap();

        let countdown = FactionConfig::default().war_countdown_days;
        let mut resolutions = Vec::new();
        for day in 0..countdown {
            resolutions.extend(engine.on_day_passed(day.saturating_mul(86_400)).unwrap());
        }
        assert_eq!(resolutions.len(), 1);
        assert_eq!(resolved.load(Ordering::SeqCst), 1);

        let pair = engine.pair(x, y).unwrap();
        assert!(!pair.is_at_war);
        assert_eq!(pair.relation, RelationState::Truce);
        assert!(pair.war_countdown_days.is_none());
    }

    #[test]
    fn territory_capture_resets_the_countdown() {
        let (mut engine, _dispatcher) = make_engine();
        let (x, y) = (FactionId::new(), FactionId::new());
        engine.register_pair(x, y);
        engine.adjust_tension(x, y, 100.0, "invasion", 0).unwrap();

        // Burn down most of the countdown, then capture territory.
        for day in 0..20 {
            let resolutions = engine.on_day_passed(day).unwrap();
            assert!(resolutions.is_empty());
        }
        engine
            .capture_territory(x, y, x, PoiId::new(), 21)
            .unwrap();
        assert_eq!(
            engine.pair(x, y).unwrap().war_countdown_days,
            Some(FactionConfig::default().war_countdown_days)
        );
    }

    #[test]
    fn explicit_resolution_requires_a_war() {
        let (mut engine, _dispatcher) = make_engine();
        let (x, y) = (FactionId::new(), FactionId::new());
        engine.register_pair(x, y);
        assert!(engine.resolve_war(x, y, 0).is_err());

        engine.adjust_tension(x, y, 90.0, "invasion", 0).unwrap();
        let resolution = engine.resolve_war(x, y, 1).unwrap();
        assert_eq!(resolution.pair, FactionPairKey::new(x, y));
        if matches!(
            resolution.outcome,
            WarOutcome::DecisiveVictory | WarOutcome::PyrrhicVictory
        ) {
            assert!(resolution.loser.is_some());
            assert!(resolution.damage.is_some());
        } else {
            assert!(resolution.loser.is_none());
        }
    }
}
