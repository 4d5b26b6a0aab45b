//! The POI registry and lifecycle state machine.
//!
//! POIs are created at world-generation time and never deleted; they
//! move through lifecycle states driven by population thresholds and war
//! damage. The population path never skips a state
//! (`Normal -> Declining -> Abandoned -> Ruins` downward,
//! `Abandoned -> Repopulating -> Normal` upward); war damage may jump
//! directly to its mapped state.
//!
//! Rules compare the POI's population as a fraction of its target, so
//! one rule table serves villages and cities alike. POIs with
//! `manual_override` set are exempt from automatic evaluation.
//!
//! # Events
//!
//! - `PopulationChanged` -- emitted on every population write.
//! - `PoiStateChanged` -- emitted once per transition.
//!
//! # State keys
//!
//! - `poi.<id>.population`, `poi.<id>.state`

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use loreweave_events::EventDispatcher;
use loreweave_state::WorldStateStore;
use loreweave_types::{Event, EventPayload, Poi, PoiId, PoiState, WarDamage};

use crate::config::PoiConfig;
use crate::error::WorldError;

/// One row in the designer-configurable transition table.
///
/// A rule matches when the POI is in `from` and its population fraction
/// (current over target) lies inside the optional bounds. A `one_way`
/// rule locks its target state: no automatic rule will ever move a POI
/// out of it again. The default table marks the fall into `Ruins` one
/// way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRule {
    /// State the rule applies in.
    pub from: PoiState,
    /// State the rule transitions to.
    pub to: PoiState,
    /// Match only when the fraction is at or above this bound.
    pub min_fraction: Option<f64>,
    /// Match only when the fraction is strictly below this bound.
    pub max_fraction: Option<f64>,
    /// Whether the transition can never be undone automatically.
    pub one_way: bool,
}

impl TransitionRule {
    fn matches(&self, state: PoiState, fraction: f64) -> bool {
        if state != self.from {
            return false;
        }
        if let Some(min) = self.min_fraction {
            if fraction < min {
                return false;
            }
        }
        if let Some(max) = self.max_fraction {
            if fraction >= max {
                return false;
            }
        }
        true
    }
}

/// The default population-threshold rule table.
///
/// Downward: `Normal -> Declining -> Abandoned -> Ruins`, each step
/// crossing a lower fraction of target. Upward: `Abandoned ->
/// Repopulating -> Normal`, plus recovery out of `Declining`.
pub fn default_rules() -> Vec<TransitionRule> {
    vec![
        TransitionRule {
            from: PoiState::Normal,
            to: PoiState::Declining,
            min_fraction: None,
            max_fraction: Some(0.25),
            one_way: false,
        },
        TransitionRule {
            from: PoiState::Declining,
            to: PoiState::Abandoned,
            min_fraction: None,
            max_fraction: Some(0.05),
            one_way: false,
        },
        TransitionRule {
            from: PoiState::Abandoned,
            to: PoiState::Ruins,
            min_fraction: None,
            max_fraction: Some(0.01),
            one_way: true,
        },
        TransitionRule {
            from: PoiState::Declining,
            to: PoiState::Normal,
            min_fraction: Some(0.4),
            max_fraction: None,
            one_way: false,
        },
        TransitionRule {
            from: PoiState::Abandoned,
            to: PoiState::Repopulating,
            min_fraction: Some(0.1),
            max_fraction: None,
            one_way: false,
        },
        TransitionRule {
            from: PoiState::Repopulating,
            to: PoiState::Normal,
            min_fraction: Some(0.5),
            max_fraction: None,
            one_way: false,
        },
    ]
}

/// Owns every POI and applies lifecycle transitions.
pub struct PoiRegistry {
    config: PoiConfig,
    pois: BTreeMap<PoiId, Poi>,
    rules: Vec<TransitionRule>,
    store: Arc<WorldStateStore>,
    dispatcher: Arc<EventDispatcher>,
}

impl PoiRegistry {
    /// Build a registry with the default rule table.
    pub fn new(
        config: PoiConfig,
        store: Arc<WorldStateStore>,
        dispatcher: Arc<EventDispatcher>,
    ) -> Self {
        Self::with_rules(config, default_rules(), store, dispatcher)
    }

    /// Build a registry with a designer-supplied rule table.
    pub const fn with_rules(
        config: PoiConfig,
        rules: Vec<TransitionRule>,
        store: Arc<WorldStateStore>,
        dispatcher: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            config,
            pois: BTreeMap::new(),
            rules,
            store,
            dispatcher,
        }
    }

    /// Add a POI at world-generation time.
    pub fn insert(&mut self, poi: Poi) {
        self.pois.insert(poi.id, poi);
    }

    /// Look up a POI.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::PoiNotFound`] for an unknown id.
    pub fn get(&self, id: PoiId) -> Result<&Poi, WorldError> {
        self.pois.get(&id).ok_or(WorldError::PoiNotFound(id))
    }

    /// Iterate over every POI.
    pub fn iter(&self) -> impl Iterator<Item = &Poi> {
        self.pois.values()
    }

    /// Ids of every POI, for callers that then mutate.
    pub fn ids(&self) -> Vec<PoiId> {
        self.pois.keys().copied().collect()
    }

    /// Number of registered POIs.
    pub fn len(&self) -> usize {
        self.pois.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.pois.is_empty()
    }

    /// Set or clear a POI's manual override flag.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::PoiNotFound`] for an unknown id.
    pub fn set_manual_override(&mut self, id: PoiId, value: bool) -> Result<(), WorldError> {
        let poi = self.pois.get_mut(&id).ok_or(WorldError::PoiNotFound(id))?;
        poi.manual_override = value;
        Ok(())
    }

    /// Write a POI's population, publish `PopulationChanged`, record the
    /// new value in the store, and evaluate lifecycle transitions.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::PoiNotFound`] for an unknown id; state and
    /// publish failures propagate.
    pub fn set_population(&mut self, id: PoiId, new: u32, sim_time: u64) -> Result<(), WorldError> {
        let (old, region) = {
            let poi = self.pois.get_mut(&id).ok_or(WorldError::PoiNotFound(id))?;
            let old = poi.current_population;
            poi.current_population = new;
            (old, poi.region.clone())
        };
        if old == new {
            return Ok(());
        }

        let _ = self.dispatcher.publish_sync(Event::new(
            sim_time,
            EventPayload::PopulationChanged { poi_id: id, old, new },
            "poi-registry",
        ))?;
        let _ = self.store.set(
            &format!("poi.{id}.population"),
            serde_json::json!(new),
            "population",
            Some(region),
            sim_time,
        )?;

        self.evaluate(id, sim_time)
    }

    /// Evaluate the rule table for one POI, applying at most one
    /// transition. POIs under manual override or in a terminal state are
    /// left alone.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::PoiNotFound`] for an unknown id; state and
    /// publish failures propagate.
    pub fn evaluate(&mut self, id: PoiId, sim_time: u64) -> Result<(), WorldError> {
        let (state, fraction, overridden) = {
            let poi = self.get(id)?;
            (poi.state, population_fraction(poi), poi.manual_override)
        };
        if overridden || state.is_terminal() {
            return Ok(());
        }
        // States reached through a one-way rule are locked for good.
        if self.rules.iter().any(|rule| rule.one_way && rule.to == state) {
            return Ok(());
        }

        let target = self
            .rules
            .iter()
            .find(|rule| rule.matches(state, fraction))
            .map(|rule| rule.to);
        match target {
            Some(to) => self.transition(id, to, sim_time),
            None => Ok(()),
        }
    }

    /// Force a transition from war damage, bypassing the population
    /// rules. Manual override still exempts the POI.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::PoiNotFound`] for an unknown id; state and
    /// publish failures propagate.
    pub fn apply_war_damage(
        &mut self,
        id: PoiId,
        damage: WarDamage,
        sim_time: u64,
    ) -> Result<(), WorldError> {
        let (state, overridden) = {
            let poi = self.get(id)?;
            (poi.state, poi.manual_override)
        };
        if overridden || state.is_terminal() {
            return Ok(());
        }

        let to = match damage {
            WarDamage::Moderate => PoiState::Declining,
            WarDamage::Heavy => PoiState::Abandoned,
            WarDamage::Devastating => PoiState::Ruins,
        };
        if state == to {
            return Ok(());
        }
        info!(poi = %id, ?damage, ?to, "war damage forced a transition");
        self.transition(id, to, sim_time)
    }

    /// Apply one transition: NPC side effects, event, state write.
    fn transition(&mut self, id: PoiId, to: PoiState, sim_time: u64) -> Result<(), WorldError> {
        let (old_state, region) = {
            let poi = self.pois.get_mut(&id).ok_or(WorldError::PoiNotFound(id))?;
            let old_state = poi.state;
            poi.state = to;
            match to {
                PoiState::Ruins | PoiState::Dungeon => poi.npc_count = 0,
                PoiState::Repopulating | PoiState::Normal => {
                    poi.npc_count = scaled_npc_count(poi.target_population, self.config.npc_fraction);
                }
                PoiState::Declining | PoiState::Abandoned | PoiState::Special => {}
            }
            (old_state, poi.region.clone())
        };

        debug!(poi = %id, ?old_state, new_state = ?to, "poi transitioned");
        let _ = self.dispatcher.publish_sync(Event::new(
            sim_time,
            EventPayload::PoiStateChanged {
                poi_id: id,
                old_state,
                new_state: to,
            },
            "poi-registry",
        ))?;
        let _ = self.store.set(
            &format!("poi.{id}.state"),
            serde_json::to_value(to)?,
            "poi",
            Some(region),
            sim_time,
        )?;
        Ok(())
    }
}

/// Current population as a fraction of target (1.0 for a zero target).
fn population_fraction(poi: &Poi) -> f64 {
    if poi.target_population == 0 {
        return 1.0;
    }
    f64::from(poi.current_population) / f64::from(poi.target_population)
}

/// NPC headcount proportional to target population.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scaled_npc_count(target_population: u32, fraction: f64) -> u32 {
    let raw = (f64::from(target_population) * fraction.max(0.0)).floor();
    if raw >= f64::from(u32::MAX) { u32::MAX } else { raw as u32 }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use loreweave_types::{PoiType, RegionId};

    fn make_registry() -> PoiRegistry {
        let dispatcher = Arc::new(EventDispatcher::new());
        let store = Arc::new(WorldStateStore::new(Arc::clone(&dispatcher)));
        PoiRegistry::new(PoiConfig::default(), store, dispatcher)
    }

    fn village(population: u32, target: u32) -> Poi {
        Poi {
            id: PoiId::new(),
            name: "Harrowgate".to_owned(),
            poi_type: PoiType::Village,
            region: RegionId::from("emberfall"),
            state: PoiState::Normal,
            current_population: population,
            target_population: target,
            min_population: 0,
            max_population: target.saturating_mul(2),
            npc_count: 10,
            manual_override: false,
        }
    }

    #[test]
    fn decline_passes_through_every_state_in_order() {
        let mut registry = make_registry();
        let poi = village(100, 100);
        let id = poi.id;
        registry.insert(poi);

        registry.set_population(id, 20, 1).unwrap();
        assert_eq!(registry.get(id).unwrap().state, PoiState::Declining);

        registry.set_population(id, 3, 2).unwrap();
        assert_eq!(registry.get(id).unwrap().state, PoiState::Abandoned);

        registry.set_population(id, 0, 3).unwrap();
        assert_eq!(registry.get(id).unwrap().state, PoiState::Ruins);
        assert_eq!(registry.get(id).unwrap().npc_count, 0);
    }

    #[test]
    fn single_collapse_still_steps_one_state_at_a_time() {
        let mut registry = make_registry();
        let poi = village(100, 100);
        let id = poi.id;
        registry.insert(poi);

        // One catastrophic drop: the evaluation applies at most one
        // transition per population change.
        registry.set_population(id, 0, 1).unwrap();
        assert_eq!(registry.get(id).unwrap().state, PoiState::Declining);
        registry.evaluate(id, 2).unwrap();
        assert_eq!(registry.get(id).unwrap().state, PoiState::Abandoned);
        registry.evaluate(id, 3).unwrap();
        assert_eq!(registry.get(id).unwrap().state, PoiState::Ruins);
    }

    #[test]
    fn recovery_path_restores_normal_and_npcs() {
        let mut registry = make_registry();
        let mut poi = village(3, 100);
        poi.state = PoiState::Abandoned;
        poi.npc_count = 0;
        let id = poi.id;
        registry.insert(poi);

        registry.set_population(id, 15, 1).unwrap();
        assert_eq!(registry.get(id).unwrap().state, PoiState::Repopulating);
        assert_eq!(registry.get(id).unwrap().npc_count, 10);

        registry.set_population(id, 60, 2).unwrap();
        assert_eq!(registry.get(id).unwrap().state, PoiState::Normal);
    }

    #[test]
    fn war_damage_may_jump_states() {
        let mut registry = make_registry();
        let poi = village(100, 100);
        let id = poi.id;
        registry.insert(poi);

        registry.apply_war_damage(id, WarDamage::Devastating, 1).unwrap();
        let ruined = registry.get(id).unwrap();
        assert_eq!(ruined.state, PoiState::Ruins);
        assert_eq!(ruined.npc_count, 0);

        // Terminal states are never transitioned again.
        registry.apply_war_damage(id, WarDamage::Moderate, 2).unwrap();
        assert_eq!(registry.get(id).unwrap().state, PoiState::Ruins);
    }

    #[test]
    fn manual_override_suppresses_evaluation() {
        let mut registry = make_registry();
        let mut poi = village(100, 100);
        poi.manual_override = true;
        let id = poi.id;
        registry.insert(poi);

        registry.set_population(id, 0, 1).unwrap();
        assert_eq!(registry.get(id).unwrap().state, PoiState::Normal);

        registry.apply_war_damage(id, WarDamage::Devastating, 2).unwrap();
        assert_eq!(registry.get(id).unwrap().state, PoiState::Normal);
    }

    #[test]
    fn transitions_emit_events_and_state_writes() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let dispatcher = Arc::new(EventDispatcher::new());
        let store = Arc::new(WorldStateStore::new(Arc::clone(&dispatcher)));
        let transitions = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&transitions);
        dispatcher
            .subscribe(
                loreweave_types::EventType::PoiStateChanged,
                0,
                Arc::new(move |_event| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            )
            .unwrap();

        let mut registry =
            PoiRegistry::new(PoiConfig::default(), Arc::clone(&store), dispatcher);
        let poi = village(100, 100);
        let id = poi.id;
        registry.insert(poi);

        registry.set_population(id, 10, 5).unwrap();
        assert_eq!(transitions.load(Ordering::SeqCst), 1);
        assert!(store.get(&format!("poi.{id}.state")).is_ok());
        assert!(store.get(&format!("poi.{id}.population")).is_ok());
    }
}
