//! The population controller.
//!
//! Once per monthly boundary, every non-terminal POI grows (or shrinks,
//! under a negative global multiplier) according to a rate curve shaped
//! by how far the POI is from its target population:
//!
//! ```text
//! raw = base_rate(type) * (current / target) * global_multiplier
//! raw = raw / 2            when current >= soft_cap_fraction * target
//! increment = floor(raw)
//! current = min(current + increment, target)   (hard cap)
//! current = max(current, min_population)       (ghost-town floor)
//! ```
//!
//! The write itself goes through [`PoiRegistry::set_population`], which
//! publishes `PopulationChanged` and evaluates lifecycle transitions.

use tracing::debug;

use loreweave_types::Poi;

use crate::config::PopulationConfig;
use crate::error::WorldError;
use crate::poi::PoiRegistry;

/// Applies monthly population growth to a [`PoiRegistry`].
pub struct PopulationController {
    config: PopulationConfig,
}

impl PopulationController {
    /// Build a controller with the given tuning.
    pub const fn new(config: PopulationConfig) -> Self {
        Self { config }
    }

    /// Set the admin-controlled global multiplier. Negative values
    /// produce world-wide decline.
    pub const fn set_global_multiplier(&mut self, multiplier: f64) {
        self.config.global_multiplier = multiplier;
    }

    /// Run the monthly growth step over every POI.
    ///
    /// POIs in terminal states are skipped. Returns the number of POIs
    /// whose population changed.
    ///
    /// # Errors
    ///
    /// Propagates state-write and publish failures from the registry.
    pub fn on_month_passed(
        &self,
        registry: &mut PoiRegistry,
        sim_time: u64,
    ) -> Result<usize, WorldError> {
        let mut changed = 0_usize;
        for id in registry.ids() {
            let (skip, old, new) = {
                let poi = registry.get(id)?;
                if poi.state.is_terminal() {
                    (true, 0, 0)
                } else {
                    (false, poi.current_population, self.next_population(poi))
                }
            };
            if skip || old == new {
                continue;
            }
            debug!(poi = %id, old, new, "monthly population step");
            registry.set_population(id, new, sim_time)?;
            changed = changed.saturating_add(1);
        }
        Ok(changed)
    }

    /// Compute one POI's next population under the growth formula.
    pub fn next_population(&self, poi: &Poi) -> u32 {
        if poi.target_population == 0 {
            return poi.current_population.max(poi.min_population);
        }
        let current = f64::from(poi.current_population);
        let target = f64::from(poi.target_population);

        let mut raw = self.config.base_rate(poi.poi_type) * (current / target)
            * self.config.global_multiplier;
        if current >= self.config.soft_cap_fraction * target {
            raw /= 2.0;
        }
        let increment = raw.floor();

        let grown = (current + increment).min(target);
        let floored = grown.max(f64::from(poi.min_population)).max(0.0);
        saturating_u32(floored)
    }
}

/// Convert a non-negative `f64` to `u32`, saturating at the bounds.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const fn saturating_u32(value: f64) -> u32 {
    if value <= 0.0 {
        0
    } else if value >= u32::MAX as f64 {
        u32::MAX
    } else {
        value as u32
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use loreweave_events::EventDispatcher;
    use loreweave_state::WorldStateStore;
    use loreweave_types::{PoiId, PoiState, PoiType, RegionId};

    use crate::config::PoiConfig;

    fn poi(current: u32, target: u32) -> Poi {
        Poi {
            id: PoiId::new(),
            name: "Harrowgate".to_owned(),
            poi_type: PoiType::Village,
            region: RegionId::from("emberfall"),
            state: PoiState::Normal,
            current_population: current,
            target_population: target,
            min_population: 0,
            max_population: target.saturating_mul(2),
            npc_count: 10,
            manual_override: false,
        }
    }

    fn make_registry() -> PoiRegistry {
        let dispatcher = Arc::new(EventDispatcher::new());
        let store = Arc::new(WorldStateStore::new(Arc::clone(&dispatcher)));
        PoiRegistry::new(PoiConfig::default(), store, dispatcher)
    }

    #[test]
    fn growth_formula_fixture() {
        // base 10, 50/100 of target, multiplier 1:
        // raw = 10 * 0.5 * 1 = 5, no soft cap, 50 + 5 = 55.
        let controller = PopulationController::new(PopulationConfig::default());
        assert_eq!(controller.next_population(&poi(50, 100)), 55);
    }

    #[test]
    fn soft_cap_halves_growth_before_flooring() {
        // 92/100: raw = 10 * 0.92 = 9.2, soft-capped to 4.6, floor 4.
        let controller = PopulationController::new(PopulationConfig::default());
        assert_eq!(controller.next_population(&poi(92, 100)), 96);
    }

    #[test]
    fn hard_cap_clamps_to_target() {
        let controller = PopulationController::new(PopulationConfig::default());
        assert_eq!(controller.next_population(&poi(98, 100)), 100);
    }

    #[test]
    fn negative_multiplier_declines_to_the_floor() {
        let mut controller = PopulationController::new(PopulationConfig::default());
        controller.set_global_multiplier(-3.0);

        // raw = 10 * 0.5 * -3 = -15, floor -15, 50 - 15 = 35.
        assert_eq!(controller.next_population(&poi(50, 100)), 35);

        let mut low = poi(4, 100);
        low.min_population = 3;
        // raw = 10 * 0.04 * -3 = -1.2, floor -2, 4 - 2 = 2, floored to 3.
        assert_eq!(controller.next_population(&low), 3);
    }

    #[test]
    fn monthly_step_skips_terminal_states() {
        let controller = PopulationController::new(PopulationConfig::default());
        let mut registry = make_registry();

        let growing = poi(50, 100);
        let growing_id = growing.id;
        registry.insert(growing);

        let mut ruined = poi(50, 100);
        ruined.state = PoiState::Ruins;
        let ruined_id = ruined.id;
        registry.insert(ruined);

        let changed = controller.on_month_passed(&mut registry, 100).unwrap();
        assert_eq!(changed, 1);
        assert_eq!(registry.get(growing_id).unwrap().current_population, 55);
        assert_eq!(registry.get(ruined_id).unwrap().current_population, 50);
    }
}
