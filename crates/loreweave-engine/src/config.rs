//! Composition of every engine's config section into one document.
//!
//! `loreweave-config.yaml` holds one section per subsystem; every
//! section and every field defaults, so an empty or missing file yields
//! a fully usable configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use loreweave_core::{LoggingConfig, SchedulerConfig, WorldConfig, load_yaml_file};
use loreweave_narrative::{MotifConfig, RumorConfig};
use loreweave_world::{FactionConfig, PoiConfig, PopulationConfig};

use crate::error::EngineError;

/// The full simulation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// World name, seed, tick pacing, calendar.
    pub world: WorldConfig,
    /// Catch-up behavior.
    pub scheduler: SchedulerConfig,
    /// Tracing filter.
    pub logging: LoggingConfig,
    /// Motif rotation tuning.
    pub motif: MotifConfig,
    /// Rumor diffusion tuning.
    pub rumor: RumorConfig,
    /// Population growth tuning.
    pub population: PopulationConfig,
    /// POI lifecycle tuning.
    pub poi: PoiConfig,
    /// Faction tension / war tuning.
    pub faction: FactionConfig,
}

impl SimulationConfig {
    /// Load the configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if the file cannot be read or
    /// parsed.
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        Ok(load_yaml_file(path)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use loreweave_core::parse_yaml;

    #[test]
    fn empty_document_yields_full_defaults() {
        let config: SimulationConfig = parse_yaml("{}").unwrap();
        assert_eq!(config.world.tick_interval_ms, 250);
        assert!((config.faction.war_threshold - 70.0).abs() < f64::EPSILON);
        assert!((config.rumor.base_mutation_chance - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn sections_override_independently() {
        let raw = "world:\n  name: emberfall\nfaction:\n  war_threshold: 60\n";
        let config: SimulationConfig = parse_yaml(raw).unwrap();
        assert_eq!(config.world.name, "emberfall");
        assert!((config.faction.war_threshold - 60.0).abs() < f64::EPSILON);
        // Untouched sections keep their defaults.
        assert!((config.population.soft_cap_fraction - 0.9).abs() < f64::EPSILON);
    }
}
