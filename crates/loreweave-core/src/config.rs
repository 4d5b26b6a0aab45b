//! Configuration loading for the simulation core.
//!
//! All config structs deserialize from YAML with per-field defaults, so a
//! partial file (or no file at all) yields a fully usable configuration.
//! Engine crates define their own config sections; the binary composes
//! them into one document and uses [`load_yaml_file`] to read it.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::calendar::CalendarConfig;

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Io {
        /// Path that failed to read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file could not be parsed as YAML.
    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yml::Error),
}

/// Read and deserialize a YAML config file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read and
/// [`ConfigError::Yaml`] if it does not parse into `T`.
pub fn load_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_yaml(&raw)
}

/// Deserialize a YAML string.
///
/// # Errors
///
/// Returns [`ConfigError::Yaml`] if the string does not parse into `T`.
pub fn parse_yaml<T: DeserializeOwned>(raw: &str) -> Result<T, ConfigError> {
    Ok(serde_yml::from_str(raw)?)
}

/// Top-level world parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Display name of the world.
    pub name: String,
    /// Seed for all deterministic randomness.
    pub seed: u64,
    /// Wall-clock interval between ticks, in milliseconds.
    pub tick_interval_ms: u64,
    /// Number of ticks to run before stopping. `None` runs until shutdown.
    pub max_ticks: Option<u64>,
    /// World-seconds per wall-second.
    pub time_scale: f64,
    /// Caller-time seconds fed to the clock each tick.
    pub tick_delta_seconds: f64,
    /// Calendar structure.
    pub calendar: CalendarConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: "unnamed-world".to_owned(),
            seed: 0,
            tick_interval_ms: 250,
            max_ticks: None,
            time_scale: 86_400.0,
            tick_delta_seconds: 1.0,
            calendar: CalendarConfig::default(),
        }
    }
}

/// Scheduler behavior parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum world-days processed in a single tick before the tick is
    /// declared overrun.
    pub max_catchup_days_per_tick: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_catchup_days_per_tick: 1_000,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter directive, e.g. `info` or `loreweave=debug`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: WorldConfig = parse_yaml("{}").unwrap();
        assert_eq!(config.tick_interval_ms, 250);
        assert_eq!(config.calendar.days_per_month, 30);
        assert!(config.max_ticks.is_none());
    }

    #[test]
    fn partial_document_overrides_only_named_fields() {
        let raw = "name: emberfall\nseed: 42\nmax_ticks: 10\n";
        let config: WorldConfig = parse_yaml(raw).unwrap();
        assert_eq!(config.name, "emberfall");
        assert_eq!(config.seed, 42);
        assert_eq!(config.max_ticks, Some(10));
        assert!((config.time_scale - 86_400.0).abs() < f64::EPSILON);
    }

    #[test]
    fn scheduler_config_default_cap() {
        let config: SchedulerConfig = parse_yaml("{}").unwrap();
        assert_eq!(config.max_catchup_days_per_tick, 1_000);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let result: Result<WorldConfig, ConfigError> = parse_yaml("name: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }
}
