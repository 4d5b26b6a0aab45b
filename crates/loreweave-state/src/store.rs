//! The [`WorldStateStore`]: append-only history with temporal queries.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use loreweave_events::EventDispatcher;
use loreweave_types::{Event, EventPayload, RegionId, StateEntry};

use crate::error::StateError;

/// Hierarchical, versioned key/value history.
///
/// One instance per process. Writes serialize behind the write lock;
/// reads take the read lock briefly to clone immutable entries.
pub struct WorldStateStore {
    /// Per-key history, ordered by version (and therefore by time,
    /// since callers supply non-decreasing `sim_time` values).
    histories: RwLock<BTreeMap<String, Vec<StateEntry>>>,
    dispatcher: Arc<EventDispatcher>,
}

impl WorldStateStore {
    /// Create an empty store that publishes change events on `dispatcher`.
    pub fn new(dispatcher: Arc<EventDispatcher>) -> Self {
        Self {
            histories: RwLock::new(BTreeMap::new()),
            dispatcher,
        }
    }

    /// Append a new version for `key` and publish `WorldStateChanged`.
    ///
    /// Returns the version assigned to the new entry (1 for the first
    /// write to a key).
    ///
    /// # Errors
    ///
    /// Returns [`StateError::InvalidKey`] for malformed keys and
    /// [`StateError::LockPoisoned`] if the store lock is poisoned.
    pub fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        category: &str,
        region: Option<RegionId>,
        sim_time: u64,
    ) -> Result<u64, StateError> {
        self.append(key, value, category, region, sim_time, None)
    }

    /// Compare-and-append: succeed only if the current version equals
    /// `expected_version` (0 for a key with no history).
    ///
    /// # Errors
    ///
    /// Returns [`StateError::VersionConflict`] if another writer got
    /// there first; otherwise as [`set`](Self::set).
    pub fn set_expecting(
        &self,
        key: &str,
        expected_version: u64,
        value: serde_json::Value,
        category: &str,
        region: Option<RegionId>,
        sim_time: u64,
    ) -> Result<u64, StateError> {
        self.append(key, value, category, region, sim_time, Some(expected_version))
    }

    /// The latest value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::KeyNotFound`] if the key has no history.
    pub fn get(&self, key: &str) -> Result<serde_json::Value, StateError> {
        let histories = self.histories.read().map_err(|_e| StateError::LockPoisoned)?;
        histories
            .get(key)
            .and_then(|entries| entries.last())
            .map(|entry| entry.value.clone())
            .ok_or_else(|| StateError::KeyNotFound(key.to_owned()))
    }

    /// The full ordered history for `key` (oldest first).
    ///
    /// # Errors
    ///
    /// Returns [`StateError::KeyNotFound`] if the key has no history.
    pub fn get_history(&self, key: &str) -> Result<Vec<StateEntry>, StateError> {
        let histories = self.histories.read().map_err(|_e| StateError::LockPoisoned)?;
        histories
            .get(key)
            .cloned()
            .ok_or_else(|| StateError::KeyNotFound(key.to_owned()))
    }

    /// The value of the latest entry with `sim_time <= at`, or `None`
    /// if the key's first entry is later than `at`.
    ///
    /// Binary search over the per-key history, which is ordered by
    /// `sim_time` because writes carry non-decreasing simulation times.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::KeyNotFound`] if the key has no history.
    pub fn get_value_at(
        &self,
        key: &str,
        at: u64,
    ) -> Result<Option<serde_json::Value>, StateError> {
        let histories = self.histories.read().map_err(|_e| StateError::LockPoisoned)?;
        let entries = histories
            .get(key)
            .ok_or_else(|| StateError::KeyNotFound(key.to_owned()))?;
        // Index of the first entry strictly after `at`.
        let idx = entries.partition_point(|entry| entry.sim_time <= at);
        Ok(idx
            .checked_sub(1)
            .and_then(|i| entries.get(i))
            .map(|entry| entry.value.clone()))
    }

    /// Latest entries whose category equals `category`.
    pub fn query_by_category(&self, category: &str) -> Vec<StateEntry> {
        self.latest_matching(|entry| entry.category == category)
    }

    /// Latest entries whose region equals `region`.
    pub fn query_by_region(&self, region: &RegionId) -> Vec<StateEntry> {
        self.latest_matching(|entry| entry.region.as_ref() == Some(region))
    }

    /// Latest entries whose key starts with `prefix`.
    pub fn query_by_prefix(&self, prefix: &str) -> Vec<StateEntry> {
        self.histories.read().map_or_else(
            |_e| Vec::new(),
            |histories| {
                histories
                    .range(prefix.to_owned()..)
                    .take_while(|(key, _)| key.starts_with(prefix))
                    .filter_map(|(_, entries)| entries.last().cloned())
                    .collect()
            },
        )
    }

    /// Number of keys with at least one entry.
    pub fn key_count(&self) -> usize {
        self.histories.read().map_or(0, |histories| histories.len())
    }

    /// Shared append path for `set` and `set_expecting`.
    fn append(
        &self,
        key: &str,
        value: serde_json::Value,
        category: &str,
        region: Option<RegionId>,
        sim_time: u64,
        expected_version: Option<u64>,
    ) -> Result<u64, StateError> {
        validate_key(key)?;

        let entry = {
            let mut histories = self.histories.write().map_err(|_e| StateError::LockPoisoned)?;
            let entries = histories.entry(key.to_owned()).or_default();
            let current = entries.last().map_or(0, |entry| entry.version);

            if let Some(expected) = expected_version {
                if current != expected {
                    return Err(StateError::VersionConflict {
                        key: key.to_owned(),
                        expected,
                        actual: current,
                    });
                }
            }

            let entry = StateEntry {
                key: key.to_owned(),
                value,
                version: current.saturating_add(1),
                sim_time,
                category: category.to_owned(),
                region,
            };
            debug_assert!(entries.last().is_none_or(|prev| prev.version < entry.version));
            entries.push(entry.clone());
            entry
        };

        let version = entry.version;
        debug!(key, version, sim_time, "State entry appended");

        // Publish after releasing the write lock so handlers can read back.
        let event = Event::new(sim_time, EventPayload::WorldStateChanged { entry }, "world-state");
        match self.dispatcher.publish_sync(event) {
            Ok(report) if !report.failures.is_empty() => {
                warn!(
                    key,
                    failures = report.failures.len(),
                    "WorldStateChanged delivered with handler failures"
                );
            }
            Ok(_) => {}
            Err(err) => warn!(key, %err, "WorldStateChanged publication failed"),
        }

        Ok(version)
    }

    /// Collect the latest entry of each key matching `predicate`.
    fn latest_matching(&self, predicate: impl Fn(&StateEntry) -> bool) -> Vec<StateEntry> {
        self.histories.read().map_or_else(
            |_e| Vec::new(),
            |histories| {
                histories
                    .values()
                    .filter_map(|entries| entries.last())
                    .filter(|entry| predicate(entry))
                    .cloned()
                    .collect()
            },
        )
    }
}

impl core::fmt::Debug for WorldStateStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WorldStateStore")
            .field("keys", &self.key_count())
            .finish_non_exhaustive()
    }
}

/// Keys must be non-empty and contain no whitespace.
fn validate_key(key: &str) -> Result<(), StateError> {
    if key.is_empty() {
        return Err(StateError::InvalidKey {
            key: key.to_owned(),
            reason: "key must not be empty",
        });
    }
    if key.chars().any(char::is_whitespace) {
        return Err(StateError::InvalidKey {
            key: key.to_owned(),
            reason: "key must not contain whitespace",
        });
    }
    Ok(())
}
