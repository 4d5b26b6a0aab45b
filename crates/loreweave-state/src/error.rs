//! Error types for the `loreweave-state` crate.

/// Errors that can occur during world-state operations.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// The key is malformed (empty, or containing whitespace).
    #[error("invalid state key {key:?}: {reason}")]
    InvalidKey {
        /// The offending key.
        key: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// No history exists for the requested key.
    #[error("state key not found: {0}")]
    KeyNotFound(String),

    /// A compare-and-append write found a different current version.
    /// Indicates a non-serialized writer.
    #[error("version conflict on {key}: expected {expected}, found {actual}")]
    VersionConflict {
        /// The contested key.
        key: String,
        /// The version the writer expected to supersede.
        expected: u64,
        /// The version actually current.
        actual: u64,
    },

    /// The store lock was poisoned by a panicking thread.
    #[error("world-state lock poisoned")]
    LockPoisoned,
}
