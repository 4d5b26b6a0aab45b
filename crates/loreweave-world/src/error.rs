//! Error types for the world engines.

use loreweave_types::{FactionPairKey, PoiId};

/// Errors that can occur in the population, POI, and faction engines.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The POI id is unknown.
    #[error("poi not found: {0}")]
    PoiNotFound(PoiId),

    /// No record exists for the faction pair.
    #[error("faction pair not found: {0:?}")]
    PairNotFound(FactionPairKey),

    /// A parameter was outside its valid range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// The offending parameter.
        name: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// A world-state write failed.
    #[error(transparent)]
    State(#[from] loreweave_state::StateError),

    /// A state value failed to serialize.
    #[error("failed to encode state value: {0}")]
    Encode(#[from] serde_json::Error),

    /// A publish to the dispatcher failed.
    #[error("failed to publish world event: {0}")]
    Publish(#[from] loreweave_events::DispatchError),
}
