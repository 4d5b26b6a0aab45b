//! Error types for the narrative engines.

use loreweave_types::{EntityId, RumorId};

/// Errors that can occur in the motif and rumor engines.
#[derive(Debug, thiserror::Error)]
pub enum NarrativeError {
    /// A parameter was outside its valid range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// The offending parameter.
        name: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// The rumor id is unknown.
    #[error("rumor not found: {0}")]
    RumorNotFound(RumorId),

    /// The entity id is unknown.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// A world-state write failed.
    #[error(transparent)]
    State(#[from] loreweave_state::StateError),

    /// A state value failed to serialize.
    #[error("failed to encode state value: {0}")]
    Encode(#[from] serde_json::Error),

    /// A publish to the dispatcher failed.
    #[error("failed to publish narrative event: {0}")]
    Publish(#[from] loreweave_events::DispatchError),
}
