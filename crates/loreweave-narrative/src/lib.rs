//! Narrative-mechanic engines: hidden motifs and diffusing rumors.
//!
//! Both engines communicate only through the event dispatcher and record
//! their effects into the world-state store. Neither exposes its internal
//! randomness; callers see read-only context snapshots
//! ([`MotifContext`], [`RumorContext`]) built for the content layer.

pub mod config;
pub mod error;
pub mod motif;
pub mod rumor;

pub use config::{MotifConfig, MutationWeights, RumorConfig};
pub use error::NarrativeError;
pub use motif::{MotifContext, MotifEngine};
pub use rumor::{BeliefLabel, EntityProfile, PropagationOutcome, RumorContext, RumorEngine};
