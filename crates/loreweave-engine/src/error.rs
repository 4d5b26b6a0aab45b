//! Error types for the simulation binary.
//!
//! [`EngineError`] wraps every subsystem failure mode so `main` can
//! propagate startup and wiring errors with `?`.

/// Top-level error for the simulation binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: loreweave_core::ConfigError,
    },

    /// World clock initialization failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: loreweave_core::ClockError,
    },

    /// The scheduler failed outside a recoverable overrun.
    #[error("scheduler error: {source}")]
    Scheduler {
        /// The underlying scheduler error.
        #[from]
        source: loreweave_core::SchedulerError,
    },

    /// A narrative engine failed during seeding or wiring.
    #[error("narrative error: {source}")]
    Narrative {
        /// The underlying narrative error.
        #[from]
        source: loreweave_narrative::NarrativeError,
    },

    /// A world engine failed during seeding or wiring.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: loreweave_world::WorldError,
    },

    /// A dispatcher operation failed.
    #[error("dispatch error: {source}")]
    Dispatch {
        /// The underlying dispatch error.
        #[from]
        source: loreweave_events::DispatchError,
    },

    /// A world-state write failed.
    #[error("state error: {source}")]
    State {
        /// The underlying state error.
        #[from]
        source: loreweave_state::StateError,
    },
}
