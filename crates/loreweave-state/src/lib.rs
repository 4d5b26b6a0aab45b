//! Versioned, append-only world-state store.
//!
//! Every engine persists its effects here. For a given key the history is
//! strictly append-only: each write creates a new [`StateEntry`] with
//! `version = previous + 1`, entries are never mutated or deleted, and
//! temporal queries binary-search the per-key history. Each write
//! publishes a `WorldStateChanged` event through the dispatcher *after*
//! releasing the store lock, so subscribers may freely read back.
//!
//! Writers to one key serialize behind the store's write lock; readers
//! clone immutable entries and never observe a partial write.
//!
//! [`StateEntry`]: loreweave_types::StateEntry

pub mod error;
pub mod store;

pub use error::StateError;
pub use store::WorldStateStore;
