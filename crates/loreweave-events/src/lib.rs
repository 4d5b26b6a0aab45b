//! In-process publish/subscribe dispatcher for the Loreweave substrate.
//!
//! Every component of the simulation communicates through this bus: the
//! scheduler publishes time-boundary events, engines subscribe to them,
//! and the world-state store raises change events here. The dispatcher
//! guarantees:
//!
//! - **Middleware first**: registered middleware runs in registration
//!   order and may transform or veto an event before any subscriber
//!   sees it.
//! - **Deterministic handler order**: handlers for one event type run in
//!   descending subscription priority, ties broken by registration order.
//!   No ordering is guaranteed across event types.
//! - **Error isolation**: a handler that fails is recorded and logged;
//!   delivery continues to the remaining subscribers.
//! - **Non-blocking async path**: [`EventDispatcher::publish_async`]
//!   enqueues onto an unbounded channel drained by a worker task and
//!   never blocks the caller. The worker shuts down cooperatively.
//!
//! Dispatch snapshots the matching handler list before invoking anything,
//! so handlers are free to publish follow-up events or change
//! subscriptions without deadlocking.

pub mod dispatcher;
pub mod error;

pub use dispatcher::{
    DispatchReport, EventDispatcher, EventHandler, HandlerFailure, Middleware,
};
pub use error::{DispatchError, HandlerError};
