//! Error types for the `loreweave-events` crate.

/// Errors that can occur inside the dispatcher itself.
///
/// Handler failures are *not* represented here: they are isolated into
/// the [`DispatchReport`] so one faulty subscriber cannot abort delivery.
///
/// [`DispatchReport`]: crate::dispatcher::DispatchReport
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// An internal lock was poisoned by a panicking thread.
    #[error("dispatcher lock poisoned")]
    LockPoisoned,

    /// The async queue has been shut down; no further events are accepted.
    #[error("async dispatch queue is closed")]
    QueueClosed,
}

/// An error raised inside a subscriber's handler.
///
/// Handlers return this to report failure; the dispatcher records it and
/// continues delivery to the next handler.
#[derive(Debug, Clone, thiserror::Error)]
#[error("handler error: {message}")]
pub struct HandlerError {
    /// Description of what went wrong inside the handler.
    pub message: String,
}

impl HandlerError {
    /// Build a handler error from any displayable cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self {
            message: message.to_owned(),
        }
    }
}
