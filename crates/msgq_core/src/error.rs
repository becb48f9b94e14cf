//! Error types returned by queue and registry operations.

use std::fmt;

use thiserror::Error;

/// Failures reported by queue creation, the registry, and converted
/// push/pop outcomes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// A name or capacity outside the configured limits, or a duplicate name.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Slot storage for the requested capacity could not be reserved.
    #[error("unable to allocate storage for {capacity} slots")]
    ResourceExhausted { capacity: usize },

    /// No queue is registered under the given name.
    #[error("no such queue: {0}")]
    NoSuchQueue(String),

    /// The registry entry was removed but other handles keep the queue alive.
    #[error("queue '{name}' is still held by {holders} other handle(s)")]
    StillShared { name: String, holders: usize },

    #[error("queue is full")]
    Full,

    #[error("queue is empty")]
    Empty,

    #[error("timed out waiting on queue")]
    Timeout,
}

/// A rejected push. The payload is handed back untouched.
#[derive(Error, PartialEq, Eq)]
pub enum PushError<T> {
    /// The queue was full and the call was not allowed to wait.
    #[error("queue is full")]
    Full(T),

    /// No slot became free before the deadline.
    #[error("timed out waiting for a free slot")]
    Timeout(T),
}

impl<T> PushError<T> {
    /// Recovers the payload that was not enqueued.
    pub fn into_inner(self) -> T {
        match self {
            Self::Full(payload) | Self::Timeout(payload) => payload,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

// Payloads need not be Debug.
impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(_) => f.write_str("Full(..)"),
            Self::Timeout(_) => f.write_str("Timeout(..)"),
        }
    }
}

impl<T> From<PushError<T>> for QueueError {
    fn from(err: PushError<T>) -> Self {
        match err {
            PushError::Full(_) => Self::Full,
            PushError::Timeout(_) => Self::Timeout,
        }
    }
}

/// A pop that returned without a payload.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopError {
    /// The queue was empty and the call was not allowed to wait.
    #[error("queue is empty")]
    Empty,

    /// No payload arrived before the deadline.
    #[error("timed out waiting for a payload")]
    Timeout,
}

impl From<PopError> for QueueError {
    fn from(err: PopError) -> Self {
        match err {
            PopError::Empty => Self::Empty,
            PopError::Timeout => Self::Timeout,
        }
    }
}
