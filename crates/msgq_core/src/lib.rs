//! Bounded in-process message queue shared between producer and consumer threads.
//!
//! This crate provides the queue itself, the limits checked when one is
//! created, the error types its operations report, and an optional registry
//! for looking queues up by name. Everything here is safe to share across OS
//! threads; blocking operations park the caller on a condition variable.

/// Creation limits for queues.
///
/// Holds the maximum slot count and maximum name length that queue creation
/// validates against. Defaults come from `msgq_common::limits`; callers that
/// need larger rings raise the ceiling here instead of editing a constant.
pub mod config;

/// Error types returned by queue and registry operations.
///
/// `Full` and `Empty` outcomes are ordinary results under the non-blocking
/// policy, so they have dedicated push/pop error types that hand rejected
/// payloads back. Both convert into the crate-wide [`QueueError`] for callers
/// that prefer a single error type and `?`.
pub mod error;

/// Mutex-and-condvar protected ring buffer of owned payloads.
///
/// Supports any number of concurrent producers and consumers with blocking,
/// non-blocking and deadline-bounded push/pop. Payloads move into the queue on
/// push and out to the caller on pop; whatever is still resident when the
/// queue goes away is dropped exactly once.
pub mod queue;

/// Name-to-queue lookup.
///
/// A thin map from names to shared queue handles, for programs that wire
/// producers and consumers together by name rather than by passing handles.
pub mod registry;

pub use config::QueueConfig;
pub use error::{PopError, PushError, QueueError};
pub use queue::{BoundedQueue, Policy, QueueStatus};
pub use registry::QueueRegistry;
