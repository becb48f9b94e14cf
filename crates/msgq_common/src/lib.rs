//! Common definitions and constants shared across the message queue workspace.
//!
//! This crate provides the default limits applied when queues are created,
//! and the message record exchanged by the demo producers and consumers.
//! It carries no synchronization code and stays `no_std` so it can be shared
//! by the queue core, the script loader and the host binary alike.

#![no_std]

extern crate alloc;

// Limits applied to queue creation and message construction.
//
// These values are defaults, not hard ceilings baked into the queue. The core
// reads them through its configuration type so callers can raise or lower
// them per registry or per queue.
pub mod limits {
    /// Default ceiling on the number of slots a single queue may allocate.
    ///
    /// Bounds the up-front slot allocation performed at queue creation. A
    /// queue with this many slots holds at most `DEFAULT_MAX_CAPACITY - 1`
    /// payloads because one slot is reserved to tell full from empty.
    pub const DEFAULT_MAX_CAPACITY: usize = 512;

    /// Default maximum length, in bytes, of a queue name.
    ///
    /// Names only appear in diagnostics, so a short bound keeps log lines
    /// readable and rejects accidental garbage early.
    pub const DEFAULT_MAX_NAME_LEN: usize = 31;

    /// Maximum length, in bytes, of a message body.
    pub const MAX_BODY_LEN: usize = 50;

    /// Name of the queue created by the demo driver.
    pub const DEMO_QUEUE_NAME: &str = "msg queue example";
}

/// Message records carried through queues by the demo driver.
///
/// The queue itself is generic over its payload; this module only defines the
/// concrete record the host binary and the script loader agree on.
pub mod message {
    use alloc::string::String;
    use core::fmt;

    use crate::limits::MAX_BODY_LEN;

    /// A typed text message with a bounded body.
    ///
    /// The body is owned, so moving a `Message` (or a `Box<Message>`) into a
    /// queue transfers the whole payload, and dropping it releases it.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Message {
        /// Application-defined message type tag.
        pub msg_type: i32,

        body: String,
    }

    /// Returned when a message body exceeds [`MAX_BODY_LEN`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BodyTooLong {
        /// Length of the rejected body in bytes.
        pub len: usize,
    }

    impl fmt::Display for BodyTooLong {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(
                f,
                "message body is {} bytes, limit is {}",
                self.len, MAX_BODY_LEN
            )
        }
    }

    impl core::error::Error for BodyTooLong {}

    impl Message {
        /// Constructs a message, rejecting bodies longer than [`MAX_BODY_LEN`].
        ///
        /// # Arguments
        ///
        /// * `msg_type` - Application-defined type tag
        /// * `body` - Message text, at most `MAX_BODY_LEN` bytes
        pub fn new(msg_type: i32, body: impl Into<String>) -> Result<Self, BodyTooLong> {
            let body = body.into();
            if body.len() > MAX_BODY_LEN {
                return Err(BodyTooLong { len: body.len() });
            }
            Ok(Self { msg_type, body })
        }

        pub fn body(&self) -> &str {
            &self.body
        }
    }

    impl fmt::Display for Message {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "[type {}] {}", self.msg_type, self.body)
        }
    }

}
