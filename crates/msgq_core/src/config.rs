//! Creation limits for queues.

use msgq_common::limits::{DEFAULT_MAX_CAPACITY, DEFAULT_MAX_NAME_LEN};
use tracing::warn;

use crate::error::QueueError;

/// Limits checked when a queue is created.
///
/// The slot ceiling bounds the allocation a single `create` may perform; it is
/// a policy knob, not a property of the ring. The name bound keeps diagnostic
/// labels short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Largest accepted slot count.
    pub max_capacity: usize,

    /// Longest accepted queue name, in bytes.
    pub max_name_len: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_capacity: DEFAULT_MAX_CAPACITY,
            max_name_len: DEFAULT_MAX_NAME_LEN,
        }
    }
}

impl QueueConfig {
    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    pub fn with_max_name_len(mut self, max_name_len: usize) -> Self {
        self.max_name_len = max_name_len;
        self
    }

    /// Checks a requested name and slot count against these limits.
    ///
    /// Rejections are logged at warn level and returned as
    /// [`QueueError::InvalidArgument`].
    pub fn validate(&self, name: &str, capacity: usize) -> Result<(), QueueError> {
        let problem = if name.is_empty() {
            Some("queue name is empty".to_string())
        } else if name.len() > self.max_name_len {
            Some(format!(
                "queue name is {} bytes, limit is {}",
                name.len(),
                self.max_name_len
            ))
        } else if capacity == 0 {
            Some("capacity must be at least 1".to_string())
        } else if capacity > self.max_capacity {
            Some(format!(
                "capacity {} exceeds maximum of {}",
                capacity, self.max_capacity
            ))
        } else {
            None
        };

        match problem {
            Some(reason) => {
                warn!(queue = name, capacity, %reason, "rejected queue parameters");
                Err(QueueError::InvalidArgument(reason))
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits() {
        let config = QueueConfig::default();
        assert_eq!(config.max_capacity, 512);
        assert_eq!(config.max_name_len, 31);
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        let config = QueueConfig::default().with_max_capacity(8);
        assert!(config.validate("q", 8).is_ok());
        assert!(matches!(
            config.validate("q", 9),
            Err(QueueError::InvalidArgument(_))
        ));
        assert!(matches!(
            config.validate("q", 0),
            Err(QueueError::InvalidArgument(_))
        ));
        assert!(matches!(
            config.validate("", 4),
            Err(QueueError::InvalidArgument(_))
        ));
    }

    #[test]
    fn name_limit_is_configurable() {
        let long = "n".repeat(40);
        assert!(QueueConfig::default().validate(&long, 4).is_err());
        assert!(
            QueueConfig::default()
                .with_max_name_len(64)
                .validate(&long, 4)
                .is_ok()
        );
    }
}
