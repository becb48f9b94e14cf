//! Name-to-queue lookup.
//!
//! The registry only owns the mapping. Queues are handed out as `Arc`s so
//! producer and consumer threads can hold them independently of the map;
//! removing a name never invalidates a handle someone else still holds.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::queue::{BoundedQueue, Policy};

pub struct QueueRegistry<T> {
    config: QueueConfig,
    queues: Mutex<HashMap<String, Arc<BoundedQueue<T>>>>,
}

impl<T> Default for QueueRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> QueueRegistry<T> {
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    /// Creates a registry whose queues are validated against `config`.
    pub fn with_config(config: QueueConfig) -> Self {
        Self {
            config,
            queues: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Creates and registers a queue under `name`.
    ///
    /// Fails with `InvalidArgument` if the name is taken or the parameters
    /// are out of range. Nothing is registered on failure.
    pub fn create(
        &self,
        name: &str,
        capacity: usize,
        default_policy: Policy,
    ) -> Result<Arc<BoundedQueue<T>>, QueueError> {
        let mut queues = self.lock();
        if queues.contains_key(name) {
            return Err(QueueError::InvalidArgument(format!(
                "queue '{name}' already exists"
            )));
        }
        let queue = Arc::new(BoundedQueue::with_config(
            name,
            capacity,
            default_policy,
            &self.config,
        )?);
        queues.insert(name.to_string(), queue.clone());
        Ok(queue)
    }

    pub fn get(&self, name: &str) -> Result<Arc<BoundedQueue<T>>, QueueError> {
        self.lock()
            .get(name)
            .cloned()
            .ok_or_else(|| QueueError::NoSuchQueue(name.to_string()))
    }

    /// Unregisters `name` and destroys the queue if this was its last handle.
    ///
    /// # Returns
    ///
    /// The number of payloads released, `NoSuchQueue` for an unknown name, or
    /// `StillShared` when other handles keep the queue alive. In that case the
    /// name is still removed and the payloads are released with the last
    /// handle.
    pub fn destroy(&self, name: &str) -> Result<usize, QueueError> {
        let queue = self
            .lock()
            .remove(name)
            .ok_or_else(|| QueueError::NoSuchQueue(name.to_string()))?;

        match Arc::try_unwrap(queue) {
            Ok(queue) => Ok(queue.destroy()),
            Err(shared) => {
                let holders = Arc::strong_count(&shared) - 1;
                debug!(queue = name, holders, "queue unregistered while shared");
                Err(QueueError::StillShared {
                    name: name.to_string(),
                    holders,
                })
            }
        }
    }

    pub fn is_full(&self, name: &str) -> Result<bool, QueueError> {
        self.get(name).map(|queue| queue.is_full())
    }

    pub fn is_empty(&self, name: &str) -> Result<bool, QueueError> {
        self.get(name).map(|queue| queue.is_empty())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn has_no_queues(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<BoundedQueue<T>>>> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_get_destroy() {
        let registry = QueueRegistry::<String>::new();
        let queue = registry.create("jobs", 4, Policy::NoWait).unwrap();
        queue.push("a".to_string(), Policy::NoWait).unwrap();
        queue.push("b".to_string(), Policy::NoWait).unwrap();

        assert_eq!(registry.is_empty("jobs"), Ok(false));
        assert_eq!(registry.is_full("jobs"), Ok(false));
        assert_eq!(registry.names(), vec!["jobs".to_string()]);

        let again = registry.get("jobs").unwrap();
        assert_eq!(again.pop(Policy::NoWait), Ok("a".to_string()));

        drop(queue);
        drop(again);
        assert_eq!(registry.destroy("jobs"), Ok(1));
        assert!(registry.has_no_queues());
    }

    #[test]
    fn unknown_names_are_reported() {
        let registry = QueueRegistry::<u32>::new();
        let missing = QueueError::NoSuchQueue("nope".to_string());
        assert_eq!(registry.get("nope").unwrap_err(), missing);
        assert_eq!(registry.destroy("nope"), Err(missing.clone()));
        assert_eq!(registry.is_full("nope"), Err(missing.clone()));
        assert_eq!(registry.is_empty("nope"), Err(missing));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let registry = QueueRegistry::<u32>::new();
        registry.create("dup", 4, Policy::Block).unwrap();
        assert!(matches!(
            registry.create("dup", 8, Policy::NoWait),
            Err(QueueError::InvalidArgument(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn failed_create_registers_nothing() {
        let registry =
            QueueRegistry::<u32>::with_config(QueueConfig::default().with_max_capacity(4));
        assert!(registry.create("big", 5, Policy::Block).is_err());
        assert!(registry.has_no_queues());
    }

    #[test]
    fn destroy_while_shared() {
        let registry = QueueRegistry::<u32>::new();
        let held = registry.create("shared", 4, Policy::NoWait).unwrap();
        held.push(7, Policy::NoWait).unwrap();

        assert_eq!(
            registry.destroy("shared"),
            Err(QueueError::StillShared {
                name: "shared".to_string(),
                holders: 1,
            })
        );
        assert!(registry.get("shared").is_err());
        assert_eq!(held.pop(Policy::NoWait), Ok(7));
    }
}
