//! Bounded FIFO shared between any number of producer and consumer threads.
//!
//! The ring keeps one slot permanently free so that `head == tail` always
//! means empty and `tail + 1 == head` (mod capacity) always means full. All
//! index and slot mutation happens under a single mutex; producers park on
//! `not_full`, consumers park on `not_empty`, and every wake re-checks the
//! ring before touching a slot.

use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::config::QueueConfig;
use crate::error::{PopError, PushError, QueueError};

/// What a push or pop does when it cannot proceed immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    /// Suspend until the operation can complete.
    #[default]
    Block,
    /// Return `Full` or `Empty` straight away.
    NoWait,
}

/// Advisory occupancy snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    /// Holding at least one payload and at least one free slot.
    Normal,
    Full,
    Empty,
}

/// How long a blocked caller is willing to wait.
#[derive(Clone, Copy)]
enum Wait {
    Never,
    Forever,
    Until(Instant),
}

impl Wait {
    fn from_policy(policy: Policy) -> Self {
        match policy {
            Policy::Block => Self::Forever,
            Policy::NoWait => Self::Never,
        }
    }

    fn for_duration(timeout: Duration) -> Self {
        // A deadline past the representable range is as good as none.
        Instant::now()
            .checked_add(timeout)
            .map_or(Self::Forever, Self::Until)
    }
}

/// Why a wait loop gave up.
enum GiveUp {
    NotAllowed,
    DeadlinePassed,
}

struct Ring<T> {
    slots: Vec<Option<T>>,
    head: usize,
    tail: usize,
}

impl<T> Ring<T> {
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline(always)]
    fn next(&self, index: usize) -> usize {
        (index + 1) % self.capacity()
    }

    fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    fn is_full(&self) -> bool {
        self.next(self.tail) == self.head
    }

    fn len(&self) -> usize {
        (self.tail + self.capacity() - self.head) % self.capacity()
    }

    fn put(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        debug_assert!(self.slots[self.tail].is_none());
        self.slots[self.tail] = Some(item);
        self.tail = self.next(self.tail);
        Ok(())
    }

    fn take(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.slots[self.head].take();
        self.head = self.next(self.head);
        item
    }

    /// Drops every resident payload, oldest first, and returns how many.
    fn release_resident(&mut self) -> usize {
        let mut released = 0;
        while let Some(item) = self.take() {
            drop(item);
            released += 1;
        }
        released
    }
}

impl<T> Drop for Ring<T> {
    fn drop(&mut self) {
        self.release_resident();
    }
}

/// A fixed-capacity, mutex-and-condvar protected ring of owned payloads.
///
/// Share it between threads behind an `Arc`. A queue created with capacity
/// `C` holds at most `C - 1` payloads. Payloads still resident when the
/// queue is destroyed or dropped are released in FIFO order.
pub struct BoundedQueue<T> {
    name: String,
    default_policy: Policy,
    ring: Mutex<Ring<T>>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T> BoundedQueue<T> {
    /// Creates a queue using the default [`QueueConfig`] limits.
    ///
    /// # Arguments
    ///
    /// * `name` - Diagnostic label, non-empty
    /// * `capacity` - Slot count, one of which is always kept free
    /// * `default_policy` - Policy used by [`push_default`](Self::push_default)
    ///   and [`pop_default`](Self::pop_default)
    ///
    /// # Returns
    ///
    /// The empty queue, `InvalidArgument` for a bad name or capacity, or
    /// `ResourceExhausted` when the slots cannot be allocated.
    pub fn new(
        name: impl Into<String>,
        capacity: usize,
        default_policy: Policy,
    ) -> Result<Self, QueueError> {
        Self::with_config(name, capacity, default_policy, &QueueConfig::default())
    }

    /// Creates a queue, validating against the given limits.
    pub fn with_config(
        name: impl Into<String>,
        capacity: usize,
        default_policy: Policy,
        config: &QueueConfig,
    ) -> Result<Self, QueueError> {
        let name = name.into();
        config.validate(&name, capacity)?;

        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| QueueError::ResourceExhausted { capacity })?;
        slots.resize_with(capacity, || None);

        debug!(queue = %name, capacity, ?default_policy, "queue created");

        Ok(Self {
            name,
            default_policy,
            ring: Mutex::new(Ring {
                slots,
                head: 0,
                tail: 0,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_policy(&self) -> Policy {
        self.default_policy
    }

    /// Number of slots, including the one kept free.
    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    /// Largest number of payloads the queue can hold at once.
    pub fn usable_capacity(&self) -> usize {
        self.capacity() - 1
    }

    /// Enqueues `payload` at the tail.
    ///
    /// With [`Policy::Block`] the caller sleeps until a slot frees up. With
    /// [`Policy::NoWait`] a full queue returns [`PushError::Full`] carrying
    /// the payload back; the queue is left untouched.
    pub fn push(&self, payload: T, policy: Policy) -> Result<(), PushError<T>> {
        self.push_until(payload, Wait::from_policy(policy))
    }

    pub fn push_default(&self, payload: T) -> Result<(), PushError<T>> {
        self.push(payload, self.default_policy)
    }

    /// Blocking push that gives up once `timeout` has elapsed.
    pub fn push_timeout(&self, payload: T, timeout: Duration) -> Result<(), PushError<T>> {
        self.push_until(payload, Wait::for_duration(timeout))
    }

    /// Dequeues the payload at the head, transferring ownership to the caller.
    ///
    /// With [`Policy::Block`] the caller sleeps until a payload arrives. With
    /// [`Policy::NoWait`] an empty queue returns [`PopError::Empty`].
    pub fn pop(&self, policy: Policy) -> Result<T, PopError> {
        self.pop_until(Wait::from_policy(policy))
    }

    pub fn pop_default(&self) -> Result<T, PopError> {
        self.pop(self.default_policy)
    }

    /// Blocking pop that gives up once `timeout` has elapsed.
    pub fn pop_timeout(&self, timeout: Duration) -> Result<T, PopError> {
        self.pop_until(Wait::for_duration(timeout))
    }

    pub fn is_full(&self) -> bool {
        self.lock().is_full()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of resident payloads at the moment of the call.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Occupancy snapshot. May be stale as soon as it returns.
    pub fn status(&self) -> QueueStatus {
        let ring = self.lock();
        if ring.is_full() {
            QueueStatus::Full
        } else if ring.is_empty() {
            QueueStatus::Empty
        } else {
            QueueStatus::Normal
        }
    }

    /// Tears the queue down, releasing every payload still resident.
    ///
    /// Taking `self` by value means no other thread can be inside `push` or
    /// `pop` while this runs.
    ///
    /// # Returns
    ///
    /// The number of payloads released.
    pub fn destroy(self) -> usize {
        let Self { name, ring, .. } = self;
        let mut ring = ring.into_inner().unwrap_or_else(PoisonError::into_inner);
        let released = ring.release_resident();
        debug!(queue = %name, released, "queue destroyed");
        released
    }

    fn lock(&self) -> MutexGuard<'_, Ring<T>> {
        // Nothing that can panic runs while the ring is borrowed mutably, so
        // a poisoned lock still guards a consistent ring.
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push_until(&self, payload: T, wait: Wait) -> Result<(), PushError<T>> {
        let mut ring = self.lock();
        let mut payload = payload;
        loop {
            match ring.put(payload) {
                Ok(()) => {
                    drop(ring);
                    self.not_empty.notify_one();
                    return Ok(());
                }
                Err(rejected) => payload = rejected,
            }
            ring = match self.park(&self.not_full, ring, wait) {
                Ok(ring) => ring,
                Err(GiveUp::NotAllowed) => {
                    trace!(queue = %self.name, "push rejected, queue full");
                    return Err(PushError::Full(payload));
                }
                Err(GiveUp::DeadlinePassed) => {
                    trace!(queue = %self.name, "push timed out");
                    return Err(PushError::Timeout(payload));
                }
            };
        }
    }

    fn pop_until(&self, wait: Wait) -> Result<T, PopError> {
        let mut ring = self.lock();
        loop {
            if let Some(item) = ring.take() {
                drop(ring);
                self.not_full.notify_one();
                return Ok(item);
            }
            ring = match self.park(&self.not_empty, ring, wait) {
                Ok(ring) => ring,
                Err(GiveUp::NotAllowed) => {
                    trace!(queue = %self.name, "pop rejected, queue empty");
                    return Err(PopError::Empty);
                }
                Err(GiveUp::DeadlinePassed) => {
                    trace!(queue = %self.name, "pop timed out");
                    return Err(PopError::Timeout);
                }
            };
        }
    }

    /// Sleeps on `cond` once. The caller re-checks the ring afterwards.
    fn park<'a>(
        &self,
        cond: &Condvar,
        ring: MutexGuard<'a, Ring<T>>,
        wait: Wait,
    ) -> Result<MutexGuard<'a, Ring<T>>, GiveUp> {
        match wait {
            Wait::Never => Err(GiveUp::NotAllowed),
            Wait::Forever => Ok(cond.wait(ring).unwrap_or_else(PoisonError::into_inner)),
            Wait::Until(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(GiveUp::DeadlinePassed);
                }
                let (ring, _) = cond
                    .wait_timeout(ring, deadline - now)
                    .unwrap_or_else(PoisonError::into_inner);
                Ok(ring)
            }
        }
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ring = self.lock();
        f.debug_struct("BoundedQueue")
            .field("name", &self.name)
            .field("capacity", &ring.capacity())
            .field("len", &ring.len())
            .field("default_policy", &self.default_policy)
            .finish()
    }
}
