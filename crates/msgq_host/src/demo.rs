//! Two-thread sender/receiver demo.
//!
//! A sender thread pushes a short list of messages, each with its own policy.
//! The receiver pops once with `Block` and once with `NoWait`, then keeps
//! draining until the sender has finished, so a `Block` push never outlives
//! its consumer. Anything still resident is released when the queue is
//! destroyed.

use anyhow::{Context, Result, anyhow, bail};
use msgq_common::limits::DEMO_QUEUE_NAME;
use msgq_common::message::Message;
use msgq_core::{BoundedQueue, Policy, PopError};
use msgq_io::loader;
use msgq_io::parser::ScriptEntry;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

const DRAIN_POLL: Duration = Duration::from_millis(10);

pub struct DemoConfig {
    pub capacity: usize,
    pub script: Option<String>,
}

/// Outcome of a demo run, for reporting and tests.
#[derive(Debug, PartialEq, Eq)]
pub struct DemoSummary {
    pub sent: usize,
    pub rejected: usize,
    pub received: Vec<Message>,
    /// The receiver's `NoWait` pop found the queue empty.
    pub reported_empty: bool,
    pub released: usize,
}

/// The sender's default messages: one blocking push, one that must not wait.
pub fn default_entries() -> Result<Vec<ScriptEntry>> {
    Ok(vec![
        ScriptEntry {
            policy: Policy::Block,
            message: Message::new(1, "hello, world!")?,
        },
        ScriptEntry {
            policy: Policy::NoWait,
            message: Message::new(2, "byebye")?,
        },
    ])
}

pub fn run_demo(config: &DemoConfig) -> Result<()> {
    let entries = match &config.script {
        Some(path) => loader::load_script(path)?,
        None => default_entries()?,
    };

    let summary = exchange(config.capacity, entries)?;

    println!("-------------------------------");
    println!("Sent: {} | Rejected: {}", summary.sent, summary.rejected);
    println!("Received: {}", summary.received.len());
    println!("Released on destroy: {}", summary.released);
    Ok(())
}

/// Runs one sender and one receiver against a fresh queue, then destroys it.
///
/// The first push always lands in an empty queue, so the receiver's opening
/// `Block` pop is guaranteed a message.
pub fn exchange(capacity: usize, entries: Vec<ScriptEntry>) -> Result<DemoSummary> {
    if capacity < 2 {
        bail!("Demo needs a capacity of at least 2 (got {capacity})");
    }
    if entries.is_empty() {
        bail!("Demo needs at least one message to send");
    }

    let queue = Arc::new(BoundedQueue::<Box<Message>>::new(
        DEMO_QUEUE_NAME,
        capacity,
        Policy::Block,
    )?);
    let sender_done = Arc::new(AtomicBool::new(false));

    let sender = {
        let queue = queue.clone();
        let sender_done = sender_done.clone();
        thread::Builder::new()
            .name("sender".into())
            .spawn(move || {
                let mut sent = 0;
                let mut rejected = 0;
                for entry in entries {
                    println!("send {:?}: {}", entry.policy, entry.message);
                    match queue.push(Box::new(entry.message), entry.policy) {
                        Ok(()) => sent += 1,
                        Err(err) => {
                            warn!(queue = queue.name(), %err, "push failed");
                            rejected += 1;
                        }
                    }
                }
                sender_done.store(true, Ordering::Release);
                (sent, rejected)
            })
            .context("Failed to spawn sender")?
    };

    let receiver = {
        let queue = queue.clone();
        thread::Builder::new()
            .name("receiver".into())
            .spawn(move || {
                let mut received = Vec::new();
                let mut reported_empty = false;
                let mut deliver = |message: Box<Message>| {
                    println!("recv: {}", message);
                    received.push(*message);
                };

                match queue.pop(Policy::Block) {
                    Ok(message) => deliver(message),
                    Err(err) => warn!(queue = queue.name(), %err, "blocking pop failed"),
                }
                match queue.pop(Policy::NoWait) {
                    Ok(message) => deliver(message),
                    Err(PopError::Empty) => {
                        println!("recv: queue is empty");
                        reported_empty = true;
                    }
                    Err(err) => warn!(queue = queue.name(), %err, "non-blocking pop failed"),
                }

                loop {
                    match queue.pop_timeout(DRAIN_POLL) {
                        Ok(message) => deliver(message),
                        Err(_) if sender_done.load(Ordering::Acquire) => break,
                        Err(_) => {}
                    }
                }
                // Pushes that finished before the flag was raised are visible now.
                while let Ok(message) = queue.pop(Policy::NoWait) {
                    deliver(message);
                }
                debug!(queue = queue.name(), "receiver drained");
                (received, reported_empty)
            })
            .context("Failed to spawn receiver")?
    };

    let (sent, rejected) = sender
        .join()
        .map_err(|_| anyhow!("sender thread panicked"))?;
    let (received, reported_empty) = receiver
        .join()
        .map_err(|_| anyhow!("receiver thread panicked"))?;

    let queue = Arc::try_unwrap(queue).map_err(|_| anyhow!("demo queue still shared"))?;
    let released = queue.destroy();

    Ok(DemoSummary {
        sent,
        rejected,
        received,
        reported_empty,
        released,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn entries(policy: Policy, count: usize) -> Vec<ScriptEntry> {
        (0..count)
            .map(|i| ScriptEntry {
                policy,
                message: Message::new(i as i32, format!("m{i}")).unwrap(),
            })
            .collect()
    }

    /// Runs `exchange` on a helper thread so a hang fails the test instead
    /// of stalling the whole run.
    fn exchange_within(
        capacity: usize,
        entries: Vec<ScriptEntry>,
        limit: Duration,
    ) -> Result<DemoSummary> {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(exchange(capacity, entries));
        });
        rx.recv_timeout(limit).expect("demo exchange did not finish")
    }

    #[test]
    fn default_exchange_delivers_both_messages() {
        let summary = exchange_within(4, default_entries().unwrap(), Duration::from_secs(5)).unwrap();
        assert_eq!(summary.sent, 2);
        assert_eq!(summary.rejected, 0);
        assert_eq!(summary.received.len(), 2);
        assert_eq!(summary.received[0].body(), "hello, world!");
        assert_eq!(summary.received[1].msg_type, 2);
        assert_eq!(summary.released, 0);
    }

    #[test]
    fn more_blocking_sends_than_slots_still_finish() {
        let script = entries(Policy::Block, 10);
        let expected: Vec<Message> = script.iter().map(|e| e.message.clone()).collect();

        let summary = exchange_within(4, script, Duration::from_secs(5)).unwrap();
        assert_eq!(summary.sent, 10);
        assert_eq!(summary.rejected, 0);
        assert_eq!(summary.received, expected);
        assert_eq!(summary.released, 0);
    }

    #[test]
    fn generated_script_runs_to_completion() {
        let script = crate::generator::generate_entries(16, 0.25, 12345).unwrap();
        let count = script.len();

        let summary = exchange_within(4, script, Duration::from_secs(5)).unwrap();
        assert_eq!(summary.sent + summary.rejected, count);
        assert_eq!(summary.received.len() + summary.released, summary.sent);
    }

    #[test]
    fn nowait_pop_reports_empty_queue() {
        let summary = exchange_within(2, entries(Policy::Block, 1), Duration::from_secs(5)).unwrap();
        assert_eq!(summary.received.len(), 1);
        assert!(summary.reported_empty);
    }

    #[test]
    fn rejects_single_slot_queue_and_empty_script() {
        let err = exchange(1, entries(Policy::Block, 3)).unwrap_err();
        assert!(err.to_string().contains("capacity"));
        assert!(exchange(4, Vec::new()).is_err());
    }
}
