use crate::stats::LatencyStats;
use anyhow::{Context, Result, anyhow};
use msgq_core::{BoundedQueue, Policy, PopError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// How long an idle consumer waits before re-checking the stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Stream payload: just the moment it was pushed.
#[derive(Debug)]
pub struct Stamped {
    pub sent_at: Instant,
}

#[derive(Default)]
pub struct StreamStats {
    pub processed: AtomicU64,
    pub generated: AtomicU64,
    pub dropped: AtomicU64,
    pub latency_us: AtomicU64,
}

pub struct StreamConfig {
    pub capacity: usize,
    pub max_capacity: usize,
    pub producers: usize,
    pub consumers: usize,
    pub rate: u64,
    pub duration_secs: u64,
}

/// Final counters of a stream run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    pub generated: u64,
    pub processed: u64,
    pub dropped: u64,
    pub released: usize,
}

/// Runs producers and consumers for `duration_secs`, then stops them and
/// destroys the queue.
///
/// Every accepted push is either processed by a consumer or released by the
/// final destroy.
pub fn run_stream(config: &StreamConfig) -> Result<StreamSummary> {
    println!("QUEUE STREAMING");
    println!("Capacity: {}", config.capacity);
    println!("Producers: {} @ {} Hz", config.producers, config.rate);
    println!("Consumers: {}", config.consumers);
    println!("Duration: {} s", config.duration_secs);
    println!("-------------------------------");

    let limits = msgq_core::QueueConfig::default().with_max_capacity(config.max_capacity);
    let queue = Arc::new(BoundedQueue::<Stamped>::with_config(
        "stream",
        config.capacity,
        Policy::NoWait,
        &limits,
    )?);
    let running = Arc::new(AtomicBool::new(true));
    let stats = Arc::new(StreamStats::default());

    let consumers: Vec<_> = (0..config.consumers)
        .map(|id| {
            let queue = queue.clone();
            let running = running.clone();
            let stats = stats.clone();
            thread::Builder::new()
                .name(format!("consumer-{id}"))
                .spawn(move || {
                    let mut lat_stats = LatencyStats::new();
                    loop {
                        match queue.pop_timeout(POLL_INTERVAL) {
                            Ok(packet) => {
                                let lat_ns = packet.sent_at.elapsed().as_nanos() as u64;
                                stats.processed.fetch_add(1, Ordering::Relaxed);
                                stats.latency_us.store(lat_ns / 1000, Ordering::Relaxed);
                                lat_stats.update(lat_ns);
                            }
                            Err(PopError::Timeout) if !running.load(Ordering::Relaxed) => break,
                            Err(_) => {}
                        }
                    }
                    debug!(consumer = id, received = lat_stats.count, "consumer stopped");
                    lat_stats
                })
        })
        .collect::<std::io::Result<_>>()
        .context("Failed to spawn consumer")?;

    let interval = Duration::from_micros(1_000_000 / config.rate.max(1));
    let producers: Vec<_> = (0..config.producers)
        .map(|id| {
            let queue = queue.clone();
            let running = running.clone();
            let stats = stats.clone();
            thread::Builder::new()
                .name(format!("producer-{id}"))
                .spawn(move || {
                    let mut next_send = Instant::now();
                    while running.load(Ordering::Relaxed) {
                        let packet = Stamped {
                            sent_at: Instant::now(),
                        };
                        match queue.push(packet, Policy::NoWait) {
                            Ok(()) => {
                                stats.generated.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(_) => {
                                stats.dropped.fetch_add(1, Ordering::Relaxed);
                            }
                        }

                        next_send += interval;
                        if let Some(wait) = next_send.checked_duration_since(Instant::now()) {
                            thread::sleep(wait);
                        }
                    }
                })
        })
        .collect::<std::io::Result<_>>()
        .context("Failed to spawn producer")?;

    let start_time = Instant::now();
    let mut last_processed = 0;

    while start_time.elapsed().as_secs() < config.duration_secs {
        thread::sleep(Duration::from_secs(1));
        let proc = stats.processed.load(Ordering::Relaxed);
        let r#gen = stats.generated.load(Ordering::Relaxed);
        let drop = stats.dropped.load(Ordering::Relaxed);
        let lat = stats.latency_us.load(Ordering::Relaxed);

        let tput = proc - last_processed;
        last_processed = proc;

        println!(
            "T={:2}s | Gen: {:8} | Proc: {:8} ({:5}/s) | Drop: {:5} | Depth: {:4} | Latency: {:3} us",
            start_time.elapsed().as_secs(),
            r#gen,
            proc,
            tput,
            drop,
            queue.len(),
            lat
        );
    }

    running.store(false, Ordering::Relaxed);
    for producer in producers {
        producer
            .join()
            .map_err(|_| anyhow!("producer thread panicked"))?;
    }

    let mut lat_stats = LatencyStats::new();
    for consumer in consumers {
        let local = consumer
            .join()
            .map_err(|_| anyhow!("consumer thread panicked"))?;
        lat_stats.merge(&local);
    }
    lat_stats.print_report();

    let queue = Arc::try_unwrap(queue).map_err(|_| anyhow!("stream queue still shared"))?;
    let released = queue.destroy();
    info!(released, "stream queue destroyed");
    println!("Done. {} undelivered messages released.", released);
    Ok(StreamSummary {
        generated: stats.generated.load(Ordering::Relaxed),
        processed: stats.processed.load(Ordering::Relaxed),
        dropped: stats.dropped.load(Ordering::Relaxed),
        released,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(capacity: usize, producers: usize, consumers: usize) -> StreamConfig {
        StreamConfig {
            capacity,
            max_capacity: 512,
            producers,
            consumers,
            rate: 1_000,
            duration_secs: 1,
        }
    }

    #[test]
    fn short_run_accounts_for_every_accepted_push() {
        let summary = run_stream(&config(16, 2, 2)).unwrap();
        assert!(summary.generated > 0);
        assert_eq!(
            summary.processed + summary.released as u64,
            summary.generated
        );
    }

    #[test]
    fn without_consumers_the_queue_fills_and_is_released() {
        let summary = run_stream(&config(8, 2, 0)).unwrap();
        assert_eq!(summary.generated, 7);
        assert_eq!(summary.processed, 0);
        assert_eq!(summary.released, 7);
        assert!(summary.dropped > 0);
    }

    #[test]
    fn rejects_oversized_queue() {
        let mut config = config(1_024, 1, 1);
        config.max_capacity = 512;
        assert!(run_stream(&config).is_err());
    }
}
