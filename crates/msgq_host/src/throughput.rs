use crate::ledger::DeliveryLedger;
use anyhow::{Context, Result, anyhow, bail};
use msgq_core::{BoundedQueue, Policy, QueueConfig};
use rayon::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How long a consumer waits for its next message before reporting a stall.
const STALL_TIMEOUT: Duration = Duration::from_secs(5);

pub struct BenchConfig {
    pub capacity: usize,
    pub max_capacity: usize,
    pub messages: usize,
    pub producers: usize,
    pub consumers: usize,
}

/// What one consumer saw: deliveries in pop order, plus reorder count.
struct ConsumerReport {
    received: Vec<(usize, usize)>,
    reordered: usize,
}

pub fn run_benchmark(config: &BenchConfig) -> Result<()> {
    if config.producers == 0 || config.consumers == 0 {
        bail!("bench needs at least one producer and one consumer");
    }
    if config.capacity < 2 {
        bail!("a queue with {} slot(s) can never hold a message", config.capacity);
    }
    let per_producer = config.messages / config.producers;
    let total = per_producer * config.producers;

    let limits = QueueConfig::default().with_max_capacity(config.max_capacity);
    let queue = Arc::new(BoundedQueue::<(usize, usize)>::with_config(
        "bench",
        config.capacity,
        Policy::Block,
        &limits,
    )?);

    println!(
        "Pushing {} messages ({} producers x {}) through {} slots to {} consumers...",
        total, config.producers, per_producer, config.capacity, config.consumers
    );
    let start_bench = Instant::now();

    let consumers: Vec<_> = consumer_shares(total, config.consumers)
        .into_iter()
        .enumerate()
        .map(|(id, share)| {
            let queue = queue.clone();
            thread::Builder::new()
                .name(format!("bench-consumer-{id}"))
                .spawn(move || consume(&queue, share, STALL_TIMEOUT))
        })
        .collect::<std::io::Result<_>>()
        .context("Failed to spawn consumer")?;

    (0..config.producers).into_par_iter().for_each(|producer| {
        for seq in 0..per_producer {
            if let Err(err) = queue.push((producer, seq), Policy::Block) {
                warn!(producer, seq, %err, "bench message not enqueued");
            }
        }
        debug!(producer, "producer finished");
    });

    let mut ledger = DeliveryLedger::new(config.producers, per_producer);
    let mut reordered = 0;
    for consumer in consumers {
        let report = consumer
            .join()
            .map_err(|_| anyhow!("consumer thread panicked"))?;
        reordered += report.reordered;
        for (producer, seq) in report.received {
            ledger.record(producer, seq)?;
        }
    }

    let duration = start_bench.elapsed();
    let seconds = duration.as_secs_f64();
    let throughput = total as f64 / seconds;

    println!("Results");
    println!("Time: {:.4} s", seconds);
    println!("Throughput: {:.2} msgs/s", throughput);
    println!("Delivered: {}/{}", ledger.delivered(), total);
    println!("Reordered: {}", reordered);

    if ledger.missing() > 0 {
        bail!("{} messages were lost", ledger.missing());
    }
    if reordered > 0 {
        bail!("{} messages arrived out of producer order", reordered);
    }
    Ok(())
}

/// Splits `total` messages over `consumers`, spreading the remainder over
/// the first ones.
fn consumer_shares(total: usize, consumers: usize) -> Vec<usize> {
    (0..consumers)
        .map(|id| total / consumers + usize::from(id < total % consumers))
        .collect()
}

fn consume(queue: &BoundedQueue<(usize, usize)>, share: usize, stall: Duration) -> ConsumerReport {
    let mut received = Vec::with_capacity(share);
    let mut last_seq: Vec<Option<usize>> = Vec::new();
    let mut reordered = 0;

    for _ in 0..share {
        let (producer, seq) = match queue.pop_timeout(stall) {
            Ok(item) => item,
            Err(err) => {
                warn!(%err, received = received.len(), share, "consumer stalled");
                break;
            }
        };
        if producer >= last_seq.len() {
            last_seq.resize(producer + 1, None);
        }
        if last_seq[producer].is_some_and(|prev| seq <= prev) {
            reordered += 1;
        }
        last_seq[producer] = Some(seq);
        received.push((producer, seq));
    }

    ConsumerReport {
        received,
        reordered,
    }
}
