use std::collections::HashSet;
use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use msgq_core::{BoundedQueue, Policy, PopError, QueueRegistry};
use rand::Rng;

const PRODUCERS: usize = 4;
const CONSUMERS: usize = 4;
const PER_PRODUCER: usize = 5_000;

#[test]
fn blocked_pop_wakes_on_push() {
    let queue = Arc::new(BoundedQueue::<&'static str>::new("wake", 4, Policy::Block).unwrap());
    let (tx, rx) = mpsc::channel();

    let consumer = {
        let queue = queue.clone();
        thread::spawn(move || tx.send(queue.pop(Policy::Block)).unwrap())
    };

    thread::sleep(Duration::from_millis(50));
    assert!(rx.try_recv().is_err(), "pop returned before any push");

    queue.push("X", Policy::NoWait).unwrap();
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(Ok("X")));
    consumer.join().unwrap();
}

#[test]
fn blocked_push_wakes_on_pop() {
    let queue = Arc::new(BoundedQueue::new("backpressure", 3, Policy::Block).unwrap());
    queue.push(1, Policy::NoWait).unwrap();
    queue.push(2, Policy::NoWait).unwrap();
    let (tx, rx) = mpsc::channel();

    let producer = {
        let queue = queue.clone();
        thread::spawn(move || tx.send(queue.push(3, Policy::Block).is_ok()).unwrap())
    };

    thread::sleep(Duration::from_millis(50));
    assert!(rx.try_recv().is_err(), "push returned while queue was full");

    assert_eq!(queue.pop(Policy::NoWait), Ok(1));
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(true));
    producer.join().unwrap();

    assert_eq!(queue.pop(Policy::NoWait), Ok(2));
    assert_eq!(queue.pop(Policy::NoWait), Ok(3));
}

/// Rejected NoWait calls return at once, even on a queue whose default
/// policy is Block.
#[test]
fn nowait_never_suspends() {
    const ATTEMPTS: usize = 1_000;
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let queue = BoundedQueue::new("fast", 2, Policy::Block).unwrap();
        let start = Instant::now();
        for _ in 0..ATTEMPTS {
            assert_eq!(queue.pop(Policy::NoWait), Err(PopError::Empty));
        }
        queue.push(0u8, Policy::NoWait).unwrap();
        for _ in 0..ATTEMPTS {
            assert!(queue.push(1u8, Policy::NoWait).unwrap_err().is_full());
        }
        tx.send(start.elapsed()).unwrap();
    });

    let elapsed = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("a NoWait call suspended");
    assert!(
        elapsed < Duration::from_millis(500),
        "{ATTEMPTS} rejected calls each way took {elapsed:?}"
    );
}

/// Every pushed value comes out exactly once, and values from any single
/// producer come out in the order that producer pushed them.
#[test]
fn many_producers_many_consumers() {
    let queue = Arc::new(BoundedQueue::<(usize, usize)>::new("mpmc", 16, Policy::Block).unwrap());
    let start = Arc::new(Barrier::new(PRODUCERS + CONSUMERS));
    let total = PRODUCERS * PER_PRODUCER;

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let queue = queue.clone();
            let start = start.clone();
            thread::spawn(move || {
                start.wait();
                for seq in 0..PER_PRODUCER {
                    queue.push((producer, seq), Policy::Block).unwrap();
                }
            })
        })
        .collect();

    // Each consumer pops a fixed share so the run ends without a stop signal.
    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let queue = queue.clone();
            let start = start.clone();
            thread::spawn(move || {
                start.wait();
                let mut seen = Vec::with_capacity(total / CONSUMERS);
                for _ in 0..total / CONSUMERS {
                    seen.push(queue.pop(Policy::Block).unwrap());
                }
                seen
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }

    let mut delivered = HashSet::with_capacity(total);
    for consumer in consumers {
        let seen = consumer.join().unwrap();
        let mut last = vec![None; PRODUCERS];
        for (producer, seq) in seen {
            assert!(delivered.insert((producer, seq)), "duplicate delivery");
            if let Some(prev) = last[producer] {
                assert!(seq > prev, "producer {producer} reordered");
            }
            last[producer] = Some(seq);
        }
    }

    assert_eq!(delivered.len(), total);
    assert!(queue.is_empty());
}

#[test]
fn random_interleaving_keeps_fifo() {
    let mut rng = rand::thread_rng();
    let queue = BoundedQueue::new("random", 7, Policy::NoWait).unwrap();
    let mut next_in = 0u32;
    let mut next_out = 0u32;

    for _ in 0..10_000 {
        if rng.gen_bool(0.5) {
            match queue.push(next_in, Policy::NoWait) {
                Ok(()) => next_in += 1,
                Err(err) => {
                    assert_eq!(queue.len(), 6);
                    assert_eq!(err.into_inner(), next_in);
                }
            }
        } else {
            match queue.pop(Policy::NoWait) {
                Ok(value) => {
                    assert_eq!(value, next_out);
                    next_out += 1;
                }
                Err(PopError::Empty) => assert_eq!(next_in, next_out),
                Err(other) => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(queue.len(), (next_in - next_out) as usize);
    }
}

#[test]
fn timed_pop_receives_late_push() {
    let queue = Arc::new(BoundedQueue::new("late", 4, Policy::Block).unwrap());
    let producer = {
        let queue = queue.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            queue.push(42, Policy::Block).unwrap();
        })
    };
    assert_eq!(queue.pop_timeout(Duration::from_secs(5)), Ok(42));
    producer.join().unwrap();
}

#[test]
fn registry_handles_cross_threads() {
    let registry = Arc::new(QueueRegistry::<String>::new());
    registry.create("inbox", 8, Policy::Block).unwrap();

    let sender = {
        let registry = registry.clone();
        thread::spawn(move || {
            let inbox = registry.get("inbox").unwrap();
            for i in 0..20 {
                inbox.push_default(format!("msg-{i}")).unwrap();
            }
        })
    };

    let inbox = registry.get("inbox").unwrap();
    for i in 0..20 {
        assert_eq!(inbox.pop_default().unwrap(), format!("msg-{i}"));
    }
    sender.join().unwrap();
    drop(inbox);
    assert_eq!(registry.destroy("inbox"), Ok(0));
}
