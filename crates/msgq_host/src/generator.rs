//! Message script generator.
//!
//! Produces scripts for `demo --script` with a configurable share of
//! non-blocking pushes, so the demo exercises both the waiting and the
//! rejecting paths of a small queue.

use anyhow::Result;
use msgq_common::limits::MAX_BODY_LEN;
use msgq_common::message::Message;
use msgq_core::Policy;
use msgq_io::loader;
use msgq_io::parser::ScriptEntry;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const WORDS: &[&str] = &[
    "hello", "world", "queue", "slot", "ring", "producer", "consumer", "wake", "block", "byebye",
];

/// Builds `count` script entries from a seeded generator.
///
/// # Arguments
///
/// * `count` - Number of entries
/// * `nowait_ratio` - Probability in `[0, 1]` that an entry uses `nowait`
/// * `seed` - Seed for reproducible output
pub fn generate_entries(count: usize, nowait_ratio: f64, seed: u64) -> Result<Vec<ScriptEntry>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let nowait_ratio = nowait_ratio.clamp(0.0, 1.0);

    (0..count)
        .map(|i| -> Result<ScriptEntry> {
            let mut body = format!("#{i}");
            let words = rng.gen_range(1..=4);
            for _ in 0..words {
                let word = WORDS.choose(&mut rng).copied().unwrap_or("msg");
                if body.len() + 1 + word.len() > MAX_BODY_LEN {
                    break;
                }
                body.push(' ');
                body.push_str(word);
            }

            let policy = if rng.gen_bool(nowait_ratio) {
                Policy::NoWait
            } else {
                Policy::Block
            };
            let message = Message::new(rng.gen_range(1..=4), body)?;
            Ok(ScriptEntry { policy, message })
        })
        .collect()
}

/// Generates a script and writes it to `out_path`.
pub fn generate_script(out_path: &str, count: usize, nowait_ratio: f64, seed: u64) -> Result<()> {
    println!(
        "Generating {} messages (nowait ratio {}, seed {})...",
        count, nowait_ratio, seed
    );
    let entries = generate_entries(count, nowait_ratio, seed)?;
    loader::save_script(out_path, &entries)?;
    println!("Wrote {}.", out_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_script() {
        let a = generate_entries(50, 0.3, 7).unwrap();
        let b = generate_entries(50, 0.3, 7).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 50);
        assert!(a.iter().all(|e| e.message.body().len() <= MAX_BODY_LEN));
    }

    #[test]
    fn ratio_extremes() {
        let all_block = generate_entries(20, 0.0, 1).unwrap();
        assert!(all_block.iter().all(|e| e.policy == Policy::Block));
        let all_nowait = generate_entries(20, 1.0, 1).unwrap();
        assert!(all_nowait.iter().all(|e| e.policy == Policy::NoWait));
    }
}
