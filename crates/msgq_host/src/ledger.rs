//! Exactly-once delivery accounting for benchmark runs.
//!
//! Every message in a bench run is identified by `(producer, seq)`. The
//! ledger keeps one bit per identifier and flags a second delivery of the
//! same identifier as a duplicate.

use anyhow::{Result, bail};
use bitvec::prelude::*;

pub struct DeliveryLedger {
    producers: usize,
    per_producer: usize,
    delivered: BitVec<u64, Lsb0>,
}

impl DeliveryLedger {
    pub fn new(producers: usize, per_producer: usize) -> Self {
        Self {
            producers,
            per_producer,
            delivered: bitvec![u64, Lsb0; 0; producers * per_producer],
        }
    }

    /// Marks `(producer, seq)` as delivered.
    ///
    /// Fails if the identifier is out of range or was already delivered.
    pub fn record(&mut self, producer: usize, seq: usize) -> Result<()> {
        if producer >= self.producers || seq >= self.per_producer {
            bail!("message ({producer}, {seq}) was never produced");
        }
        let idx = producer * self.per_producer + seq;
        if self.delivered.replace(idx, true) {
            bail!("message ({producer}, {seq}) delivered twice");
        }
        Ok(())
    }

    pub fn delivered(&self) -> usize {
        self.delivered.count_ones()
    }

    pub fn missing(&self) -> usize {
        self.delivered.count_zeros()
    }
}
