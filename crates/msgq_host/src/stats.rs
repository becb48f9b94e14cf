//! Latency statistics for messages passing through a queue.
//!
//! Tracks how long payloads sit in a queue between push and pop. Keeps min,
//! max, average and a coarse histogram so stream runs can report the shape
//! of the distribution, not just its mean.

const BUCKETS: usize = 20;
const BUCKET_WIDTH_NS: u64 = 10_000;

/// Residence-time statistics with constant-time updates.
///
/// Each consumer thread owns one of these and the host merges them once the
/// run is over, so no synchronization is needed on the hot path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencyStats {
    pub min: u64,
    pub max: u64,
    pub sum: u64,
    pub count: u64,
    pub buckets: [u64; BUCKETS],
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyStats {
    /// Creates an empty tracker.
    ///
    /// `min` starts at `u64::MAX` so the first measurement becomes the
    /// minimum.
    pub fn new() -> Self {
        Self {
            min: u64::MAX,
            max: 0,
            sum: 0,
            count: 0,
            buckets: [0; BUCKETS],
        }
    }

    /// Records one measurement in nanoseconds.
    ///
    /// Buckets are 10 microseconds wide; anything beyond the last bucket is
    /// counted in it.
    ///
    /// # Arguments
    ///
    /// * `nanos` - Time the payload spent queued, in nanoseconds
    pub fn update(&mut self, nanos: u64) {
        self.min = self.min.min(nanos);
        self.max = self.max.max(nanos);
        self.sum += nanos;
        self.count += 1;

        let idx = (nanos / BUCKET_WIDTH_NS).min(BUCKETS as u64 - 1) as usize;
        self.buckets[idx] += 1;
    }

    /// Folds another tracker's measurements into this one.
    pub fn merge(&mut self, other: &Self) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.count += other.count;
        for (mine, theirs) in self.buckets.iter_mut().zip(other.buckets.iter()) {
            *mine += theirs;
        }
    }

    /// Average latency in nanoseconds, or 0.0 before any measurement.
    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }

    /// Prints count, min/avg/max and the non-empty histogram buckets.
    pub fn print_report(&self) {
        println!("\nLatency Metrics (Queue Residence)");
        println!("Count: {}", self.count);
        if self.count == 0 {
            return;
        }

        let avg_ns = self.avg();
        if avg_ns < 1000.0 {
            println!("Min:   {:.2} ns", self.min as f64);
            println!("Avg:   {:.2} ns", avg_ns);
            println!("Max:   {:.2} ns", self.max as f64);
        } else {
            println!("Min:   {:.2} us", self.min as f64 / 1000.0);
            println!("Avg:   {:.2} us", avg_ns / 1000.0);
            println!("Max:   {:.2} us", self.max as f64 / 1000.0);
        }

        println!("Distribution (10us buckets):");
        for (i, &count) in self.buckets.iter().enumerate() {
            if count > 0 {
                let range_end = if i == BUCKETS - 1 { ">" } else { "" };
                let lower = i * 10;
                let upper = (i + 1) * 10;
                println!("[{:3}-{:3}{} us]: {}", lower, upper, range_end, count);
            }
        }
    }
}
