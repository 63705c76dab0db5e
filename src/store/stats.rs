//! Store Statistics Module
//!
//! Tracks store activity: hits, misses, invalidations, and cancellations.

use serde::Serialize;

// == Store Stats ==
/// Counters describing store activity since construction.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    /// Number of reads that found a live entry
    pub hits: u64,
    /// Number of reads that found nothing
    pub misses: u64,
    /// Number of entries marked stale by invalidation
    pub invalidations: u64,
    /// Number of in-flight reads cancelled
    pub cancellations: u64,
    /// Number of entries removed by garbage collection
    pub swept: u64,
    /// Current number of entries in the store
    pub total_entries: usize,
    /// When this snapshot was taken (RFC 3339)
    pub captured_at: String,
}

impl StoreStats {
    // == Constructor ==
    /// Creates a new StoreStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the read hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Invalidation ==
    /// Increments the invalidation counter by the number of entries marked.
    pub fn record_invalidations(&mut self, count: u64) {
        self.invalidations += count;
    }

    // == Record Cancellation ==
    /// Increments the cancellation counter.
    pub fn record_cancellation(&mut self) {
        self.cancellations += 1;
    }

    // == Record Sweep ==
    /// Increments the sweep counter by the number of entries removed.
    pub fn record_swept(&mut self, count: u64) {
        self.swept += count;
    }

    // == Update Entry Count ==
    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
