//! Store Statistics Module
//!
//! Tracks store performance metrics including hits, misses and expirations.

use serde::Serialize;

// == Store Stats ==
/// Tracks item-store performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    /// Number of successful item retrievals
    pub hits: u64,
    /// Number of failed item retrievals (key absent or expired)
    pub misses: u64,
    /// Number of items removed because their TTL elapsed
    pub expirations: u64,
    /// Current number of live items in the store
    pub total_items: usize,
}

impl StoreStats {
    // == Constructor ==
    /// Creates a new StoreStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the hit rate.
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

    // == Record Expiration ==
    /// Increments the expiration counter.
    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    // == Update Item Count ==
    /// Updates the live item count.
    pub fn set_total_items(&mut self, count: usize) {
        self.total_items = count;
    }
}
