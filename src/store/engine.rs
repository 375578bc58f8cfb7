//! Item Store Engine Module
//!
//! Authoritative in-memory mapping from key to stored item. Every mutating
//! method is one atomic step: the adapter serializes calls through a single
//! lock, so each `&mut self` method here reads current metadata, decides,
//! applies and bumps the CAS version without any other caller observing an
//! intermediate state. Counters in particular are never decomposed into a
//! read call followed by a write call.
//!
//! Expired items are lazily evicted: any access that finds an item past its
//! expiry removes it and proceeds as if the key were absent. This keeps
//! memory bounded without requiring a sweep thread; a periodic sweep can be
//! layered on top via [`purge_expired`](ItemStore::purge_expired).

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use crate::store::{ItemMetadata, StoreStats, StoredItem};

// == Item Store ==
/// In-memory item store with TTL expiry and CAS versioning.
#[derive(Debug, Default)]
pub struct ItemStore {
    /// Key-item storage
    items: HashMap<String, StoredItem>,
    /// Performance statistics
    stats: StoreStats,
}

impl ItemStore {
    // == Constructor ==
    /// Creates an empty item store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Lazy Eviction ==
    /// Removes the item if its TTL has elapsed. Called at the start of
    /// every keyed access so expired items are observably absent.
    fn evict_if_expired(&mut self, key: &str) {
        let now = Utc::now();
        let expired = self
            .items
            .get(key)
            .map(|item| item.is_expired(now))
            .unwrap_or(false);

        if expired {
            self.items.remove(key);
            self.stats.record_expiration();
            self.stats.set_total_items(self.items.len());
            debug!("Lazily evicted expired item: {}", key);
        }
    }

    // == Get ==
    /// Retrieves the value and current CAS version for a key.
    ///
    /// Returns None if the key is absent or expired.
    pub fn get(&mut self, key: &str) -> Option<(Value, u64)> {
        self.evict_if_expired(key);

        match self.items.get(key) {
            Some(item) => {
                self.stats.record_hit();
                Some((item.value.clone(), item.metadata.cas_version))
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Contains ==
    /// Tests whether a live (non-expired) item exists for the key.
    pub fn contains(&mut self, key: &str) -> bool {
        self.evict_if_expired(key);
        self.items.contains_key(key)
    }

    // == Metadata ==
    /// Returns a snapshot of the item's metadata, or None if absent.
    pub fn metadata(&mut self, key: &str) -> Option<ItemMetadata> {
        self.evict_if_expired(key);
        self.items.get(key).map(|item| item.metadata.clone())
    }

    // == Set ==
    /// Unconditional create-or-overwrite.
    ///
    /// Overwriting mutates the existing item: `created_at` is preserved and
    /// the CAS version is bumped, which invalidates outstanding tokens.
    pub fn set(&mut self, key: &str, value: Value, ttl: Option<Duration>) {
        self.evict_if_expired(key);
        let now = Utc::now();

        match self.items.get_mut(key) {
            Some(item) => item.write(value, now, ttl),
            None => {
                self.items.insert(key.to_string(), StoredItem::new(value, now, ttl));
            }
        }

        self.stats.set_total_items(self.items.len());
    }

    // == Add ==
    /// Stores the value only if no live item exists for the key.
    ///
    /// Returns false on conflict.
    pub fn add(&mut self, key: &str, value: Value, ttl: Option<Duration>) -> bool {
        self.evict_if_expired(key);

        if self.items.contains_key(key) {
            return false;
        }

        let now = Utc::now();
        self.items.insert(key.to_string(), StoredItem::new(value, now, ttl));
        self.stats.set_total_items(self.items.len());
        true
    }

    // == Replace ==
    /// Overwrites the value only if a live item exists for the key.
    ///
    /// Returns false if the key is absent.
    pub fn replace(&mut self, key: &str, value: Value, ttl: Option<Duration>) -> bool {
        self.evict_if_expired(key);

        match self.items.get_mut(key) {
            Some(item) => {
                item.write(value, Utc::now(), ttl);
                true
            }
            None => false,
        }
    }

    // == Check And Set ==
    /// Conditional overwrite: succeeds only if the item's current CAS
    /// version equals `expected_version`.
    ///
    /// Returns false on version mismatch or if the key is absent; the
    /// caller is expected to re-read and retry.
    pub fn check_and_set(
        &mut self,
        expected_version: u64,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> bool {
        self.evict_if_expired(key);

        match self.items.get_mut(key) {
            Some(item) if item.metadata.cas_version == expected_version => {
                item.write(value, Utc::now(), ttl);
                true
            }
            _ => false,
        }
    }

    // == Touch ==
    /// Resets the expiry clock of a live item without modifying its value
    /// or CAS version.
    ///
    /// Returns false if the key is absent or expired.
    pub fn touch(&mut self, key: &str, ttl: Option<Duration>) -> bool {
        self.evict_if_expired(key);

        match self.items.get_mut(key) {
            Some(item) => {
                item.refresh(Utc::now(), ttl);
                true
            }
            None => false,
        }
    }

    // == Remove ==
    /// Removes an item by key.
    ///
    /// Returns false if there was nothing to remove.
    pub fn remove(&mut self, key: &str) -> bool {
        self.evict_if_expired(key);
        let removed = self.items.remove(key).is_some();
        self.stats.set_total_items(self.items.len());
        removed
    }

    // == Adjust ==
    /// Atomically adjusts an integer counter by `delta`, clamping the
    /// result at zero.
    ///
    /// A missing key is created with the clamped delta as its value. An
    /// existing non-integer value cannot be adjusted and yields None.
    pub fn adjust(&mut self, key: &str, delta: i64, ttl: Option<Duration>) -> Option<i64> {
        self.evict_if_expired(key);
        let now = Utc::now();

        match self.items.get_mut(key) {
            Some(item) => {
                let current = item.value.as_i64()?;
                let next = current.saturating_add(delta).max(0);
                item.write(Value::from(next), now, ttl);
                Some(next)
            }
            None => {
                let initial = delta.max(0);
                self.items
                    .insert(key.to_string(), StoredItem::new(Value::from(initial), now, ttl));
                self.stats.set_total_items(self.items.len());
                Some(initial)
            }
        }
    }

    // == Purge Expired ==
    /// Removes all expired items from the store.
    ///
    /// Returns the number of items removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = Utc::now();
        let expired_keys: Vec<String> = self
            .items
            .iter()
            .filter(|(_, item)| item.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in expired_keys {
            self.items.remove(&key);
            self.stats.record_expiration();
        }

        self.stats.set_total_items(self.items.len());
        count
    }

    // == Stats ==
    /// Returns current store statistics.
    pub fn stats(&self) -> StoreStats {
        let mut stats = self.stats.clone();
        stats.set_total_items(self.items.len());
        stats
    }

    // == Length ==
    /// Returns the current number of items, expired stragglers included.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
