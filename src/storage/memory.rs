//! In-Memory Storage Adapter
//!
//! Reference implementation of the [`Storage`] contract over the in-process
//! [`ItemStore`]. The adapter owns an `Arc<Mutex<ItemStore>>`; cloning it
//! yields a cheap handle onto the same store, which is how multiple threads
//! share one cache instance. Every engine call happens inside one lock
//! acquisition, which makes each single-key operation atomic relative to
//! concurrent callers.
//!
//! The adapter enforces everything the engine does not know about: the
//! readable/writable flags, key validation (length and pattern), the
//! namespace prefix, the default TTL, and capability gating.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;
use tracing::warn;

use crate::capabilities::Capabilities;
use crate::error::{Result, StorageError};
use crate::options::AdapterOptions;
use crate::storage::{CasToken, Storage};
use crate::store::{ItemMetadata, ItemStore, StoreStats};

// == Public Constants ==
/// Maximum key length in bytes accepted by the in-memory adapter.
pub const MAX_KEY_LENGTH: usize = 256;

// == Memory Storage ==
/// In-memory storage adapter with TTL, CAS and atomic counters.
///
/// Cloning shares the underlying item store; options and capabilities are
/// per-handle snapshots.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    /// Shared item store; the lock is the linearization point
    store: Arc<Mutex<ItemStore>>,
    /// Adapter configuration
    options: AdapterOptions,
    /// Immutable feature descriptor
    capabilities: Capabilities,
}

impl MemoryStorage {
    // == Constructors ==
    /// Creates an adapter over a fresh item store with the full in-memory
    /// feature set (TTL and CAS supported).
    pub fn new(options: AdapterOptions) -> Self {
        Self::with_capabilities(options, Self::default_capabilities())
    }

    /// Creates an adapter with an explicit capability descriptor.
    ///
    /// Mostly useful for exercising capability gating: an adapter declared
    /// without CAS support will reject `check_and_set_item` with
    /// [`StorageError::Unsupported`].
    pub fn with_capabilities(options: AdapterOptions, capabilities: Capabilities) -> Self {
        Self {
            store: Arc::new(Mutex::new(ItemStore::new())),
            options,
            capabilities,
        }
    }

    /// The capability set of the in-memory backend.
    fn default_capabilities() -> Capabilities {
        Capabilities {
            supports_ttl: true,
            supports_cas: true,
            static_values: false,
            supports_tags: false,
            min_ttl: None,
            max_ttl: None,
            max_key_length: Some(MAX_KEY_LENGTH),
            namespace_separator: ":".to_string(),
        }
    }

    // == Maintenance ==
    /// Removes all expired items from the underlying store.
    ///
    /// Lazy eviction on access already keeps expired items observably
    /// absent; this purge reclaims stragglers that are never read again.
    /// Returns the number of items removed.
    pub fn purge_expired(&self) -> Result<usize> {
        Ok(self.lock()?.purge_expired())
    }

    /// Returns current statistics of the underlying store.
    pub fn stats(&self) -> Result<StoreStats> {
        Ok(self.lock()?.stats())
    }

    // == Internals ==
    /// Acquires the store lock, surfacing poisoning as a backend failure.
    fn lock(&self) -> Result<MutexGuard<'_, ItemStore>> {
        self.store
            .lock()
            .map_err(|_| StorageError::Backend("item store lock poisoned".to_string()))
    }

    /// Maps a caller key to its namespaced form.
    fn canonical_key(&self, key: &str) -> String {
        if self.options.namespace.is_empty() {
            key.to_string()
        } else {
            format!(
                "{}{}{}",
                self.options.namespace, self.capabilities.namespace_separator, key
            )
        }
    }

    /// Validates a caller key against the adapter's limits and pattern.
    fn validate_key(&self, key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(StorageError::invalid_key(key, "key must not be empty"));
        }
        if let Some(max) = self.capabilities.max_key_length {
            if key.len() > max {
                return Err(StorageError::invalid_key(
                    key,
                    format!("key exceeds maximum length of {} bytes", max),
                ));
            }
        }
        if let Some(pattern) = &self.options.key_pattern {
            if !pattern.is_match(key) {
                return Err(StorageError::invalid_key(
                    key,
                    format!("key does not match pattern {}", pattern),
                ));
            }
        }
        Ok(())
    }

    /// TTL applied to writes and touches: the configured default, or none
    /// when the backend does not support expiry.
    fn effective_ttl(&self) -> Option<Duration> {
        if self.capabilities.supports_ttl {
            self.options.default_ttl
        } else {
            None
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new(AdapterOptions::default())
    }
}

impl Storage for MemoryStorage {
    // == Configuration ==
    fn set_options(&mut self, options: AdapterOptions) {
        self.options = options;
    }

    fn options(&self) -> &AdapterOptions {
        &self.options
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    // == Reading ==
    fn get_item(&self, key: &str) -> Result<Option<(Value, CasToken)>> {
        if !self.options.readable {
            return Ok(None);
        }
        self.validate_key(key)?;

        let canonical = self.canonical_key(key);
        let mut store = self.lock()?;
        Ok(store
            .get(&canonical)
            .map(|(value, version)| (value, CasToken::new(canonical, version))))
    }

    fn get_items(&self, keys: &[&str]) -> Result<HashMap<String, Value>> {
        let mut found = HashMap::new();
        for key in keys {
            if let Some((value, _)) = self.get_item(key)? {
                found.insert(key.to_string(), value);
            }
        }
        Ok(found)
    }

    fn has_item(&self, key: &str) -> Result<bool> {
        if !self.options.readable {
            return Ok(false);
        }
        self.validate_key(key)?;

        let canonical = self.canonical_key(key);
        Ok(self.lock()?.contains(&canonical))
    }

    fn has_items(&self, keys: &[&str]) -> Result<Vec<String>> {
        let mut found = Vec::new();
        for key in keys {
            if self.has_item(key)? {
                found.push(key.to_string());
            }
        }
        Ok(found)
    }

    fn get_metadata(&self, key: &str) -> Result<Option<ItemMetadata>> {
        if !self.options.readable {
            return Ok(None);
        }
        self.validate_key(key)?;

        let canonical = self.canonical_key(key);
        Ok(self.lock()?.metadata(&canonical))
    }

    fn get_metadatas(&self, keys: &[&str]) -> Result<HashMap<String, ItemMetadata>> {
        let mut found = HashMap::new();
        for key in keys {
            if let Some(metadata) = self.get_metadata(key)? {
                found.insert(key.to_string(), metadata);
            }
        }
        Ok(found)
    }

    // == Writing ==
    fn set_item(&self, key: &str, value: Value) -> Result<bool> {
        if !self.options.writable {
            return Ok(false);
        }
        self.validate_key(key)?;

        let canonical = self.canonical_key(key);
        let ttl = self.effective_ttl();
        self.lock()?.set(&canonical, value, ttl);
        Ok(true)
    }

    fn set_items(&self, pairs: &[(&str, Value)]) -> Result<Vec<String>> {
        let mut failed = Vec::new();
        for (key, value) in pairs {
            match self.set_item(key, value.clone()) {
                Ok(true) => {}
                Ok(false) => failed.push(key.to_string()),
                Err(err) => {
                    warn!("set_items: failed to store {:?}: {}", key, err);
                    failed.push(key.to_string());
                }
            }
        }
        Ok(failed)
    }

    fn add_item(&self, key: &str, value: Value) -> Result<bool> {
        if !self.options.writable {
            return Ok(false);
        }
        self.validate_key(key)?;

        let canonical = self.canonical_key(key);
        let ttl = self.effective_ttl();
        Ok(self.lock()?.add(&canonical, value, ttl))
    }

    fn add_items(&self, pairs: &[(&str, Value)]) -> Result<Vec<String>> {
        let mut failed = Vec::new();
        for (key, value) in pairs {
            match self.add_item(key, value.clone()) {
                Ok(true) => {}
                Ok(false) => failed.push(key.to_string()),
                Err(err) => {
                    warn!("add_items: failed to store {:?}: {}", key, err);
                    failed.push(key.to_string());
                }
            }
        }
        Ok(failed)
    }

    fn replace_item(&self, key: &str, value: Value) -> Result<bool> {
        if !self.options.writable {
            return Ok(false);
        }
        self.validate_key(key)?;

        let canonical = self.canonical_key(key);
        let ttl = self.effective_ttl();
        Ok(self.lock()?.replace(&canonical, value, ttl))
    }

    fn replace_items(&self, pairs: &[(&str, Value)]) -> Result<Vec<String>> {
        let mut failed = Vec::new();
        for (key, value) in pairs {
            match self.replace_item(key, value.clone()) {
                Ok(true) => {}
                Ok(false) => failed.push(key.to_string()),
                Err(err) => {
                    warn!("replace_items: failed to store {:?}: {}", key, err);
                    failed.push(key.to_string());
                }
            }
        }
        Ok(failed)
    }

    fn check_and_set_item(&self, token: &CasToken, key: &str, value: Value) -> Result<bool> {
        if !self.capabilities.supports_cas {
            return Err(StorageError::Unsupported("check_and_set_item"));
        }
        if !self.options.writable {
            return Ok(false);
        }
        self.validate_key(key)?;

        let canonical = self.canonical_key(key);
        // Tokens are bound to the key they were read from
        if !token.matches_key(&canonical) {
            return Ok(false);
        }

        let ttl = self.effective_ttl();
        Ok(self
            .lock()?
            .check_and_set(token.version(), &canonical, value, ttl))
    }

    fn touch_item(&self, key: &str) -> Result<bool> {
        if !self.capabilities.supports_ttl {
            return Err(StorageError::Unsupported("touch_item"));
        }
        if !self.options.writable {
            return Ok(false);
        }
        self.validate_key(key)?;

        let canonical = self.canonical_key(key);
        let ttl = self.effective_ttl();
        Ok(self.lock()?.touch(&canonical, ttl))
    }

    fn touch_items(&self, keys: &[&str]) -> Result<Vec<String>> {
        let mut failed = Vec::new();
        for key in keys {
            match self.touch_item(key) {
                Ok(true) => {}
                Ok(false) => failed.push(key.to_string()),
                Err(err) => {
                    warn!("touch_items: failed to touch {:?}: {}", key, err);
                    failed.push(key.to_string());
                }
            }
        }
        Ok(failed)
    }

    fn remove_item(&self, key: &str) -> Result<bool> {
        if !self.options.writable {
            return Ok(false);
        }
        self.validate_key(key)?;

        let canonical = self.canonical_key(key);
        Ok(self.lock()?.remove(&canonical))
    }

    fn remove_items(&self, keys: &[&str]) -> Result<Vec<String>> {
        let mut failed = Vec::new();
        for key in keys {
            match self.remove_item(key) {
                Ok(true) => {}
                Ok(false) => failed.push(key.to_string()),
                Err(err) => {
                    warn!("remove_items: failed to remove {:?}: {}", key, err);
                    failed.push(key.to_string());
                }
            }
        }
        Ok(failed)
    }

    // == Counters ==
    fn increment_item(&self, key: &str, delta: i64) -> Result<Option<i64>> {
        if !self.options.writable {
            return Ok(None);
        }
        self.validate_key(key)?;

        let canonical = self.canonical_key(key);
        let ttl = self.effective_ttl();
        Ok(self.lock()?.adjust(&canonical, delta, ttl))
    }

    fn increment_items(&self, pairs: &[(&str, i64)]) -> Result<HashMap<String, i64>> {
        let mut updated = HashMap::new();
        for (key, delta) in pairs {
            match self.increment_item(key, *delta) {
                Ok(Some(new_value)) => {
                    updated.insert(key.to_string(), new_value);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!("increment_items: failed to adjust {:?}: {}", key, err);
                }
            }
        }
        Ok(updated)
    }

    fn decrement_item(&self, key: &str, delta: i64) -> Result<Option<i64>> {
        self.increment_item(key, delta.saturating_neg())
    }

    fn decrement_items(&self, pairs: &[(&str, i64)]) -> Result<HashMap<String, i64>> {
        let mut updated = HashMap::new();
        for (key, delta) in pairs {
            match self.decrement_item(key, *delta) {
                Ok(Some(new_value)) => {
                    updated.insert(key.to_string(), new_value);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!("decrement_items: failed to adjust {:?}: {}", key, err);
                }
            }
        }
        Ok(updated)
    }
}
