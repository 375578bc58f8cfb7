//! Storage Adapter Module
//!
//! Defines the public contract every cache-storage backend implements, and
//! provides the in-memory reference adapter.
//!
//! The contract separates two kinds of unhappy outcome. Expected misses
//! (key absent, already exists, CAS mismatch, nothing to remove) are return
//! values: `false`, `None`, or omission from a batch result. Errors are
//! reserved for infrastructural failures and for operations the backend's
//! [`Capabilities`] declare unsupported. Callers can therefore tell "the
//! cache legitimately doesn't have this" from "the cache is broken" without
//! error-driven control flow on the hot path.
//!
//! Batch operations are best-effort sequences of independent single-key
//! atomic operations: one item's failure never aborts its siblings, and
//! successes stay committed. Write batches report the keys that failed;
//! read batches simply omit keys that were not found.

mod memory;

use std::collections::HashMap;

use serde_json::Value;

use crate::capabilities::Capabilities;
use crate::error::Result;
use crate::options::AdapterOptions;
use crate::store::ItemMetadata;

pub use memory::{MemoryStorage, MAX_KEY_LENGTH};

// == CAS Token ==
/// Opaque concurrency token returned by [`Storage::get_item`].
///
/// A token is valid only for comparison against the current version of the
/// same key: it records the namespaced key it was read from, so a token
/// presented for a different key yields an ordinary CAS mismatch rather
/// than a false success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasToken {
    key: String,
    version: u64,
}

impl CasToken {
    pub(crate) fn new(key: String, version: u64) -> Self {
        Self { key, version }
    }

    pub(crate) fn matches_key(&self, key: &str) -> bool {
        self.key == key
    }

    pub(crate) fn version(&self) -> u64 {
        self.version
    }
}

// == Storage Contract ==
/// Contract for pluggable cache-storage backends.
///
/// Implementations must make every single-key mutation atomic with respect
/// to concurrent callers: operations on the same key are linearizable, and
/// increment/decrement must never be observable as a separate read followed
/// by a write. Operations on different keys are independent; no batch spans
/// keys transactionally.
pub trait Storage {
    // == Configuration ==
    /// Swaps the adapter's options. Takes effect for subsequent calls only;
    /// existing items are never rewritten.
    fn set_options(&mut self, options: AdapterOptions);

    /// Returns the adapter's current options.
    fn options(&self) -> &AdapterOptions;

    /// Returns the backend's capability descriptor. Constant for the
    /// adapter's lifetime.
    fn capabilities(&self) -> &Capabilities;

    // == Reading ==
    /// Retrieves an item's value together with a CAS token reflecting its
    /// current version. Returns None when the key is absent or expired.
    fn get_item(&self, key: &str) -> Result<Option<(Value, CasToken)>>;

    /// Retrieves multiple items. Keys that were not found are omitted from
    /// the result, not reported as errors.
    fn get_items(&self, keys: &[&str]) -> Result<HashMap<String, Value>>;

    /// Tests whether a live item exists for the key.
    fn has_item(&self, key: &str) -> Result<bool>;

    /// Tests multiple keys, returning the ones that exist.
    fn has_items(&self, keys: &[&str]) -> Result<Vec<String>>;

    /// Returns an item's metadata, or None if the key is absent or expired.
    fn get_metadata(&self, key: &str) -> Result<Option<ItemMetadata>>;

    /// Returns metadata for multiple keys; keys not found are omitted.
    fn get_metadatas(&self, keys: &[&str]) -> Result<HashMap<String, ItemMetadata>>;

    // == Writing ==
    /// Stores an item unconditionally, creating or overwriting. Returns
    /// true unless the adapter is not writable.
    fn set_item(&self, key: &str, value: Value) -> Result<bool>;

    /// Stores multiple items, returning the keys that failed to store.
    fn set_items(&self, pairs: &[(&str, Value)]) -> Result<Vec<String>>;

    /// Stores an item only if the key does not currently exist (or has
    /// expired). Returns false on conflict.
    fn add_item(&self, key: &str, value: Value) -> Result<bool>;

    /// Adds multiple items, returning the keys that failed (already exist
    /// or backend error).
    fn add_items(&self, pairs: &[(&str, Value)]) -> Result<Vec<String>>;

    /// Overwrites an item only if the key currently exists. Returns false
    /// if it is absent.
    fn replace_item(&self, key: &str, value: Value) -> Result<bool>;

    /// Replaces multiple items, returning the keys that failed.
    fn replace_items(&self, pairs: &[(&str, Value)]) -> Result<Vec<String>>;

    /// Conditional overwrite using a token obtained from [`get_item`]
    /// (lost-update prevention). Returns false on version mismatch; a
    /// success assigns the item a new version.
    ///
    /// The contract does not retry internally: a false return signals the
    /// caller to re-read and retry.
    ///
    /// [`get_item`]: Storage::get_item
    fn check_and_set_item(&self, token: &CasToken, key: &str, value: Value) -> Result<bool>;

    /// Resets an item's expiry clock from the adapter's default TTL without
    /// altering its value. Returns false if the key is absent.
    fn touch_item(&self, key: &str) -> Result<bool>;

    /// Touches multiple items, returning the keys that failed.
    fn touch_items(&self, keys: &[&str]) -> Result<Vec<String>>;

    /// Removes an item. Returns false if there was nothing to remove.
    fn remove_item(&self, key: &str) -> Result<bool>;

    /// Removes multiple items, returning the keys that failed (keys that
    /// did not exist count as failed to remove).
    fn remove_items(&self, keys: &[&str]) -> Result<Vec<String>>;

    // == Counters ==
    /// Atomically increments an integer counter, returning the new value.
    /// A missing key is created with `delta` as its value; results clamp
    /// at zero. Returns None if the existing value is not an integer.
    fn increment_item(&self, key: &str, delta: i64) -> Result<Option<i64>>;

    /// Increments multiple counters, returning the new values for the keys
    /// that succeeded.
    fn increment_items(&self, pairs: &[(&str, i64)]) -> Result<HashMap<String, i64>>;

    /// Atomically decrements an integer counter, returning the new value.
    /// Decrementing below zero clamps to zero; a missing key is created at
    /// the clamped value. Returns None if the existing value is not an
    /// integer.
    fn decrement_item(&self, key: &str, delta: i64) -> Result<Option<i64>>;

    /// Decrements multiple counters, returning the new values for the keys
    /// that succeeded.
    fn decrement_items(&self, pairs: &[(&str, i64)]) -> Result<HashMap<String, i64>>;
}
