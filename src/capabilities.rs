//! Capabilities Descriptor Module
//!
//! Describes which optional contract behaviors a concrete backend supports.
//!
//! A `Capabilities` value is constructed once per adapter configuration and
//! never changes for the adapter's lifetime. Generic client code queries it
//! to branch (e.g. skip CAS retry loops when `supports_cas` is false);
//! adapters use it to gate unsupported operations with
//! [`StorageError::Unsupported`](crate::error::StorageError::Unsupported).

use std::time::Duration;

use serde::Serialize;

// == Capabilities ==
/// Immutable snapshot of a backend's optional feature set.
#[derive(Debug, Clone, Serialize)]
pub struct Capabilities {
    /// Whether items can carry an expiry and be touched
    pub supports_ttl: bool,
    /// Whether check-and-set concurrency control is available
    pub supports_cas: bool,
    /// Whether values are immutable once written
    pub static_values: bool,
    /// Whether items can be tagged for group operations
    pub supports_tags: bool,
    /// Smallest TTL the backend honors, if bounded
    pub min_ttl: Option<Duration>,
    /// Largest TTL the backend honors, if bounded
    pub max_ttl: Option<Duration>,
    /// Maximum key length in bytes, if bounded
    pub max_key_length: Option<usize>,
    /// Separator inserted between namespace prefix and key
    pub namespace_separator: String,
}

impl Default for Capabilities {
    /// A conservative descriptor: no optional behavior supported.
    fn default() -> Self {
        Self {
            supports_ttl: false,
            supports_cas: false,
            static_values: false,
            supports_tags: false,
            min_ttl: None,
            max_ttl: None,
            max_key_length: None,
            namespace_separator: ":".to_string(),
        }
    }
}
