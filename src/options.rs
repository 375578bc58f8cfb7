//! Adapter Options Module
//!
//! Configuration record that parameterizes a storage adapter without touching
//! the store's data.
//!
//! Options are applied at construction or swapped via the adapter's
//! `set_options`; a swap takes effect for subsequent calls only and never
//! rewrites existing items (items stored under an old namespace or TTL keep
//! it).

use std::time::Duration;

use regex::Regex;

// == Adapter Options ==
/// Per-adapter configuration.
#[derive(Debug, Clone)]
pub struct AdapterOptions {
    /// Namespace prefix prepended to every key (empty = no namespace)
    pub namespace: String,
    /// TTL applied to new and touched items (None = items never expire)
    pub default_ttl: Option<Duration>,
    /// Optional validation pattern every key must match
    pub key_pattern: Option<Regex>,
    /// Whether read operations are permitted
    pub readable: bool,
    /// Whether write operations are permitted
    pub writable: bool,
}

impl AdapterOptions {
    // == Constructor ==
    /// Creates options with no namespace, no TTL and no key restrictions.
    pub fn new() -> Self {
        Self::default()
    }

    // == Builder Setters ==
    /// Sets the namespace prefix.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets the default TTL used by writes and touch operations.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Sets the key validation pattern.
    pub fn with_key_pattern(mut self, pattern: Regex) -> Self {
        self.key_pattern = Some(pattern);
        self
    }

    /// Marks the adapter read-only.
    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    /// Marks the adapter write-only.
    pub fn write_only(mut self) -> Self {
        self.readable = false;
        self
    }
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            default_ttl: None,
            key_pattern: None,
            readable: true,
            writable: true,
        }
    }
}
