//! Stored Item Module
//!
//! Defines the structure for individual stored items with TTL and CAS
//! version metadata.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

// == Item Metadata ==
/// Per-item metadata maintained by the item store.
///
/// `cas_version` is a monotonic counter starting at 1; it is bumped on every
/// successful mutation of the item's value and is the token callers compare
/// against for optimistic concurrency control.
#[derive(Debug, Clone, Serialize)]
pub struct ItemMetadata {
    /// When the item was first written
    pub created_at: DateTime<Utc>,
    /// When the item's value was last written
    pub last_modified_at: DateTime<Utc>,
    /// Expiration instant, None = no expiration
    pub expires_at: Option<DateTime<Utc>>,
    /// Concurrency token, bumped on every value mutation
    pub cas_version: u64,
}

// == Stored Item ==
/// A single stored value together with its metadata.
#[derive(Debug, Clone)]
pub struct StoredItem {
    /// The stored value
    pub value: Value,
    /// Item metadata
    pub metadata: ItemMetadata,
}

impl StoredItem {
    // == Constructor ==
    /// Creates a fresh item with `cas_version = 1` and an expiry derived
    /// from the optional TTL.
    pub fn new(value: Value, now: DateTime<Utc>, ttl: Option<Duration>) -> Self {
        Self {
            value,
            metadata: ItemMetadata {
                created_at: now,
                last_modified_at: now,
                expires_at: expiry_after(now, ttl),
                cas_version: 1,
            },
        }
    }

    // == Is Expired ==
    /// Checks whether the item has expired at `now`.
    ///
    /// Boundary condition: an item is expired when `now` is greater than or
    /// equal to the expiration instant, so an item whose TTL has fully
    /// elapsed is immediately treated as absent.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.metadata.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Write ==
    /// Replaces the value, resets the expiry clock and bumps the CAS
    /// version. `created_at` is preserved; an overwrite mutates the item
    /// rather than recreating it.
    pub fn write(&mut self, value: Value, now: DateTime<Utc>, ttl: Option<Duration>) {
        self.value = value;
        self.metadata.last_modified_at = now;
        self.metadata.expires_at = expiry_after(now, ttl);
        self.metadata.cas_version += 1;
    }

    // == Refresh ==
    /// Resets the expiry clock only. The value, `last_modified_at` and
    /// `cas_version` are untouched: a touch is not a value mutation.
    pub fn refresh(&mut self, now: DateTime<Utc>, ttl: Option<Duration>) {
        self.metadata.expires_at = expiry_after(now, ttl);
    }
}

// == Utility Functions ==
/// Computes the expiration instant for an item written at `now` with the
/// given TTL, or None when the item should never expire.
pub fn expiry_after(now: DateTime<Utc>, ttl: Option<Duration>) -> Option<DateTime<Utc>> {
    ttl.and_then(|t| chrono::Duration::from_std(t).ok())
        .map(|d| now + d)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_creation_no_ttl() {
        let now = Utc::now();
        let item = StoredItem::new(json!("payload"), now, None);

        assert_eq!(item.value, json!("payload"));
        assert!(item.metadata.expires_at.is_none());
        assert_eq!(item.metadata.cas_version, 1);
        assert!(!item.is_expired(now));
    }

    #[test]
    fn test_item_creation_with_ttl() {
        let now = Utc::now();
        let item = StoredItem::new(json!(1), now, Some(Duration::from_secs(60)));

        assert!(item.metadata.expires_at.is_some());
        assert!(!item.is_expired(now));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Utc::now();
        let mut item = StoredItem::new(json!(1), now, None);
        item.metadata.expires_at = Some(now);

        // Expired when now >= expires_at
        assert!(item.is_expired(now), "Item should be expired at boundary");
    }

    #[test]
    fn test_write_bumps_cas_and_preserves_created_at() {
        let created = Utc::now();
        let mut item = StoredItem::new(json!("v1"), created, None);

        let later = created + chrono::Duration::seconds(5);
        item.write(json!("v2"), later, None);

        assert_eq!(item.value, json!("v2"));
        assert_eq!(item.metadata.cas_version, 2);
        assert_eq!(item.metadata.created_at, created);
        assert_eq!(item.metadata.last_modified_at, later);
    }

    #[test]
    fn test_refresh_leaves_value_and_cas_alone() {
        let now = Utc::now();
        let mut item = StoredItem::new(json!("v"), now, Some(Duration::from_secs(1)));
        let first_expiry = item.metadata.expires_at;

        let later = now + chrono::Duration::seconds(10);
        item.refresh(later, Some(Duration::from_secs(1)));

        assert_eq!(item.value, json!("v"));
        assert_eq!(item.metadata.cas_version, 1);
        assert_eq!(item.metadata.last_modified_at, now);
        assert!(item.metadata.expires_at > first_expiry);
    }

    #[test]
    fn test_expiry_after_none_ttl() {
        assert!(expiry_after(Utc::now(), None).is_none());
    }
}
