//! Item Store Module
//!
//! Provides the in-memory item store with TTL expiry and CAS versioning
//! that backs the reference storage adapter.

mod engine;
mod entry;
mod stats;


// Re-export public types
pub use engine::ItemStore;
pub use entry::{expiry_after, ItemMetadata, StoredItem};
pub use stats::StoreStats;
