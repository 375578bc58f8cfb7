//! Cachet - a pluggable cache-storage contract
//!
//! Defines a uniform contract ([`Storage`]) for key-addressed cache
//! backends with TTL expiry, compare-and-set concurrency control and atomic
//! numeric counters, plus an in-memory reference implementation
//! ([`MemoryStorage`]) that makes the semantics concrete and testable.

pub mod capabilities;
pub mod error;
pub mod options;
pub mod storage;
pub mod store;
pub mod tasks;

pub use capabilities::Capabilities;
pub use error::{Result, StorageError};
pub use options::AdapterOptions;
pub use storage::{CasToken, MemoryStorage, Storage};
pub use tasks::spawn_sweep_task;
