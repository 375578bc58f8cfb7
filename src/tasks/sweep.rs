//! Expiry Sweep Task
//!
//! Background task that periodically purges expired items.
//!
//! Lazy eviction on access is the baseline behavior of the store; the sweep
//! only reclaims expired items that would otherwise linger until their next
//! access.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::storage::MemoryStorage;

/// Spawns a background task that periodically purges expired items.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps. The handle can be used to abort the task during
/// shutdown.
///
/// # Example
/// ```ignore
/// let storage = MemoryStorage::new(options);
/// let sweep_handle = spawn_sweep_task(storage.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(storage: MemoryStorage, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting expiry sweep task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            match storage.purge_expired() {
                Ok(0) => debug!("Expiry sweep: no expired items found"),
                Ok(removed) => info!("Expiry sweep: removed {} expired items", removed),
                Err(err) => warn!("Expiry sweep failed: {}", err),
            }
        }
    })
}
