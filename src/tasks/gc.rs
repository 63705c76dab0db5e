//! Garbage Collection Task
//!
//! Background task that periodically sweeps entries idle past the store's
//! GC threshold.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::MemoryStore;

/// Spawns a background task that periodically sweeps expired entries.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps.
///
/// # Arguments
/// * `store` - Shared reference to the store to sweep
/// * `interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let store = Arc::new(MemoryStore::new(300_000, 600_000));
/// let gc_handle = spawn_gc_task(store.clone(), 60);
/// // Later, during shutdown:
/// gc_handle.abort();
/// ```
pub fn spawn_gc_task(store: Arc<MemoryStore>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting GC sweep task with interval of {} seconds",
            interval_secs
        );

        loop {
            // Sleep for the configured interval
            tokio::time::sleep(interval).await;

            let removed = store.sweep_expired();

            // Log sweep statistics
            if removed > 0 {
                info!("GC sweep: removed {} idle entries", removed);
            } else {
                debug!("GC sweep: no idle entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CacheStore, QueryKey};
    use serde_json::json;

    #[tokio::test]
    async fn test_gc_task_removes_idle_entries() {
        let store = Arc::new(MemoryStore::new(60_000, 400));

        store.set(&QueryKey::root("idle"), json!("value"));

        // Spawn GC task with 1 second interval
        let handle = spawn_gc_task(store.clone(), 1);

        // Wait for the entry to idle out and the sweep to run
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert_eq!(store.len(), 0, "Idle entry should have been swept");

        handle.abort();
    }

    #[tokio::test]
    async fn test_gc_task_preserves_active_entries() {
        let store = Arc::new(MemoryStore::new(60_000, 3_600_000));

        store.set(&QueryKey::root("active"), json!("value"));

        let handle = spawn_gc_task(store.clone(), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(
            store.get(&QueryKey::root("active")),
            Some(json!("value")),
            "Active entry should not be swept"
        );

        handle.abort();
    }

    #[tokio::test]
    async fn test_gc_task_can_be_aborted() {
        let store = Arc::new(MemoryStore::new(60_000, 120_000));

        let handle = spawn_gc_task(store, 1);

        // Abort immediately
        handle.abort();

        // Wait a bit and verify task is finished
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
