//! Prefetch Scheduler Module
//!
//! Runs priority-tagged fetch tasks: high-priority tasks sequentially and
//! to completion, then the remaining tiers concurrently. Fetched values
//! land in the store under each task's key.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::store::{CacheStore, QueryKey};

// == Prefetch Priority ==
/// Scheduling tier for a prefetch task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchPriority {
    /// Runs first, sequentially, before any other tier starts
    High,
    /// Runs concurrently after the high tier completes
    Medium,
    /// Runs concurrently after the high tier completes
    Low,
}

// == Prefetch Task ==
/// A key to warm and the fetch that produces its value.
pub struct PrefetchTask {
    pub key: QueryKey,
    pub priority: PrefetchPriority,
    fetch: Pin<Box<dyn Future<Output = std::result::Result<Value, TransportError>> + Send>>,
}

impl PrefetchTask {
    /// Creates a task from a plain future.
    pub fn new<Fut>(key: QueryKey, priority: PrefetchPriority, fetch: Fut) -> Self
    where
        Fut: Future<Output = std::result::Result<Value, TransportError>> + Send + 'static,
    {
        Self {
            key,
            priority,
            fetch: Box::pin(fetch),
        }
    }
}

// == Prefetch Report ==
/// Outcome counts for one scheduler run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchReport {
    pub succeeded: usize,
    pub failed: usize,
}

// == Prefetch Scheduler ==
/// Runs prefetch tasks against one store.
#[derive(Clone)]
pub struct PrefetchScheduler {
    store: Arc<dyn CacheStore>,
}

impl PrefetchScheduler {
    // == Constructor ==
    /// Creates a scheduler over the given store.
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    // == Run ==
    /// Executes all tasks honoring their tiers.
    ///
    /// Every high task completes (successfully or not) before any medium or
    /// low task starts; medium and low tasks then run concurrently with no
    /// ordering between them. A failed task is logged and skipped without
    /// affecting its siblings.
    pub async fn run(&self, tasks: Vec<PrefetchTask>) -> PrefetchReport {
        let mut report = PrefetchReport::default();

        let (high, rest): (Vec<PrefetchTask>, Vec<PrefetchTask>) = tasks
            .into_iter()
            .partition(|task| task.priority == PrefetchPriority::High);

        debug!(
            "prefetch: {} high task(s) sequential, {} concurrent",
            high.len(),
            rest.len()
        );

        for task in high {
            self.settle(task.key, task.fetch.await, &mut report);
        }

        let settled = join_all(
            rest.into_iter()
                .map(|task| async move { (task.key, task.fetch.await) }),
        )
        .await;
        for (key, outcome) in settled {
            self.settle(key, outcome, &mut report);
        }

        report
    }

    /// Records one task outcome, writing successful fetches to the store.
    fn settle(
        &self,
        key: QueryKey,
        outcome: std::result::Result<Value, TransportError>,
        report: &mut PrefetchReport,
    ) {
        match outcome {
            Ok(value) => {
                self.store.set(&key, value);
                report.succeeded += 1;
            }
            Err(error) => {
                warn!("prefetch for {} failed: {}", key, error);
                report.failed += 1;
            }
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn scheduler_with_store() -> (PrefetchScheduler, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new(60_000, 120_000));
        (PrefetchScheduler::new(store.clone()), store)
    }

    /// Builds a task that records its start order before resolving.
    fn ordered_task(
        key: &str,
        priority: PrefetchPriority,
        order: Arc<std::sync::Mutex<Vec<String>>>,
        delay: Duration,
    ) -> PrefetchTask {
        let name = key.to_string();
        PrefetchTask::new(QueryKey::root(key), priority, async move {
            order.lock().unwrap().push(name.clone());
            tokio::time::sleep(delay).await;
            Ok(json!(name))
        })
    }

    #[tokio::test]
    async fn test_high_tasks_complete_before_other_tiers_start() {
        let (scheduler, _store) = scheduler_with_store();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        let tasks = vec![
            ordered_task("medium", PrefetchPriority::Medium, order.clone(), Duration::ZERO),
            ordered_task("high_a", PrefetchPriority::High, order.clone(), Duration::from_millis(15)),
            ordered_task("high_b", PrefetchPriority::High, order.clone(), Duration::from_millis(5)),
            ordered_task("low", PrefetchPriority::Low, order.clone(), Duration::ZERO),
        ];

        scheduler.run(tasks).await;

        let order = order.lock().unwrap().clone();
        // High tasks start in list order, before any other tier
        assert_eq!(&order[..2], &["high_a", "high_b"]);
        assert_eq!(order.len(), 4);
    }

    #[tokio::test]
    async fn test_fetched_values_land_in_store() {
        let (scheduler, store) = scheduler_with_store();

        let tasks = vec![
            PrefetchTask::new(QueryKey::root("a"), PrefetchPriority::High, async {
                Ok(json!("value_a"))
            }),
            PrefetchTask::new(QueryKey::root("b"), PrefetchPriority::Low, async {
                Ok(json!("value_b"))
            }),
        ];

        let report = scheduler.run(tasks).await;

        assert_eq!(report, PrefetchReport { succeeded: 2, failed: 0 });
        assert_eq!(store.get(&QueryKey::root("a")), Some(json!("value_a")));
        assert_eq!(store.get(&QueryKey::root("b")), Some(json!("value_b")));
    }

    #[tokio::test]
    async fn test_task_failure_is_isolated() {
        let (scheduler, store) = scheduler_with_store();
        let completed = Arc::new(AtomicUsize::new(0));

        let done = completed.clone();
        let tasks = vec![
            PrefetchTask::new(QueryKey::root("bad"), PrefetchPriority::Medium, async {
                Err(TransportError::NoResponse)
            }),
            PrefetchTask::new(QueryKey::root("good"), PrefetchPriority::Medium, async move {
                done.fetch_add(1, Ordering::SeqCst);
                Ok(json!(1))
            }),
        ];

        let report = scheduler.run(tasks).await;

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(completed.load(Ordering::SeqCst), 1);
        assert_eq!(store.get(&QueryKey::root("good")), Some(json!(1)));
        assert_eq!(store.get(&QueryKey::root("bad")), None);
    }

    #[tokio::test]
    async fn test_high_failure_does_not_block_later_tiers() {
        let (scheduler, store) = scheduler_with_store();

        let tasks = vec![
            PrefetchTask::new(QueryKey::root("bad"), PrefetchPriority::High, async {
                Err(TransportError::Connection("down".to_string()))
            }),
            PrefetchTask::new(QueryKey::root("low"), PrefetchPriority::Low, async {
                Ok(json!("still ran"))
            }),
        ];

        let report = scheduler.run(tasks).await;

        assert_eq!(report.failed, 1);
        assert_eq!(store.get(&QueryKey::root("low")), Some(json!("still ran")));
    }

    #[tokio::test]
    async fn test_empty_task_list() {
        let (scheduler, _store) = scheduler_with_store();

        let report = scheduler.run(Vec::new()).await;

        assert_eq!(report, PrefetchReport::default());
    }
}
