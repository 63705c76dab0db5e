//! Invalidation Scheduler Module
//!
//! Four invalidation strategies over the store's invalidate primitive:
//! immediate, cascading with delay, partial prefix match, and
//! staleness-conditional, plus an explicit multi-key form.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::store::{current_timestamp_ms, CacheStore, QueryKey};

// == Invalidation Task ==
/// A scheduled invalidation with its strategy.
#[derive(Debug, Clone)]
pub enum InvalidationTask {
    /// Invalidate one exact key now
    Immediate(QueryKey),
    /// Invalidate `primary` now and `secondary` after `delay`
    Cascade {
        primary: Vec<QueryKey>,
        secondary: Vec<QueryKey>,
        delay: Duration,
    },
    /// Invalidate every entry whose key starts with the pattern
    Prefix(QueryKey),
    /// Invalidate only entries older than `max_stale`, unless forced
    Conditional {
        key: QueryKey,
        max_stale: Duration,
        force: bool,
    },
    /// Invalidate an explicit list of exact keys
    Multi(Vec<QueryKey>),
}

// == Invalidation Scheduler ==
/// Dispatches invalidation strategies against one store.
#[derive(Clone)]
pub struct InvalidationScheduler {
    store: Arc<dyn CacheStore>,
}

impl InvalidationScheduler {
    // == Constructor ==
    /// Creates a scheduler over the given store.
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    // == Run ==
    /// Executes a task according to its strategy.
    ///
    /// Cascade secondaries fire on a detached timer; everything else is
    /// synchronous.
    pub fn run(&self, task: InvalidationTask) {
        match task {
            InvalidationTask::Immediate(key) => self.invalidate_now(&key),
            InvalidationTask::Cascade {
                primary,
                secondary,
                delay,
            } => {
                let _ = self.invalidate_cascade(primary, secondary, delay);
            }
            InvalidationTask::Prefix(pattern) => self.invalidate_prefix(&pattern),
            InvalidationTask::Conditional {
                key,
                max_stale,
                force,
            } => {
                self.invalidate_if_stale(&key, max_stale, force);
            }
            InvalidationTask::Multi(keys) => self.invalidate_many(&keys),
        }
    }

    // == Immediate ==
    /// Marks one exact key stale now.
    pub fn invalidate_now(&self, key: &QueryKey) {
        self.store.invalidate(key, true);
    }

    // == Cascade ==
    /// Marks `primary` stale now and `secondary` stale after `delay`.
    ///
    /// The secondary wave is fire-and-forget; the returned handle exists so
    /// tests can await or abort it.
    pub fn invalidate_cascade(
        &self,
        primary: Vec<QueryKey>,
        secondary: Vec<QueryKey>,
        delay: Duration,
    ) -> JoinHandle<()> {
        for key in &primary {
            self.store.invalidate(key, true);
        }
        debug!(
            "cascade: {} primary key(s) invalidated, {} secondary in {:?}",
            primary.len(),
            secondary.len(),
            delay
        );

        let store = self.store.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            for key in &secondary {
                store.invalidate(key, true);
            }
            debug!("cascade: {} secondary key(s) invalidated", secondary.len());
        })
    }

    // == Prefix ==
    /// Marks stale every entry whose key starts with `pattern`.
    pub fn invalidate_prefix(&self, pattern: &QueryKey) {
        self.store.invalidate(pattern, false);
    }

    // == Conditional ==
    /// Marks `key` stale only if its entry is older than `max_stale`, or
    /// unconditionally when `force` is set.
    ///
    /// Returns true if an invalidation was issued. An absent entry is left
    /// alone; there is nothing to mark.
    pub fn invalidate_if_stale(&self, key: &QueryKey, max_stale: Duration, force: bool) -> bool {
        if !force {
            match self.store.updated_at(key) {
                Some(updated_at) => {
                    let age_ms = current_timestamp_ms().saturating_sub(updated_at);
                    if age_ms < max_stale.as_millis() as u64 {
                        debug!("conditional invalidation skipped, {} is fresh", key);
                        return false;
                    }
                }
                None => return false,
            }
        }
        self.store.invalidate(key, true);
        true
    }

    // == Multi ==
    /// Marks an explicit list of exact keys stale in one call.
    pub fn invalidate_many(&self, keys: &[QueryKey]) {
        for key in keys {
            self.store.invalidate(key, true);
        }
    }
}
