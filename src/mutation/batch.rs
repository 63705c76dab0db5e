//! Batch Controller Module
//!
//! Runs N independent key updates as one atomic optimistic unit: one
//! snapshot pass, one write, and on failure one all-or-nothing restore.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{MutationError, Result, TransportError};
use crate::mutation::descriptor::{
    MutationFn, OptimisticUpdater, RollbackHook, SuccessHook,
};
use crate::mutation::snapshot::Snapshot;
use crate::retry::{classify, RetryPolicy};
use crate::store::{CacheStore, QueryKey};

// == Batch Update ==
/// One key and the optimistic updater to apply to it.
pub struct BatchUpdate {
    pub key: QueryKey,
    pub update: OptimisticUpdater,
}

impl BatchUpdate {
    /// Creates a batch entry from a plain closure.
    pub fn new<F>(key: QueryKey, update: F) -> Self
    where
        F: Fn(Option<Value>, &Value) -> Value + Send + Sync + 'static,
    {
        Self {
            key,
            update: Arc::new(update),
        }
    }
}

// == Batch Handle ==
/// A registered batch mutation: one write function shared by every key in
/// an invocation, with all-or-nothing rollback.
#[derive(Clone)]
pub struct BatchHandle {
    mutation_fn: MutationFn,
    on_rollback: Option<RollbackHook>,
    on_success: Option<SuccessHook>,
    invalidate_extra: Vec<QueryKey>,
    store: Arc<dyn CacheStore>,
    policy: RetryPolicy,
}

// == Batch Builder ==
/// Builder for [`BatchHandle`].
pub struct BatchBuilder {
    mutation_fn: MutationFn,
    on_rollback: Option<RollbackHook>,
    on_success: Option<SuccessHook>,
    invalidate_extra: Vec<QueryKey>,
}

impl BatchBuilder {
    // == Constructor ==
    /// Starts a builder around the shared write function.
    pub fn new<F, Fut>(mutation_fn: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Value, TransportError>> + Send + 'static,
    {
        Self {
            mutation_fn: Arc::new(move |vars| Box::pin(mutation_fn(vars))),
            on_rollback: None,
            on_success: None,
            invalidate_extra: Vec::new(),
        }
    }

    /// Sets the rollback hook, run after every key has been restored.
    pub fn on_rollback<F>(mut self, hook: F) -> Self
    where
        F: Fn(&MutationError, &Value) + Send + Sync + 'static,
    {
        self.on_rollback = Some(Arc::new(hook));
        self
    }

    /// Sets the success hook, run before commit invalidation.
    pub fn on_success<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Value, &Value) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(hook));
        self
    }

    /// Adds keys invalidated alongside the batch keys on success.
    pub fn invalidate_also(mut self, keys: impl IntoIterator<Item = QueryKey>) -> Self {
        self.invalidate_extra.extend(keys);
        self
    }

    /// Binds the batch to a store and retry policy.
    pub fn register(self, store: Arc<dyn CacheStore>, policy: RetryPolicy) -> BatchHandle {
        BatchHandle {
            mutation_fn: self.mutation_fn,
            on_rollback: self.on_rollback,
            on_success: self.on_success,
            invalidate_extra: self.invalidate_extra,
            store,
            policy,
        }
    }
}

impl BatchHandle {
    // == Execute ==
    /// Runs one atomic batch invocation.
    ///
    /// All keys are cancelled and snapshotted before any updater runs, so
    /// the rollback target is the state the whole batch observed. On failure
    /// every key is restored in one pass before the rollback hook runs; on
    /// success every key plus the extra invalidation set becomes stale.
    ///
    /// # Panics
    /// Panics if two updates name the same key; overlapping updates within
    /// one atomic unit would make the restore order-dependent.
    pub async fn execute(&self, updates: &[BatchUpdate], variables: Value) -> Result<Value> {
        let store = &*self.store;
        let keys: Vec<QueryKey> = updates.iter().map(|update| update.key.clone()).collect();

        for key in &keys {
            store.cancel_in_flight(key);
        }

        let snapshot = Snapshot::capture(store, &keys);
        debug!("batch snapshotted {} key(s)", snapshot.len());

        for update in updates {
            store.set_with(&update.key, &mut |old| (update.update)(old, &variables));
        }

        let mut attempt: u32 = 0;
        let error = loop {
            match (self.mutation_fn)(variables.clone()).await {
                Ok(data) => {
                    if let Some(hook) = &self.on_success {
                        hook(&data, &variables);
                    }
                    for key in keys.iter().chain(self.invalidate_extra.iter()) {
                        store.invalidate(key, true);
                    }
                    debug!("batch of {} key(s) committed", keys.len());
                    return Ok(data);
                }
                Err(source) => {
                    let kind = classify(&source);
                    if self.policy.should_retry_mutation(attempt, kind) {
                        attempt += 1;
                        tokio::time::sleep(self.policy.mutation_backoff()).await;
                        continue;
                    }
                    break MutationError {
                        kind,
                        attempts: attempt + 1,
                        source,
                    };
                }
            }
        };

        snapshot.restore(store);
        warn!(kind = ?error.kind, "batch write failed, {} key(s) restored", keys.len());
        if let Some(hook) = &self.on_rollback {
            hook(&error, &variables);
        }
        Err(error)
    }
}
