//! Mutation Descriptor Module
//!
//! The registration surface: a descriptor is created once per mutation type
//! and bound to a store and retry policy, yielding a handle the application
//! invokes with per-call variables.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{MutationError, Result, TransportError};
use crate::mutation::controller;
use crate::retry::RetryPolicy;
use crate::store::{CacheStore, QueryKey};

// == Closure Types ==
/// The real write: takes the invocation variables, performs the network
/// call, resolves to the confirmed data or a transport failure.
pub type MutationFn = Arc<
    dyn Fn(Value) -> Pin<Box<dyn Future<Output = std::result::Result<Value, TransportError>> + Send>>
        + Send
        + Sync,
>;

/// Resolves the cache key(s) a given invocation touches.
pub type KeyResolver = Arc<dyn Fn(&Value) -> Vec<QueryKey> + Send + Sync>;

/// Pure optimistic updater: previous value (None if absent) and variables
/// in, expected post-write value out.
pub type OptimisticUpdater = Arc<dyn Fn(Option<Value>, &Value) -> Value + Send + Sync>;

/// Called after rollback with the classified error and original variables.
pub type RollbackHook = Arc<dyn Fn(&MutationError, &Value) + Send + Sync>;

/// Called on confirmed success with the server data and original variables.
pub type SuccessHook = Arc<dyn Fn(&Value, &Value) + Send + Sync>;

// == Mutation Descriptor ==
/// Immutable description of one registered mutation type.
pub struct MutationDescriptor {
    pub(crate) mutation_fn: MutationFn,
    pub(crate) resolve_keys: KeyResolver,
    pub(crate) apply_optimistic: OptimisticUpdater,
    pub(crate) on_rollback: Option<RollbackHook>,
    pub(crate) on_success: Option<SuccessHook>,
    /// Additional keys invalidated when the write settles successfully
    pub(crate) invalidate_extra: Vec<QueryKey>,
}

// == Mutation Builder ==
/// Builder for [`MutationDescriptor`]; `register` binds it to a store and
/// policy and returns the executable handle.
///
/// ```
/// use std::sync::Arc;
/// use opticache::{MemoryStore, MutationBuilder, QueryKey};
/// use opticache::retry::RetryPolicy;
/// use serde_json::json;
///
/// let store = Arc::new(MemoryStore::new(300_000, 600_000));
/// let handle = MutationBuilder::new(|vars| async move { Ok(vars) })
///     .keys(|_| vec![QueryKey::from(["todos", "list"])])
///     .optimistic(|old, vars| {
///         let mut list = old.unwrap_or_else(|| json!([]));
///         list.as_array_mut().unwrap().push(vars.clone());
///         list
///     })
///     .register(store, RetryPolicy::default());
/// ```
pub struct MutationBuilder {
    mutation_fn: MutationFn,
    resolve_keys: Option<KeyResolver>,
    apply_optimistic: Option<OptimisticUpdater>,
    on_rollback: Option<RollbackHook>,
    on_success: Option<SuccessHook>,
    invalidate_extra: Vec<QueryKey>,
}

impl MutationBuilder {
    // == Constructor ==
    /// Starts a builder around the real write function.
    pub fn new<F, Fut>(mutation_fn: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Value, TransportError>> + Send + 'static,
    {
        Self {
            mutation_fn: Arc::new(move |vars| Box::pin(mutation_fn(vars))),
            resolve_keys: None,
            apply_optimistic: None,
            on_rollback: None,
            on_success: None,
            invalidate_extra: Vec::new(),
        }
    }

    // == Key Resolver ==
    /// Sets the target-key resolver. Required.
    pub fn keys<F>(mut self, resolve: F) -> Self
    where
        F: Fn(&Value) -> Vec<QueryKey> + Send + Sync + 'static,
    {
        self.resolve_keys = Some(Arc::new(resolve));
        self
    }

    /// Convenience resolver for mutations that always target one fixed key.
    pub fn fixed_key(self, key: QueryKey) -> Self {
        self.keys(move |_| vec![key.clone()])
    }

    // == Optimistic Updater ==
    /// Sets the optimistic updater. Required.
    pub fn optimistic<F>(mut self, update: F) -> Self
    where
        F: Fn(Option<Value>, &Value) -> Value + Send + Sync + 'static,
    {
        self.apply_optimistic = Some(Arc::new(update));
        self
    }

    /// Sets a prebuilt updater (used by the list/paginated families).
    pub fn optimistic_updater(mut self, update: OptimisticUpdater) -> Self {
        self.apply_optimistic = Some(update);
        self
    }

    // == Hooks ==
    /// Sets the rollback hook, run after the cache has been restored.
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

    // == Extra Invalidation ==
    /// Adds keys invalidated alongside the mutation's own keys on success.
    pub fn invalidate_also(mut self, keys: impl IntoIterator<Item = QueryKey>) -> Self {
        self.invalidate_extra.extend(keys);
        self
    }

    // == Register ==
    /// Finalizes the descriptor and binds it to a store and retry policy.
    ///
    /// # Panics
    /// Panics if the key resolver or optimistic updater was never set; a
    /// descriptor without either cannot uphold rollback guarantees.
    pub fn register(self, store: Arc<dyn CacheStore>, policy: RetryPolicy) -> MutationHandle {
        let descriptor = MutationDescriptor {
            mutation_fn: self.mutation_fn,
            resolve_keys: self
                .resolve_keys
                .expect("mutation registered without a key resolver"),
            apply_optimistic: self
                .apply_optimistic
                .expect("mutation registered without an optimistic updater"),
            on_rollback: self.on_rollback,
            on_success: self.on_success,
            invalidate_extra: self.invalidate_extra,
        };

        MutationHandle {
            descriptor: Arc::new(descriptor),
            store,
            policy,
        }
    }
}

// == Mutation Handle ==
/// Executable binding of a descriptor to a store and retry policy.
///
/// Cheap to clone; clones share the descriptor.
#[derive(Clone)]
pub struct MutationHandle {
    descriptor: Arc<MutationDescriptor>,
    store: Arc<dyn CacheStore>,
    policy: RetryPolicy,
}

impl MutationHandle {
    // == Execute ==
    /// Runs one optimistic invocation: cancel in-flight reads, snapshot,
    /// apply the optimistic update, perform the write, then commit
    /// (invalidate) or roll back.
    ///
    /// Concurrent invocations targeting the same key are not serialized: a
    /// second invocation may snapshot a value the first wrote optimistically,
    /// so its rollback restores that intermediate value. Callers needing
    /// serialization per logical action should go through
    /// [`DebouncedMutation`](crate::mutation::DebouncedMutation).
    pub async fn execute(&self, variables: Value) -> Result<Value> {
        controller::run_mutation(&*self.store, &self.policy, &self.descriptor, variables).await
    }

    /// The store this handle writes through.
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }
}
