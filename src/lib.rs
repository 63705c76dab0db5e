//! Opticache - an optimistic mutation and cache-consistency engine
//!
//! Sits between application-triggered writes and a TTL-aware key/value
//! cache: optimistic updates with snapshot-based rollback, classified
//! retryable errors, cascading/conditional/prefix invalidation, debounced
//! coalescing, and priority-tiered prefetching.

pub mod config;
pub mod error;
pub mod invalidate;
pub mod mutation;
pub mod prefetch;
pub mod retry;
pub mod store;
pub mod tasks;

pub use config::EngineConfig;
pub use error::{ErrorKind, MutationError, TransportError};
pub use invalidate::{InvalidationScheduler, InvalidationTask};
pub use mutation::{
    BatchBuilder, BatchHandle, BatchUpdate, DebouncedMutation, MutationBuilder, MutationHandle,
};
pub use prefetch::{PrefetchPriority, PrefetchScheduler, PrefetchTask};
pub use retry::RetryPolicy;
pub use store::{CacheStore, MemoryStore, QueryKey};
pub use tasks::spawn_gc_task;
