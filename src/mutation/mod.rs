//! Mutation Module
//!
//! Optimistic write orchestration: registration surface, snapshot/rollback,
//! the single-key and batch controllers, list-shaped updater families, and
//! the debounce coalescer.

mod batch;
mod controller;
mod debounce;
mod descriptor;
mod list;
mod snapshot;

// Re-export public types
pub use batch::{BatchBuilder, BatchHandle, BatchUpdate};
pub use controller::Phase;
pub use debounce::{DebounceTicket, DebouncedMutation};
pub use descriptor::{
    KeyResolver, MutationBuilder, MutationDescriptor, MutationFn, MutationHandle,
    OptimisticUpdater, RollbackHook, SuccessHook,
};
pub use list::{list_updater, page_key, paginated_key_resolver, paginated_updater, ListOp};
pub use snapshot::Snapshot;
