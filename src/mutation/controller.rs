//! Optimistic Mutation Controller
//!
//! Drives one logical write through its phases: cancel in-flight reads,
//! snapshot, optimistic apply, write (with retries), then commit or roll
//! back. Every invocation reaches a terminal phase.

use std::fmt;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{MutationError, Result};
use crate::mutation::descriptor::MutationDescriptor;
use crate::mutation::snapshot::Snapshot;
use crate::retry::{classify, RetryPolicy};
use crate::store::CacheStore;

// == Phase ==
/// Lifecycle phase of one mutation invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Cancelling,
    Snapshotted,
    OptimisticallyApplied,
    Writing,
    Committed,
    RolledBack,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Cancelling => "cancelling",
            Phase::Snapshotted => "snapshotted",
            Phase::OptimisticallyApplied => "optimistically-applied",
            Phase::Writing => "writing",
            Phase::Committed => "committed",
            Phase::RolledBack => "rolled-back",
        };
        write!(f, "{}", name)
    }
}

// == Run Mutation ==
/// Executes one invocation of `descriptor` with `variables`.
///
/// The optimistic value is visible to readers before the first await on the
/// write call: cancel, snapshot, and apply are all synchronous. On retry the
/// optimistic value stays in place and only the write re-runs; the snapshot
/// captured before the first attempt remains the rollback target.
pub(crate) async fn run_mutation(
    store: &dyn CacheStore,
    policy: &RetryPolicy,
    descriptor: &MutationDescriptor,
    variables: Value,
) -> Result<Value> {
    let keys = (descriptor.resolve_keys)(&variables);
    debug!(phase = %Phase::Cancelling, "mutation targets {} key(s)", keys.len());
    for key in &keys {
        store.cancel_in_flight(key);
    }

    let snapshot = Snapshot::capture(store, &keys);
    debug!(phase = %Phase::Snapshotted, "captured {} prior value(s)", snapshot.len());

    for key in &keys {
        store.set_with(key, &mut |old| (descriptor.apply_optimistic)(old, &variables));
    }
    debug!(phase = %Phase::OptimisticallyApplied, "optimistic value applied");

    let mut attempt: u32 = 0;
    let error = loop {
        debug!(phase = %Phase::Writing, attempt, "invoking write");
        match (descriptor.mutation_fn)(variables.clone()).await {
            Ok(data) => {
                if let Some(hook) = &descriptor.on_success {
                    hook(&data, &variables);
                }
                for key in keys.iter().chain(descriptor.invalidate_extra.iter()) {
                    store.invalidate(key, true);
                }
                debug!(phase = %Phase::Committed, attempt, "write confirmed");
                return Ok(data);
            }
            Err(source) => {
                let kind = classify(&source);
                if policy.should_retry_mutation(attempt, kind) {
                    debug!(
                        attempt,
                        ?kind,
                        "write failed, retrying after {:?}",
                        policy.mutation_backoff()
                    );
                    attempt += 1;
                    tokio::time::sleep(policy.mutation_backoff()).await;
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
    warn!(phase = %Phase::RolledBack, kind = ?error.kind, "write failed, cache restored");
    if let Some(hook) = &descriptor.on_rollback {
        hook(&error, &variables);
    }
    Err(error)
}
