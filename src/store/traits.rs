//! Cache Store Contract
//!
//! The interface the mutation engine consumes. Any store that implements it
//! can sit behind the controllers; [`MemoryStore`](super::MemoryStore) is the
//! bundled reference implementation.

use serde_json::Value;

use super::key::QueryKey;

// == Cache Store Trait ==
/// Key/value store with staleness tracking and best-effort read cancellation.
///
/// All mutating methods are synchronous: a value written through `set` or
/// `set_with` must be visible to any subsequent `get` before the call
/// returns. The engine relies on this for optimistic updates.
pub trait CacheStore: Send + Sync {
    /// Returns the current value for `key`, or None if absent.
    fn get(&self, key: &QueryKey) -> Option<Value>;

    /// Writes `value` under `key`, resetting staleness metadata.
    fn set(&self, key: &QueryKey, value: Value);

    /// Writes the result of `update` applied to the current value (None if
    /// the key is absent).
    fn set_with(&self, key: &QueryKey, update: &mut dyn FnMut(Option<Value>) -> Value);

    /// Removes the entry for `key`. Removing an absent key is a no-op.
    fn remove(&self, key: &QueryKey);

    /// Cancels any in-flight read for `key` so a stale response cannot land
    /// after an optimistic write.
    ///
    /// Best-effort and idempotent: cancelling a key with no in-flight read
    /// is a no-op, never an error.
    fn cancel_in_flight(&self, key: &QueryKey);

    /// Marks entries stale and eligible for refetch.
    ///
    /// With `exact` set, only the entry whose key equals `key` is marked.
    /// Otherwise every entry whose key starts with `key` is marked
    /// (partial-match invalidation).
    fn invalidate(&self, key: &QueryKey, exact: bool);

    /// Returns when the entry for `key` was last written (Unix ms), or None
    /// if absent. Conditional invalidation reads entry age through this.
    fn updated_at(&self, key: &QueryKey) -> Option<u64>;

    /// Returns true if the entry for `key` is stale (invalidated or past the
    /// store's staleness threshold). Absent keys are reported stale.
    fn is_stale(&self, key: &QueryKey) -> bool;
}
