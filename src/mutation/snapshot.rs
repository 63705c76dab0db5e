//! Snapshot Module
//!
//! Captures cache state before an optimistic update and restores it on
//! failure. One snapshot belongs to exactly one mutation invocation.

use std::collections::HashSet;

use serde_json::Value;

use crate::store::{CacheStore, QueryKey};

// == Snapshot ==
/// Pre-mutation values for every key one invocation touches.
///
/// Absent keys are recorded as `None` and re-removed on restore, so a
/// rollback returns the cache to exactly the observed prior state.
///
/// Restoring consumes the snapshot; a snapshot that is dropped instead was
/// committed and its captured values are discarded. There is no way to
/// restore a key set other than the one captured.
#[derive(Debug)]
pub struct Snapshot {
    entries: Vec<(QueryKey, Option<Value>)>,
}

impl Snapshot {
    // == Capture ==
    /// Reads the current value for each key through the store.
    ///
    /// # Panics
    /// Panics if `keys` contains duplicates. A duplicate would make restore
    /// order-dependent, which is a programmer error in the key resolver.
    pub fn capture(store: &dyn CacheStore, keys: &[QueryKey]) -> Self {
        let mut seen = HashSet::with_capacity(keys.len());
        for key in keys {
            if !seen.insert(key) {
                panic!("duplicate key in snapshot capture: {}", key);
            }
        }

        let entries = keys
            .iter()
            .map(|key| (key.clone(), store.get(key)))
            .collect();

        Self { entries }
    }

    // == Restore ==
    /// Writes back exactly the captured values, re-removing keys that were
    /// absent at capture time.
    pub fn restore(self, store: &dyn CacheStore) {
        for (key, prior) in self.entries {
            match prior {
                Some(value) => store.set(&key, value),
                None => store.remove(&key),
            }
        }
    }

    // == Accessors ==
    /// Returns the keys captured by this snapshot, in capture order.
    pub fn keys(&self) -> impl Iterator<Item = &QueryKey> {
        self.entries.iter().map(|(key, _)| key)
    }

    /// Returns the number of captured keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no keys were captured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
