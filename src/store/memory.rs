//! Memory Store Module
//!
//! Reference in-memory implementation of the [`CacheStore`] contract with
//! staleness tracking, prefix invalidation, and garbage collection.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};

use serde_json::Value;
use tracing::debug;

use crate::config::EngineConfig;
use crate::store::{CacheStore, QueryKey, StoreEntry, StoreStats};

// == Memory Store ==
/// In-memory key/value store backing the engine by default.
///
/// Interior locking keeps every contract method synchronous, so an
/// optimistic write is visible to readers as soon as `set` returns. Locks
/// are never held across an await point; the store itself has no async
/// surface.
#[derive(Debug)]
pub struct MemoryStore {
    /// Key-value storage
    entries: RwLock<HashMap<QueryKey, StoreEntry>>,
    /// Keys with a registered in-flight read
    in_flight: Mutex<HashSet<QueryKey>>,
    /// Activity statistics
    stats: Mutex<StoreStats>,
    /// Age at which an entry is considered stale (milliseconds)
    stale_time_ms: u64,
    /// Idle time after which an entry may be garbage collected (milliseconds)
    gc_time_ms: u64,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates a new MemoryStore with the given staleness and GC thresholds.
    ///
    /// # Arguments
    /// * `stale_time_ms` - Age in milliseconds after which entries are stale
    /// * `gc_time_ms` - Idle time in milliseconds after which entries are swept
    pub fn new(stale_time_ms: u64, gc_time_ms: u64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
            stats: Mutex::new(StoreStats::new()),
            stale_time_ms,
            gc_time_ms,
        }
    }

    /// Creates a new MemoryStore from engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.stale_time_ms, config.gc_time_ms)
    }

    // == In-Flight Tracking ==
    /// Registers an in-flight read for `key`.
    ///
    /// The transport calls this when it starts a fetch; a later
    /// `cancel_in_flight` for the same key counts as a cancellation.
    pub fn begin_in_flight(&self, key: &QueryKey) {
        self.in_flight.lock().unwrap().insert(key.clone());
    }

    /// Clears the in-flight mark for `key` after a fetch settles.
    pub fn end_in_flight(&self, key: &QueryKey) {
        self.in_flight.lock().unwrap().remove(key);
    }

    /// Returns true if `key` currently has a registered in-flight read.
    pub fn has_in_flight(&self, key: &QueryKey) -> bool {
        self.in_flight.lock().unwrap().contains(key)
    }

    // == Sweep Expired ==
    /// Removes all entries idle past the GC threshold.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&self) -> usize {
        let mut entries = self.entries.write().unwrap();
        let expired_keys: Vec<QueryKey> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(self.gc_time_ms))
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in expired_keys {
            entries.remove(&key);
        }

        let mut stats = self.stats.lock().unwrap();
        stats.record_swept(count as u64);
        stats.set_total_entries(entries.len());

        count
    }

    // == Stats ==
    /// Returns a snapshot of current store statistics.
    pub fn stats(&self) -> StoreStats {
        let mut stats = self.stats.lock().unwrap().clone();
        stats.set_total_entries(self.entries.read().unwrap().len());
        stats.captured_at = chrono::Utc::now().to_rfc3339();
        stats
    }

    // == Length ==
    /// Returns the current number of entries in the store.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    // == Is Empty ==
    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &QueryKey) -> Option<Value> {
        let mut entries = self.entries.write().unwrap();
        let mut stats = self.stats.lock().unwrap();

        match entries.get_mut(key) {
            Some(entry) => {
                entry.touch();
                stats.record_hit();
                Some(entry.value.clone())
            }
            None => {
                stats.record_miss();
                None
            }
        }
    }

    fn set(&self, key: &QueryKey, value: Value) {
        let mut entries = self.entries.write().unwrap();
        match entries.get_mut(key) {
            Some(entry) => entry.replace(value),
            None => {
                entries.insert(key.clone(), StoreEntry::new(value));
            }
        }
        let len = entries.len();
        self.stats.lock().unwrap().set_total_entries(len);
    }

    fn set_with(&self, key: &QueryKey, update: &mut dyn FnMut(Option<Value>) -> Value) {
        let mut entries = self.entries.write().unwrap();
        let old = entries.get(key).map(|entry| entry.value.clone());
        let new = update(old);
        match entries.get_mut(key) {
            Some(entry) => entry.replace(new),
            None => {
                entries.insert(key.clone(), StoreEntry::new(new));
            }
        }
        let len = entries.len();
        self.stats.lock().unwrap().set_total_entries(len);
    }

    fn remove(&self, key: &QueryKey) {
        let mut entries = self.entries.write().unwrap();
        entries.remove(key);
        let len = entries.len();
        self.stats.lock().unwrap().set_total_entries(len);
    }

    fn cancel_in_flight(&self, key: &QueryKey) {
        // No-op unless a read is actually registered for the key
        if self.in_flight.lock().unwrap().remove(key) {
            self.stats.lock().unwrap().record_cancellation();
            debug!("cancelled in-flight read for {}", key);
        }
    }

    fn invalidate(&self, key: &QueryKey, exact: bool) {
        let mut entries = self.entries.write().unwrap();
        let mut marked: u64 = 0;

        if exact {
            if let Some(entry) = entries.get_mut(key) {
                if !entry.invalidated {
                    entry.invalidated = true;
                    marked = 1;
                }
            }
        } else {
            for (entry_key, entry) in entries.iter_mut() {
                if entry_key.starts_with(key) && !entry.invalidated {
                    entry.invalidated = true;
                    marked += 1;
                }
            }
        }

        if marked > 0 {
            self.stats.lock().unwrap().record_invalidations(marked);
            debug!("invalidated {} entries under {}", marked, key);
        }
    }

    fn updated_at(&self, key: &QueryKey) -> Option<u64> {
        self.entries
            .read()
            .unwrap()
            .get(key)
            .map(|entry| entry.updated_at)
    }

    fn is_stale(&self, key: &QueryKey) -> bool {
        match self.entries.read().unwrap().get(key) {
            Some(entry) => entry.is_stale(self.stale_time_ms),
            None => true,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;
    use std::time::Duration;

    fn test_store() -> MemoryStore {
        MemoryStore::new(60_000, 120_000)
    }

    #[test]
    fn test_set_and_get() {
        let store = test_store();
        let key = QueryKey::from(["todos", "list"]);

        store.set(&key, json!([1, 2]));

        assert_eq!(store.get(&key), Some(json!([1, 2])));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_absent() {
        let store = test_store();
        assert_eq!(store.get(&QueryKey::root("missing")), None);
    }

    #[test]
    fn test_set_with_updater_sees_old_value() {
        let store = test_store();
        let key = QueryKey::root("counter");
        store.set(&key, json!(1));

        store.set_with(&key, &mut |old| {
            json!(old.unwrap().as_i64().unwrap() + 1)
        });

        assert_eq!(store.get(&key), Some(json!(2)));
    }

    #[test]
    fn test_set_with_updater_on_absent_key() {
        let store = test_store();
        let key = QueryKey::root("fresh");

        store.set_with(&key, &mut |old| {
            assert!(old.is_none());
            json!("created")
        });

        assert_eq!(store.get(&key), Some(json!("created")));
    }

    #[test]
    fn test_remove() {
        let store = test_store();
        let key = QueryKey::root("gone");
        store.set(&key, json!(1));

        store.remove(&key);

        assert_eq!(store.get(&key), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let store = test_store();
        store.remove(&QueryKey::root("never"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_exact_invalidation_marks_stale() {
        let store = test_store();
        let key = QueryKey::from(["todos", "list"]);
        store.set(&key, json!([]));
        assert!(!store.is_stale(&key));

        store.invalidate(&key, true);

        assert!(store.is_stale(&key));
        // Value remains readable while stale
        assert_eq!(store.get(&key), Some(json!([])));
    }

    #[test]
    fn test_exact_invalidation_does_not_touch_prefix_matches() {
        let store = test_store();
        let parent = QueryKey::root("todos");
        let child = QueryKey::from(["todos", "list"]);
        store.set(&parent, json!(1));
        store.set(&child, json!(2));

        store.invalidate(&parent, true);

        assert!(store.is_stale(&parent));
        assert!(!store.is_stale(&child));
    }

    #[test]
    fn test_prefix_invalidation() {
        let store = test_store();
        let todos_list = QueryKey::from(["todos", "list"]);
        let todos_page = QueryKey::from(["todos", "page"]).join(1u64);
        let posts = QueryKey::from(["posts", "list"]);
        store.set(&todos_list, json!([]));
        store.set(&todos_page, json!([]));
        store.set(&posts, json!([]));

        store.invalidate(&QueryKey::root("todos"), false);

        assert!(store.is_stale(&todos_list));
        assert!(store.is_stale(&todos_page));
        assert!(!store.is_stale(&posts));
    }

    #[test]
    fn test_absent_key_reported_stale() {
        let store = test_store();
        assert!(store.is_stale(&QueryKey::root("missing")));
    }

    #[test]
    fn test_write_clears_staleness() {
        let store = test_store();
        let key = QueryKey::root("todos");
        store.set(&key, json!(1));
        store.invalidate(&key, true);
        assert!(store.is_stale(&key));

        store.set(&key, json!(2));

        assert!(!store.is_stale(&key));
    }

    #[test]
    fn test_cancel_without_in_flight_is_noop() {
        let store = test_store();
        let key = QueryKey::root("idle");

        store.cancel_in_flight(&key);
        store.cancel_in_flight(&key);

        assert_eq!(store.stats().cancellations, 0);
    }

    #[test]
    fn test_cancel_clears_registered_read() {
        let store = test_store();
        let key = QueryKey::root("busy");
        store.begin_in_flight(&key);
        assert!(store.has_in_flight(&key));

        store.cancel_in_flight(&key);

        assert!(!store.has_in_flight(&key));
        assert_eq!(store.stats().cancellations, 1);

        // Second cancel finds nothing
        store.cancel_in_flight(&key);
        assert_eq!(store.stats().cancellations, 1);
    }

    #[test]
    fn test_updated_at_reported() {
        let store = test_store();
        let key = QueryKey::root("todos");
        assert_eq!(store.updated_at(&key), None);

        store.set(&key, json!(1));

        assert!(store.updated_at(&key).is_some());
    }

    #[test]
    fn test_sweep_expired_removes_idle_entries() {
        let store = MemoryStore::new(60_000, 20);
        let idle = QueryKey::root("idle");
        let busy = QueryKey::root("busy");
        store.set(&idle, json!(1));
        store.set(&busy, json!(2));

        sleep(Duration::from_millis(30));
        // Touch one entry so only the idle one is eligible
        store.get(&busy);

        let removed = store.sweep_expired();

        assert_eq!(removed, 1);
        assert_eq!(store.get(&idle), None);
        assert_eq!(store.get(&busy), Some(json!(2)));
    }

    #[test]
    fn test_stats_tracking() {
        let store = test_store();
        let key = QueryKey::root("k");
        store.set(&key, json!(1));
        store.get(&key); // hit
        store.get(&QueryKey::root("missing")); // miss
        store.invalidate(&key, true);

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.invalidations, 1);
        assert_eq!(stats.total_entries, 1);
        assert!(!stats.captured_at.is_empty());
    }
}
