//! Store Entry Module
//!
//! Defines the structure of individual cache entries with staleness metadata.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

// == Store Entry ==
/// A single cached value with its staleness and garbage-collection metadata.
#[derive(Debug, Clone)]
pub struct StoreEntry {
    /// The cached value
    pub value: Value,
    /// When the value was last written (Unix milliseconds)
    pub updated_at: u64,
    /// When the entry was last read or written (Unix milliseconds)
    pub last_access: u64,
    /// Explicit staleness mark set by invalidation
    pub invalidated: bool,
}

impl StoreEntry {
    // == Constructor ==
    /// Creates a fresh entry for a just-written value.
    pub fn new(value: Value) -> Self {
        let now = current_timestamp_ms();
        Self {
            value,
            updated_at: now,
            last_access: now,
            invalidated: false,
        }
    }

    // == Touch ==
    /// Records an access without changing the value.
    pub fn touch(&mut self) {
        self.last_access = current_timestamp_ms();
    }

    // == Replace ==
    /// Replaces the value, resetting staleness metadata.
    pub fn replace(&mut self, value: Value) {
        let now = current_timestamp_ms();
        self.value = value;
        self.updated_at = now;
        self.last_access = now;
        self.invalidated = false;
    }

    // == Age ==
    /// Milliseconds elapsed since the value was last written.
    pub fn age_ms(&self) -> u64 {
        current_timestamp_ms().saturating_sub(self.updated_at)
    }

    // == Is Stale ==
    /// Checks whether the entry is stale.
    ///
    /// An entry is stale once it has been explicitly invalidated, or once
    /// its age reaches the staleness threshold. The boundary is inclusive:
    /// an entry exactly `stale_time_ms` old counts as stale.
    pub fn is_stale(&self, stale_time_ms: u64) -> bool {
        self.invalidated || self.age_ms() >= stale_time_ms
    }

    // == Is Expired ==
    /// Checks whether the entry is eligible for garbage collection.
    ///
    /// Eligibility is based on the last access, not the last write, so an
    /// entry that is still being read stays resident even when stale.
    pub fn is_expired(&self, gc_time_ms: u64) -> bool {
        current_timestamp_ms().saturating_sub(self.last_access) >= gc_time_ms
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
