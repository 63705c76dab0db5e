//! Retry Policy Module
//!
//! Deterministic retry decisions and backoff delays. The policy never
//! sleeps; controllers own the actual rescheduling.

use std::time::Duration;

use crate::config::EngineConfig;
use crate::error::ErrorKind;

// == Retry Policy ==
/// Decides whether a failed attempt should be retried and how long to wait.
///
/// Queries retry up to three times for transient kinds with exponential
/// backoff; mutations retry once, only for network failures, with a fixed
/// delay. Attempt counters are zero-based: attempt 0 is the first failure.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum retries for query-style fetches
    max_query_retries: u32,
    /// Maximum retries for mutations
    max_mutation_retries: u32,
    /// Base backoff delay in milliseconds
    base_delay_ms: u64,
    /// Backoff ceiling in milliseconds
    max_delay_ms: u64,
}

impl RetryPolicy {
    // == Constructor ==
    /// Creates a policy with explicit backoff bounds.
    ///
    /// # Arguments
    /// * `base_delay_ms` - First-retry delay, doubled on each later attempt
    /// * `max_delay_ms` - Ceiling the exponential backoff never exceeds
    pub fn new(base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_query_retries: 3,
            max_mutation_retries: 1,
            base_delay_ms,
            max_delay_ms,
        }
    }

    /// Creates a policy from engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.retry_base_delay_ms, config.retry_max_delay_ms)
    }

    // == Should Retry (query) ==
    /// Decides whether a failed query attempt should be retried.
    ///
    /// Only transient kinds (Network, ServerFault) retry, and only while
    /// fewer than three attempts have failed.
    pub fn should_retry_query(&self, attempt: u32, kind: ErrorKind) -> bool {
        attempt < self.max_query_retries
            && matches!(kind, ErrorKind::Network | ErrorKind::ServerFault)
    }

    // == Should Retry (mutation) ==
    /// Decides whether a failed mutation attempt should be retried.
    ///
    /// Mutations are not idempotent from the engine's point of view, so only
    /// a single retry is allowed and only for network failures.
    pub fn should_retry_mutation(&self, attempt: u32, kind: ErrorKind) -> bool {
        attempt < self.max_mutation_retries && kind == ErrorKind::Network
    }

    // == Query Backoff ==
    /// Returns the delay before retrying a query: `base * 2^attempt`,
    /// capped at the configured ceiling.
    pub fn query_backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        let delay = self.base_delay_ms.saturating_mul(factor);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }

    // == Mutation Backoff ==
    /// Returns the fixed delay before the single mutation retry.
    pub fn mutation_backoff(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1_000, 30_000)
    }
}
