//! Configuration Module
//!
//! Handles loading and managing engine configuration from environment
//! variables.

use std::env;

/// Engine configuration parameters.
///
/// All values can be configured via environment variables with sensible
/// defaults.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Age in milliseconds after which a cached entry is considered stale
    pub stale_time_ms: u64,
    /// Idle time in milliseconds after which an entry may be garbage collected
    pub gc_time_ms: u64,
    /// Default debounce window in milliseconds for coalesced mutations
    pub debounce_ms: u64,
    /// Page targeted by paginated mutations when no page variable is given
    pub default_page: u64,
    /// Base retry backoff delay in milliseconds
    pub retry_base_delay_ms: u64,
    /// Retry backoff ceiling in milliseconds
    pub retry_max_delay_ms: u64,
    /// Background GC sweep interval in seconds
    pub gc_interval_secs: u64,
}

impl EngineConfig {
    /// Creates a new EngineConfig by loading values from environment
    /// variables.
    ///
    /// # Environment Variables
    /// - `STALE_TIME_MS` - Staleness threshold (default: 300000)
    /// - `GC_TIME_MS` - GC idle threshold (default: 600000)
    /// - `DEBOUNCE_MS` - Default debounce window (default: 500)
    /// - `DEFAULT_PAGE` - Default paginated target page (default: 1)
    /// - `RETRY_BASE_DELAY_MS` - Base backoff delay (default: 1000)
    /// - `RETRY_MAX_DELAY_MS` - Backoff ceiling (default: 30000)
    /// - `GC_INTERVAL` - Sweep frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        Self {
            stale_time_ms: read_env("STALE_TIME_MS", 300_000),
            gc_time_ms: read_env("GC_TIME_MS", 600_000),
            debounce_ms: read_env("DEBOUNCE_MS", 500),
            default_page: read_env("DEFAULT_PAGE", 1),
            retry_base_delay_ms: read_env("RETRY_BASE_DELAY_MS", 1_000),
            retry_max_delay_ms: read_env("RETRY_MAX_DELAY_MS", 30_000),
            gc_interval_secs: read_env("GC_INTERVAL", 60),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stale_time_ms: 300_000,
            gc_time_ms: 600_000,
            debounce_ms: 500,
            default_page: 1,
            retry_base_delay_ms: 1_000,
            retry_max_delay_ms: 30_000,
            gc_interval_secs: 60,
        }
    }
}

fn read_env(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
