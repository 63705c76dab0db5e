//! Invalidation Module
//!
//! Strategies for marking cached entries stale.

mod scheduler;

// Re-export public types
pub use scheduler::{InvalidationScheduler, InvalidationTask};
