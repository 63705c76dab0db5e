//! Prefetch Module
//!
//! Priority-tiered cache warming.

mod scheduler;

// Re-export public types
pub use scheduler::{PrefetchPriority, PrefetchReport, PrefetchScheduler, PrefetchTask};
