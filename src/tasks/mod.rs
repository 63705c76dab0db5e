//! Background Tasks Module
//!
//! Contains background tasks that run alongside the engine.
//!
//! # Tasks
//! - GC sweep: removes idle store entries at configured intervals

mod gc;

pub use gc::spawn_gc_task;
