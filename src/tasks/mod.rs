//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a cache is alive.
//!
//! # Tasks
//! - Expiry sweep: physically drops expired entries at configured intervals

mod cleanup;

pub use cleanup::spawn_cleanup_task;
