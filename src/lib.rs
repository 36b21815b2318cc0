//! Flight Cache - single-flight in-memory cache for expensive async producers
//!
//! Concurrent requests for the same missing key collapse into one producer
//! call. Entries are bounded by a FIFO capacity limit and expire after a
//! fixed max age.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheStats, Fetcher, SingleFlightCache};
pub use config::Config;
pub use error::CacheError;
pub use tasks::spawn_cleanup_task;
