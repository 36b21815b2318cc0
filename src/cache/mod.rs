//! Cache Module
//!
//! Single-flight, bounded, expiring cache for async producer results.

mod entry;
mod flight;
mod locks;
mod order;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use flight::{Fetcher, SingleFlightCache};
pub use stats::CacheStats;

pub(crate) use entry::CacheEntry;
pub(crate) use locks::LockRegistry;
pub(crate) use order::InsertionOrder;
pub(crate) use store::{Removal, Store};
