//! Cache Entry Module
//!
//! Defines a single memoized value and the time it was produced.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// A value stored by a successful producer call.
///
/// Entries are replaced, never mutated, when a key is refreshed.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// When the producer result was stored
    pub inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry stamped with `inserted_at`.
    pub fn new(value: V, inserted_at: Instant) -> Self {
        Self { value, inserted_at }
    }

    // == Age ==
    /// Returns how long the entry has existed at `now`.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.inserted_at)
    }

    // == Is Expired ==
    /// Checks if the entry is logically absent at `now`.
    ///
    /// Boundary condition: an entry whose age equals `max_age` is expired.
    pub fn is_expired(&self, now: Instant, max_age: Duration) -> bool {
        self.age(now) >= max_age
    }
}
