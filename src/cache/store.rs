//! Cache Store Module
//!
//! Bounded value storage combining a HashMap with insertion-order tracking
//! and age-based expiry.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::{CacheEntry, InsertionOrder};

// == Removal Reason ==
/// Why an entry left the store during an insert or a purge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Evicted to make room, regardless of remaining lifetime
    Capacity,
    /// Physically dropped after its max age elapsed
    Expired,
}

// == Cache Store ==
/// Bounded store with FIFO eviction and lazy expiry.
///
/// `len() <= max_entries` holds after every insert. Expired entries may stay
/// physically present but are never returned by [`Store::get`].
#[derive(Debug)]
pub struct Store<K, V> {
    /// Key-value storage
    entries: HashMap<K, CacheEntry<V>>,
    /// Insertion order, oldest first
    order: InsertionOrder<K>,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Age at which an entry becomes logically absent
    max_age: Duration,
}

impl<K, V> Store<K, V>
where
    K: Eq + Hash + Clone,
{
    // == Constructor ==
    /// Creates a new Store with the given capacity and max age.
    ///
    /// Callers validate the parameters; see `SingleFlightCache::new`.
    pub fn new(max_entries: usize, max_age: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            max_entries,
            max_age,
        }
    }

    // == Get ==
    /// Returns the live value for `key` at `now`, if any.
    ///
    /// Never refreshes the entry's timestamp or its position in the order.
    pub fn get<Q>(&self, key: &Q, now: Instant) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(now, self.max_age))
            .map(|entry| &entry.value)
    }

    // == Insert ==
    /// Stores `value` under `key`, stamped with `now`.
    ///
    /// Replacing an existing key counts as a fresh insertion. When the store
    /// is full, expired entries at the front of the order are dropped first,
    /// then the oldest live entry is evicted.
    ///
    /// Returns every key removed to make room, with the reason.
    pub fn insert(&mut self, key: K, value: V, now: Instant) -> Vec<(K, Removal)> {
        let mut removed = Vec::new();

        if !self.entries.contains_key(&key) {
            // Entries share one max age, so the oldest are the first to expire
            while let Some(oldest) = self.order.peek_oldest() {
                let expired = self
                    .entries
                    .get(oldest)
                    .map_or(true, |entry| entry.is_expired(now, self.max_age));
                if !expired {
                    break;
                }
                if let Some(oldest) = self.order.pop_oldest() {
                    self.entries.remove(&oldest);
                    removed.push((oldest, Removal::Expired));
                }
            }

            while self.entries.len() >= self.max_entries {
                match self.order.pop_oldest() {
                    Some(oldest) => {
                        self.entries.remove(&oldest);
                        removed.push((oldest, Removal::Capacity));
                    }
                    None => break,
                }
            }
        }

        self.entries.insert(key.clone(), CacheEntry::new(value, now));
        self.order.record(key);

        removed
    }

    // == Remove ==
    /// Removes an entry by key. Returns true if an entry was present.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.entries.remove(key).is_some() {
            self.order.remove(key);
            true
        } else {
            false
        }
    }

    // == Purge Expired ==
    /// Removes all entries expired at `now` and returns their keys.
    pub fn purge_expired(&mut self, now: Instant) -> Vec<K> {
        let max_age = self.max_age;
        let expired_keys: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now, max_age))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
            self.order.remove(key);
        }

        expired_keys
    }

    // == Clear ==
    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    // == Length ==
    /// Returns the number of physically stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the configured capacity.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Returns the configured max age.
    pub fn max_age(&self) -> Duration {
        self.max_age
    }
}
