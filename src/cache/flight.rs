//! Single-Flight Cache Module
//!
//! Memoizes results of expensive async producers. Concurrent misses for the
//! same key collapse into one producer call; distinct keys never wait on
//! each other.

use std::borrow::Borrow;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::cache::stats::StatsCounters;
use crate::cache::{CacheStats, LockRegistry, Removal, Store};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Fetcher ==
/// A producer that knows its own cache key.
///
/// Lets call sites pass one object instead of a key and a closure, see
/// [`SingleFlightCache::fetch`].
pub trait Fetcher {
    type Key;
    type Value;
    type Error;

    /// Key the produced value is cached under.
    fn key(&self) -> Self::Key;

    /// Produces the value. Must be idempotent: the cache may call it again
    /// after expiry, eviction or a failed attempt.
    fn fetch(
        &self,
    ) -> impl Future<Output = std::result::Result<Self::Value, Self::Error>> + Send;
}

// == Single-Flight Cache ==
/// Concurrency-safe, bounded, expiring cache for async producer results.
///
/// - At most one producer call per key runs at a time.
/// - Producer errors go back to the caller that invoked the producer and are
///   never cached.
/// - Values are handed out as clones, so callers never alias cached state.
///
/// The registry guard (`locks`) and the store lock are only ever held over
/// synchronous code, never across an `.await`.
pub struct SingleFlightCache<K, V> {
    /// Memoized values
    store: RwLock<Store<K, V>>,
    /// Per-key producer locks, behind the registry guard
    locks: Mutex<LockRegistry<K>>,
    /// Bumped by `clear`; results fetched under an older generation are not stored
    generation: AtomicU64,
    /// Performance counters
    stats: StatsCounters,
}

impl<K, V> fmt::Debug for SingleFlightCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleFlightCache")
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<K, V> SingleFlightCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
{
    // == Constructor ==
    /// Creates a cache holding at most `max_entries` values, each visible for
    /// `max_age` after it was produced.
    ///
    /// # Errors
    /// - [`CacheError::InvalidCapacity`] if `max_entries` is 0
    /// - [`CacheError::InvalidMaxAge`] if `max_age` is zero
    pub fn new(max_entries: usize, max_age: Duration) -> Result<Self> {
        if max_entries == 0 {
            return Err(CacheError::InvalidCapacity(max_entries));
        }
        if max_age.is_zero() {
            return Err(CacheError::InvalidMaxAge(
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            store: RwLock::new(Store::new(max_entries, max_age)),
            locks: Mutex::new(LockRegistry::new()),
            generation: AtomicU64::new(0),
            stats: StatsCounters::default(),
        })
    }

    /// Creates a cache from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.max_entries, config.max_age()?)
    }

    // == Get Or Fetch ==
    /// Returns the cached value for `key`, or calls `producer` to create it.
    ///
    /// Concurrent callers for the same missing key wait for the first one;
    /// once it stores its value they return a copy of it without calling
    /// their own producer. If the first caller's producer fails, the error
    /// goes to that caller only and the next waiter calls its own producer.
    ///
    /// Dropping the returned future at any point releases the key's lock.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        key: K,
        producer: F,
    ) -> std::result::Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
    {
        if let Some(value) = self.lookup(&key) {
            self.stats.record_hit();
            trace!("Cache hit for {:?}", key);
            return Ok(value);
        }
        self.stats.record_miss();

        // A lock obtained before a `clear` no longer excludes callers holding
        // the post-clear lock, so a waiter that sees the generation move on
        // goes back to the registry instead of fetching under the old one.
        let (_guard, generation) = loop {
            let (key_lock, generation) = {
                let mut registry = self.locks.lock();
                let (key_lock, created) = registry.lock_for(&key);
                if created {
                    debug!("Created lock for key {:?}", key);
                }
                (key_lock, self.generation.load(Ordering::Relaxed))
            };

            let guard = key_lock.lock_owned().await;
            if self.generation.load(Ordering::Relaxed) == generation {
                break (guard, generation);
            }
            debug!("Cache cleared while waiting on {:?}, retrying", key);
        };

        // Another caller may have stored the value while we waited
        if let Some(value) = self.lookup(&key) {
            self.stats.record_coalesced();
            debug!("Cache filled for {:?} while waiting on its lock", key);
            return Ok(value);
        }

        self.stats.record_fetch();
        debug!("Invoking producer for {:?}", key);
        let value = match producer().await {
            Ok(value) => value,
            Err(err) => {
                self.stats.record_fetch_failure();
                warn!("Producer for {:?} failed, nothing cached", key);
                return Err(err);
            }
        };

        let removed = {
            let mut store = self.store.write();
            // `clear` bumps the generation under this same write lock
            if self.generation.load(Ordering::Relaxed) == generation {
                Some(store.insert(key.clone(), value.clone(), Instant::now()))
            } else {
                None
            }
        };

        match removed {
            Some(removed) => self.release_removed(removed),
            None => {
                self.stats.record_stale_discard();
                debug!("Cache cleared while fetching {:?}, result not stored", key);
            }
        }

        Ok(value)
    }

    // == Fetch ==
    /// Like [`get_or_fetch`](Self::get_or_fetch), keyed by the fetcher itself.
    pub async fn fetch<P>(&self, fetcher: &P) -> std::result::Result<V, P::Error>
    where
        P: Fetcher<Key = K, Value = V>,
    {
        self.get_or_fetch(fetcher.key(), || fetcher.fetch()).await
    }

    // == Get ==
    /// Returns a copy of the live value for `key` without ever fetching.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let value = self.lookup(key);
        if value.is_some() {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }
        value
    }

    // == Invalidate ==
    /// Removes the entry for `key`. Returns true if one was present.
    ///
    /// Leaves the key's lock alone; fetches already in flight finish normally.
    pub fn invalidate<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        let removed = self.store.write().remove(key);
        if removed {
            self.stats.record_invalidation();
            debug!("Invalidated {:?}", key);
        }
        removed
    }

    // == Clear ==
    /// Empties the store and the lock registry.
    ///
    /// Fetches in flight keep their old lock and still return their value to
    /// their caller, but do not store it. New callers get fresh locks, and
    /// callers still queued on an old lock move over to the fresh one, so at
    /// most one old and one new producer call for the same key overlap.
    pub fn clear(&self) {
        let mut registry = self.locks.lock();
        let mut store = self.store.write();
        store.clear();
        registry.clear();
        self.generation.fetch_add(1, Ordering::Relaxed);
        debug!("Cache cleared");
    }

    // == Purge Expired ==
    /// Physically removes expired entries and returns how many were dropped.
    ///
    /// Expired entries are already invisible to readers; this only frees them.
    pub fn purge_expired(&self) -> usize {
        let expired = self.store.write().purge_expired(Instant::now());
        let count = expired.len();
        if count > 0 {
            self.stats.record_expirations(count as u64);
            self.locks.lock().release_idle(&expired);
        }
        count
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.len(), self.lock_count())
    }

    // == Length ==
    /// Returns the number of physically stored entries, including expired
    /// ones not purged yet.
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    /// Returns the number of per-key locks in the registry.
    pub fn lock_count(&self) -> usize {
        self.locks.lock().len()
    }

    /// Returns how many times the cache has been cleared.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }

    /// Returns the configured capacity.
    pub fn max_entries(&self) -> usize {
        self.store.read().max_entries()
    }

    /// Returns the configured max age.
    pub fn max_age(&self) -> Duration {
        self.store.read().max_age()
    }

    fn lookup<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.read().get(key, Instant::now()).cloned()
    }

    /// Records entries pushed out by an insert and drops their idle locks.
    fn release_removed(&self, removed: Vec<(K, Removal)>) {
        if removed.is_empty() {
            return;
        }

        let mut evicted = 0;
        let mut expired = 0;
        for (key, reason) in &removed {
            match reason {
                Removal::Capacity => {
                    evicted += 1;
                    debug!("Evicted {:?} to stay within capacity", key);
                }
                Removal::Expired => expired += 1,
            }
        }
        self.stats.record_evictions(evicted);
        self.stats.record_expirations(expired);

        self.locks
            .lock()
            .release_idle(removed.iter().map(|(key, _)| key));
    }
}
