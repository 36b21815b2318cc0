//! Lock Registry Module
//!
//! Per-key async locks serializing producer calls for one key at a time.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::Mutex;

/// Shared handle to one key's producer lock.
pub type KeyLock = Arc<Mutex<()>>;

// == Lock Registry ==
/// Maps keys to their producer locks.
///
/// Locks are created lazily. A lock object handed out to a caller stays valid
/// for that caller even if the registry later drops or replaces it.
#[derive(Debug)]
pub struct LockRegistry<K> {
    locks: HashMap<K, KeyLock>,
}

impl<K> Default for LockRegistry<K> {
    fn default() -> Self {
        Self {
            locks: HashMap::new(),
        }
    }
}

impl<K> LockRegistry<K>
where
    K: Eq + Hash + Clone,
{
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Lock For ==
    /// Returns the lock for `key`, creating it if needed.
    ///
    /// The boolean is true when a new lock was created.
    pub fn lock_for(&mut self, key: &K) -> (KeyLock, bool) {
        if let Some(lock) = self.locks.get(key) {
            return (Arc::clone(lock), false);
        }
        let lock = KeyLock::default();
        self.locks.insert(key.clone(), Arc::clone(&lock));
        (lock, true)
    }

    // == Release Idle ==
    /// Drops the locks of `keys` that no caller currently references.
    ///
    /// Must run under the registry guard: with the guard held, a strong count
    /// of one means nobody holds or waits on the lock and nobody can obtain it.
    pub fn release_idle<'a, I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        for key in keys {
            let idle = self
                .locks
                .get(key)
                .is_some_and(|lock| Arc::strong_count(lock) == 1);
            if idle {
                self.locks.remove(key);
            }
        }
    }

    // == Clear ==
    /// Forgets every lock. Callers already holding one keep using it.
    pub fn clear(&mut self) {
        self.locks.clear();
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    // == Is Empty ==
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
