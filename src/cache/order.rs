//! Insertion Order Module
//!
//! Tracks the order in which keys were stored, for FIFO capacity eviction.

use std::borrow::Borrow;
use std::collections::VecDeque;

// == Insertion Order ==
/// Tracks insertion order of stored keys.
///
/// Keys are stored in a VecDeque where:
/// - Front = Oldest insertion
/// - Back = Newest insertion
///
/// Reads never reorder keys; only (re)insertion moves a key to the back.
#[derive(Debug)]
pub struct InsertionOrder<K> {
    /// Keys by insertion time
    order: VecDeque<K>,
}

impl<K> Default for InsertionOrder<K> {
    fn default() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }
}

impl<K: Eq> InsertionOrder<K> {
    // == Constructor ==
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record ==
    /// Marks a key as the newest insertion (moves to back).
    pub fn record(&mut self, key: K) {
        self.remove(&key);
        self.order.push_back(key);
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.order.retain(|k| k.borrow() != key);
    }

    // == Pop Oldest ==
    /// Returns and removes the oldest key, or None if empty.
    pub fn pop_oldest(&mut self) -> Option<K> {
        self.order.pop_front()
    }

    // == Peek Oldest ==
    /// Returns the oldest key without removing it.
    pub fn peek_oldest(&self) -> Option<&K> {
        self.order.front()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.order.clear();
    }

    // == Length ==
    /// Returns the number of tracked keys.
    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    // == Is Empty ==
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // == Contains ==
    /// Checks if a key is being tracked.
    #[allow(dead_code)]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.order.iter().any(|k| k.borrow() == key)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn order_of(keys: &[&str]) -> InsertionOrder<String> {
        let mut order = InsertionOrder::new();
        for key in keys {
            order.record(key.to_string());
        }
        order
    }

    #[test]
    fn test_order_default_without_eq_bound() {
        // Default needs no bound on the key type
        struct Opaque;
        let order: InsertionOrder<Opaque> = InsertionOrder::default();
        assert!(order.order.is_empty());
    }

    #[test]
    fn test_order_new() {
        let order: InsertionOrder<String> = InsertionOrder::new();
        assert!(order.is_empty());
        assert_eq!(order.len(), 0);
    }

    #[test]
    fn test_record_new_keys() {
        let order = order_of(&["key1", "key2", "key3"]);

        assert_eq!(order.len(), 3);
        // key1 is oldest (added first)
        assert_eq!(order.peek_oldest().map(String::as_str), Some("key1"));
    }

    #[test]
    fn test_rerecord_moves_to_back() {
        let mut order = order_of(&["key1", "key2", "key3"]);

        // Re-inserting key1 makes key2 the oldest
        order.record("key1".to_string());

        assert_eq!(order.len(), 3);
        assert_eq!(order.pop_oldest().as_deref(), Some("key2"));
        assert_eq!(order.pop_oldest().as_deref(), Some("key3"));
        assert_eq!(order.pop_oldest().as_deref(), Some("key1"));
    }

    #[test]
    fn test_pop_oldest_empty() {
        let mut order: InsertionOrder<String> = InsertionOrder::new();
        assert_eq!(order.pop_oldest(), None);
    }

    #[test]
    fn test_remove() {
        let mut order = order_of(&["key1", "key2", "key3"]);

        order.remove("key2");

        assert_eq!(order.len(), 2);
        assert!(!order.contains("key2"));
        assert!(order.contains("key1"));
        assert!(order.contains("key3"));
    }

    #[test]
    fn test_remove_nonexistent_key() {
        let mut order = order_of(&["key1", "key2"]);

        order.remove("nonexistent");

        assert_eq!(order.len(), 2);
    }

    #[test]
    fn test_record_same_key_multiple_times() {
        let mut order = order_of(&["key1", "key1", "key1"]);

        assert_eq!(order.len(), 1);
        assert_eq!(order.pop_oldest().as_deref(), Some("key1"));
        assert!(order.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut order = order_of(&["a", "b"]);
        order.clear();
        assert!(order.is_empty());
    }
}
