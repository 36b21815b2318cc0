//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check store invariants and single-flight behavior over
//! generated inputs.

use proptest::prelude::*;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::{SingleFlightCache, Store};

// == Test Configuration ==
const TEST_MAX_AGE: Duration = Duration::from_secs(300);

// == Strategies ==
/// Generates cache keys from a small alphabet so collisions are common
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,2}".prop_map(|s| s)
}

/// Generates cache values
fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..32)
}

#[derive(Debug, Clone)]
enum StoreOp {
    Insert { key: String, value: Vec<u8> },
    Remove { key: String },
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        3 => (key_strategy(), value_strategy())
            .prop_map(|(key, value)| StoreOp::Insert { key, value }),
        1 => key_strategy().prop_map(|key| StoreOp::Remove { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // **Capacity Enforcement**
    // For any sequence of inserts and removals, the store never holds more
    // than `max_entries` entries.
    #[test]
    fn prop_capacity_enforcement(
        max_entries in 1usize..8,
        ops in prop::collection::vec(store_op_strategy(), 1..60)
    ) {
        let mut store = Store::new(max_entries, TEST_MAX_AGE);
        let now = Instant::now();

        for op in ops {
            match op {
                StoreOp::Insert { key, value } => {
                    store.insert(key, value, now);
                }
                StoreOp::Remove { key } => {
                    store.remove(&key);
                }
            }
            prop_assert!(store.len() <= max_entries, "Store exceeded capacity");
        }
    }

    // **FIFO Eviction Order**
    // The store holds exactly the keys a simple insertion-order model keeps:
    // re-inserting moves a key to the back, a full store drops the front.
    #[test]
    fn prop_fifo_matches_model(
        max_entries in 1usize..6,
        ops in prop::collection::vec(store_op_strategy(), 1..60)
    ) {
        let mut store = Store::new(max_entries, TEST_MAX_AGE);
        let mut model: VecDeque<String> = VecDeque::new();
        let now = Instant::now();

        for op in ops {
            match op {
                StoreOp::Insert { key, value } => {
                    if let Some(pos) = model.iter().position(|k| *k == key) {
                        model.remove(pos);
                    } else if model.len() >= max_entries {
                        model.pop_front();
                    }
                    model.push_back(key.clone());
                    store.insert(key, value, now);
                }
                StoreOp::Remove { key } => {
                    model.retain(|k| *k != key);
                    store.remove(&key);
                }
            }
        }

        prop_assert_eq!(store.len(), model.len());
        for key in &model {
            prop_assert!(store.get(key, now).is_some(), "Model key {} missing", key);
        }
    }

    // **Round-trip and Copy Isolation**
    // A fetched value reads back equal, and mutating a returned copy never
    // changes what the cache hands out next.
    #[test]
    fn prop_roundtrip_and_isolation(key in key_strategy(), value in value_strategy()) {
        let cache: SingleFlightCache<String, Vec<u8>> =
            SingleFlightCache::new(16, TEST_MAX_AGE).unwrap();

        let expected = value.clone();
        let mut first = tokio_test::block_on(
            cache.get_or_fetch(key.clone(), || async move { Ok::<_, ()>(value) }),
        )
        .unwrap();
        prop_assert_eq!(&first, &expected);

        first.push(0xFF);
        prop_assert_eq!(cache.get(&key), Some(expected));
    }

    // **Invalidate Forces a Fetch**
    // After `invalidate(k)`, the next `get_or_fetch(k)` always calls its producer.
    #[test]
    fn prop_invalidate_forces_fetch(key in key_strategy(), prefill in any::<bool>()) {
        let cache: SingleFlightCache<String, u32> =
            SingleFlightCache::new(16, TEST_MAX_AGE).unwrap();
        let calls = AtomicUsize::new(0);

        tokio_test::block_on(async {
            if prefill {
                cache.get_or_fetch(key.clone(), || async { Ok::<_, ()>(1) }).await.unwrap();
            }
            cache.invalidate(&key);
            cache
                .get_or_fetch(key.clone(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(2)
                })
                .await
                .unwrap();
        });

        prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
        prop_assert_eq!(cache.get(&key), Some(2));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    // **Single Flight**
    // For any number of concurrent callers on one missing key, the producer
    // runs exactly once and every caller receives its value.
    #[test]
    fn prop_single_flight(callers in 1usize..32) {
        let cache: Arc<SingleFlightCache<String, u64>> =
            Arc::new(SingleFlightCache::new(16, TEST_MAX_AGE).unwrap());
        let calls = Arc::new(AtomicUsize::new(0));

        let results = tokio_test::block_on(async {
            let mut handles = Vec::with_capacity(callers);
            for _ in 0..callers {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                handles.push(tokio::spawn(async move {
                    cache
                        .get_or_fetch("shared".to_string(), || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(1)).await;
                            Ok::<_, ()>(99)
                        })
                        .await
                }));
            }

            let mut results = Vec::with_capacity(callers);
            for handle in handles {
                results.push(handle.await.unwrap());
            }
            results
        });

        prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
        prop_assert!(results.iter().all(|r| *r == Ok(99)));
    }
}
