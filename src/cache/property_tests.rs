//! Property-Based Tests for Cache Module
//!
//! Uses proptest to verify store semantics over arbitrary operation sequences.

use proptest::prelude::*;
use std::collections::HashMap;
use std::thread::sleep;
use std::time::Duration;

use crate::cache::CacheStore;
use crate::error::CacheError;

// == Test Configuration ==
const TEST_TTL: i64 = 300;

// == Strategies ==
/// Generates cache keys from a small alphabet so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,2}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,64}".prop_map(|s| s)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
    Expire { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
        key_strategy().prop_map(|key| CacheOp::Expire { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // The store behaves like a plain map while nothing expires.
    #[test]
    fn prop_matches_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let mut store = CacheStore::new();
        let mut model: HashMap<String, String> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    store.set(key.clone(), value.clone(), TEST_TTL);
                    model.insert(key, value);
                }
                CacheOp::Get { key } => match (store.get(&key), model.get(&key)) {
                    (Ok(got), Some(expected)) => prop_assert_eq!(&got, expected),
                    (Err(CacheError::NotFound(_)), None) => {}
                    (got, expected) => {
                        prop_assert!(false, "get {} diverged: {:?} vs {:?}", key, got, expected)
                    }
                },
                CacheOp::Delete { key } => {
                    prop_assert_eq!(store.delete(&[key.as_str()]), 1);
                    model.remove(&key);
                }
                CacheOp::Expire { key } => {
                    prop_assert_eq!(store.expire(&key, TEST_TTL), model.contains_key(&key));
                }
            }
            prop_assert_eq!(store.len(), model.len());
        }
    }

    // Statistics reflect every read.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let mut store = CacheStore::new();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => store.set(key, value, TEST_TTL),
                CacheOp::Get { key } => match store.get(&key) {
                    Ok(_) => expected_hits += 1,
                    Err(_) => expected_misses += 1,
                },
                CacheOp::Delete { key } => {
                    store.delete(&[key]);
                }
                CacheOp::Expire { key } => {
                    store.expire(&key, TEST_TTL);
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, store.len(), "Total entries mismatch");
    }

    // Storing then reading before expiry returns the stored value.
    #[test]
    fn prop_roundtrip_storage(key in key_strategy(), value in value_strategy()) {
        let mut store = CacheStore::new();
        store.set(key.clone(), value.clone(), TEST_TTL);
        prop_assert_eq!(store.get(&key).unwrap(), value);
    }
}

// Separate proptest block with fewer cases for time-sensitive TTL tests
proptest! {
    #![proptest_config(ProptestConfig::with_cases(3))]

    // After the TTL elapses a read reports Expired once, then NotFound.
    #[test]
    fn prop_ttl_expiration_behavior(key in key_strategy(), value in value_strategy()) {
        let mut store = CacheStore::new();

        store.set(key.clone(), value.clone(), 1);
        prop_assert_eq!(store.get(&key).unwrap(), value);

        sleep(Duration::from_millis(1100));

        prop_assert!(matches!(store.get(&key), Err(CacheError::Expired(_))));
        prop_assert!(matches!(store.get(&key), Err(CacheError::NotFound(_))));
    }
}
