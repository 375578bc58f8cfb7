//! Integration Tests for the Storage Contract
//!
//! Exercises the full contract surface of the in-memory adapter: round
//! trips, CAS safety, counter atomicity under concurrent writers, TTL
//! expiry, touch semantics, batch partial failure and capability gating.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use regex::Regex;
use serde_json::json;

use cachet::{AdapterOptions, Capabilities, MemoryStorage, Storage, StorageError};

// == Helper Functions ==

fn storage_with_ttl(ttl: Duration) -> MemoryStorage {
    MemoryStorage::new(AdapterOptions::new().with_default_ttl(ttl))
}

// == Round Trip ==

#[test]
fn test_round_trip_arbitrary_values() {
    let storage = MemoryStorage::default();

    let payloads = vec![
        json!("plain string"),
        json!(42),
        json!(-3.5),
        json!(true),
        json!(null),
        json!(["a", 1, false]),
        json!({"nested": {"map": [1, 2, 3]}}),
    ];

    for (index, payload) in payloads.into_iter().enumerate() {
        let key = format!("key{}", index);
        assert!(storage.set_item(&key, payload.clone()).unwrap());

        let (value, _) = storage.get_item(&key).unwrap().unwrap();
        assert_eq!(value, payload, "Round-trip mismatch for {}", key);
    }
}

#[test]
fn test_get_missing_is_not_an_error() {
    let storage = MemoryStorage::default();
    assert!(storage.get_item("missing").unwrap().is_none());
    assert!(!storage.has_item("missing").unwrap());
    assert!(storage.get_metadata("missing").unwrap().is_none());
}

// == Batch Reads ==

#[test]
fn test_get_items_omits_absent_keys() {
    let storage = MemoryStorage::default();

    storage.set_item("a", json!(1)).unwrap();
    storage.set_item("b", json!(2)).unwrap();

    let found = storage.get_items(&["a", "b", "missing"]).unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found["a"], json!(1));
    assert_eq!(found["b"], json!(2));
    assert!(!found.contains_key("missing"));
}

#[test]
fn test_has_items_returns_existing_keys() {
    let storage = MemoryStorage::default();

    storage.set_item("a", json!(1)).unwrap();

    let found = storage.has_items(&["a", "missing"]).unwrap();
    assert_eq!(found, vec!["a".to_string()]);
}

#[test]
fn test_get_metadatas_for_found_keys_only() {
    let storage = MemoryStorage::default();

    storage.set_item("a", json!(1)).unwrap();

    let metadatas = storage.get_metadatas(&["a", "missing"]).unwrap();
    assert_eq!(metadatas.len(), 1);
    assert_eq!(metadatas["a"].cas_version, 1);
}

// == Add / Replace ==

#[test]
fn test_add_item_conflict_returns_false() {
    let storage = MemoryStorage::default();

    assert!(storage.add_item("key", json!("first")).unwrap());
    assert!(!storage.add_item("key", json!("second")).unwrap());

    let (value, _) = storage.get_item("key").unwrap().unwrap();
    assert_eq!(value, json!("first"));
}

#[test]
fn test_add_item_succeeds_on_expired_key() {
    let storage = storage_with_ttl(Duration::from_millis(50));

    storage.set_item("key", json!("old")).unwrap();
    thread::sleep(Duration::from_millis(80));

    assert!(storage.add_item("key", json!("new")).unwrap());
}

#[test]
fn test_replace_item_requires_existing_key() {
    let storage = MemoryStorage::default();

    assert!(!storage.replace_item("missing", json!(1)).unwrap());

    storage.set_item("key", json!("v1")).unwrap();
    assert!(storage.replace_item("key", json!("v2")).unwrap());

    let (value, _) = storage.get_item("key").unwrap().unwrap();
    assert_eq!(value, json!("v2"));
}

#[test]
fn test_add_items_reports_conflicts() {
    let storage = MemoryStorage::default();

    storage.set_item("taken", json!(0)).unwrap();

    let failed = storage
        .add_items(&[("taken", json!(1)), ("fresh", json!(2))])
        .unwrap();
    assert_eq!(failed, vec!["taken".to_string()]);

    let (value, _) = storage.get_item("fresh").unwrap().unwrap();
    assert_eq!(value, json!(2));
}

#[test]
fn test_replace_items_reports_missing() {
    let storage = MemoryStorage::default();

    storage.set_item("present", json!("v1")).unwrap();

    let failed = storage
        .replace_items(&[("present", json!("v2")), ("missing", json!("x"))])
        .unwrap();
    assert_eq!(failed, vec!["missing".to_string()]);
}

// == CAS ==

#[test]
fn test_cas_loser_returns_false_and_winner_state_persists() {
    let storage = MemoryStorage::default();

    storage.set_item("key", json!("base")).unwrap();
    let (_, token1) = storage.get_item("key").unwrap().unwrap();
    let (_, token2) = storage.get_item("key").unwrap().unwrap();

    assert!(storage.check_and_set_item(&token1, "key", json!("winner")).unwrap());
    assert!(!storage.check_and_set_item(&token2, "key", json!("loser")).unwrap());

    let (value, _) = storage.get_item("key").unwrap().unwrap();
    assert_eq!(value, json!("winner"));
}

#[test]
fn test_cas_safety_under_concurrent_writers() {
    let storage = MemoryStorage::default();
    storage.set_item("key", json!("base")).unwrap();

    let (_, token) = storage.get_item("key").unwrap().unwrap();
    let barrier = Arc::new(Barrier::new(2));

    let mut handles = Vec::new();
    for id in 0..2 {
        let storage = storage.clone();
        let token = token.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            let won = storage
                .check_and_set_item(&token, "key", json!(id))
                .unwrap();
            (id, won)
        }));
    }

    let outcomes: Vec<(i64, bool)> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners: Vec<i64> = outcomes
        .iter()
        .filter(|(_, won)| *won)
        .map(|(id, _)| *id)
        .collect();

    assert_eq!(winners.len(), 1, "Exactly one CAS attempt must succeed");

    let (value, _) = storage.get_item("key").unwrap().unwrap();
    assert_eq!(value, json!(winners[0]), "Store must end in the winner's state");
}

#[test]
fn test_cas_token_stale_after_unconditional_set() {
    let storage = MemoryStorage::default();

    storage.set_item("key", json!("v1")).unwrap();
    let (_, token) = storage.get_item("key").unwrap().unwrap();

    storage.set_item("key", json!("v2")).unwrap();

    assert!(!storage.check_and_set_item(&token, "key", json!("v3")).unwrap());
}

// == Counters ==

#[test]
fn test_counter_atomicity_under_concurrent_increments() {
    const THREADS: usize = 8;
    const INCREMENTS: usize = 100;

    let storage = MemoryStorage::default();
    storage.set_item("counter", json!(0)).unwrap();

    let mut handles = Vec::new();
    for _ in 0..THREADS {
        let storage = storage.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..INCREMENTS {
                storage.increment_item("counter", 1).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let (value, _) = storage.get_item("counter").unwrap().unwrap();
    assert_eq!(
        value,
        json!((THREADS * INCREMENTS) as i64),
        "No increment may be lost under concurrency"
    );
}

#[test]
fn test_increment_missing_key_creates_with_delta() {
    let storage = MemoryStorage::default();
    assert_eq!(storage.increment_item("fresh", 7).unwrap(), Some(7));
}

#[test]
fn test_increment_non_numeric_returns_none() {
    let storage = MemoryStorage::default();

    storage.set_item("key", json!("text")).unwrap();
    assert_eq!(storage.increment_item("key", 1).unwrap(), None);

    let (value, _) = storage.get_item("key").unwrap().unwrap();
    assert_eq!(value, json!("text"));
}

#[test]
fn test_decrement_floor_clamps_at_zero() {
    let storage = MemoryStorage::default();

    storage.set_item("counter", json!(5)).unwrap();
    assert_eq!(storage.decrement_item("counter", 100).unwrap(), Some(0));

    let (value, _) = storage.get_item("counter").unwrap().unwrap();
    assert_eq!(value, json!(0));
}

#[test]
fn test_increment_items_partial_success() {
    let storage = MemoryStorage::default();

    storage.set_item("numeric", json!(10)).unwrap();
    storage.set_item("textual", json!("nope")).unwrap();

    let updated = storage
        .increment_items(&[("numeric", 5), ("textual", 5), ("fresh", 5)])
        .unwrap();

    assert_eq!(updated.len(), 2);
    assert_eq!(updated["numeric"], 15);
    assert_eq!(updated["fresh"], 5);
    assert!(!updated.contains_key("textual"));
}

#[test]
fn test_decrement_items_reports_new_values() {
    let storage = MemoryStorage::default();

    storage.set_item("a", json!(10)).unwrap();
    storage.set_item("b", json!(3)).unwrap();

    let updated = storage.decrement_items(&[("a", 4), ("b", 30)]).unwrap();
    assert_eq!(updated["a"], 6);
    assert_eq!(updated["b"], 0);
}

// == TTL & Touch ==

#[test]
fn test_ttl_expiry_makes_item_absent() {
    let storage = storage_with_ttl(Duration::from_millis(100));

    storage.set_item("key", json!("value")).unwrap();
    assert!(storage.get_item("key").unwrap().is_some());

    thread::sleep(Duration::from_millis(150));
    assert!(storage.get_item("key").unwrap().is_none());
    assert!(!storage.has_item("key").unwrap());
}

#[test]
fn test_touch_extends_availability_without_changing_value() {
    let storage = storage_with_ttl(Duration::from_millis(150));

    storage.set_item("key", json!("value")).unwrap();
    thread::sleep(Duration::from_millis(100));

    assert!(storage.touch_item("key").unwrap());
    thread::sleep(Duration::from_millis(100));

    // 200ms after set, but only 100ms after touch
    let (value, _) = storage.get_item("key").unwrap().unwrap();
    assert_eq!(value, json!("value"));

    thread::sleep(Duration::from_millis(120));
    assert!(storage.get_item("key").unwrap().is_none());
}

#[test]
fn test_touch_missing_key_returns_false() {
    let storage = storage_with_ttl(Duration::from_millis(100));
    assert!(!storage.touch_item("missing").unwrap());
}

#[test]
fn test_touch_items_reports_missing_keys() {
    let storage = storage_with_ttl(Duration::from_secs(60));

    storage.set_item("present", json!(1)).unwrap();

    let failed = storage.touch_items(&["present", "missing"]).unwrap();
    assert_eq!(failed, vec!["missing".to_string()]);
}

// == Batch Partial Failure ==

#[test]
fn test_set_items_partial_failure_commits_siblings() {
    let options = AdapterOptions::new().with_key_pattern(Regex::new("^[a-z0-9_]+$").unwrap());
    let storage = MemoryStorage::new(options);

    let failed = storage
        .set_items(&[("alpha", json!(1)), ("BAD KEY", json!(2))])
        .unwrap();

    assert_eq!(failed, vec!["BAD KEY".to_string()]);

    // The sibling write stayed committed
    let (value, _) = storage.get_item("alpha").unwrap().unwrap();
    assert_eq!(value, json!(1));
}

#[test]
fn test_remove_items_counts_missing_as_failed() {
    let storage = MemoryStorage::default();

    storage.set_item("present", json!(1)).unwrap();

    let failed = storage.remove_items(&["present", "missing"]).unwrap();
    assert_eq!(failed, vec!["missing".to_string()]);
    assert!(!storage.has_item("present").unwrap());
}

// == Capability Gating ==

#[test]
fn test_cas_unsupported_raises_distinct_error() {
    let caps = Capabilities {
        supports_ttl: true,
        supports_cas: false,
        max_key_length: Some(256),
        ..Capabilities::default()
    };
    let storage = MemoryStorage::with_capabilities(AdapterOptions::default(), caps);

    storage.set_item("key", json!("v1")).unwrap();
    let (_, token) = storage.get_item("key").unwrap().unwrap();

    // The get path does not go through CAS gating, so a token still comes
    // back; presenting it must fail loudly, not silently no-op.
    let result = storage.check_and_set_item(&token, "key", json!("v2"));
    assert!(matches!(result, Err(StorageError::Unsupported(_))));

    let (value, _) = storage.get_item("key").unwrap().unwrap();
    assert_eq!(value, json!("v1"));
}

#[test]
fn test_capabilities_constant_for_adapter_lifetime() {
    let mut storage = MemoryStorage::default();
    let before = storage.capabilities().clone();

    storage.set_options(AdapterOptions::new().with_namespace("other"));

    assert_eq!(storage.capabilities().supports_ttl, before.supports_ttl);
    assert_eq!(storage.capabilities().supports_cas, before.supports_cas);
    assert_eq!(storage.capabilities().max_key_length, before.max_key_length);
}

// == Invalid Keys ==

#[test]
fn test_single_op_invalid_key_is_an_error() {
    let options = AdapterOptions::new().with_key_pattern(Regex::new("^[a-z]+$").unwrap());
    let storage = MemoryStorage::new(options);

    let result = storage.get_item("NOT-ALLOWED");
    assert!(matches!(result, Err(StorageError::InvalidKey { .. })));
}
