// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::queue::{WriteQueue, QUEUE_SLOT};
use crate::storage::MemoryStore;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Every slot in the store, for comparing end states.
fn dump(store: &MemoryStore, slots: &[&str]) -> BTreeMap<String, Option<Vec<u8>>> {
    slots
        .iter()
        .map(|slot| (slot.to_string(), store.read(slot).unwrap()))
        .collect()
}

const ALL_SLOTS: &[&str] = &[
    METADATA_SLOT,
    QUEUE_SLOT,
    INSTALLATION_ID_SLOT,
    LEGACY_INSTALLATION_ID_SLOT,
    LEGACY_QUEUE_SLOT,
];

fn legacy_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.write(LEGACY_INSTALLATION_ID_SLOT, b"old-device").unwrap();
    store
        .write(
            LEGACY_QUEUE_SLOT,
            br#"[{"key":"a","value":1},{"key":"b","value":{"x":2}},{"key":"c","value":3,"uuid":"shared"}]"#,
        )
        .unwrap();
    store
}

#[test]
fn fresh_storage_is_stamped_with_current_version() {
    let store = MemoryStore::new();
    let report = migrate(&store).unwrap();

    assert_eq!(report.from, 0);
    assert_eq!(report.to, CURRENT_SCHEMA_VERSION);
    assert_eq!(report.requeued, 0);
    assert_eq!(
        read_metadata(&store).unwrap().schema_version,
        CURRENT_SCHEMA_VERSION
    );
}

#[test]
fn current_version_is_left_alone() {
    let store = MemoryStore::new();
    migrate(&store).unwrap();
    let report = migrate(&store).unwrap();
    assert!(!report.upgraded());
}

#[test]
fn version_zero_relocates_installation_id() {
    let store = legacy_store();
    migrate(&store).unwrap();

    assert_eq!(
        store.read(INSTALLATION_ID_SLOT).unwrap().unwrap(),
        b"old-device"
    );
    assert!(store.read(LEGACY_INSTALLATION_ID_SLOT).unwrap().is_none());
}

#[test]
fn existing_installation_id_wins_over_legacy() {
    let store = legacy_store();
    store.write(INSTALLATION_ID_SLOT, b"current").unwrap();
    migrate(&store).unwrap();

    assert_eq!(store.read(INSTALLATION_ID_SLOT).unwrap().unwrap(), b"current");
    assert!(store.read(LEGACY_INSTALLATION_ID_SLOT).unwrap().is_none());
}

#[test]
fn version_zero_requeues_legacy_writes_in_order() {
    let store = Arc::new(legacy_store());
    let report = migrate(&*store).unwrap();
    assert_eq!(report.requeued, 3);

    let entries = WriteQueue::new(store.clone()).entries().unwrap();
    let summary: Vec<_> = entries
        .iter()
        .map(|e| (e.key.as_str(), e.value.clone(), e.namespace.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("a", json!(1), "old-device"),
            ("b", json!({"x": 2}), "old-device"),
            ("c", json!(3), "shared"),
        ]
    );
    assert!(store.read(LEGACY_QUEUE_SLOT).unwrap().is_none());
}

#[test]
fn legacy_writes_are_applied_to_local_values() {
    let store = legacy_store();
    migrate(&store).unwrap();

    let local = |key: &str, namespace: &str| -> Value {
        let bytes = store.read(&local_key(key, namespace)).unwrap().unwrap();
        serde_json::from_slice(&bytes).unwrap()
    };
    assert_eq!(local("a", "old-device"), json!(1));
    assert_eq!(local("b", "old-device"), json!({"x": 2}));
    assert_eq!(local("c", "shared"), json!(3));
}

#[test]
fn legacy_writes_go_behind_current_queue() {
    let store = Arc::new(legacy_store());
    WriteQueue::new(store.clone())
        .enqueue(QueueEntry::new("first", json!(0), "ns"))
        .unwrap();

    migrate(&*store).unwrap();

    let keys: Vec<_> = WriteQueue::new(store.clone())
        .entries()
        .unwrap()
        .into_iter()
        .map(|e| e.key)
        .collect();
    assert_eq!(keys, vec!["first", "a", "b", "c"]);
}

#[test]
fn legacy_writes_without_any_id_get_a_fresh_one() {
    let store = MemoryStore::new();
    store
        .write(LEGACY_QUEUE_SLOT, br#"[{"key":"a","value":null}]"#)
        .unwrap();
    migrate(&store).unwrap();

    let id = String::from_utf8(store.read(INSTALLATION_ID_SLOT).unwrap().unwrap()).unwrap();
    let queue: Vec<QueueEntry> =
        serde_json::from_slice(&store.read(QUEUE_SLOT).unwrap().unwrap()).unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].namespace, id);
    assert_eq!(queue[0].value, Value::Null);
}

#[test]
fn migration_twice_matches_migration_once() {
    let once = legacy_store();
    migrate(&once).unwrap();
    let after_once = dump(&once, ALL_SLOTS);

    let twice = legacy_store();
    migrate(&twice).unwrap();
    migrate(&twice).unwrap();
    let after_twice = dump(&twice, ALL_SLOTS);

    assert_eq!(after_once, after_twice);
}

#[test]
fn partially_migrated_state_converges() {
    // Simulate a crash after the id moved but before the version was written.
    let store = legacy_store();
    store.write(INSTALLATION_ID_SLOT, b"old-device").unwrap();
    store.delete(LEGACY_INSTALLATION_ID_SLOT).unwrap();

    let report = migrate(&store).unwrap();
    assert_eq!(report.requeued, 3);

    let reference = legacy_store();
    migrate(&reference).unwrap();
    assert_eq!(dump(&store, ALL_SLOTS), dump(&reference, ALL_SLOTS));
}

#[test]
fn newer_schema_is_refused_untouched() {
    let store = legacy_store();
    store.write(METADATA_SLOT, br#"{"schema_version":9}"#).unwrap();
    let before = dump(&store, ALL_SLOTS);

    let result = migrate(&store);
    assert!(matches!(
        result,
        Err(Error::SchemaTooNew {
            found: 9,
            supported: CURRENT_SCHEMA_VERSION
        })
    ));
    assert_eq!(dump(&store, ALL_SLOTS), before);
}

#[test]
fn metadata_without_version_field_is_version_zero() {
    let store = MemoryStore::new();
    store.write(METADATA_SLOT, b"{}").unwrap();
    assert_eq!(read_metadata(&store).unwrap().schema_version, 0);
    assert_eq!(migrate(&store).unwrap().from, 0);
}
