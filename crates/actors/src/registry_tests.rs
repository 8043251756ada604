// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn insert_if_absent_is_idempotent() {
    let registry: Registry<&'static str> = Registry::new();
    let key = RegistryKey::BoardManager;
    assert!(registry.insert_if_absent(key, "first"));
    assert!(!registry.insert_if_absent(key, "second"));
    assert_eq!(registry.lookup(&key), Some("first"));
}

#[test]
fn lookup_missing_returns_none() {
    let registry: Registry<&'static str> = Registry::new();
    assert_eq!(registry.lookup(&RegistryKey::BoardManager), None);
}

#[test]
fn remove_then_lookup_round_trips_to_not_found() {
    let registry: Registry<&'static str> = Registry::new();
    let key = RegistryKey::BoardSupervisor(BoardId::new());
    registry.insert_if_absent(key, "handle");
    assert!(registry.remove(&key).is_some());
    assert_eq!(registry.lookup(&key), None);
}

#[test]
fn different_board_ids_are_distinct_keys() {
    let registry: Registry<&'static str> = Registry::new();
    let a = BoardId::new();
    let b = BoardId::new();
    registry.insert_if_absent(RegistryKey::BoardActor(a), "a");
    registry.insert_if_absent(RegistryKey::BoardActor(b), "b");
    assert_eq!(registry.lookup(&RegistryKey::BoardActor(a)), Some("a"));
    assert_eq!(registry.lookup(&RegistryKey::BoardActor(b)), Some("b"));
}
