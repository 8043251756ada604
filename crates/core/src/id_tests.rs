// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::define_id;

define_id!(TestId, "tst-");

#[test]
fn new_ids_carry_prefix() {
    let id = TestId::new();
    assert!(id.as_str().starts_with("tst-"));
}

#[test]
fn ids_are_unique() {
    assert_ne!(TestId::new(), TestId::new());
}

#[test]
fn from_string_round_trips() {
    let id = TestId::from_string("tst-abc123");
    assert_eq!(id.as_str(), "tst-abc123");
    assert_eq!(id, "tst-abc123");
}

#[test]
fn short_is_prefix_of_suffix() {
    let id = TestId::from_string("tst-abcdefghijklmnop");
    assert_eq!(id.short(), "abcdefgh");
}

#[test]
fn equality_and_hash_agree_with_as_str() {
    use std::collections::HashSet;
    let a = TestId::from_string("tst-same");
    let b = TestId::from_string("tst-same");
    assert_eq!(a, b);
    let mut set = HashSet::new();
    set.insert(a);
    assert!(set.contains(&b));
}

#[test]
fn default_id_is_empty() {
    let buf = IdBuf::default();
    assert!(buf.is_empty());
}

#[test]
fn id_buf_truncates_overlong_input() {
    let long = "x".repeat(100);
    let buf = IdBuf::from_string(&long);
    assert_eq!(buf.as_str().len(), ID_CAPACITY);
}