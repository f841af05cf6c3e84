// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

#[test]
fn run_id_has_prefix_and_fits_inline() {
    let id = RunId::new();
    assert!(id.as_str().starts_with("run-"));
    assert_eq!(id.as_str().len(), 23);
    assert!(!id.0.is_heap_allocated());
}

#[test]
fn run_ids_are_unique() {
    assert_ne!(RunId::new(), RunId::new());
}

#[test]
fn hash_map_lookup_by_str() {
    let mut map = HashMap::new();
    map.insert(OrgId::from_string("org-acme"), 3);
    assert_eq!(map.get("org-acme"), Some(&3));
}

#[test]
fn serde_is_transparent() {
    let id = RunId::from_string("run-abc");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"run-abc\"");
    let parsed: RunId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

#[yare::parameterized(
    truncates      = { "run-abcdefghij", 4, "abcd" },
    shorter        = { "run-ab", 4, "ab" },
    no_prefix      = { "legacy", 3, "leg" },
)]
fn short_suffix(raw: &str, n: usize, expected: &str) {
    assert_eq!(RunId::from_string(raw).short(n), expected);
}

#[test]
fn short_respects_char_boundaries() {
    assert_eq!(short("ééé", 2), "éé");
}
