// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

#[yare::parameterized(
    already_normal  = { "acme supplies",          "acme supplies" },
    mixed_case      = { "ACME Supplies",          "acme supplies" },
    padded          = { "  acme supplies  ",      "acme supplies" },
    inner_runs      = { "acme \t  supplies",      "acme supplies" },
    newline         = { "acme\nsupplies",         "acme supplies" },
    empty           = { "   ",                    "" },
)]
fn normalizes(raw: &str, expected: &str) {
    assert_eq!(normalize_name(raw), expected);
}

#[test]
fn first_seen_then_seen_again_keeps_count() {
    let org = OrgId::from("org-1");
    let first = RunId::from("run-a");
    let second = RunId::from("run-b");
    let hit = SellerHit::new("  Acme  Supplies", "shopee");

    let mut entity = DiscoveredEntity::first_seen(&org, &hit, &first, 10);
    assert_eq!(entity.key.normalized_name, "acme supplies");
    assert_eq!(entity.display_name, "Acme  Supplies");
    assert_eq!(entity.seen_count, 1);

    entity.seen_again(&second, 20);
    assert_eq!(entity.seen_count, 1);
    assert_eq!(entity.first_seen_run, first);
    assert_eq!(entity.last_seen_run, second);
    assert_eq!(entity.last_seen_ms, 20);
}

#[test]
fn key_distinguishes_platforms() {
    let org = OrgId::from("org-1");
    assert_ne!(EntityKey::new(&org, "shopee", "Acme"), EntityKey::new(&org, "lazada", "Acme"));
    assert_eq!(EntityKey::new(&org, "shopee", "ACME"), EntityKey::new(&org, "shopee", " acme "));
}

proptest! {
    #[test]
    fn normalize_is_idempotent(raw in "[ a-zA-Z\t]{0,24}") {
        let once = normalize_name(&raw);
        prop_assert_eq!(normalize_name(&once), once.clone());
        prop_assert!(!once.contains("  "));
        prop_assert_eq!(once.trim(), once.as_str());
    }

    #[test]
    fn normalize_ignores_case_and_padding(raw in "[a-z]{1,8}( [a-z]{1,8}){0,3}") {
        let noisy = format!("  {}\t", raw.to_uppercase().replace(' ', "   "));
        prop_assert_eq!(normalize_name(&noisy), raw);
    }
}
