// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hv_core::test_support::{org, seller};
use hv_storage::{FaultyStore, MemoryStore, StoreOp};

#[tokio::test]
async fn duplicates_within_a_page_count_once() {
    let store = MemoryStore::new();
    let run = RunId::new();
    let sellers = [seller("Acme Supplies"), seller("  acme   SUPPLIES "), seller("Birch & Co")];

    let stats = merge_entities(&store, &org("org-a"), &run, "alice", &sellers, 10).await.unwrap();

    assert_eq!(stats, MergeStats { found: 2, new: 2 });
    let stored = store
        .find_entities(&org("org-a"), "market", &["acme supplies".to_string()])
        .await
        .unwrap();
    assert_eq!(stored[0].display_name, "Acme Supplies");
    assert_eq!(stored[0].seen_count, 1);
}

#[tokio::test]
async fn known_entities_only_move_last_seen() {
    let store = MemoryStore::new();
    let (first, second) = (RunId::new(), RunId::new());
    merge_entities(&store, &org("org-a"), &first, "alice", &[seller("Acme")], 10).await.unwrap();

    let stats = merge_entities(&store, &org("org-a"), &second, "alice", &[seller("ACME"), seller("Dune")], 20)
        .await
        .unwrap();

    assert_eq!(stats, MergeStats { found: 2, new: 1 });
    let acme = store.find_entities(&org("org-a"), "market", &["acme".to_string()]).await.unwrap();
    assert_eq!(acme[0].first_seen_run, first);
    assert_eq!(acme[0].last_seen_run, second);
    assert_eq!(acme[0].last_seen_ms, 20);
    assert_eq!(acme[0].seen_count, 1);
    assert_eq!(store.snapshot().entity_count(), 2);
}

#[tokio::test]
async fn orgs_and_platforms_are_separate() {
    let store = MemoryStore::new();
    let run = RunId::new();
    let sellers = [seller("Acme"), SellerHit::new("Acme", "bazaar")];
    let stats = merge_entities(&store, &org("org-a"), &run, "alice", &sellers, 10).await.unwrap();
    assert_eq!(stats.new, 2);

    let stats = merge_entities(&store, &org("org-b"), &run, "bob", &[seller("Acme")], 10).await.unwrap();
    assert_eq!(stats.new, 1);
}

#[tokio::test]
async fn empty_input_writes_nothing() {
    let store = MemoryStore::new();
    let run = RunId::new();
    let stats = merge_entities(&store, &org("org-a"), &run, "alice", &[seller("   ")], 10).await.unwrap();

    assert_eq!(stats, MergeStats::default());
    assert!(store.list_audit(&run).await.unwrap().is_empty());
}

#[tokio::test]
async fn merge_is_audited() {
    let store = MemoryStore::new();
    let run = RunId::new();
    merge_entities(&store, &org("org-a"), &run, "alice", &[seller("Acme")], 10).await.unwrap();

    let audit = store.list_audit(&run).await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, "entities.merge");
    assert_eq!(audit[0].summary["new"], 1);
    assert_eq!(audit[0].summary["updated"], 0);
}

#[tokio::test]
async fn entity_write_failure_propagates_but_audit_failure_does_not() {
    let store = FaultyStore::new(MemoryStore::new());
    let run = RunId::new();

    store.fail(StoreOp::AppendAudit);
    merge_entities(&store, &org("org-a"), &run, "alice", &[seller("Acme")], 10).await.unwrap();

    store.fail(StoreOp::PutEntities);
    let err = merge_entities(&store, &org("org-a"), &run, "alice", &[seller("Birch")], 10).await;
    assert!(err.is_err());
}
