// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hv_core::test_support::{org, seller, source_item};
use hv_core::RunStatus;

#[test]
fn upsert_items_replaces_same_external_id() {
    let mut state = StoreState::default();
    let run = RunId::new();
    let first = source_item(&run, "c1", 0, "Kettle");
    let mut renamed = first.clone();
    renamed.name = "Kettle XL".to_string();

    state.upsert_items(&[first, source_item(&run, "c1", 1, "Toaster")]);
    state.upsert_items(&[renamed]);

    let items = state.list_items(&run);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "Kettle XL");
    assert_eq!(items[1].name, "Toaster");
}

#[test]
fn list_runs_filters_by_org_and_status() {
    let mut state = StoreState::default();
    let a = org("org-a");
    let older = Run::builder().org(a.clone()).status(RunStatus::Running).created_at_ms(1).build();
    let newer = Run::builder().org(a.clone()).status(RunStatus::Paused).created_at_ms(2).build();
    let done = Run::builder().org(a.clone()).status(RunStatus::Completed).build();
    let other = Run::builder().org("org-b").status(RunStatus::Running).build();
    for run in [&newer, &done, &other, &older] {
        state.put_run(run);
    }

    let filter = RunFilter::all().org(&a).statuses(&RunStatus::INCOMPLETE);
    let ids: Vec<RunId> = state.list_runs(&filter).into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![older.id, newer.id]);
    assert_eq!(state.list_runs(&RunFilter::all()).len(), 4);
}

#[test]
fn entities_are_scoped_by_org_and_platform() {
    let mut state = StoreState::default();
    let run = RunId::new();
    let a = org("org-a");
    let entity = DiscoveredEntity::first_seen(&a, &seller("Acme  Supplies"), &run, 5);
    state.put_entities(&[entity.clone()]);

    let names = vec!["acme supplies".to_string()];
    assert_eq!(state.find_entities(&a, "market", &names), vec![entity]);
    assert!(state.find_entities(&a, "elsewhere", &names).is_empty());
    assert!(state.find_entities(&org("org-b"), "market", &names).is_empty());
    assert_eq!(state.entity_count(), 1);
}

#[test]
fn state_survives_json() {
    let mut state = StoreState::default();
    let run = Run::builder().build();
    state.put_run(&run);
    state.upsert_items(&[source_item(&run.id, "c1", 0, "Kettle")]);

    let json = serde_json::to_string(&state).unwrap();
    let back: StoreState = serde_json::from_str(&json).unwrap();
    assert_eq!(back.get_run(&run.id), Some(run.clone()));
    assert_eq!(back.list_items(&run.id).len(), 1);
}
