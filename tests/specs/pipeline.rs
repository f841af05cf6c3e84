// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A run from creation to completion.

use crate::prelude::*;
use hv_adapters::{FakeCatalog, FakeSearch, RemoteError};
use hv_core::test_support::{categories, org};
use hv_core::{Progress, RunStatus};
use hv_engine::RunOutcome;
use hv_storage::RunStore;
use tempfile::tempdir;

pub fn expected_progress() -> Progress {
    Progress {
        total_items: 8,
        processed_items: 8,
        failed_items: 0,
        departments_total: 2,
        departments_completed: 2,
        categories_total: 4,
        categories_completed: 4,
        products_total: 4,
        products_searched: 4,
        entities_found: 6,
        entities_new: 4,
    }
}

#[tokio::test]
async fn run_completes_and_everything_is_on_disk() {
    let dir = tempdir().unwrap();
    let runtime = runtime_in(dir.path(), catalog(), search());
    let run = runtime.create_run(&org("org-a"), "alice", departments(), None).await.unwrap();

    let outcome = runtime.start_and_execute(&run.id).await.unwrap();
    assert_eq!(outcome, RunOutcome::Completed { progress: expected_progress() });
    drop(runtime);

    // A new process sees the same run, items, entities and audit trail
    let reopened = runtime_in(dir.path(), FakeCatalog::new(), FakeSearch::new());
    let stored = reopened.get_run(&run.id).await.unwrap();
    assert_eq!(stored.status, RunStatus::Completed);
    assert_eq!(stored.progress, expected_progress());

    let store = hv_engine::open_store(dir.path()).unwrap();
    assert_eq!(store.list_items(&run.id).await.unwrap().len(), 4);
    let names: Vec<String> =
        ["camp goods", "hearth", "tin & co", "wok shop"].iter().map(|s| s.to_string()).collect();
    let entities = store.find_entities(&org("org-a"), "market", &names).await.unwrap();
    assert_eq!(entities.len(), 4);

    let actions: Vec<String> =
        store.list_audit(&run.id).await.unwrap().into_iter().map(|e| e.action).collect();
    assert_eq!(actions.first().map(String::as_str), Some("run.create"));
    assert_eq!(actions.last().map(String::as_str), Some("run.complete"));
    assert!(actions.iter().any(|a| a == "run.start"));
    assert!(actions.iter().any(|a| a == "entities.merge"));
    assert!(!reopened.recover().await.unwrap().iter().any(|r| r.id == run.id));
}

#[tokio::test(start_paused = true)]
async fn rate_limited_categories_still_complete() {
    let dir = tempdir().unwrap();
    let catalog = FakeCatalog::new();
    catalog.fail_times("mugs", RemoteError::RateLimited, 1);
    catalog.fail_times("hoses", RemoteError::RateLimited, 1);
    let runtime = runtime_in(dir.path(), catalog.clone(), FakeSearch::new());
    let run = runtime
        .create_run(&org("org-a"), "alice", categories(&[("mugs", "kitchen"), ("hoses", "garden")]), None)
        .await
        .unwrap();

    let outcome = runtime.start_and_execute(&run.id).await.unwrap();

    let progress = *outcome.progress();
    assert!(matches!(outcome, RunOutcome::Completed { .. }));
    assert_eq!(progress.categories_completed, 2);
    assert_eq!(progress.departments_completed, progress.departments_total);
    assert_eq!(progress.failed_items, 0);
    assert_eq!(catalog.calls().len(), 4);

    let stored = runtime.get_run(&run.id).await.unwrap();
    let checkpoint = stored.checkpoint.unwrap();
    assert_eq!(checkpoint["phase"], "sourcePhaseComplete");
    assert_eq!(checkpoint["v"], 1);
}
