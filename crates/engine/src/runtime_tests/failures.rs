// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn every_category_failing_fails_the_run() {
    let config = EngineConfig { max_attempts: 1, failure_threshold: 10, ..test_config() };
    let ctx = setup_with(stocked_catalog(), stocked_search(), config);
    for id in ["c1", "c2", "c3"] {
        ctx.catalog.fail_times(id, RemoteError::Other("catalog offline".into()), 1);
    }
    let run = ctx.started_run(kitchen_and_garden()).await;

    let outcome = ctx.runtime.execute(&run.id).await.unwrap();

    let RunOutcome::Failed { reason, progress } = &outcome else {
        panic!("expected failure, got {:?}", outcome);
    };
    assert_eq!(progress.failed_items, 3);
    assert_eq!(progress.categories_completed, 0);
    let stored = ctx.runtime.get_run(&run.id).await.unwrap();
    assert_eq!(stored.status, RunStatus::Failed);
    assert_eq!(stored.error.as_deref(), Some(reason.as_str()));
    assert!(stored.finished_at_ms.is_some());
    assert!(ctx.search.calls().is_empty());
}

#[tokio::test]
async fn failed_searches_are_counted_and_the_run_completes() {
    let config = EngineConfig { failure_threshold: 10, ..test_config() };
    let ctx = setup_with(stocked_catalog(), stocked_search(), config);
    ctx.search.fail_times("Rake", RemoteError::Http(404), 3);
    let run = ctx.started_run(kitchen_and_garden()).await;

    let outcome = ctx.runtime.execute(&run.id).await.unwrap();

    let progress = *outcome.progress();
    assert!(matches!(outcome, RunOutcome::Completed { .. }));
    assert_eq!(progress.failed_items, 1);
    assert_eq!(progress.processed_items, 5);
    assert_eq!(progress.products_searched, 2);
    assert_eq!(checkpoint_of(&ctx, &run.id).await.position, PhaseCursor::SearchComplete);
}

#[tokio::test]
async fn item_write_failure_surfaces_and_keeps_the_run_running() {
    let ctx = setup(stocked_catalog(), stocked_search());
    let run = ctx.started_run(kitchen_and_garden()).await;
    ctx.store.fail(StoreOp::UpsertItems);

    let err = ctx.runtime.execute(&run.id).await.unwrap_err();

    assert!(matches!(err, EngineError::Store(_)), "{:?}", err);
    let stored = ctx.runtime.get_run(&run.id).await.unwrap();
    assert_eq!(stored.status, RunStatus::Running);
    assert_eq!(stored.progress.processed_items, 0);

    // Once the store recovers the run picks up from its checkpoint
    ctx.store.heal(StoreOp::UpsertItems);
    let outcome = ctx.runtime.execute(&run.id).await.unwrap();
    assert_eq!(outcome, RunOutcome::Completed { progress: expected_stocked_progress() });
}

#[tokio::test]
async fn checkpoint_write_failure_surfaces() {
    let ctx = setup(stocked_catalog(), stocked_search());
    let run = ctx.started_run(kitchen_and_garden()).await;
    ctx.store.fail_times(StoreOp::PutRun, 1);

    let err = ctx.runtime.execute(&run.id).await.unwrap_err();

    assert!(matches!(err, EngineError::Store(_)), "{:?}", err);
    assert!(ctx.catalog.calls().is_empty());
    assert_eq!(ctx.runtime.get_run(&run.id).await.unwrap().checkpoint, None);
}

#[tokio::test]
async fn entity_write_failure_surfaces_from_search() {
    let ctx = setup(stocked_catalog(), stocked_search());
    let run = ctx.started_run(kitchen_and_garden()).await;
    ctx.store.fail(StoreOp::PutEntities);

    let err = ctx.runtime.execute(&run.id).await.unwrap_err();

    assert!(matches!(err, EngineError::Store(_)), "{:?}", err);
    let checkpoint = checkpoint_of(&ctx, &run.id).await;
    assert_eq!(checkpoint.position.phase(), Phase::Search);
    assert_eq!(ctx.store.inner().snapshot().entity_count(), 0);
}

#[tokio::test]
async fn audit_failures_never_fail_a_run() {
    let ctx = setup(stocked_catalog(), stocked_search());
    let run = ctx.started_run(kitchen_and_garden()).await;
    ctx.store.fail(StoreOp::AppendAudit);

    let outcome = ctx.runtime.execute(&run.id).await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed { progress: expected_stocked_progress() });
}

#[tokio::test]
async fn concurrency_limit_counts_running_and_paused_runs() {
    let config = EngineConfig { max_active_runs_per_org: 2, ..test_config() };
    let ctx = setup_with(stocked_catalog(), stocked_search(), config);
    let first = ctx.started_run(kitchen_and_garden()).await;
    let second = ctx.started_run(kitchen_and_garden()).await;
    ctx.runtime.pause_run(&second.id).await.unwrap();

    let err = ctx
        .runtime
        .create_run(&org("org-a"), "alice", categories(&[("c1", "kitchen")]), None)
        .await
        .unwrap_err();
    assert!(matches!(err.rejection(), Some(Rejection::ConcurrencyLimit { active: 2, .. })));

    ctx.runtime.execute(&first.id).await.unwrap();
    ctx.runtime
        .create_run(&org("org-a"), "alice", categories(&[("c1", "kitchen")]), None)
        .await
        .unwrap();
}
