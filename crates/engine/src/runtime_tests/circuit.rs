// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn consecutive_failures_auto_pause_the_run() {
    let ctx = setup(stocked_catalog(), stocked_search());
    ctx.catalog.fail_times("c1", RemoteError::Http(500), 3);
    let run = ctx.started_run(kitchen_and_garden()).await;

    let outcome = ctx.runtime.execute(&run.id).await.unwrap();

    let (reason, progress) = match outcome {
        RunOutcome::Paused { reason, progress } => (reason, progress),
        other => panic!("expected auto-pause, got {:?}", other),
    };
    assert!(reason.contains("3 consecutive failures"), "{}", reason);
    assert!(reason.contains("http_error:500"), "{}", reason);
    assert_eq!(progress.failed_items, 0);

    let stored = ctx.runtime.get_run(&run.id).await.unwrap();
    assert_eq!(stored.status, RunStatus::Paused);
    assert_eq!(stored.error.as_deref(), Some(reason.as_str()));
    let checkpoint = checkpoint_of(&ctx, &run.id).await;
    assert_eq!(checkpoint.pause_reason.as_deref(), Some(reason.as_str()));
    assert_eq!(checkpoint.position, PhaseCursor::at(Phase::Source, 0, vec![]));

    // Workers stopped with the circuit; nothing after c1 was tried
    assert_eq!(ctx.catalog.calls(), vec!["c1", "c1", "c1"]);
    let errors = ctx
        .runtime
        .activity(&run.id)
        .drain()
        .into_iter()
        .filter(|e| e.action == ActivityAction::Error)
        .count();
    assert_eq!(errors, 3);
}

#[tokio::test]
async fn auto_paused_run_resumes_cleanly() {
    let ctx = setup(stocked_catalog(), stocked_search());
    ctx.catalog.fail_times("c1", RemoteError::Timeout, 3);
    let run = ctx.started_run(kitchen_and_garden()).await;
    assert!(matches!(ctx.runtime.execute(&run.id).await.unwrap(), RunOutcome::Paused { .. }));

    let resumed = ctx.runtime.resume_run(&run.id).await.unwrap();
    assert_eq!(resumed.error, None);
    let outcome = ctx.runtime.execute(&run.id).await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed { progress: expected_stocked_progress() });
}

#[tokio::test(start_paused = true)]
async fn rate_limits_never_trip_the_circuit() {
    let ctx = setup(stocked_catalog(), stocked_search());
    ctx.catalog.fail_times("c1", RemoteError::RateLimited, 7);
    ctx.search.fail_times("Kettle", RemoteError::RateLimited, 4);
    let run = ctx.started_run(kitchen_and_garden()).await;
    let started = tokio::time::Instant::now();

    let outcome = ctx.runtime.execute(&run.id).await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed { progress: expected_stocked_progress() });
    assert_eq!(ctx.catalog.calls_for("c1"), 8);
    // Every rate limit waits the configured delay
    assert!(started.elapsed() >= ctx.runtime.config().rate_limit_delay() * 11);
    let limited = ctx
        .runtime
        .activity(&run.id)
        .drain()
        .into_iter()
        .filter(|e| e.action == ActivityAction::RateLimited)
        .count();
    assert_eq!(limited, 11);
}

#[tokio::test]
async fn success_resets_the_failure_streak() {
    let ctx = setup(stocked_catalog(), stocked_search());
    // Two failures each, always followed by a success: never three in a row
    ctx.catalog.fail_times("c1", RemoteError::Http(503), 2);
    ctx.catalog.fail_times("c2", RemoteError::Http(503), 2);
    ctx.catalog.fail_times("c3", RemoteError::Http(503), 2);
    let run = ctx.started_run(kitchen_and_garden()).await;

    let outcome = ctx.runtime.execute(&run.id).await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed { progress: expected_stocked_progress() });
    assert_eq!(ctx.catalog.calls().len(), 9);
}

#[tokio::test]
async fn exhausted_attempts_below_threshold_fail_only_the_task() {
    let config = EngineConfig { failure_threshold: 10, ..test_config() };
    let ctx = setup_with(stocked_catalog(), stocked_search(), config);
    ctx.catalog.fail_times("c3", RemoteError::Http(500), 3);
    let run = ctx.started_run(kitchen_and_garden()).await;

    let outcome = ctx.runtime.execute(&run.id).await.unwrap();

    let progress = *outcome.progress();
    assert!(matches!(outcome, RunOutcome::Completed { .. }));
    assert_eq!(progress.failed_items, 1);
    assert_eq!(progress.categories_completed, 2);
    // garden never completes
    assert_eq!(progress.departments_completed, 1);
    assert_eq!(progress.products_total, 2);
    assert_eq!(progress.total_items, 5);
    assert_eq!(progress.settled_items(), 5);
}
