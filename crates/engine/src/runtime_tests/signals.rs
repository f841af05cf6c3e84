// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test(start_paused = true)]
async fn cancel_mid_run_stops_workers_and_is_final() {
    let ctx = setup(stocked_catalog().with_latency(LATENCY), stocked_search());
    let run = ctx.started_run(kitchen_and_garden()).await;

    let (outcome, cancelled) = tokio::join!(ctx.runtime.execute(&run.id), async {
        tokio::time::sleep(LATENCY / 2).await;
        ctx.runtime.cancel_run(&run.id).await
    });

    assert_eq!(cancelled.unwrap().status, RunStatus::Cancelled);
    assert!(matches!(outcome.unwrap(), RunOutcome::Stopped { signal: Signal::Cancel, .. }));
    assert_eq!(ctx.catalog.calls(), vec!["c1"]);

    let stored = ctx.runtime.get_run(&run.id).await.unwrap();
    assert_eq!(stored.status, RunStatus::Cancelled);
    // The in-flight result arrived after the cancel and was not recorded
    assert_eq!(stored.progress.processed_items, 0);

    let err = ctx.runtime.resume_run(&run.id).await.unwrap_err();
    assert!(matches!(err.rejection(), Some(Rejection::InvalidTransition { .. })));
    let err = ctx.runtime.execute(&run.id).await.unwrap_err();
    assert!(matches!(err.rejection(), Some(Rejection::NotRunning { .. })));
}

#[tokio::test(start_paused = true)]
async fn pause_then_cancel_reports_cancel() {
    let ctx = setup(stocked_catalog().with_latency(LATENCY), stocked_search());
    let run = ctx.started_run(kitchen_and_garden()).await;

    let (outcome, _) = tokio::join!(ctx.runtime.execute(&run.id), async {
        tokio::time::sleep(LATENCY / 2).await;
        ctx.runtime.pause_run(&run.id).await.unwrap();
        ctx.runtime.cancel_run(&run.id).await.unwrap();
    });

    assert!(matches!(outcome.unwrap(), RunOutcome::Stopped { signal: Signal::Cancel, .. }));
    assert_eq!(ctx.runtime.get_run(&run.id).await.unwrap().status, RunStatus::Cancelled);
}

#[tokio::test]
async fn paused_run_does_not_execute() {
    let ctx = setup(stocked_catalog(), stocked_search());
    let run = ctx.started_run(kitchen_and_garden()).await;
    ctx.runtime.pause_run(&run.id).await.unwrap();

    let err = ctx.runtime.execute(&run.id).await.unwrap_err();

    assert_eq!(
        err.rejection(),
        Some(&Rejection::NotRunning { id: run.id.clone(), status: RunStatus::Paused })
    );
    assert!(ctx.catalog.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn resumed_run_is_not_stopped_by_the_old_pause() {
    let ctx = setup(stocked_catalog().with_latency(LATENCY), stocked_search());
    let run = ctx.started_run(kitchen_and_garden()).await;
    ctx.runtime.pause_run(&run.id).await.unwrap();

    let outcome = ctx.runtime.resume_and_execute(&run.id).await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed { progress: expected_stocked_progress() });
}

#[tokio::test]
async fn completed_run_releases_its_token() {
    let ctx = setup(stocked_catalog(), stocked_search());
    let run = ctx.started_run(kitchen_and_garden()).await;

    ctx.runtime.execute(&run.id).await.unwrap();

    assert!(!ctx.runtime.signals().contains(&run.id));
    assert!(ctx.runtime.signals().is_empty());
}

#[tokio::test]
async fn failed_run_releases_its_token() {
    let config = EngineConfig { max_attempts: 1, failure_threshold: 10, ..test_config() };
    let ctx = setup_with(stocked_catalog(), stocked_search(), config);
    for id in ["c1", "c2", "c3"] {
        ctx.catalog.fail_times(id, RemoteError::Other("down".into()), 1);
    }
    let run = ctx.started_run(kitchen_and_garden()).await;

    let outcome = ctx.runtime.execute(&run.id).await.unwrap();

    assert!(matches!(outcome, RunOutcome::Failed { .. }));
    assert!(ctx.runtime.signals().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancelled_run_releases_its_token() {
    let ctx = setup(stocked_catalog().with_latency(LATENCY), stocked_search());
    let run = ctx.started_run(kitchen_and_garden()).await;

    let (outcome, _) = tokio::join!(ctx.runtime.execute(&run.id), async {
        tokio::time::sleep(LATENCY / 2).await;
        ctx.runtime.cancel_run(&run.id).await.unwrap();
    });

    assert!(matches!(outcome.unwrap(), RunOutcome::Stopped { signal: Signal::Cancel, .. }));
    assert!(ctx.runtime.signals().is_empty());
}

#[tokio::test]
async fn paused_run_keeps_its_token_until_resumed() {
    let ctx = setup(stocked_catalog(), stocked_search());
    let run = ctx.started_run(kitchen_and_garden()).await;
    ctx.runtime.pause_run(&run.id).await.unwrap();
    assert!(ctx.runtime.signals().contains(&run.id));

    ctx.runtime.resume_and_execute(&run.id).await.unwrap();

    assert!(ctx.runtime.signals().is_empty());
}
