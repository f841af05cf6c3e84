// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn stocked_run_completes_both_phases() {
    init_tracing();
    let ctx = setup(stocked_catalog(), stocked_search());
    let run = ctx.started_run(kitchen_and_garden()).await;

    let outcome = ctx.runtime.execute(&run.id).await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed { progress: expected_stocked_progress() });
    let stored = ctx.runtime.get_run(&run.id).await.unwrap();
    assert_eq!(stored.status, RunStatus::Completed);
    assert_eq!(stored.progress, expected_stocked_progress());
    assert!(stored.finished_at_ms.is_some());
    assert_eq!(checkpoint_of(&ctx, &run.id).await.position, PhaseCursor::SearchComplete);

    assert_eq!(ctx.catalog.calls(), vec!["c1", "c2", "c3"]);
    assert_eq!(ctx.search.calls_for("Kettle"), 2);
    assert_eq!(ctx.search.calls_for("Toaster"), 1);
    assert_eq!(ctx.search.calls_for("Rake"), 1);
}

#[tokio::test]
async fn search_queries_bracket_the_reference_price() {
    let ctx = setup(stocked_catalog(), stocked_search());
    let run = ctx.started_run(kitchen_and_garden()).await;
    ctx.runtime.execute(&run.id).await.unwrap();

    let kettle = ctx.search.calls().into_iter().find(|q| q.query == "Kettle").unwrap();
    assert!((kettle.min_price - 32.0).abs() < 1e-9);
    assert!((kettle.max_price - 48.0).abs() < 1e-9);
    assert_eq!(kettle.page, 0);
}

#[tokio::test]
async fn items_are_stored_in_catalog_order() {
    let ctx = setup(stocked_catalog(), stocked_search());
    let run = ctx.started_run(kitchen_and_garden()).await;
    ctx.runtime.execute(&run.id).await.unwrap();

    let items = ctx.store.list_items(&run.id).await.unwrap();
    let mut names: Vec<(String, usize, String)> =
        items.into_iter().map(|i| (i.category_id, i.position, i.name)).collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            ("c1".to_string(), 0, "Kettle".to_string()),
            ("c1".to_string(), 1, "Toaster".to_string()),
            ("c3".to_string(), 0, "Rake".to_string()),
        ]
    );
}

#[tokio::test]
async fn activity_reports_each_step() {
    let ctx = setup(stocked_catalog(), stocked_search());
    let run = ctx.started_run(kitchen_and_garden()).await;
    ctx.runtime.execute(&run.id).await.unwrap();

    let events = ctx.runtime.activity(&run.id).drain();
    assert!(events.windows(2).all(|w| w[0].id < w[1].id));

    let source_found: Vec<_> = events
        .iter()
        .filter(|e| e.phase == Phase::Source && e.action == ActivityAction::Found)
        .collect();
    assert_eq!(source_found.len(), 3);
    assert_eq!(source_found[0].payload.as_ref().unwrap()["items"], 2);

    let searched = events
        .iter()
        .filter(|e| e.phase == Phase::Search && e.action == ActivityAction::Complete)
        .count();
    assert_eq!(searched, 3);

    assert!(ctx.runtime.release_activity(&run.id));
    assert!(!ctx.runtime.release_activity(&run.id));
}

#[tokio::test]
async fn empty_catalog_skips_search() {
    let ctx = setup(FakeCatalog::new(), FakeSearch::new());
    let run = ctx.started_run(kitchen_and_garden()).await;

    let outcome = ctx.runtime.execute(&run.id).await.unwrap();

    let progress = *outcome.progress();
    assert!(matches!(outcome, RunOutcome::Completed { .. }));
    assert_eq!(progress.total_items, 3);
    assert_eq!(progress.categories_completed, 3);
    assert_eq!(progress.departments_completed, 2);
    assert_eq!(progress.products_total, 0);
    assert!(ctx.search.calls().is_empty());
    assert_eq!(checkpoint_of(&ctx, &run.id).await.position, PhaseCursor::SourceComplete);
}

#[tokio::test]
async fn run_without_categories_completes() {
    let ctx = setup(FakeCatalog::new(), FakeSearch::new());
    let run = ctx.started_run(Vec::new()).await;

    let outcome = ctx.runtime.execute(&run.id).await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed { progress: Progress::default() });
}

#[tokio::test]
async fn entities_carry_over_between_runs() {
    let ctx = setup(stocked_catalog(), stocked_search());
    let first = ctx.started_run(kitchen_and_garden()).await;
    ctx.runtime.execute(&first.id).await.unwrap();

    let second = ctx.started_run(kitchen_and_garden()).await;
    let outcome = ctx.runtime.execute(&second.id).await.unwrap();

    assert_eq!(outcome.progress().entities_found, 4);
    assert_eq!(outcome.progress().entities_new, 0);
    let acme = ctx.store.find_entities(&org("org-a"), "market", &["acme".to_string()]).await.unwrap();
    assert_eq!(acme[0].first_seen_run, first.id);
    assert_eq!(acme[0].last_seen_run, second.id);
    assert_eq!(ctx.store.inner().snapshot().entity_count(), 2);
}

#[tokio::test]
async fn only_running_runs_execute() {
    let ctx = setup(stocked_catalog(), stocked_search());
    let run = ctx
        .runtime
        .create_run(&org("org-a"), "alice", kitchen_and_garden(), None)
        .await
        .unwrap();

    let err = ctx.runtime.execute(&run.id).await.unwrap_err();

    assert_eq!(
        err.rejection(),
        Some(&Rejection::NotRunning { id: run.id.clone(), status: RunStatus::Pending })
    );
    assert!(ctx.catalog.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn a_run_executes_once_at_a_time() {
    let ctx = setup(stocked_catalog().with_latency(LATENCY), stocked_search());
    let run = ctx.started_run(kitchen_and_garden()).await;

    let (first, second) = tokio::join!(ctx.runtime.execute(&run.id), ctx.runtime.execute(&run.id));

    assert!(matches!(first.unwrap(), RunOutcome::Completed { .. }));
    assert_eq!(
        second.unwrap_err().rejection(),
        Some(&Rejection::AlreadyExecuting(run.id.clone()))
    );
    // The claim is released once execution ends
    let err = ctx.runtime.execute(&run.id).await.unwrap_err();
    assert!(matches!(err.rejection(), Some(Rejection::NotRunning { .. })));
}

#[tokio::test]
async fn timestamps_follow_the_clock() {
    let ctx = setup(stocked_catalog(), stocked_search());
    let run = ctx.started_run(kitchen_and_garden()).await;
    ctx.clock.advance(Duration::from_secs(60));
    ctx.runtime.execute(&run.id).await.unwrap();

    let stored = ctx.runtime.get_run(&run.id).await.unwrap();
    assert_eq!(stored.finished_at_ms, Some(run.created_at_ms + 60_000));
    assert_eq!(checkpoint_of(&ctx, &run.id).await.written_at_ms, run.created_at_ms + 60_000);
}
