// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hv_adapters::{CatalogItem, SearchPage};
use hv_core::test_support::seller;
use hv_core::{PartialTask, TaskPosition};

#[tokio::test(start_paused = true)]
async fn paused_run_resumes_to_the_same_counters() {
    let ctx = setup(stocked_catalog().with_latency(LATENCY), stocked_search());
    let run = ctx.started_run(kitchen_and_garden()).await;

    let (outcome, paused) = tokio::join!(ctx.runtime.execute(&run.id), async {
        tokio::time::sleep(LATENCY + LATENCY / 2).await;
        ctx.runtime.pause_run(&run.id).await
    });
    paused.unwrap();
    let progress = match outcome.unwrap() {
        RunOutcome::Stopped { signal: Signal::Pause, progress } => progress,
        other => panic!("expected a paused stop, got {:?}", other),
    };
    // c1 finished before the pause; c2 was in flight and still lands
    assert_eq!(progress.processed_items, 2);
    let stored = ctx.runtime.get_run(&run.id).await.unwrap();
    assert_eq!(stored.status, RunStatus::Paused);
    assert_eq!(stored.progress.processed_items, 2);
    assert_eq!(checkpoint_of(&ctx, &run.id).await.position, PhaseCursor::at(Phase::Source, 2, vec![]));

    let outcome = ctx.runtime.resume_and_execute(&run.id).await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed { progress: expected_stocked_progress() });
    assert_eq!(ctx.catalog.calls(), vec!["c1", "c2", "c3"]);
}

#[tokio::test]
async fn resume_in_search_phase_skips_sourcing() {
    let ctx = setup(stocked_catalog(), stocked_search());
    ctx.search.fail_times("Toaster", RemoteError::Http(502), 3);
    let run = ctx.started_run(kitchen_and_garden()).await;

    let outcome = ctx.runtime.execute(&run.id).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Paused { .. }));
    let checkpoint = checkpoint_of(&ctx, &run.id).await;
    assert_eq!(checkpoint.position, PhaseCursor::at(Phase::Search, 1, vec![]));

    let outcome = ctx.runtime.resume_and_execute(&run.id).await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed { progress: expected_stocked_progress() });
    assert_eq!(ctx.catalog.calls().len(), 3);
    assert_eq!(ctx.search.calls_for("Kettle"), 2);
}

#[tokio::test(start_paused = true)]
async fn crashed_run_is_recovered_and_finished_by_a_new_runtime() {
    let ctx = setup(stocked_catalog().with_latency(LATENCY), stocked_search());
    let run = ctx.started_run(kitchen_and_garden()).await;

    // Dropping the execution mid-phase stands in for a crash
    let crashed = tokio::time::timeout(LATENCY + LATENCY / 2, ctx.runtime.execute(&run.id)).await;
    assert!(crashed.is_err());

    let restarted = setup_on(ctx.store.clone(), stocked_catalog(), stocked_search(), test_config());
    let incomplete = restarted.runtime.recover().await.unwrap();
    assert_eq!(incomplete.len(), 1);
    assert_eq!(incomplete[0].id, run.id);
    assert_eq!(incomplete[0].status, RunStatus::Running);
    assert_eq!(incomplete[0].progress.processed_items, 1);

    let outcome = restarted.runtime.execute(&run.id).await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed { progress: expected_stocked_progress() });
    // c1 is not fetched again; c2 was lost mid-call and is redone
    assert_eq!(restarted.catalog.calls(), vec!["c2", "c3"]);
}

#[tokio::test]
async fn recover_reports_nothing_when_all_runs_settled() {
    let ctx = setup(stocked_catalog(), stocked_search());
    let run = ctx.started_run(kitchen_and_garden()).await;
    ctx.runtime.execute(&run.id).await.unwrap();

    assert!(ctx.runtime.recover().await.unwrap().is_empty());
}

#[tokio::test]
async fn category_failed_before_a_trip_keeps_its_department_open() {
    let uninterrupted = {
        let config = EngineConfig { failure_threshold: 10, ..test_config() };
        let ctx = setup_with(stocked_catalog(), stocked_search(), config);
        ctx.catalog.fail_times("c1", RemoteError::Http(500), 3);
        let run = ctx.started_run(kitchen_and_garden()).await;
        *ctx.runtime.execute(&run.id).await.unwrap().progress()
    };

    // c1 exhausts its attempts, then one c2 failure trips the circuit
    let config = EngineConfig { failure_threshold: 4, ..test_config() };
    let ctx = setup_with(stocked_catalog(), stocked_search(), config);
    ctx.catalog.fail_times("c1", RemoteError::Http(500), 3);
    ctx.catalog.fail_times("c2", RemoteError::Http(500), 1);
    let run = ctx.started_run(kitchen_and_garden()).await;

    let outcome = ctx.runtime.execute(&run.id).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Paused { .. }), "{:?}", outcome);
    let PhaseCursor::Source(position) = checkpoint_of(&ctx, &run.id).await.position else {
        panic!("expected a source checkpoint");
    };
    assert_eq!(position.cursor, 1);
    assert_eq!(position.failed, vec![0]);

    let outcome = ctx.runtime.resume_and_execute(&run.id).await.unwrap();

    assert!(matches!(outcome, RunOutcome::Completed { .. }), "{:?}", outcome);
    assert_eq!(outcome.progress().departments_completed, 1);
    assert_eq!(*outcome.progress(), uninterrupted);
}

fn paged_kettle() -> (FakeCatalog, FakeSearch) {
    let catalog = FakeCatalog::new().with_items("c1", vec![CatalogItem::new("k-1", "Kettle", 40.0)]);
    let search = FakeSearch::new()
        .with_page("Kettle", 0, SearchPage::new(vec![seller("Acme")], true))
        .with_page("Kettle", 1, SearchPage::new(vec![seller("Birch")], false));
    (catalog, search)
}

#[tokio::test(start_paused = true)]
async fn pause_between_pages_resumes_at_the_next_page() {
    let uninterrupted = {
        let (catalog, search) = paged_kettle();
        let ctx = setup(catalog, search);
        let run = ctx.started_run(categories(&[("c1", "kitchen")])).await;
        *ctx.runtime.execute(&run.id).await.unwrap().progress()
    };
    assert_eq!((uninterrupted.entities_found, uninterrupted.entities_new), (2, 2));

    let (catalog, search) = paged_kettle();
    let ctx = setup(catalog, search.with_latency(LATENCY));
    let run = ctx.started_run(categories(&[("c1", "kitchen")])).await;

    // Page 0 is in flight when the pause lands; it is merged, page 1 is not
    let (outcome, _) = tokio::join!(ctx.runtime.execute(&run.id), async {
        tokio::time::sleep(LATENCY / 2).await;
        ctx.runtime.pause_run(&run.id).await.unwrap();
    });
    let progress = *outcome.unwrap().progress();
    assert_eq!((progress.entities_found, progress.entities_new), (1, 1));
    assert_eq!(
        checkpoint_of(&ctx, &run.id).await.position,
        PhaseCursor::within(
            Phase::Search,
            TaskPosition { partial: vec![PartialTask { index: 0, next_page: 1 }], ..TaskPosition::default() },
        )
    );

    let outcome = ctx.runtime.resume_and_execute(&run.id).await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed { progress: uninterrupted });
    let pages: Vec<u32> = ctx.search.calls().iter().map(|q| q.page).collect();
    assert_eq!(pages, vec![0, 1]);
}
