// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs interrupted by a crash or a pause finish in a later process.

use crate::pipeline::expected_progress;
use crate::prelude::*;
use hv_core::test_support::org;
use hv_core::RunStatus;
use hv_engine::{RunOutcome, Signal};
use std::time::Duration;
use tempfile::tempdir;

const LATENCY: Duration = Duration::from_secs(1);

#[tokio::test(start_paused = true)]
async fn crashed_run_resumes_in_a_new_process() {
    let dir = tempdir().unwrap();
    let runtime = runtime_in(dir.path(), catalog().with_latency(LATENCY), search());
    let run = runtime.create_run(&org("org-a"), "alice", departments(), None).await.unwrap();
    runtime.start_run(&run.id).await.unwrap();

    let crashed = tokio::time::timeout(LATENCY * 3 / 2, runtime.execute(&run.id)).await;
    assert!(crashed.is_err());
    drop(runtime);

    let restarted = runtime_in(dir.path(), catalog(), search());
    let incomplete = restarted.recover().await.unwrap();
    assert_eq!(incomplete.len(), 1);
    assert_eq!(incomplete[0].status, RunStatus::Running);
    assert!(incomplete[0].progress.processed_items > 0);

    let outcome = restarted.execute(&run.id).await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed { progress: expected_progress() });
}

#[tokio::test(start_paused = true)]
async fn paused_run_survives_a_restart() {
    let dir = tempdir().unwrap();
    let runtime = runtime_in(dir.path(), catalog().with_latency(LATENCY), search());
    let run = runtime.create_run(&org("org-a"), "alice", departments(), None).await.unwrap();
    runtime.start_run(&run.id).await.unwrap();

    let (outcome, _) = tokio::join!(runtime.execute(&run.id), async {
        tokio::time::sleep(LATENCY / 2).await;
        runtime.pause_run(&run.id).await.unwrap();
    });
    assert!(matches!(outcome.unwrap(), RunOutcome::Stopped { signal: Signal::Pause, .. }));
    drop(runtime);

    let restarted = runtime_in(dir.path(), catalog(), search());
    let incomplete = restarted.recover().await.unwrap();
    assert_eq!(incomplete[0].status, RunStatus::Paused);

    let outcome = restarted.resume_and_execute(&run.id).await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed { progress: expected_progress() });
}
