// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::strategies::*;
use proptest::prelude::*;

fn categories() -> Vec<Category> {
    vec![
        Category::new("c1", "Blenders", "kitchen"),
        Category::new("c2", "Kettles", "kitchen"),
        Category::new("c3", "Drills", "tools"),
    ]
}

#[test]
fn new_run_is_pending_with_totals() {
    let run = Run::new(OrgId::from("org-1"), "alice", "weekly", categories(), 42);
    assert_eq!(run.status, RunStatus::Pending);
    assert!(run.id.as_str().starts_with("run-"));
    assert_eq!(run.progress.categories_total, 3);
    assert_eq!(run.progress.departments_total, 2);
    assert_eq!(run.created_at_ms, 42);
    assert!(run.checkpoint.is_none());
}

#[yare::parameterized(
    start           = { RunStatus::Pending, RunAction::Start,      Some(RunStatus::Running) },
    pause           = { RunStatus::Running, RunAction::Pause,      Some(RunStatus::Paused) },
    resume          = { RunStatus::Paused,  RunAction::Resume,     Some(RunStatus::Running) },
    complete        = { RunStatus::Running, RunAction::Complete,   Some(RunStatus::Completed) },
    fail            = { RunStatus::Running, RunAction::Fail,       Some(RunStatus::Failed) },
    cancel_pending  = { RunStatus::Pending, RunAction::Cancel,     Some(RunStatus::Cancelled) },
    cancel_paused   = { RunStatus::Paused,  RunAction::Cancel,     Some(RunStatus::Cancelled) },
    checkpoint_keep = { RunStatus::Paused,  RunAction::Checkpoint, Some(RunStatus::Paused) },
    start_running   = { RunStatus::Running, RunAction::Start,      None },
    pause_pending   = { RunStatus::Pending, RunAction::Pause,      None },
    resume_running  = { RunStatus::Running, RunAction::Resume,     None },
    complete_paused = { RunStatus::Paused,  RunAction::Complete,   None },
)]
fn status_edges(from: RunStatus, action: RunAction, expected: Option<RunStatus>) {
    assert_eq!(from.next(action), expected);
}

#[test]
fn transition_stamps_timestamps() {
    let mut run = Run::builder().build();
    run.transition(RunAction::Start, 10).unwrap();
    assert_eq!(run.started_at_ms, Some(10));
    assert_eq!(run.finished_at_ms, None);

    run.transition(RunAction::Complete, 20).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.finished_at_ms, Some(20));
    assert_eq!(run.updated_at_ms, 20);
}

#[test]
fn resume_clears_pause_reason() {
    let mut run = Run::builder().status(RunStatus::Paused).error("circuit open").build();
    run.transition(RunAction::Resume, 5).unwrap();
    assert_eq!(run.status, RunStatus::Running);
    assert!(run.error.is_none());
}

#[test]
fn rejected_transition_leaves_run_untouched() {
    let mut run = Run::builder().status(RunStatus::Pending).build();
    let before = run.clone();
    let err = run.transition(RunAction::Pause, 99).unwrap_err();
    assert_eq!(err, InvalidTransition { from: RunStatus::Pending, action: RunAction::Pause });
    assert_eq!(err.to_string(), "cannot pause a run that is pending");
    assert_eq!(run, before);
}

#[test]
fn run_serde_round_trip_uses_snake_case_status() {
    let run = Run::builder().status(RunStatus::Paused).build();
    let json = serde_json::to_value(&run).unwrap();
    assert_eq!(json["status"], "paused");
    let back: Run = serde_json::from_value(json).unwrap();
    assert_eq!(back, run);
}

proptest! {
    #[test]
    fn terminal_statuses_have_no_outgoing_edges(status in arb_run_status(), action in arb_run_action()) {
        if status.is_terminal() {
            prop_assert_eq!(status.next(action), None);
        }
    }

    #[test]
    fn cancel_reaches_cancelled_from_every_live_status(status in arb_run_status()) {
        if !status.is_terminal() {
            prop_assert_eq!(status.next(RunAction::Cancel), Some(RunStatus::Cancelled));
        }
    }
}
