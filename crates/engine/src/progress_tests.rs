// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hv_core::test_support::categories;
use hv_core::TaskPosition;
use proptest::prelude::*;

#[test]
fn cursor_waits_for_gaps() {
    let mut tracker = CursorTracker::new(&Resume::Fresh, 5);
    tracker.mark(1);
    tracker.mark(3);
    assert_eq!(tracker.position(Phase::Source), PhaseCursor::at(Phase::Source, 0, vec![1, 3]));

    tracker.mark(0);
    assert_eq!(tracker.position(Phase::Source), PhaseCursor::at(Phase::Source, 2, vec![3]));

    tracker.mark(2);
    tracker.mark(4);
    assert!(tracker.is_complete());
    assert_eq!(tracker.position(Phase::Source), PhaseCursor::SourceComplete);
}

#[test]
fn resume_restores_position() {
    let resume = Resume::from_position(&TaskPosition::new(2, vec![4]));
    let mut tracker = CursorTracker::new(&resume, 6);
    tracker.mark(1);
    assert_eq!(tracker.cursor(), 2);
    tracker.mark(2);
    tracker.mark(3);
    assert_eq!(tracker.position(Phase::Search), PhaseCursor::at(Phase::Search, 5, vec![]));
}

#[test]
fn done_resume_is_complete() {
    let tracker = CursorTracker::new(&Resume::Done, 3);
    assert_eq!(tracker.position(Phase::Search), PhaseCursor::SearchComplete);
}

proptest! {
    #[test]
    fn any_completion_order_reaches_the_end(order in Just((0..12usize).collect::<Vec<_>>()).prop_shuffle()) {
        let mut tracker = CursorTracker::new(&Resume::Fresh, order.len());
        for index in order {
            tracker.mark(index);
        }
        prop_assert!(tracker.is_complete());
        prop_assert_eq!(tracker.cursor(), 12);
    }
}

#[test]
fn departments_complete_with_their_last_category() {
    let cats = categories(&[("c1", "kitchen"), ("c2", "kitchen"), ("c3", "garden")]);
    let mut tracker = CompletionTracker::new(&cats, &Resume::Fresh);
    assert_eq!(tracker.departments_remaining(), 2);

    assert_eq!(
        tracker.complete("c1"),
        Rollup { category_completed: true, department_completed: false }
    );
    assert_eq!(
        tracker.complete("c3"),
        Rollup { category_completed: true, department_completed: true }
    );
    assert_eq!(
        tracker.complete("c2"),
        Rollup { category_completed: true, department_completed: true }
    );
    assert_eq!(tracker.categories_remaining(), 0);
    assert_eq!(tracker.complete("c2"), Rollup::default());
}

#[test]
fn succeeded_categories_are_not_tracked() {
    let cats = categories(&[("c1", "kitchen"), ("c2", "kitchen")]);
    let resume = Resume::from_position(&TaskPosition::new(1, vec![]));
    let mut tracker = CompletionTracker::new(&cats, &resume);
    assert_eq!(tracker.categories_remaining(), 1);
    assert_eq!(tracker.complete("c1"), Rollup::default());
    assert!(tracker.complete("c2").department_completed);
}

#[test]
fn failed_category_before_checkpoint_still_blocks_its_department() {
    let cats = categories(&[("c1", "kitchen"), ("c2", "kitchen"), ("c3", "garden")]);
    let mut tracker = CursorTracker::new(&Resume::Fresh, cats.len());
    tracker.mark_failed(0);
    let PhaseCursor::Source(position) = tracker.position(Phase::Source) else {
        panic!("expected a source position");
    };
    assert_eq!(position.failed, vec![0]);

    let resume = Resume::from_position(&position);
    let mut rollup = CompletionTracker::new(&cats, &resume);
    assert_eq!(
        rollup.complete("c2"),
        Rollup { category_completed: true, department_completed: false }
    );
    assert!(rollup.complete("c3").department_completed);
    assert_eq!(rollup.departments_remaining(), 1);
}

#[test]
fn partial_tasks_stay_pending_until_marked() {
    let mut tracker = CursorTracker::new(&Resume::Fresh, 3);
    tracker.mark(0);
    tracker.mark_partial(1, 2);
    let position = tracker.position(Phase::Search);
    let resume = match &position {
        PhaseCursor::Search(p) => Resume::from_position(p),
        other => panic!("unexpected {:?}", other),
    };
    assert!(!resume.is_done(1));
    assert_eq!(resume.start_page(1), 2);

    let mut resumed = CursorTracker::new(&resume, 3);
    resumed.mark(1);
    resumed.mark(2);
    assert_eq!(resumed.position(Phase::Search), PhaseCursor::SearchComplete);
}

#[test]
fn settling_a_partial_task_drops_its_page() {
    let mut tracker = CursorTracker::new(&Resume::Fresh, 3);
    tracker.mark_partial(1, 1);
    tracker.mark(1);
    assert_eq!(tracker.position(Phase::Search), PhaseCursor::at(Phase::Search, 0, vec![1]));
}
