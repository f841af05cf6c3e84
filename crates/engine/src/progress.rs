// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Incremental completion bookkeeping for a phase

use hv_core::{Category, PartialTask, Phase, PhaseCursor, Resume, TaskPosition};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Low-water mark over a phase's ordered task list.
///
/// Tasks finish out of order; the cursor only advances over a contiguous
/// prefix of settled tasks, and anything settled beyond it is kept in
/// `ahead`. Failed and part-way tasks are carried along so a resume can
/// tell them apart.
#[derive(Debug, Clone)]
pub struct CursorTracker {
    cursor: usize,
    ahead: BTreeSet<usize>,
    failed: BTreeSet<usize>,
    partial: BTreeMap<usize, u32>,
    total: usize,
}

impl CursorTracker {
    pub fn new(resume: &Resume, total: usize) -> Self {
        let mut tracker = match resume {
            Resume::Fresh => Self::starting_at(0, total),
            Resume::From { cursor, completed_ahead, failed, partial } => Self {
                cursor: *cursor,
                ahead: completed_ahead.clone(),
                failed: failed.clone(),
                partial: partial.clone(),
                total,
            },
            Resume::Done => Self::starting_at(total, total),
        };
        tracker.advance();
        tracker
    }

    fn starting_at(cursor: usize, total: usize) -> Self {
        Self {
            cursor,
            ahead: BTreeSet::new(),
            failed: BTreeSet::new(),
            partial: BTreeMap::new(),
            total,
        }
    }

    /// Record task `index` as settled successfully.
    pub fn mark(&mut self, index: usize) {
        self.partial.remove(&index);
        if index >= self.cursor {
            self.ahead.insert(index);
            self.advance();
        }
    }

    /// Record task `index` as settled with a failure.
    pub fn mark_failed(&mut self, index: usize) {
        self.failed.insert(index);
        self.mark(index);
    }

    /// Record task `index` as stopped before `next_page`; it stays pending.
    pub fn mark_partial(&mut self, index: usize, next_page: u32) {
        self.partial.insert(index, next_page);
    }

    fn advance(&mut self) {
        while self.ahead.remove(&self.cursor) {
            self.cursor += 1;
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.total
    }

    /// Checkpoint position for `phase`.
    pub fn position(&self, phase: Phase) -> PhaseCursor {
        if self.is_complete() {
            return PhaseCursor::complete(phase);
        }
        PhaseCursor::within(
            phase,
            TaskPosition {
                cursor: self.cursor,
                completed_ahead: self.ahead.iter().copied().collect(),
                failed: self.failed.iter().copied().collect(),
                partial: self
                    .partial
                    .iter()
                    .map(|(&index, &next_page)| PartialTask { index, next_page })
                    .collect(),
            },
        )
    }
}

/// What finishing a category rolled up into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rollup {
    pub category_completed: bool,
    pub department_completed: bool,
}

/// Remaining-count maps for categories and departments.
///
/// Each success decrements its category and, when the category reaches zero,
/// its department. O(1) per task.
#[derive(Debug, Clone, Default)]
pub struct CompletionTracker {
    by_category: HashMap<String, usize>,
    department_of: HashMap<String, String>,
    by_department: HashMap<String, usize>,
}

impl CompletionTracker {
    /// Track `categories`, skipping those `resume` reports succeeded.
    ///
    /// Categories that failed before the checkpoint are tracked but can never
    /// complete, so their department stays incomplete as it would have
    /// without the interruption.
    pub fn new(categories: &[Category], resume: &Resume) -> Self {
        let mut tracker = Self::default();
        for (index, category) in categories.iter().enumerate() {
            if resume.succeeded(index) {
                continue;
            }
            *tracker.by_category.entry(category.id.clone()).or_default() += 1;
            if tracker
                .department_of
                .insert(category.id.clone(), category.department.clone())
                .is_none()
            {
                *tracker.by_department.entry(category.department.clone()).or_default() += 1;
            }
        }
        tracker
    }

    /// Record one successful task for `category_id`.
    pub fn complete(&mut self, category_id: &str) -> Rollup {
        let mut rollup = Rollup::default();
        let Some(remaining) = self.by_category.get_mut(category_id) else {
            return rollup;
        };
        *remaining -= 1;
        if *remaining > 0 {
            return rollup;
        }
        self.by_category.remove(category_id);
        rollup.category_completed = true;

        let Some(department) = self.department_of.get(category_id) else {
            return rollup;
        };
        if let Some(left) = self.by_department.get_mut(department) {
            *left -= 1;
            if *left == 0 {
                self.by_department.remove(department);
                rollup.department_completed = true;
            }
        }
        rollup
    }

    pub fn categories_remaining(&self) -> usize {
        self.by_category.len()
    }

    pub fn departments_remaining(&self) -> usize {
        self.by_department.len()
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
