// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run progress counters

use serde::{Deserialize, Serialize};

/// Counters reported for a run.
///
/// `total_items`/`processed_items`/`failed_items` count tasks across both
/// phases; a task is one category fetch in the source phase or one product
/// search in the search phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    pub total_items: u64,
    pub processed_items: u64,
    pub failed_items: u64,
    pub departments_total: u64,
    pub departments_completed: u64,
    pub categories_total: u64,
    pub categories_completed: u64,
    pub products_total: u64,
    pub products_searched: u64,
    pub entities_found: u64,
    pub entities_new: u64,
}

impl Progress {
    /// Tasks that have finished, successfully or not.
    pub fn settled_items(&self) -> u64 {
        self.processed_items + self.failed_items
    }

    /// Tasks still outstanding. Saturates at zero.
    pub fn remaining_items(&self) -> u64 {
        self.total_items.saturating_sub(self.settled_items())
    }

    /// Add the counters of a single task's contribution.
    ///
    /// Totals (`*_total`) are left alone; they are fixed when a phase is
    /// planned, except `products_total`, which the source phase grows as
    /// items arrive.
    pub fn absorb(&mut self, delta: &Progress) {
        self.processed_items += delta.processed_items;
        self.failed_items += delta.failed_items;
        self.departments_completed += delta.departments_completed;
        self.categories_completed += delta.categories_completed;
        self.products_total += delta.products_total;
        self.products_searched += delta.products_searched;
        self.entities_found += delta.entities_found;
        self.entities_new += delta.entities_new;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorb_leaves_fixed_totals() {
        let mut progress = Progress { total_items: 4, categories_total: 2, ..Progress::default() };
        progress.absorb(&Progress {
            total_items: 99,
            processed_items: 1,
            categories_completed: 1,
            products_total: 7,
            ..Progress::default()
        });
        assert_eq!(progress.total_items, 4);
        assert_eq!(progress.processed_items, 1);
        assert_eq!(progress.categories_completed, 1);
        assert_eq!(progress.products_total, 7);
        assert_eq!(progress.remaining_items(), 3);
    }

    #[test]
    fn remaining_saturates() {
        let progress = Progress { total_items: 1, processed_items: 2, ..Progress::default() };
        assert_eq!(progress.remaining_items(), 0);
    }
}
