// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{Category, OrgId, RunId, SellerHit, SourceItem};

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for the run state machine.
pub mod strategies {
    use crate::run::{RunAction, RunStatus};
    use proptest::prelude::*;

    pub fn arb_run_status() -> impl Strategy<Value = RunStatus> {
        proptest::sample::select(RunStatus::ALL.to_vec())
    }

    pub fn arb_run_action() -> impl Strategy<Value = RunAction> {
        prop_oneof![
            Just(RunAction::Start),
            Just(RunAction::Pause),
            Just(RunAction::Resume),
            Just(RunAction::Cancel),
            Just(RunAction::Checkpoint),
            Just(RunAction::Complete),
            Just(RunAction::Fail),
        ]
    }
}

// ── Fixtures ────────────────────────────────────────────────────────────

pub fn org(id: &str) -> OrgId {
    OrgId::from_string(id)
}

/// `(id, department)` pairs to categories named after their id.
pub fn categories(specs: &[(&str, &str)]) -> Vec<Category> {
    specs.iter().map(|(id, dept)| Category::new(*id, format!("{} category", id), *dept)).collect()
}

pub fn source_item(run: &RunId, category: &str, position: usize, name: &str) -> SourceItem {
    SourceItem {
        run_id: run.clone(),
        category_id: category.to_string(),
        position,
        external_id: format!("{}-{}", category, position),
        name: name.to_string(),
        reference_price: 100.0,
    }
}

pub fn seller(name: &str) -> SellerHit {
    SellerHit::new(name, "market")
}
