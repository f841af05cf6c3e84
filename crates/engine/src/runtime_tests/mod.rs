// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime tests

mod circuit;
mod execute;
mod failures;
mod resume;
mod schedule;
mod signals;

use super::*;
use crate::error::Rejection;
use crate::signal::Signal;
use crate::test_helpers::{
    init_tracing, kitchen_and_garden, setup, setup_on, setup_with, stocked_catalog, stocked_search,
    test_config, TestContext, LATENCY,
};
use hv_adapters::{FakeCatalog, FakeSearch, RemoteError};
use hv_core::test_support::{categories, org};
use hv_core::{ActivityAction, Phase, PhaseCursor, Progress, RunStatus};
use hv_storage::StoreOp;
use std::time::Duration;

/// Counters of an uninterrupted run over [`kitchen_and_garden`] with the
/// stocked fakes.
fn expected_stocked_progress() -> Progress {
    Progress {
        total_items: 6,
        processed_items: 6,
        failed_items: 0,
        departments_total: 2,
        departments_completed: 2,
        categories_total: 3,
        categories_completed: 3,
        products_total: 3,
        products_searched: 3,
        entities_found: 4,
        entities_new: 2,
    }
}

async fn checkpoint_of(ctx: &TestContext, id: &RunId) -> hv_core::Checkpoint {
    ctx.runtime.get_run(id).await.unwrap().decode_checkpoint().unwrap().unwrap()
}
