// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hv-core: domain types for resumable two-phase collection runs

pub mod macros;

pub mod activity;
pub mod checkpoint;
pub mod clock;
pub mod entity;
pub mod id;
pub mod progress;
pub mod records;
pub mod run;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use activity::{ActivityAction, ActivityEvent, Phase};
pub use checkpoint::{
    Checkpoint, CheckpointError, PartialTask, PhaseCursor, Resume, TaskPosition, CHECKPOINT_VERSION,
};
pub use clock::{Clock, FakeClock, SystemClock};
pub use entity::{normalize_name, DiscoveredEntity, EntityKey, SellerHit};
pub use id::{short, OrgId, RunId};
pub use progress::Progress;
pub use records::{AuditEntry, SourceItem};
#[cfg(any(test, feature = "test-support"))]
pub use run::RunBuilder;
pub use run::{Category, InvalidTransition, Run, RunAction, RunStatus};
