// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hv-engine: resumable two-phase collection runs
//!
//! A run sources items category by category, then searches the marketplace
//! for sellers of every item. Progress is checkpointed after each task so a
//! paused, auto-paused or crashed run resumes where it left off.

pub mod activity;
pub mod config;
pub mod env;
mod error;
pub mod lifecycle;
pub mod phase;
pub mod pool;
pub mod progress;
pub mod retry;
mod runtime;
pub mod schedule;
pub mod signal;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use activity::{ActivityHub, ActivityStream};
pub use config::{ConfigError, EngineConfig};
pub use error::{EngineError, Rejection};
pub use lifecycle::{Admission, RunLifecycleManager};
pub use phase::{merge_entities, MergeStats, PhaseExecutor, RunOutcome};
pub use pool::{Completion, ParallelRunner, PoolHandle};
pub use retry::{CallOutcome, FailureCounter, RetryEvent, RetryPolicy};
pub use runtime::{open_store, open_store_from_env, store_path, Runtime, RuntimeDeps, STORE_FILE};
pub use schedule::{CategoryPreset, FireOutcome, ScheduleTrigger};
pub use signal::{RunToken, Signal, SignalRegistry};
