// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hv-storage: durable store contract for runs and their records
//!
//! The production store lives outside this workspace. `MemoryStore` backs
//! tests and embedded use; `FileStore` persists the same state as a
//! versioned JSON snapshot so a process crash leaves runs recoverable.

mod error;
mod file;
mod memory;
mod snapshot;
mod state;
mod store;

#[cfg(any(test, feature = "test-support"))]
mod faulty;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use snapshot::{Snapshot, CURRENT_SNAPSHOT_VERSION};
pub use state::StoreState;
pub use store::{RunFilter, RunStore};

#[cfg(any(test, feature = "test-support"))]
pub use faulty::{FaultyStore, StoreOp};
