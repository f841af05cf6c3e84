// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use hv_core::{CheckpointError, OrgId, RunAction, RunId, RunStatus};
use hv_storage::StoreError;
use thiserror::Error;

/// A request refused by a business rule. Nothing was written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("org {org} already has {active} active runs (limit {limit})")]
    ConcurrencyLimit { org: OrgId, limit: usize, active: usize },
    #[error("run {id}: cannot {action} a run that is {from}")]
    InvalidTransition { id: RunId, from: RunStatus, action: RunAction },
    #[error("run not found: {0}")]
    NotFound(RunId),
    #[error("run {id} is {status}, only running runs execute")]
    NotRunning { id: RunId, status: RunStatus },
    #[error("run {0} is already executing")]
    AlreadyExecuting(RunId),
}

/// Errors surfaced by the engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
    #[error("worker error: {0}")]
    Worker(String),
}

impl EngineError {
    /// The business-rule rejection, if that is what this is.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            EngineError::Rejected(r) => Some(r),
            _ => None,
        }
    }
}
