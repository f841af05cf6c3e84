// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run record and status state machine.
//!
//! ```text
//! pending ──start──▶ running ◀──resume── paused
//!                      │  └────pause────▶  │
//!                      ├──complete──▶ completed
//!                      └──fail──────▶ failed
//! (any non-terminal) ──cancel──▶ cancelled
//! ```

use crate::checkpoint::{Checkpoint, CheckpointError};
use crate::id::{OrgId, RunId};
use crate::progress::Progress;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Authoritative persisted status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Paused,
    Cancelled,
    Completed,
    Failed,
}

impl RunStatus {
    pub const ALL: [RunStatus; 6] = [
        RunStatus::Pending,
        RunStatus::Running,
        RunStatus::Paused,
        RunStatus::Cancelled,
        RunStatus::Completed,
        RunStatus::Failed,
    ];

    /// Statuses that count against an org's concurrency cap.
    pub const ACTIVE: [RunStatus; 3] = [RunStatus::Pending, RunStatus::Running, RunStatus::Paused];

    /// Statuses a restarted process reports as needing resume.
    pub const INCOMPLETE: [RunStatus; 2] = [RunStatus::Running, RunStatus::Paused];

    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Cancelled | RunStatus::Completed | RunStatus::Failed)
    }

    /// Status reached by applying `action`, or `None` if the edge doesn't exist.
    pub fn next(self, action: RunAction) -> Option<RunStatus> {
        match (self, action) {
            (RunStatus::Pending, RunAction::Start) => Some(RunStatus::Running),
            (RunStatus::Running, RunAction::Pause) => Some(RunStatus::Paused),
            (RunStatus::Paused, RunAction::Resume) => Some(RunStatus::Running),
            (RunStatus::Running, RunAction::Complete) => Some(RunStatus::Completed),
            (RunStatus::Running, RunAction::Fail) => Some(RunStatus::Failed),
            (s, RunAction::Cancel) if !s.is_terminal() => Some(RunStatus::Cancelled),
            (s, RunAction::Checkpoint) if !s.is_terminal() => Some(s),
            _ => None,
        }
    }
}

crate::simple_display! {
    RunStatus {
        Pending => "pending",
        Running => "running",
        Paused => "paused",
        Cancelled => "cancelled",
        Completed => "completed",
        Failed => "failed",
    }
}

/// Operation requested against a run's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunAction {
    Start,
    Pause,
    Resume,
    Cancel,
    Checkpoint,
    Complete,
    Fail,
}

crate::simple_display! {
    RunAction {
        Start => "start",
        Pause => "pause",
        Resume => "resume",
        Cancel => "cancel",
        Checkpoint => "checkpoint",
        Complete => "complete",
        Fail => "fail",
    }
}

/// Rejected status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {action} a run that is {from}")]
pub struct InvalidTransition {
    pub from: RunStatus,
    pub action: RunAction,
}

/// A selected source category and the department it rolls up into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub department: String,
}

impl Category {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        department: impl Into<String>,
    ) -> Self {
        Self { id: id.into(), name: name.into(), department: department.into() }
    }
}

/// One end-to-end execution of the two-phase collection pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub org: OrgId,
    /// Who created the run (user id, or the schedule name for cron runs)
    pub actor: String,
    pub name: String,
    pub status: RunStatus,
    pub categories: Vec<Category>,
    #[serde(default)]
    pub progress: Progress,
    /// Encoded [`Checkpoint`] envelope, kept opaque so a record written by a
    /// different schema version still loads and is rejected on decode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<serde_json::Value>,
    /// Failure or auto-pause reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    pub updated_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_ms: Option<u64>,
}

impl Run {
    pub fn new(
        org: OrgId,
        actor: impl Into<String>,
        name: impl Into<String>,
        categories: Vec<Category>,
        epoch_ms: u64,
    ) -> Self {
        let departments: BTreeSet<&str> = categories.iter().map(|c| c.department.as_str()).collect();
        let progress = Progress {
            categories_total: categories.len() as u64,
            departments_total: departments.len() as u64,
            ..Progress::default()
        };
        Self {
            id: RunId::new(),
            org,
            actor: actor.into(),
            name: name.into(),
            status: RunStatus::Pending,
            categories,
            progress,
            checkpoint: None,
            error: None,
            created_at_ms: epoch_ms,
            started_at_ms: None,
            updated_at_ms: epoch_ms,
            finished_at_ms: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Decode the stored checkpoint, if any.
    pub fn decode_checkpoint(&self) -> Result<Option<Checkpoint>, CheckpointError> {
        self.checkpoint.as_ref().map(Checkpoint::from_value).transpose()
    }

    /// Move along the state machine, stamping timestamps on the way.
    ///
    /// Terminal statuses are final: every action against them is rejected.
    pub fn transition(&mut self, action: RunAction, epoch_ms: u64) -> Result<(), InvalidTransition> {
        let next =
            self.status.next(action).ok_or(InvalidTransition { from: self.status, action })?;
        match action {
            RunAction::Start => self.started_at_ms = Some(epoch_ms),
            RunAction::Resume => self.error = None,
            _ => {}
        }
        if next.is_terminal() {
            self.finished_at_ms = Some(epoch_ms);
        }
        self.status = next;
        self.updated_at_ms = epoch_ms;
        Ok(())
    }
}

crate::builder! {
    pub struct RunBuilder => Run {
        into {
            org: OrgId = "org-test",
            actor: String = "tester",
            name: String = "test-run",
        }
        set {
            id: RunId = RunId::new(),
            status: RunStatus = RunStatus::Pending,
            categories: Vec<Category> = Vec::new(),
            progress: Progress = Progress::default(),
            created_at_ms: u64 = 1_000_000,
            updated_at_ms: u64 = 1_000_000,
        }
        option {
            checkpoint: serde_json::Value = None,
            error: String = None,
            started_at_ms: u64 = None,
            finished_at_ms: u64 = None,
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
