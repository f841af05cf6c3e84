// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Versioned checkpoint envelope for crash recovery.
//!
//! A checkpoint records which phase a run reached, how far into that phase's
//! ordered task list it got, and the counters at that point. It is the only
//! state consulted when a run is executed again after a pause or a crash.
//!
//! On the wire the envelope is flat:
//!
//! ```json
//! { "v": 1, "phase": "search", "cursor": 12, "completed_ahead": [14],
//!   "failed": [3], "partial": [{ "index": 13, "next_page": 1 }],
//!   "progress": { ... }, "written_at_ms": 1700000000000 }
//! ```

use crate::activity::Phase;
use crate::progress::Progress;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Envelope schema version written by this build.
pub const CHECKPOINT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint version {found} is not supported (expected {CHECKPOINT_VERSION})")]
    UnsupportedVersion { found: u64 },
    #[error("checkpoint is missing its version field")]
    MissingVersion,
    #[error("invalid checkpoint: {0}")]
    Json(#[from] serde_json::Error),
}

/// A task that stopped part-way through its pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialTask {
    pub index: usize,
    /// First page not yet merged
    pub next_page: u32,
}

/// Position within one phase's ordered task list.
///
/// `cursor` is a low-water mark: every task with a lower index is settled.
/// Workers complete out of order, so tasks at or above the cursor that also
/// settled are listed in `completed_ahead`. Settled tasks that failed are
/// kept in `failed` for the rest of the phase, since a failed category still
/// holds back its department.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPosition {
    pub cursor: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub completed_ahead: Vec<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partial: Vec<PartialTask>,
}

impl TaskPosition {
    pub fn new(cursor: usize, completed_ahead: Vec<usize>) -> Self {
        Self { cursor, completed_ahead, ..Self::default() }
    }
}

/// Where a run is within its phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase")]
pub enum PhaseCursor {
    #[serde(rename = "source")]
    Source(TaskPosition),
    #[serde(rename = "sourcePhaseComplete")]
    SourceComplete,
    #[serde(rename = "search")]
    Search(TaskPosition),
    #[serde(rename = "searchPhaseComplete")]
    SearchComplete,
}

impl PhaseCursor {
    /// Cursor for `phase` at the given position.
    pub fn at(phase: Phase, cursor: usize, completed_ahead: Vec<usize>) -> Self {
        Self::within(phase, TaskPosition::new(cursor, completed_ahead))
    }

    pub fn within(phase: Phase, position: TaskPosition) -> Self {
        match phase {
            Phase::Source => PhaseCursor::Source(position),
            Phase::Search => PhaseCursor::Search(position),
        }
    }

    pub fn complete(phase: Phase) -> Self {
        match phase {
            Phase::Source => PhaseCursor::SourceComplete,
            Phase::Search => PhaseCursor::SearchComplete,
        }
    }

    /// Wire tag, e.g. `"sourcePhaseComplete"`.
    pub fn tag(&self) -> &'static str {
        match self {
            PhaseCursor::Source(_) => "source",
            PhaseCursor::SourceComplete => "sourcePhaseComplete",
            PhaseCursor::Search(_) => "search",
            PhaseCursor::SearchComplete => "searchPhaseComplete",
        }
    }

    /// Phase this cursor belongs to.
    pub fn phase(&self) -> Phase {
        match self {
            PhaseCursor::Source(_) | PhaseCursor::SourceComplete => Phase::Source,
            PhaseCursor::Search(_) | PhaseCursor::SearchComplete => Phase::Search,
        }
    }
}

/// How much of a phase is already done according to a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resume {
    /// Nothing done yet
    Fresh,
    /// Skip indices below `cursor` and those in `completed_ahead`
    From {
        cursor: usize,
        completed_ahead: BTreeSet<usize>,
        failed: BTreeSet<usize>,
        partial: BTreeMap<usize, u32>,
    },
    /// The whole phase finished
    Done,
}

impl Resume {
    pub fn from_position(position: &TaskPosition) -> Self {
        Resume::From {
            cursor: position.cursor,
            completed_ahead: position.completed_ahead.iter().copied().collect(),
            failed: position.failed.iter().copied().collect(),
            partial: position.partial.iter().map(|p| (p.index, p.next_page)).collect(),
        }
    }

    /// True if the task at `index` already settled, successfully or not.
    pub fn is_done(&self, index: usize) -> bool {
        match self {
            Resume::Fresh => false,
            Resume::From { cursor, completed_ahead, .. } => {
                index < *cursor || completed_ahead.contains(&index)
            }
            Resume::Done => true,
        }
    }

    /// True if the task at `index` settled as a failure.
    pub fn is_failed(&self, index: usize) -> bool {
        matches!(self, Resume::From { failed, .. } if failed.contains(&index))
    }

    /// True if the task at `index` settled and succeeded.
    pub fn succeeded(&self, index: usize) -> bool {
        self.is_done(index) && !self.is_failed(index)
    }

    /// Page the task at `index` continues from.
    pub fn start_page(&self, index: usize) -> u32 {
        match self {
            Resume::From { partial, .. } => partial.get(&index).copied().unwrap_or(0),
            Resume::Fresh | Resume::Done => 0,
        }
    }
}

/// Versioned checkpoint envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(rename = "v")]
    pub version: u32,
    #[serde(flatten)]
    pub position: PhaseCursor,
    pub progress: Progress,
    /// Set when the run was paused automatically
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_reason: Option<String>,
    pub written_at_ms: u64,
}

impl Checkpoint {
    pub fn new(position: PhaseCursor, progress: Progress, written_at_ms: u64) -> Self {
        Self { version: CHECKPOINT_VERSION, position, progress, pause_reason: None, written_at_ms }
    }

    pub fn with_pause_reason(mut self, reason: impl Into<String>) -> Self {
        self.pause_reason = Some(reason.into());
        self
    }

    pub fn phase_tag(&self) -> &'static str {
        self.position.tag()
    }

    /// What this checkpoint says about `phase`.
    ///
    /// A checkpoint from a later phase means `phase` is done; one from an
    /// earlier phase means `phase` hasn't started.
    pub fn resume_for(&self, phase: Phase) -> Resume {
        match (&self.position, phase) {
            (PhaseCursor::Source(position), Phase::Source)
            | (PhaseCursor::Search(position), Phase::Search) => Resume::from_position(position),
            (PhaseCursor::Source(_), Phase::Search) | (PhaseCursor::SourceComplete, Phase::Search) => {
                Resume::Fresh
            }
            (PhaseCursor::SourceComplete, Phase::Source)
            | (PhaseCursor::Search(_), Phase::Source)
            | (PhaseCursor::SearchComplete, _) => Resume::Done,
        }
    }

    pub fn to_value(&self) -> Result<serde_json::Value, CheckpointError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decode an envelope, checking the version before the body so a
    /// checkpoint from another schema is reported as such rather than as a
    /// shape mismatch.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, CheckpointError> {
        let found =
            value.get("v").and_then(serde_json::Value::as_u64).ok_or(CheckpointError::MissingVersion)?;
        if found != u64::from(CHECKPOINT_VERSION) {
            return Err(CheckpointError::UnsupportedVersion { found });
        }
        Ok(Checkpoint::deserialize(value)?)
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
