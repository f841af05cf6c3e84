// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live activity events emitted by workers (never persisted)

use serde::{Deserialize, Serialize};

/// Sequential stage within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Enumerate categories and fetch candidate items
    Source,
    /// Search the marketplace for sellers of each item
    Search,
}

crate::simple_display! {
    Phase {
        Source => "source",
        Search => "search",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Fetching,
    Found,
    Error,
    RateLimited,
    Complete,
}

crate::simple_display! {
    ActivityAction {
        Fetching => "fetching",
        Found => "found",
        Error => "error",
        RateLimited => "rate_limited",
        Complete => "complete",
    }
}

/// One observable step of a worker. `id` is assigned by the run's stream
/// and increases monotonically within it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: u64,
    pub at_ms: u64,
    pub worker: usize,
    pub phase: Phase,
    pub action: ActivityAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl ActivityEvent {
    /// Event without an id; the stream stamps one on push.
    pub fn new(worker: usize, phase: Phase, action: ActivityAction, at_ms: u64) -> Self {
        Self { id: 0, at_ms, worker, phase, action, message: None, payload: None }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}
