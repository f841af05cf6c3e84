// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plain records persisted alongside runs.

use crate::id::{OrgId, RunId};
use serde::{Deserialize, Serialize};

/// Candidate product collected by the source phase.
///
/// Unique per (run, category, external id); re-fetching a category after a
/// crash overwrites rather than duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceItem {
    pub run_id: RunId,
    pub category_id: String,
    /// Order within the category's fetch result
    pub position: usize,
    pub external_id: String,
    pub name: String,
    pub reference_price: f64,
}

/// Summary entry for the audit collaborator.
///
/// Entity merges write one entry per batch rather than one per entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub run_id: RunId,
    pub org: OrgId,
    pub actor: String,
    pub action: String,
    pub summary: serde_json::Value,
    pub at_ms: u64,
}
