// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory tables shared by the memory and file stores

use crate::store::RunFilter;
use hv_core::{AuditEntry, DiscoveredEntity, EntityKey, OrgId, Run, RunId, SourceItem};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// All persisted tables.
///
/// Entities are keyed per org by `platform:normalized_name` so the snapshot
/// stays a plain JSON object.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StoreState {
    pub runs: HashMap<RunId, Run>,
    #[serde(default)]
    pub items: HashMap<RunId, Vec<SourceItem>>,
    #[serde(default)]
    pub entities: HashMap<OrgId, BTreeMap<String, DiscoveredEntity>>,
    #[serde(default)]
    pub audit: Vec<AuditEntry>,
}

fn entity_slot(platform: &str, normalized_name: &str) -> String {
    format!("{}:{}", platform, normalized_name)
}

fn slot_for(key: &EntityKey) -> String {
    entity_slot(&key.platform, &key.normalized_name)
}

impl StoreState {
    pub fn get_run(&self, id: &RunId) -> Option<Run> {
        self.runs.get(id).cloned()
    }

    pub fn put_run(&mut self, run: &Run) {
        self.runs.insert(run.id.clone(), run.clone());
    }

    pub fn list_runs(&self, filter: &RunFilter) -> Vec<Run> {
        let mut runs: Vec<Run> = self.runs.values().filter(|r| filter.matches(r)).cloned().collect();
        runs.sort_by(|a, b| a.created_at_ms.cmp(&b.created_at_ms).then_with(|| a.id.cmp(&b.id)));
        runs
    }

    /// Insert or replace by `(category, external id)` within the run. Each
    /// item scans the run's rows, so a batch is O(batch × rows).
    pub fn upsert_items(&mut self, items: &[SourceItem]) {
        for item in items {
            let rows = self.items.entry(item.run_id.clone()).or_default();
            match rows.iter_mut().find(|row| {
                row.category_id == item.category_id && row.external_id == item.external_id
            }) {
                Some(row) => *row = item.clone(),
                None => rows.push(item.clone()),
            }
        }
    }

    pub fn list_items(&self, run: &RunId) -> Vec<SourceItem> {
        self.items.get(run).cloned().unwrap_or_default()
    }

    pub fn find_entities(&self, org: &OrgId, platform: &str, names: &[String]) -> Vec<DiscoveredEntity> {
        let Some(table) = self.entities.get(org) else {
            return Vec::new();
        };
        names.iter().filter_map(|name| table.get(&entity_slot(platform, name))).cloned().collect()
    }

    pub fn put_entities(&mut self, entities: &[DiscoveredEntity]) {
        for entity in entities {
            self.entities
                .entry(entity.key.org.clone())
                .or_default()
                .insert(slot_for(&entity.key), entity.clone());
        }
    }

    pub fn append_audit(&mut self, entry: &AuditEntry) {
        self.audit.push(entry.clone());
    }

    pub fn list_audit(&self, run: &RunId) -> Vec<AuditEntry> {
        self.audit.iter().filter(|e| e.run_id == *run).cloned().collect()
    }

    /// Number of stored entities across all orgs.
    pub fn entity_count(&self) -> usize {
        self.entities.values().map(BTreeMap::len).sum()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
