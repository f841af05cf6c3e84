// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::error::StoreError;
use crate::state::StoreState;
use crate::store::{RunFilter, RunStore};
use async_trait::async_trait;
use hv_core::{AuditEntry, DiscoveredEntity, OrgId, Run, RunId, SourceItem};
use parking_lot::Mutex;
use std::sync::Arc;

/// Process-local store. Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every table, for assertions and export.
    pub fn snapshot(&self) -> StoreState {
        self.state.lock().clone()
    }
}

#[async_trait]
impl RunStore for MemoryStore {
    async fn get_run(&self, id: &RunId) -> Result<Option<Run>, StoreError> {
        Ok(self.state.lock().get_run(id))
    }

    async fn put_run(&self, run: &Run) -> Result<(), StoreError> {
        self.state.lock().put_run(run);
        Ok(())
    }

    async fn list_runs(&self, filter: &RunFilter) -> Result<Vec<Run>, StoreError> {
        Ok(self.state.lock().list_runs(filter))
    }

    async fn upsert_items(&self, items: &[SourceItem]) -> Result<(), StoreError> {
        self.state.lock().upsert_items(items);
        Ok(())
    }

    async fn list_items(&self, run: &RunId) -> Result<Vec<SourceItem>, StoreError> {
        Ok(self.state.lock().list_items(run))
    }

    async fn find_entities(
        &self,
        org: &OrgId,
        platform: &str,
        names: &[String],
    ) -> Result<Vec<DiscoveredEntity>, StoreError> {
        Ok(self.state.lock().find_entities(org, platform, names))
    }

    async fn put_entities(&self, entities: &[DiscoveredEntity]) -> Result<(), StoreError> {
        self.state.lock().put_entities(entities);
        Ok(())
    }

    async fn append_audit(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        self.state.lock().append_audit(entry);
        Ok(())
    }

    async fn list_audit(&self, run: &RunId) -> Result<Vec<AuditEntry>, StoreError> {
        Ok(self.state.lock().list_audit(run))
    }
}
