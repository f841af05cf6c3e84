// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The durable store contract consumed by the engine

use crate::error::StoreError;
use async_trait::async_trait;
use hv_core::{AuditEntry, DiscoveredEntity, OrgId, Run, RunId, RunStatus, SourceItem};

/// Equality and membership filter for [`RunStore::list_runs`].
///
/// Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunFilter {
    pub org: Option<OrgId>,
    pub statuses: Vec<RunStatus>,
}

impl RunFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn org(mut self, org: &OrgId) -> Self {
        self.org = Some(org.clone());
        self
    }

    pub fn statuses(mut self, statuses: &[RunStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    pub fn matches(&self, run: &Run) -> bool {
        self.org.as_ref().is_none_or(|org| run.org == *org)
            && (self.statuses.is_empty() || self.statuses.contains(&run.status))
    }
}

/// Table-like store with strong read-after-write consistency.
///
/// Every write is visible to the next read from any clone of the store.
#[async_trait]
pub trait RunStore: Clone + Send + Sync + 'static {
    async fn get_run(&self, id: &RunId) -> Result<Option<Run>, StoreError>;

    /// Insert or replace a run record.
    async fn put_run(&self, run: &Run) -> Result<(), StoreError>;

    /// Runs matching `filter`, oldest first.
    async fn list_runs(&self, filter: &RunFilter) -> Result<Vec<Run>, StoreError>;

    /// Insert or replace items keyed by (run, category, external id).
    async fn upsert_items(&self, items: &[SourceItem]) -> Result<(), StoreError>;

    async fn list_items(&self, run: &RunId) -> Result<Vec<SourceItem>, StoreError>;

    /// Entities of `org` on `platform` whose normalized name is in `names`.
    async fn find_entities(
        &self,
        org: &OrgId,
        platform: &str,
        names: &[String],
    ) -> Result<Vec<DiscoveredEntity>, StoreError>;

    /// Insert or replace entities keyed by their [`hv_core::EntityKey`].
    async fn put_entities(&self, entities: &[DiscoveredEntity]) -> Result<(), StoreError>;

    async fn append_audit(&self, entry: &AuditEntry) -> Result<(), StoreError>;

    async fn list_audit(&self, run: &RunId) -> Result<Vec<AuditEntry>, StoreError>;
}
