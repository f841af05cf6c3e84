// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store wrapper that fails chosen operations on demand

use crate::error::StoreError;
use crate::memory::MemoryStore;
use crate::store::{RunFilter, RunStore};
use async_trait::async_trait;
use hv_core::{AuditEntry, DiscoveredEntity, OrgId, Run, RunId, SourceItem};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    GetRun,
    PutRun,
    ListRuns,
    UpsertItems,
    ListItems,
    FindEntities,
    PutEntities,
    AppendAudit,
    ListAudit,
}

impl StoreOp {
    fn name(self) -> &'static str {
        match self {
            StoreOp::GetRun => "get_run",
            StoreOp::PutRun => "put_run",
            StoreOp::ListRuns => "list_runs",
            StoreOp::UpsertItems => "upsert_items",
            StoreOp::ListItems => "list_items",
            StoreOp::FindEntities => "find_entities",
            StoreOp::PutEntities => "put_entities",
            StoreOp::AppendAudit => "append_audit",
            StoreOp::ListAudit => "list_audit",
        }
    }
}

/// Remaining failures per op; `None` fails until healed.
type Faults = HashMap<StoreOp, Option<usize>>;

/// Wraps a store and fails selected operations with [`StoreError::Injected`].
#[derive(Clone, Default)]
pub struct FaultyStore<S = MemoryStore> {
    inner: S,
    faults: Arc<Mutex<Faults>>,
}

impl<S: RunStore> FaultyStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, faults: Arc::default() }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Fail every call to `op` until [`heal`](Self::heal).
    pub fn fail(&self, op: StoreOp) {
        self.faults.lock().insert(op, None);
    }

    /// Fail the next `count` calls to `op`.
    pub fn fail_times(&self, op: StoreOp, count: usize) {
        if count == 0 {
            self.heal(op);
        } else {
            self.faults.lock().insert(op, Some(count));
        }
    }

    pub fn heal(&self, op: StoreOp) {
        self.faults.lock().remove(&op);
    }

    fn check(&self, op: StoreOp) -> Result<(), StoreError> {
        let mut faults = self.faults.lock();
        match faults.get_mut(&op) {
            None => Ok(()),
            Some(None) => Err(StoreError::Injected(op.name())),
            Some(Some(remaining)) => {
                *remaining -= 1;
                if *remaining == 0 {
                    faults.remove(&op);
                }
                Err(StoreError::Injected(op.name()))
            }
        }
    }
}

#[async_trait]
impl<S: RunStore> RunStore for FaultyStore<S> {
    async fn get_run(&self, id: &RunId) -> Result<Option<Run>, StoreError> {
        self.check(StoreOp::GetRun)?;
        self.inner.get_run(id).await
    }

    async fn put_run(&self, run: &Run) -> Result<(), StoreError> {
        self.check(StoreOp::PutRun)?;
        self.inner.put_run(run).await
    }

    async fn list_runs(&self, filter: &RunFilter) -> Result<Vec<Run>, StoreError> {
        self.check(StoreOp::ListRuns)?;
        self.inner.list_runs(filter).await
    }

    async fn upsert_items(&self, items: &[SourceItem]) -> Result<(), StoreError> {
        self.check(StoreOp::UpsertItems)?;
        self.inner.upsert_items(items).await
    }

    async fn list_items(&self, run: &RunId) -> Result<Vec<SourceItem>, StoreError> {
        self.check(StoreOp::ListItems)?;
        self.inner.list_items(run).await
    }

    async fn find_entities(
        &self,
        org: &OrgId,
        platform: &str,
        names: &[String],
    ) -> Result<Vec<DiscoveredEntity>, StoreError> {
        self.check(StoreOp::FindEntities)?;
        self.inner.find_entities(org, platform, names).await
    }

    async fn put_entities(&self, entities: &[DiscoveredEntity]) -> Result<(), StoreError> {
        self.check(StoreOp::PutEntities)?;
        self.inner.put_entities(entities).await
    }

    async fn append_audit(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        self.check(StoreOp::AppendAudit)?;
        self.inner.append_audit(entry).await
    }

    async fn list_audit(&self, run: &RunId) -> Result<Vec<AuditEntry>, StoreError> {
        self.check(StoreOp::ListAudit)?;
        self.inner.list_audit(run).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fail_times_then_recovers() {
        let store = FaultyStore::new(MemoryStore::new());
        let run = Run::builder().build();
        store.fail_times(StoreOp::PutRun, 2);

        assert!(matches!(store.put_run(&run).await, Err(StoreError::Injected("put_run"))));
        assert!(store.put_run(&run).await.is_err());
        store.put_run(&run).await.unwrap();
        assert_eq!(store.get_run(&run.id).await.unwrap(), Some(run));
    }

    #[tokio::test]
    async fn fail_until_healed() {
        let store = FaultyStore::new(MemoryStore::new());
        store.fail(StoreOp::ListRuns);
        for _ in 0..3 {
            assert!(store.list_runs(&RunFilter::all()).await.is_err());
        }
        store.heal(StoreOp::ListRuns);
        assert!(store.list_runs(&RunFilter::all()).await.unwrap().is_empty());
    }
}
