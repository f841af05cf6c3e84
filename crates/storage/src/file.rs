// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed store persisting a snapshot after every mutation

use crate::error::StoreError;
use crate::snapshot::{rotate_bak_path, Snapshot};
use crate::state::StoreState;
use crate::store::{RunFilter, RunStore};
use async_trait::async_trait;
use hv_core::{AuditEntry, DiscoveredEntity, OrgId, Run, RunId, SourceItem};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Store whose tables survive a process restart.
///
/// Reads are served from memory. Writes apply to memory, then rewrite the
/// snapshot; a failed write rolls memory back so callers never observe state
/// that isn't on disk.
///
/// Every mutation clones the whole state for the rollback and rewrites the
/// whole file synchronously while holding the lock, blocking the calling
/// task's thread. Cost grows with the number of runs, items and entities
/// kept, so this suits a single process with modest history; large
/// deployments belong on a real database behind [`RunStore`].
#[derive(Clone)]
pub struct FileStore {
    path: Arc<PathBuf>,
    state: Arc<Mutex<StoreState>>,
}

impl FileStore {
    /// Open the snapshot at `path`, starting empty if there is none.
    ///
    /// A snapshot that isn't valid JSON is moved aside to a rotated `.bak`
    /// and the store starts empty. A snapshot with an unsupported version is
    /// left untouched and fails the open.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let state = match Snapshot::load(&path) {
            Ok(Some(snapshot)) => {
                tracing::info!(
                    path = %path.display(),
                    runs = snapshot.state.runs.len(),
                    "loaded snapshot"
                );
                snapshot.state
            }
            Ok(None) => StoreState::default(),
            Err(StoreError::Json(e)) => {
                let bak = rotate_bak_path(&path);
                tracing::error!(
                    path = %path.display(),
                    backup = %bak.display(),
                    error = %e,
                    "corrupt snapshot, moving aside"
                );
                std::fs::rename(&path, &bak)?;
                StoreState::default()
            }
            Err(e) => return Err(e),
        };
        Ok(Self { path: Arc::new(path), state: Arc::new(Mutex::new(state)) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn mutate(&self, op: impl FnOnce(&mut StoreState)) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        let before = state.clone();
        op(&mut state);
        if let Err(e) = Snapshot::save_state(&state, &self.path) {
            tracing::error!(path = %self.path.display(), error = %e, "snapshot write failed");
            *state = before;
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl RunStore for FileStore {
    async fn get_run(&self, id: &RunId) -> Result<Option<Run>, StoreError> {
        Ok(self.state.lock().get_run(id))
    }

    async fn put_run(&self, run: &Run) -> Result<(), StoreError> {
        self.mutate(|s| s.put_run(run))
    }

    async fn list_runs(&self, filter: &RunFilter) -> Result<Vec<Run>, StoreError> {
        Ok(self.state.lock().list_runs(filter))
    }

    async fn upsert_items(&self, items: &[SourceItem]) -> Result<(), StoreError> {
        self.mutate(|s| s.upsert_items(items))
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
        self.mutate(|s| s.put_entities(entities))
    }

    async fn append_audit(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        self.mutate(|s| s.append_audit(entry))
    }

    async fn list_audit(&self, run: &RunId) -> Result<Vec<AuditEntry>, StoreError> {
        Ok(self.state.lock().list_audit(run))
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
