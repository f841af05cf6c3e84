// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence for crash recovery.
//!
//! A snapshot holds every table at a point in time. It is rewritten after
//! each store mutation, via a temp file and rename so a crash mid-write
//! leaves the previous snapshot intact.

use crate::error::StoreError;
use crate::state::StoreState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Current snapshot schema version
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

const MAX_BAK_FILES: u32 = 3;

/// The complete store state at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Schema version
    #[serde(rename = "v")]
    pub version: u32,
    pub state: StoreState,
    /// When this snapshot was written
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(state: StoreState) -> Self {
        Self { version: CURRENT_SNAPSHOT_VERSION, state, created_at: Utc::now() }
    }

    /// Write atomically: temp file, then rename over `path`.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let snapshot =
            SnapshotRef { version: self.version, state: &self.state, created_at: self.created_at };
        write_atomic(&snapshot, path)
    }

    /// Save `state` without taking ownership of it.
    pub(crate) fn save_state(state: &StoreState, path: &Path) -> Result<(), StoreError> {
        let snapshot =
            SnapshotRef { version: CURRENT_SNAPSHOT_VERSION, state, created_at: Utc::now() };
        write_atomic(&snapshot, path)
    }

    /// Load a snapshot, or `None` if no file exists yet.
    ///
    /// The version is checked before the body, so a snapshot from another
    /// schema fails as such instead of as a shape mismatch.
    pub fn load(path: &Path) -> Result<Option<Self>, StoreError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let value: serde_json::Value = serde_json::from_slice(&bytes)?;
        let found =
            value.get("v").and_then(serde_json::Value::as_u64).ok_or(StoreError::MissingVersion)?;
        if found != u64::from(CURRENT_SNAPSHOT_VERSION) {
            return Err(StoreError::UnsupportedVersion {
                found,
                supported: CURRENT_SNAPSHOT_VERSION,
            });
        }
        Ok(Some(serde_json::from_value(value)?))
    }
}

/// Borrowed form of [`Snapshot`] for writing.
#[derive(Serialize)]
struct SnapshotRef<'a> {
    #[serde(rename = "v")]
    version: u32,
    state: &'a StoreState,
    created_at: DateTime<Utc>,
}

fn write_atomic(snapshot: &SnapshotRef<'_>, path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    let json = serde_json::to_vec(snapshot)?;
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
///
/// Keeps up to [`MAX_BAK_FILES`] backups: `.bak`, `.bak.2`, `.bak.3`.
/// The oldest backup is removed when the limit is reached.
pub(crate) fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    // Remove the oldest if at capacity
    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }

    // Shift existing backups up by one
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
