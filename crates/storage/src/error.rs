// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors that can occur in store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot version {found} is not supported (expected {supported})")]
    UnsupportedVersion { found: u64, supported: u32 },
    #[error("snapshot is missing its version field")]
    MissingVersion,
    #[error("injected fault in {0}")]
    Injected(&'static str),
}
