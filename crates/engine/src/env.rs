// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the engine crate.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

fn parsed<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}

/// Directory for the file-backed store: `HV_STATE_DIR`, if set
pub fn state_dir() -> Option<PathBuf> {
    std::env::var("HV_STATE_DIR").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Cap on non-terminal runs per org
pub fn max_active_runs() -> Option<usize> {
    parsed("HV_MAX_ACTIVE_RUNS")
}

/// Concurrent workers per phase
pub fn worker_count() -> Option<usize> {
    parsed("HV_WORKER_COUNT")
}

/// Fixed wait before retrying a rate-limited call
pub fn rate_limit_delay() -> Option<Duration> {
    parsed("HV_RATE_LIMIT_DELAY_MS").map(Duration::from_millis)
}

/// Consecutive failures that auto-pause a run
pub fn failure_threshold() -> Option<u32> {
    parsed("HV_FAILURE_THRESHOLD")
}

/// Per-call timeout for remote capabilities
pub fn call_timeout() -> Option<Duration> {
    parsed("HV_CALL_TIMEOUT_MS").map(Duration::from_millis)
}
