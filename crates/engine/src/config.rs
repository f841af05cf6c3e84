// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine tunables, loadable from TOML with environment overrides

use crate::env;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Engine configuration. Every field has a default, so an empty TOML
/// document is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_active_runs_per_org: usize,
    pub worker_count: usize,
    /// Tries per remote call, rate-limited retries excluded
    pub max_attempts: u32,
    pub rate_limit_delay_ms: u64,
    /// Consecutive non-rate-limit failures that auto-pause a run
    pub failure_threshold: u32,
    /// Pages fetched per product in the search phase
    pub search_page_cap: u32,
    pub price_window_low: f64,
    pub price_window_high: f64,
    /// Buffered activity events per run
    pub activity_capacity: usize,
    pub call_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_active_runs_per_org: 3,
            worker_count: 5,
            max_attempts: 3,
            rate_limit_delay_ms: 5_000,
            failure_threshold: 5,
            search_page_cap: 3,
            price_window_low: 0.8,
            price_window_high: 1.2,
            activity_capacity: 100,
            call_timeout_ms: 30_000,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Defaults with `HV_*` environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::default().with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Replace fields whose `HV_*` variable is set and parses.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(n) = env::max_active_runs() {
            self.max_active_runs_per_org = n;
        }
        if let Some(n) = env::worker_count() {
            self.worker_count = n;
        }
        if let Some(d) = env::rate_limit_delay() {
            self.rate_limit_delay_ms = d.as_millis() as u64;
        }
        if let Some(n) = env::failure_threshold() {
            self.failure_threshold = n;
        }
        if let Some(d) = env::call_timeout() {
            self.call_timeout_ms = d.as_millis() as u64;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        if self.max_active_runs_per_org == 0 {
            return invalid("max_active_runs_per_org must be at least 1");
        }
        if self.worker_count == 0 {
            return invalid("worker_count must be at least 1");
        }
        if self.max_attempts == 0 {
            return invalid("max_attempts must be at least 1");
        }
        if self.failure_threshold == 0 {
            return invalid("failure_threshold must be at least 1");
        }
        if self.search_page_cap == 0 {
            return invalid("search_page_cap must be at least 1");
        }
        if self.activity_capacity == 0 {
            return invalid("activity_capacity must be at least 1");
        }
        if !(self.price_window_low > 0.0 && self.price_window_low <= self.price_window_high) {
            return invalid("price window must satisfy 0 < low <= high");
        }
        Ok(())
    }

    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
