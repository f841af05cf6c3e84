// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime wiring lifecycle, executor, signals and activity together

use crate::activity::{ActivityHub, ActivityStream};
use crate::config::EngineConfig;
use crate::env;
use crate::error::EngineError;
use crate::lifecycle::RunLifecycleManager;
use crate::phase::{PhaseExecutor, RunOutcome};
use crate::schedule::ScheduleTrigger;
use crate::signal::SignalRegistry;
use hv_adapters::{MarketplaceSearch, SourceCatalog};
use hv_core::{Category, Clock, OrgId, Run, RunId};
use hv_storage::{FileStore, RunStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name of the store snapshot inside the state directory
pub const STORE_FILE: &str = "runs.json";

/// Runtime adapter dependencies
pub struct RuntimeDeps<S, Cat, Se> {
    pub store: S,
    pub catalog: Cat,
    pub search: Se,
}

/// Entry point for operators and schedulers. Clones share all state.
#[derive(Clone)]
pub struct Runtime<S, Cat, Se, C> {
    lifecycle: RunLifecycleManager<S, C>,
    executor: PhaseExecutor<S, Cat, Se, C>,
    signals: SignalRegistry,
    activity: ActivityHub,
    config: Arc<EngineConfig>,
}

impl<S, Cat, Se, C> Runtime<S, Cat, Se, C>
where
    S: RunStore,
    Cat: SourceCatalog,
    Se: MarketplaceSearch,
    C: Clock,
{
    pub fn new(deps: RuntimeDeps<S, Cat, Se>, clock: C, config: EngineConfig) -> Self {
        let config = Arc::new(config);
        let signals = SignalRegistry::new();
        let activity = ActivityHub::new(config.activity_capacity);
        let lifecycle = RunLifecycleManager::new(
            deps.store.clone(),
            clock.clone(),
            signals.clone(),
            config.max_active_runs_per_org,
        );
        let executor = PhaseExecutor::new(
            deps.store,
            deps.catalog,
            deps.search,
            clock,
            lifecycle.clone(),
            signals.clone(),
            activity.clone(),
            Arc::clone(&config),
        );
        Self { lifecycle, executor, signals, activity, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &RunLifecycleManager<S, C> {
        &self.lifecycle
    }

    /// Signal tokens of runs that are executing, paused, or about to run.
    pub fn signals(&self) -> &SignalRegistry {
        &self.signals
    }

    pub async fn create_run(
        &self,
        org: &OrgId,
        actor: &str,
        categories: Vec<Category>,
        name: Option<String>,
    ) -> Result<Run, EngineError> {
        self.lifecycle.create_run(org, actor, categories, name).await
    }

    pub async fn start_run(&self, id: &RunId) -> Result<Run, EngineError> {
        self.lifecycle.start_run(id).await
    }

    pub async fn pause_run(&self, id: &RunId) -> Result<Run, EngineError> {
        self.lifecycle.pause_run(id).await
    }

    pub async fn resume_run(&self, id: &RunId) -> Result<Run, EngineError> {
        self.lifecycle.resume_run(id).await
    }

    pub async fn cancel_run(&self, id: &RunId) -> Result<Run, EngineError> {
        self.lifecycle.cancel_run(id).await
    }

    pub async fn get_run(&self, id: &RunId) -> Result<Run, EngineError> {
        self.lifecycle.get_run(id).await
    }

    pub async fn list_runs(&self, org: &OrgId) -> Result<Vec<Run>, EngineError> {
        self.lifecycle.list_runs(org).await
    }

    /// Execute a `running` run until it settles or stops.
    pub async fn execute(&self, id: &RunId) -> Result<RunOutcome, EngineError> {
        self.executor.execute(id).await
    }

    /// Start a pending run and execute it.
    pub async fn start_and_execute(&self, id: &RunId) -> Result<RunOutcome, EngineError> {
        self.lifecycle.start_run(id).await?;
        self.executor.execute(id).await
    }

    /// Resume a paused run and execute it from its checkpoint.
    pub async fn resume_and_execute(&self, id: &RunId) -> Result<RunOutcome, EngineError> {
        self.lifecycle.resume_run(id).await?;
        self.executor.execute(id).await
    }

    /// Live activity for `run`; created on first access.
    pub fn activity(&self, run: &RunId) -> ActivityStream {
        self.activity.stream(run)
    }

    /// Drop the run's activity buffer once nobody is watching.
    pub fn release_activity(&self, run: &RunId) -> bool {
        self.activity.remove(run)
    }

    /// Runs left `running` or `paused` by a previous process.
    ///
    /// Nothing is resumed automatically; callers decide per run.
    pub async fn recover(&self) -> Result<Vec<Run>, EngineError> {
        let runs = self.lifecycle.list_incomplete_runs().await?;
        for run in &runs {
            tracing::info!(
                run_id = %run.id,
                org = %run.org,
                status = %run.status,
                processed = run.progress.processed_items,
                total = run.progress.total_items,
                "found incomplete run"
            );
        }
        if !runs.is_empty() {
            tracing::warn!(count = runs.len(), "incomplete runs await an operator decision");
        }
        Ok(runs)
    }

    pub fn schedule_trigger(&self) -> ScheduleTrigger<S, Cat, Se, C> {
        ScheduleTrigger::new(self.lifecycle.clone(), self.executor.clone())
    }
}

/// Store snapshot path inside `state_dir`.
pub fn store_path(state_dir: &Path) -> PathBuf {
    state_dir.join(STORE_FILE)
}

/// Open the file-backed store under `state_dir`, creating the directory.
pub fn open_store(state_dir: &Path) -> Result<FileStore, EngineError> {
    std::fs::create_dir_all(state_dir).map_err(hv_storage::StoreError::from)?;
    Ok(FileStore::open(store_path(state_dir))?)
}

/// Open the store under `HV_STATE_DIR`, if set.
pub fn open_store_from_env() -> Result<Option<FileStore>, EngineError> {
    env::state_dir().map(|dir| open_store(&dir)).transpose()
}

#[cfg(test)]
#[path = "runtime_tests/mod.rs"]
mod tests;
