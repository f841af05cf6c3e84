// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run lifecycle: creation, status transitions, checkpoints.
//!
//! Every mutation of a run record goes through [`RunLifecycleManager`] and
//! is serialized by one async lock held across read, validate and write, so
//! an operator pause racing a checkpoint write never loses either update.

use crate::error::{EngineError, Rejection};
use crate::signal::SignalRegistry;
use chrono::DateTime;
use hv_core::{
    AuditEntry, Category, Checkpoint, Clock, OrgId, Progress, Run, RunAction, RunId, RunStatus,
};
use hv_storage::{RunFilter, RunStore};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Result of [`RunLifecycleManager::create_run_if_idle`].
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Created(Run),
    /// The org's existing active run
    Busy(Run),
}

#[derive(Clone)]
pub struct RunLifecycleManager<S, C> {
    store: S,
    clock: C,
    signals: SignalRegistry,
    max_active_runs: usize,
    write_lock: Arc<Mutex<()>>,
}

/// Default display name for a run created at `epoch_ms`.
fn default_run_name(epoch_ms: u64) -> String {
    match DateTime::from_timestamp_millis(epoch_ms as i64) {
        Some(at) => format!("Run {}", at.format("%Y-%m-%d %H:%M")),
        None => format!("Run {}", epoch_ms),
    }
}

impl<S, C> RunLifecycleManager<S, C>
where
    S: RunStore,
    C: Clock,
{
    pub fn new(store: S, clock: C, signals: SignalRegistry, max_active_runs: usize) -> Self {
        Self {
            store,
            clock,
            signals,
            max_active_runs: max_active_runs.max(1),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Create a pending run, unless the org is at its active-run cap.
    pub async fn create_run(
        &self,
        org: &OrgId,
        actor: &str,
        categories: Vec<Category>,
        name: Option<String>,
    ) -> Result<Run, EngineError> {
        let _guard = self.write_lock.lock().await;
        let active = self.active_runs(org).await?;
        if active.len() >= self.max_active_runs {
            tracing::warn!(
                org = %org,
                active = active.len(),
                limit = self.max_active_runs,
                "run rejected: concurrency limit"
            );
            return Err(Rejection::ConcurrencyLimit {
                org: org.clone(),
                limit: self.max_active_runs,
                active: active.len(),
            }
            .into());
        }
        self.insert_run(org, actor, categories, name).await
    }

    /// Create a pending run only if `org` has no active run at all.
    ///
    /// The check and the insert share the write lock, so two callers racing
    /// on an idle org get one run between them.
    pub async fn create_run_if_idle(
        &self,
        org: &OrgId,
        actor: &str,
        categories: Vec<Category>,
        name: Option<String>,
    ) -> Result<Admission, EngineError> {
        let _guard = self.write_lock.lock().await;
        if let Some(active) = self.active_runs(org).await?.into_iter().next() {
            return Ok(Admission::Busy(active));
        }
        Ok(Admission::Created(self.insert_run(org, actor, categories, name).await?))
    }

    async fn active_runs(&self, org: &OrgId) -> Result<Vec<Run>, EngineError> {
        Ok(self
            .store
            .list_runs(&RunFilter::all().org(org).statuses(&RunStatus::ACTIVE))
            .await
            .inspect_err(|e| tracing::error!(org = %org, error = %e, "failed to count active runs"))?)
    }

    /// Insert a new run. Callers hold the write lock.
    async fn insert_run(
        &self,
        org: &OrgId,
        actor: &str,
        categories: Vec<Category>,
        name: Option<String>,
    ) -> Result<Run, EngineError> {
        let now = self.clock.epoch_ms();
        let name = name.filter(|n| !n.trim().is_empty()).unwrap_or_else(|| default_run_name(now));
        let run = Run::new(org.clone(), actor, name, categories, now);
        self.store
            .put_run(&run)
            .await
            .inspect_err(|e| tracing::error!(run_id = %run.id, error = %e, "failed to create run"))?;
        tracing::info!(
            run_id = %run.id,
            org = %org,
            categories = run.categories.len(),
            "run created"
        );
        self.audit(&run, "run.create", json!({ "name": run.name, "categories": run.categories.len() }))
            .await;
        Ok(run)
    }

    pub async fn start_run(&self, id: &RunId) -> Result<Run, EngineError> {
        self.apply(id, RunAction::Start, |_| {}).await
    }

    /// Persist `paused`, then signal workers.
    pub async fn pause_run(&self, id: &RunId) -> Result<Run, EngineError> {
        let run = self.apply(id, RunAction::Pause, |_| {}).await?;
        self.signals.pause(id);
        Ok(run)
    }

    /// Persist `running` and clear the run's signal.
    pub async fn resume_run(&self, id: &RunId) -> Result<Run, EngineError> {
        let run = self.apply(id, RunAction::Resume, |_| {}).await?;
        self.signals.clear(id);
        Ok(run)
    }

    /// Persist `cancelled`, then signal workers.
    pub async fn cancel_run(&self, id: &RunId) -> Result<Run, EngineError> {
        let run = self.apply(id, RunAction::Cancel, |_| {}).await?;
        self.signals.cancel(id);
        Ok(run)
    }

    /// Record a checkpoint and the counters it carries. Status is untouched.
    pub async fn checkpoint(
        &self,
        id: &RunId,
        checkpoint: Checkpoint,
        processed: u64,
        failed: u64,
    ) -> Result<Run, EngineError> {
        let mut checkpoint = checkpoint;
        checkpoint.progress.processed_items = processed;
        checkpoint.progress.failed_items = failed;
        let value = checkpoint.to_value()?;
        let _guard = self.write_lock.lock().await;
        let mut run = self.load(id).await?;
        self.transition(&mut run, RunAction::Checkpoint)?;
        run.progress = checkpoint.progress;
        run.checkpoint = Some(value);
        self.store.put_run(&run).await.inspect_err(|e| {
            tracing::error!(run_id = %id, error = %e, "failed to write checkpoint")
        })?;
        tracing::debug!(run_id = %id, phase = checkpoint.phase_tag(), processed, failed, "checkpoint");
        Ok(run)
    }

    pub async fn complete_run(&self, id: &RunId, progress: Progress) -> Result<Run, EngineError> {
        self.apply(id, RunAction::Complete, |run| run.progress = progress).await
    }

    pub async fn fail_run(
        &self,
        id: &RunId,
        reason: &str,
        progress: Progress,
    ) -> Result<Run, EngineError> {
        self.apply(id, RunAction::Fail, |run| {
            run.progress = progress;
            run.error = Some(reason.to_string());
        })
        .await
    }

    /// Pause on the engine's own initiative, recording why in both the run
    /// and its checkpoint.
    pub async fn auto_pause(
        &self,
        id: &RunId,
        reason: &str,
        checkpoint: Checkpoint,
    ) -> Result<Run, EngineError> {
        let checkpoint = checkpoint.with_pause_reason(reason);
        let value = checkpoint.to_value()?;
        self.apply(id, RunAction::Pause, |run| {
            run.progress = checkpoint.progress;
            run.checkpoint = Some(value);
            run.error = Some(reason.to_string());
        })
        .await
    }

    pub async fn get_run(&self, id: &RunId) -> Result<Run, EngineError> {
        self.load(id).await
    }

    pub async fn list_runs(&self, org: &OrgId) -> Result<Vec<Run>, EngineError> {
        Ok(self.store.list_runs(&RunFilter::all().org(org)).await?)
    }

    /// Runs left `running` or `paused`, e.g. by a crash. Never resumed
    /// automatically.
    pub async fn list_incomplete_runs(&self) -> Result<Vec<Run>, EngineError> {
        Ok(self.store.list_runs(&RunFilter::all().statuses(&RunStatus::INCOMPLETE)).await?)
    }

    async fn load(&self, id: &RunId) -> Result<Run, EngineError> {
        match self.store.get_run(id).await {
            Ok(Some(run)) => Ok(run),
            Ok(None) => Err(Rejection::NotFound(id.clone()).into()),
            Err(e) => {
                tracing::error!(run_id = %id, error = %e, "failed to load run");
                Err(e.into())
            }
        }
    }

    fn transition(&self, run: &mut Run, action: RunAction) -> Result<(), Rejection> {
        let from = run.status;
        run.transition(action, self.clock.epoch_ms()).map_err(|e| {
            tracing::warn!(run_id = %run.id, error = %e, "transition rejected");
            Rejection::InvalidTransition { id: run.id.clone(), from, action }
        })
    }

    /// Read, transition, mutate, write, audit.
    async fn apply(
        &self,
        id: &RunId,
        action: RunAction,
        mutate: impl FnOnce(&mut Run),
    ) -> Result<Run, EngineError> {
        let _guard = self.write_lock.lock().await;
        let mut run = self.load(id).await?;
        let from = run.status;
        self.transition(&mut run, action)?;
        mutate(&mut run);
        self.store.put_run(&run).await.inspect_err(|e| {
            tracing::error!(run_id = %id, %action, error = %e, "failed to persist transition")
        })?;
        tracing::info!(run_id = %id, from = %from, to = %run.status, "run {}", action);
        let summary = json!({ "from": from, "to": run.status, "error": run.error });
        self.audit(&run, &format!("run.{}", action), summary).await;
        Ok(run)
    }

    /// Audit is best effort; the transition already happened.
    async fn audit(&self, run: &Run, action: &str, summary: serde_json::Value) {
        let entry = AuditEntry {
            run_id: run.id.clone(),
            org: run.org.clone(),
            actor: run.actor.clone(),
            action: action.to_string(),
            summary,
            at_ms: self.clock.epoch_ms(),
        };
        if let Err(e) = self.store.append_audit(&entry).await {
            tracing::error!(run_id = %run.id, action, error = %e, "failed to append audit entry");
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
