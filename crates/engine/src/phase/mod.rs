// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Two-phase run execution.
//!
//! ```text
//! source: one task per category  ──▶ items persisted, sourcePhaseComplete
//! search: one task per item      ──▶ entities merged, searchPhaseComplete
//! ```
//!
//! Workers run tasks and report completions; the executor alone folds them
//! into the run's progress and writes checkpoints, one at a time.

mod merge;
mod search;
mod source;

pub use merge::{merge_entities, MergeStats};

use crate::activity::{ActivityHub, ActivityStream};
use crate::config::EngineConfig;
use crate::error::{EngineError, Rejection};
use crate::lifecycle::RunLifecycleManager;
use crate::pool::ParallelRunner;
use crate::progress::{CompletionTracker, CursorTracker};
use crate::retry::{FailureCounter, RetryEvent, RetryPolicy};
use crate::signal::{RunToken, Signal, SignalRegistry};
use hv_adapters::{MarketplaceSearch, SourceCatalog};
use hv_core::{
    ActivityAction, ActivityEvent, Checkpoint, Clock, OrgId, Phase, PhaseCursor, Progress, Resume,
    Run, RunId, RunStatus,
};
use hv_storage::{RunStore, StoreError};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// How an execution ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Both phases finished
    Completed { progress: Progress },
    /// Every source task failed
    Failed { reason: String, progress: Progress },
    /// The failure circuit opened; the run was paused automatically
    Paused { reason: String, progress: Progress },
    /// An operator pause or cancel was observed
    Stopped { signal: Signal, progress: Progress },
}

impl RunOutcome {
    pub fn progress(&self) -> &Progress {
        match self {
            RunOutcome::Completed { progress }
            | RunOutcome::Failed { progress, .. }
            | RunOutcome::Paused { progress, .. }
            | RunOutcome::Stopped { progress, .. } => progress,
        }
    }
}

/// How a single phase ended.
#[derive(Debug)]
enum PhaseEnd {
    Done,
    Stopped(Signal),
    CircuitOpen(String),
}

/// Result of one task, folded into progress by the executor.
#[derive(Debug)]
enum TaskOutcome {
    /// `category` is set for source tasks, whose success completes it
    Done { delta: Progress, category: Option<String> },
    Failed { reason: String, delta: Progress },
    /// Stopped after merging some pages; the task continues from `next_page`
    Partial { delta: Progress, next_page: u32 },
    /// Stopped with nothing to keep; the task is redone on resume
    Stopped,
}

/// Shared by every worker of one phase.
struct PhaseCtx {
    run_id: RunId,
    org: OrgId,
    actor: String,
    phase: Phase,
    stop: CancellationToken,
    failures: FailureCounter,
    stream: ActivityStream,
}

/// Removes the run from the executing set when dropped.
struct ExecutionClaim {
    executing: Arc<Mutex<HashSet<RunId>>>,
    run: RunId,
}

impl ExecutionClaim {
    fn acquire(executing: &Arc<Mutex<HashSet<RunId>>>, run: &RunId) -> Result<Self, Rejection> {
        if !executing.lock().insert(run.clone()) {
            return Err(Rejection::AlreadyExecuting(run.clone()));
        }
        Ok(Self { executing: Arc::clone(executing), run: run.clone() })
    }
}

impl Drop for ExecutionClaim {
    fn drop(&mut self) {
        self.executing.lock().remove(&self.run);
    }
}

fn is_rejected_transition(e: &EngineError) -> bool {
    matches!(e.rejection(), Some(Rejection::InvalidTransition { .. }))
}

/// Executes runs phase by phase. Clones share state.
#[derive(Clone)]
pub struct PhaseExecutor<S, Cat, Se, C> {
    store: S,
    catalog: Cat,
    search: Se,
    clock: C,
    lifecycle: RunLifecycleManager<S, C>,
    signals: SignalRegistry,
    activity: ActivityHub,
    config: Arc<EngineConfig>,
    retry: RetryPolicy,
    runner: ParallelRunner,
    executing: Arc<Mutex<HashSet<RunId>>>,
    /// Serializes entity read-merge-write across workers
    merge_lock: Arc<tokio::sync::Mutex<()>>,
}

impl<S, Cat, Se, C> PhaseExecutor<S, Cat, Se, C>
where
    S: RunStore,
    Cat: SourceCatalog,
    Se: MarketplaceSearch,
    C: Clock,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: S,
        catalog: Cat,
        search: Se,
        clock: C,
        lifecycle: RunLifecycleManager<S, C>,
        signals: SignalRegistry,
        activity: ActivityHub,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            retry: RetryPolicy::from_config(&config),
            runner: ParallelRunner::new(config.worker_count),
            store,
            catalog,
            search,
            clock,
            lifecycle,
            signals,
            activity,
            config,
            executing: Arc::default(),
            merge_lock: Arc::default(),
        }
    }

    /// Run both phases of a `running` run, resuming from its checkpoint.
    ///
    /// Returns once the run completes, fails, pauses itself, or observes an
    /// operator signal. Store failures propagate and leave the run in its
    /// last persisted status. A run that ends terminally releases its signal
    /// token.
    pub async fn execute(&self, id: &RunId) -> Result<RunOutcome, EngineError> {
        let run = self.lifecycle.get_run(id).await?;
        if run.status != RunStatus::Running {
            return Err(Rejection::NotRunning { id: id.clone(), status: run.status }.into());
        }
        let _claim = ExecutionClaim::acquire(&self.executing, id)?;
        let token = self.signals.token(id);
        let outcome = self.run_phases(&run, &token).await;
        if let Ok(
            RunOutcome::Completed { .. }
            | RunOutcome::Failed { .. }
            | RunOutcome::Stopped { signal: Signal::Cancel, .. },
        ) = &outcome
        {
            self.signals.clear(id);
        }
        outcome
    }

    async fn run_phases(&self, run: &Run, token: &RunToken) -> Result<RunOutcome, EngineError> {
        let id = &run.id;
        let checkpoint = run.decode_checkpoint()?;
        let mut progress = checkpoint.as_ref().map_or(run.progress, |c| c.progress);
        tracing::info!(
            run_id = %id,
            org = %run.org,
            checkpoint = checkpoint.as_ref().map_or("none", Checkpoint::phase_tag),
            "executing run"
        );

        match self.source_phase(run, token, checkpoint.as_ref(), &mut progress).await? {
            PhaseEnd::Done => {}
            end => return Ok(self.finish_early(run, end, progress)),
        }
        if progress.categories_total > 0 && progress.categories_completed == 0 {
            let reason = "every category fetch failed".to_string();
            tracing::warn!(run_id = %id, "{}", reason);
            return match self.lifecycle.fail_run(id, &reason, progress).await {
                Ok(_) => Ok(RunOutcome::Failed { reason, progress }),
                Err(e) if is_rejected_transition(&e) => self.observed_stop(run, token, progress).await,
                Err(e) => Err(e),
            };
        }

        let items = self.ordered_items(run).await?;
        if items.is_empty() {
            tracing::info!(run_id = %id, "no items collected, skipping search phase");
        } else {
            match self.search_phase(run, token, checkpoint.as_ref(), items, &mut progress).await? {
                PhaseEnd::Done => {}
                end => return Ok(self.finish_early(run, end, progress)),
            }
        }

        match self.lifecycle.complete_run(id, progress).await {
            Ok(_) => {
                tracing::info!(
                    run_id = %id,
                    processed = progress.processed_items,
                    failed = progress.failed_items,
                    entities_new = progress.entities_new,
                    "run completed"
                );
                Ok(RunOutcome::Completed { progress })
            }
            Err(e) if is_rejected_transition(&e) => self.observed_stop(run, token, progress).await,
            Err(e) => Err(e),
        }
    }

    fn finish_early(&self, run: &Run, end: PhaseEnd, progress: Progress) -> RunOutcome {
        match end {
            PhaseEnd::Done => RunOutcome::Completed { progress },
            PhaseEnd::Stopped(signal) => {
                tracing::info!(run_id = %run.id, %signal, "run stopped by signal");
                RunOutcome::Stopped { signal, progress }
            }
            PhaseEnd::CircuitOpen(reason) => RunOutcome::Paused { reason, progress },
        }
    }

    /// The run moved on without us (operator pause or cancel); report it.
    async fn observed_stop(
        &self,
        run: &Run,
        token: &RunToken,
        progress: Progress,
    ) -> Result<RunOutcome, EngineError> {
        let signal = self.observed_signal(run, token).await?;
        Ok(RunOutcome::Stopped { signal, progress })
    }

    /// The signal behind a stop: the run's token, else its persisted status.
    async fn observed_signal(&self, run: &Run, token: &RunToken) -> Result<Signal, EngineError> {
        if let Some(signal) = token.signal() {
            return Ok(signal);
        }
        let status = self.lifecycle.get_run(&run.id).await?.status;
        Ok(if status == RunStatus::Cancelled { Signal::Cancel } else { Signal::Pause })
    }

    /// Write a checkpoint for `position`.
    async fn persist(
        &self,
        run: &RunId,
        position: PhaseCursor,
        progress: &Progress,
    ) -> Result<(), EngineError> {
        let checkpoint = Checkpoint::new(position, *progress, self.clock.epoch_ms());
        self.lifecycle
            .checkpoint(run, checkpoint, progress.processed_items, progress.failed_items)
            .await
            .map(|_| ())
    }

    /// Run one phase's pending tasks through the worker pool.
    ///
    /// Completions are folded into `progress` and checkpointed as they
    /// arrive. The phase ends when every task settled, a signal stopped the
    /// run, or the failure circuit opened.
    #[allow(clippy::too_many_arguments)]
    async fn drive<T, F, Fut>(
        &self,
        run: &Run,
        token: &RunToken,
        phase: Phase,
        resume: &Resume,
        tasks: Vec<T>,
        progress: &mut Progress,
        mut rollup: Option<&mut CompletionTracker>,
        process: F,
    ) -> Result<PhaseEnd, EngineError>
    where
        T: Send + 'static,
        F: Fn(Arc<PhaseCtx>, usize, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<TaskOutcome, StoreError>> + Send + 'static,
    {
        let mut cursor = CursorTracker::new(resume, tasks.len());
        let pending: Vec<(usize, T)> =
            tasks.into_iter().enumerate().filter(|(index, _)| !resume.is_done(*index)).collect();
        tracing::info!(
            run_id = %run.id,
            %phase,
            total = cursor.cursor() + pending.len(),
            pending = pending.len(),
            "phase starting"
        );
        if let Err(e) = self.persist(&run.id, cursor.position(phase), progress).await {
            if is_rejected_transition(&e) {
                return Ok(PhaseEnd::Stopped(self.observed_signal(run, token).await?));
            }
            return Err(e);
        }

        let stop = token.child();
        let failures = FailureCounter::new(self.config.failure_threshold, stop.clone());
        let ctx = Arc::new(PhaseCtx {
            run_id: run.id.clone(),
            org: run.org.clone(),
            actor: run.actor.clone(),
            phase,
            stop: stop.clone(),
            failures: failures.clone(),
            stream: self.activity.stream(&run.id),
        });
        let mut handle = self.runner.spawn(pending, stop.clone(), move |worker, _, task| {
            process(Arc::clone(&ctx), worker, task)
        });

        let mut fatal: Option<EngineError> = None;
        let mut moved_on = false;
        while let Some(completion) = handle.next().await {
            match completion.result {
                Ok(TaskOutcome::Done { delta, category }) => {
                    progress.absorb(&delta);
                    if let (Some(tracker), Some(category)) = (rollup.as_deref_mut(), category) {
                        let rolled = tracker.complete(&category);
                        progress.categories_completed += u64::from(rolled.category_completed);
                        progress.departments_completed += u64::from(rolled.department_completed);
                    }
                    cursor.mark(completion.index);
                }
                Ok(TaskOutcome::Failed { reason, delta }) => {
                    tracing::warn!(run_id = %run.id, %phase, index = completion.index, %reason, "task failed");
                    progress.absorb(&delta);
                    progress.failed_items += 1;
                    cursor.mark_failed(completion.index);
                }
                Ok(TaskOutcome::Partial { delta, next_page }) => {
                    progress.absorb(&delta);
                    cursor.mark_partial(completion.index, next_page);
                }
                Ok(TaskOutcome::Stopped) => continue,
                Err(e) => {
                    tracing::error!(run_id = %run.id, %phase, error = %e, "task store write failed");
                    stop.cancel();
                    fatal.get_or_insert(e.into());
                    continue;
                }
            }
            if fatal.is_some() || moved_on {
                continue;
            }
            if let Err(e) = self.persist(&run.id, cursor.position(phase), progress).await {
                stop.cancel();
                if is_rejected_transition(&e) {
                    moved_on = true;
                } else {
                    fatal = Some(e);
                }
            }
        }
        handle.join().await?;
        if let Some(e) = fatal {
            return Err(e);
        }

        if let Some(reason) = failures.trip_reason() {
            tracing::warn!(run_id = %run.id, %phase, %reason, "auto-pausing run");
            let checkpoint = Checkpoint::new(cursor.position(phase), *progress, self.clock.epoch_ms());
            return match self.lifecycle.auto_pause(&run.id, &reason, checkpoint).await {
                Ok(_) => Ok(PhaseEnd::CircuitOpen(reason)),
                Err(e) if is_rejected_transition(&e) => {
                    Ok(PhaseEnd::Stopped(self.observed_signal(run, token).await?))
                }
                Err(e) => Err(e),
            };
        }
        if moved_on || token.is_stopped() || !cursor.is_complete() {
            let signal = self.observed_signal(run, token).await?;
            if !moved_on {
                // Cancelled runs reject the write; paused runs keep the counters
                match self.persist(&run.id, cursor.position(phase), progress).await {
                    Ok(()) => {}
                    Err(e) if is_rejected_transition(&e) => {}
                    Err(e) => return Err(e),
                }
            }
            return Ok(PhaseEnd::Stopped(signal));
        }

        tracing::info!(run_id = %run.id, %phase, "phase complete");
        Ok(PhaseEnd::Done)
    }

    fn emit(&self, ctx: &PhaseCtx, worker: usize, action: ActivityAction, message: String) {
        let event = ActivityEvent::new(worker, ctx.phase, action, self.clock.epoch_ms()).message(message);
        ctx.stream.push(event);
    }

    fn emit_with(
        &self,
        ctx: &PhaseCtx,
        worker: usize,
        action: ActivityAction,
        message: String,
        payload: serde_json::Value,
    ) {
        let event = ActivityEvent::new(worker, ctx.phase, action, self.clock.epoch_ms())
            .message(message)
            .payload(payload);
        ctx.stream.push(event);
    }

    fn on_retry(&self, ctx: &PhaseCtx, worker: usize, event: RetryEvent<'_>) {
        match event {
            RetryEvent::RateLimited { delay } => self.emit(
                ctx,
                worker,
                ActivityAction::RateLimited,
                format!("rate limited, retrying in {}s", delay.as_secs_f64()),
            ),
            RetryEvent::Failed { error, attempt, max_attempts } => self.emit(
                ctx,
                worker,
                ActivityAction::Error,
                format!("attempt {}/{} failed: {}", attempt, max_attempts, error),
            ),
        }
    }
}
