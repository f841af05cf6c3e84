// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source phase: one catalog fetch per category.

use super::{PhaseCtx, PhaseEnd, PhaseExecutor, TaskOutcome};
use crate::error::EngineError;
use crate::progress::CompletionTracker;
use crate::retry::CallOutcome;
use crate::signal::RunToken;
use hv_adapters::{MarketplaceSearch, SourceCatalog};
use hv_core::{ActivityAction, Category, Checkpoint, Clock, Phase, Progress, Resume, Run, SourceItem};
use hv_storage::{RunStore, StoreError};
use serde_json::json;

impl<S, Cat, Se, C> PhaseExecutor<S, Cat, Se, C>
where
    S: RunStore,
    Cat: SourceCatalog,
    Se: MarketplaceSearch,
    C: Clock,
{
    pub(super) async fn source_phase(
        &self,
        run: &Run,
        token: &RunToken,
        checkpoint: Option<&Checkpoint>,
        progress: &mut Progress,
    ) -> Result<PhaseEnd, EngineError> {
        let resume = checkpoint.map_or(Resume::Fresh, |c| c.resume_for(Phase::Source));
        match resume {
            Resume::Done => return Ok(PhaseEnd::Done),
            Resume::Fresh => progress.total_items += run.categories.len() as u64,
            Resume::From { .. } => {}
        }

        let mut tracker = CompletionTracker::new(&run.categories, &resume);
        let this = self.clone();
        self.drive(
            run,
            token,
            Phase::Source,
            &resume,
            run.categories.clone(),
            progress,
            Some(&mut tracker),
            move |ctx, worker, category| {
                let this = this.clone();
                async move { this.fetch_category(&ctx, worker, category).await }
            },
        )
        .await
    }

    async fn fetch_category(
        &self,
        ctx: &PhaseCtx,
        worker: usize,
        category: Category,
    ) -> Result<TaskOutcome, StoreError> {
        self.emit(ctx, worker, ActivityAction::Fetching, format!("fetching {}", category.name));
        let outcome = self
            .retry
            .call(
                &ctx.stop,
                &ctx.failures,
                || self.catalog.fetch_items(&category),
                |event| self.on_retry(ctx, worker, event),
            )
            .await;
        let fetched = match outcome {
            CallOutcome::Ok(fetched) => fetched,
            CallOutcome::Stopped => return Ok(TaskOutcome::Stopped),
            CallOutcome::Failed(error) => {
                return Ok(TaskOutcome::Failed {
                    reason: format!("category {} failed: {}", category.id, error),
                    delta: Progress::default(),
                })
            }
        };

        let items: Vec<SourceItem> = fetched
            .into_iter()
            .enumerate()
            .map(|(position, item)| SourceItem {
                run_id: ctx.run_id.clone(),
                category_id: category.id.clone(),
                position,
                external_id: item.external_id,
                name: item.name,
                reference_price: item.reference_price,
            })
            .collect();
        if !items.is_empty() {
            self.store.upsert_items(&items).await?;
        }
        tracing::debug!(run_id = %ctx.run_id, category = %category.id, items = items.len(), "category fetched");
        self.emit_with(
            ctx,
            worker,
            ActivityAction::Found,
            format!("{} items in {}", items.len(), category.name),
            json!({ "category": category.id, "items": items.len() }),
        );

        let delta = Progress {
            processed_items: 1,
            products_total: items.len() as u64,
            ..Progress::default()
        };
        Ok(TaskOutcome::Done { delta, category: Some(category.id) })
    }
}
