// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Search phase: page through marketplace sellers for every collected item.

use super::{merge_entities, PhaseCtx, PhaseEnd, PhaseExecutor, TaskOutcome};
use crate::error::EngineError;
use crate::retry::CallOutcome;
use crate::signal::RunToken;
use hv_adapters::{MarketplaceSearch, SearchQuery, SourceCatalog};
use hv_core::{ActivityAction, Checkpoint, Clock, Phase, Progress, Resume, Run, SourceItem};
use hv_storage::{RunStore, StoreError};
use serde_json::json;
use std::collections::HashMap;

impl<S, Cat, Se, C> PhaseExecutor<S, Cat, Se, C>
where
    S: RunStore,
    Cat: SourceCatalog,
    Se: MarketplaceSearch,
    C: Clock,
{
    /// The run's items in task order: category order, then catalog position.
    pub(super) async fn ordered_items(&self, run: &Run) -> Result<Vec<SourceItem>, EngineError> {
        let rank: HashMap<&str, usize> =
            run.categories.iter().enumerate().map(|(i, c)| (c.id.as_str(), i)).collect();
        let mut items = self.store.list_items(&run.id).await?;
        items.sort_by_key(|item| {
            (rank.get(item.category_id.as_str()).copied().unwrap_or(usize::MAX), item.position)
        });
        Ok(items)
    }

    pub(super) async fn search_phase(
        &self,
        run: &Run,
        token: &RunToken,
        checkpoint: Option<&Checkpoint>,
        items: Vec<SourceItem>,
        progress: &mut Progress,
    ) -> Result<PhaseEnd, EngineError> {
        let resume = checkpoint.map_or(Resume::Fresh, |c| c.resume_for(Phase::Search));
        match resume {
            Resume::Done => return Ok(PhaseEnd::Done),
            Resume::Fresh => progress.total_items += items.len() as u64,
            Resume::From { .. } => {}
        }

        let tasks: Vec<(SourceItem, u32)> = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| (item, resume.start_page(index)))
            .collect();
        let this = self.clone();
        self.drive(
            run,
            token,
            Phase::Search,
            &resume,
            tasks,
            progress,
            None,
            move |ctx, worker, (item, start_page)| {
                let this = this.clone();
                async move { this.search_item(&ctx, worker, item, start_page).await }
            },
        )
        .await
    }

    /// Fetch up to `search_page_cap` pages for one item, merging each page's
    /// sellers as it arrives.
    ///
    /// A task stopped after merging pages reports them as partial, so a
    /// resume continues at the next page instead of merging them twice.
    async fn search_item(
        &self,
        ctx: &PhaseCtx,
        worker: usize,
        item: SourceItem,
        start_page: u32,
    ) -> Result<TaskOutcome, StoreError> {
        self.emit(ctx, worker, ActivityAction::Fetching, format!("searching sellers for {}", item.name));
        let mut delta = Progress::default();
        for page in start_page..self.config.search_page_cap {
            let query = SearchQuery::windowed(
                &item.name,
                item.reference_price,
                self.config.price_window_low,
                self.config.price_window_high,
                page,
            );
            let outcome = self
                .retry
                .call(
                    &ctx.stop,
                    &ctx.failures,
                    || self.search.search_sellers(&query),
                    |event| self.on_retry(ctx, worker, event),
                )
                .await;
            let results = match outcome {
                CallOutcome::Ok(results) => results,
                CallOutcome::Stopped if page > start_page => {
                    tracing::debug!(run_id = %ctx.run_id, item = %item.external_id, next_page = page, "search stopped part-way");
                    return Ok(TaskOutcome::Partial { delta, next_page: page });
                }
                CallOutcome::Stopped => return Ok(TaskOutcome::Stopped),
                CallOutcome::Failed(error) => {
                    return Ok(TaskOutcome::Failed {
                        reason: format!("search for {} page {} failed: {}", item.external_id, page, error),
                        delta,
                    })
                }
            };

            if !results.sellers.is_empty() {
                let stats = {
                    let _merge = self.merge_lock.lock().await;
                    merge_entities(
                        &self.store,
                        &ctx.org,
                        &ctx.run_id,
                        &ctx.actor,
                        &results.sellers,
                        self.clock.epoch_ms(),
                    )
                    .await?
                };
                delta.entities_found += stats.found;
                delta.entities_new += stats.new;
                self.emit_with(
                    ctx,
                    worker,
                    ActivityAction::Found,
                    format!("{} sellers for {} ({} new)", stats.found, item.name, stats.new),
                    json!({ "item": item.external_id, "page": page, "found": stats.found, "new": stats.new }),
                );
            }
            if !results.has_more {
                break;
            }
        }

        self.emit(ctx, worker, ActivityAction::Complete, format!("searched {}", item.name));
        delta.processed_items = 1;
        delta.products_searched = 1;
        Ok(TaskOutcome::Done { delta, category: None })
    }
}
