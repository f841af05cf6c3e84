// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduled runs from category presets.
//!
//! Timing lives with the caller (cron, a timer loop); a trigger only decides
//! whether a fire should start a run. An org with any active run is skipped
//! rather than queued.

use crate::error::EngineError;
use crate::lifecycle::{Admission, RunLifecycleManager};
use crate::phase::{PhaseExecutor, RunOutcome};
use hv_adapters::{MarketplaceSearch, SourceCatalog};
use hv_core::{Category, Clock, OrgId, RunId};
use hv_storage::RunStore;
use serde::{Deserialize, Serialize};

/// Named set of categories a schedule runs over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPreset {
    pub name: String,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FireOutcome {
    /// The org already had an active run
    Skipped { active_run: RunId },
    Executed { run_id: RunId, outcome: RunOutcome },
}

#[derive(Clone)]
pub struct ScheduleTrigger<S, Cat, Se, C> {
    lifecycle: RunLifecycleManager<S, C>,
    executor: PhaseExecutor<S, Cat, Se, C>,
}

impl<S, Cat, Se, C> ScheduleTrigger<S, Cat, Se, C>
where
    S: RunStore,
    Cat: SourceCatalog,
    Se: MarketplaceSearch,
    C: Clock,
{
    pub fn new(lifecycle: RunLifecycleManager<S, C>, executor: PhaseExecutor<S, Cat, Se, C>) -> Self {
        Self { lifecycle, executor }
    }

    /// Create, start and execute a run over `preset` for `org`, unless one
    /// is already active.
    pub async fn fire(&self, org: &OrgId, preset: &CategoryPreset) -> Result<FireOutcome, EngineError> {
        let actor = format!("schedule:{}", preset.name);
        let admission =
            self.lifecycle.create_run_if_idle(org, &actor, preset.categories.clone(), None).await?;
        let run = match admission {
            Admission::Created(run) => run,
            Admission::Busy(active) => {
                tracing::info!(
                    org = %org,
                    preset = %preset.name,
                    active_run = %active.id,
                    status = %active.status,
                    "scheduled run skipped: org has an active run"
                );
                return Ok(FireOutcome::Skipped { active_run: active.id });
            }
        };
        tracing::info!(org = %org, preset = %preset.name, run_id = %run.id, "scheduled run created");
        self.lifecycle.start_run(&run.id).await?;
        let outcome = self.executor.execute(&run.id).await?;
        Ok(FireOutcome::Executed { run_id: run.id, outcome })
    }
}
