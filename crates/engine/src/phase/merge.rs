// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seller → entity merge.
//!
//! Sellers are deduplicated per `(org, platform, normalized name)`. A known
//! entity gets its last-seen run and time moved forward, its seen count left
//! as it was; an unknown one is created.
//! Callers must serialize merges for the same org, since this reads and then
//! writes.

use hv_core::{AuditEntry, DiscoveredEntity, EntityKey, OrgId, RunId, SellerHit};
use hv_storage::{RunStore, StoreError};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};

/// Counts from one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Distinct entities in the input
    pub found: u64,
    /// Of those, how many were not known before
    pub new: u64,
}

pub async fn merge_entities<S: RunStore>(
    store: &S,
    org: &OrgId,
    run: &RunId,
    actor: &str,
    sellers: &[SellerHit],
    now_ms: u64,
) -> Result<MergeStats, StoreError> {
    // platform -> normalized name -> first hit
    let mut by_platform: BTreeMap<&str, BTreeMap<String, &SellerHit>> = BTreeMap::new();
    for hit in sellers {
        let key = EntityKey::new(org, &hit.platform, &hit.name);
        if key.normalized_name.is_empty() {
            continue;
        }
        by_platform.entry(hit.platform.as_str()).or_default().entry(key.normalized_name).or_insert(hit);
    }
    if by_platform.is_empty() {
        return Ok(MergeStats::default());
    }

    let mut stats = MergeStats::default();
    let mut merged = Vec::new();
    for (platform, hits) in &by_platform {
        let names: Vec<String> = hits.keys().cloned().collect();
        let mut known: HashMap<String, DiscoveredEntity> = store
            .find_entities(org, platform, &names)
            .await?
            .into_iter()
            .map(|entity| (entity.key.normalized_name.clone(), entity))
            .collect();
        for (name, hit) in hits {
            stats.found += 1;
            match known.remove(name) {
                Some(mut entity) => {
                    entity.seen_again(run, now_ms);
                    merged.push(entity);
                }
                None => {
                    stats.new += 1;
                    merged.push(DiscoveredEntity::first_seen(org, hit, run, now_ms));
                }
            }
        }
    }
    store.put_entities(&merged).await?;

    let entry = AuditEntry {
        run_id: run.clone(),
        org: org.clone(),
        actor: actor.to_string(),
        action: "entities.merge".to_string(),
        summary: json!({
            "found": stats.found,
            "new": stats.new,
            "updated": stats.found - stats.new,
            "platforms": by_platform.keys().collect::<Vec<_>>(),
        }),
        at_ms: now_ms,
    };
    if let Err(e) = store.append_audit(&entry).await {
        tracing::error!(run_id = %run, error = %e, "failed to append merge audit entry");
    }
    Ok(stats)
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
