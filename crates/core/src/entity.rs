// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Discovered sellers and their normalized identity

use crate::id::{OrgId, RunId};
use serde::{Deserialize, Serialize};

/// Case-fold and collapse internal whitespace.
///
/// `"  ACME   Supplies "` and `"acme supplies"` normalize to the same key.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>().join(" ")
}

/// Identity of a discovered entity within an org.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    pub org: OrgId,
    pub platform: String,
    pub normalized_name: String,
}

impl EntityKey {
    pub fn new(org: &OrgId, platform: &str, name: &str) -> Self {
        Self { org: org.clone(), platform: platform.to_string(), normalized_name: normalize_name(name) }
    }
}

/// A seller returned by one marketplace search page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerHit {
    pub name: String,
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl SellerHit {
    pub fn new(name: impl Into<String>, platform: impl Into<String>) -> Self {
        Self { name: name.into(), platform: platform.into(), url: None, price: None }
    }
}

/// Stored seller, unique per (org, platform, normalized name).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredEntity {
    pub key: EntityKey,
    /// Name as first seen, before normalization
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Set to 1 on first discovery; re-discovery leaves it unchanged.
    pub seen_count: u32,
    pub first_seen_run: RunId,
    pub last_seen_run: RunId,
    pub first_seen_ms: u64,
    pub last_seen_ms: u64,
}

impl DiscoveredEntity {
    /// First sighting of a seller.
    pub fn first_seen(org: &OrgId, hit: &SellerHit, run: &RunId, epoch_ms: u64) -> Self {
        Self {
            key: EntityKey::new(org, &hit.platform, &hit.name),
            display_name: hit.name.trim().to_string(),
            url: hit.url.clone(),
            seen_count: 1,
            first_seen_run: run.clone(),
            last_seen_run: run.clone(),
            first_seen_ms: epoch_ms,
            last_seen_ms: epoch_ms,
        }
    }

    /// Record a later sighting. Only the last-seen fields move.
    pub fn seen_again(&mut self, run: &RunId, epoch_ms: u64) {
        self.last_seen_run = run.clone();
        self.last_seen_ms = epoch_ms;
    }
}

#[cfg(test)]
#[path = "entity_tests.rs"]
mod tests;
