// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source catalog capability: candidate items per category

use crate::error::RemoteError;
use async_trait::async_trait;
use hv_core::Category;
use serde::{Deserialize, Serialize};

/// Candidate product as listed by the source catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub external_id: String,
    pub name: String,
    pub reference_price: f64,
}

impl CatalogItem {
    pub fn new(external_id: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self { external_id: external_id.into(), name: name.into(), reference_price: price }
    }
}

/// Fetch the candidate items listed under a category.
#[async_trait]
pub trait SourceCatalog: Clone + Send + Sync + 'static {
    async fn fetch_items(&self, category: &Category) -> Result<Vec<CatalogItem>, RemoteError>;
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{CatalogItem, RemoteError, SourceCatalog};
    use async_trait::async_trait;
    use hv_core::Category;
    use parking_lot::Mutex;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Arc;
    use std::time::Duration;

    type Hook = Arc<dyn Fn(&str) + Send + Sync>;

    #[derive(Default)]
    struct FakeCatalogState {
        /// One-shot responses consumed in order, per category id
        scripted: HashMap<String, VecDeque<Result<Vec<CatalogItem>, RemoteError>>>,
        /// Returned once the script for a category is exhausted
        items: HashMap<String, Vec<CatalogItem>>,
        calls: Vec<String>,
    }

    /// Scripted source catalog for tests.
    ///
    /// Each category answers from its script first, then from its fixed item
    /// list (empty by default).
    #[derive(Clone, Default)]
    pub struct FakeCatalog {
        inner: Arc<Mutex<FakeCatalogState>>,
        latency: Option<Duration>,
        hook: Option<Hook>,
    }

    impl FakeCatalog {
        pub fn new() -> Self {
            Self::default()
        }

        /// Items returned for `category_id` after its script runs out.
        pub fn with_items(self, category_id: &str, items: Vec<CatalogItem>) -> Self {
            self.inner.lock().items.insert(category_id.to_string(), items);
            self
        }

        /// Queue a one-shot response for `category_id`.
        pub fn push(&self, category_id: &str, response: Result<Vec<CatalogItem>, RemoteError>) {
            self.inner
                .lock()
                .scripted
                .entry(category_id.to_string())
                .or_default()
                .push_back(response);
        }

        /// Queue the same error `count` times for `category_id`.
        pub fn fail_times(&self, category_id: &str, err: RemoteError, count: usize) {
            for _ in 0..count {
                self.push(category_id, Err(err.clone()));
            }
        }

        /// Sleep this long (tokio time) inside every call.
        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = Some(latency);
            self
        }

        /// Run `hook` with the category id at the start of every call.
        pub fn with_hook(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
            self.hook = Some(Arc::new(hook));
            self
        }

        /// Category ids in call order, one entry per attempt.
        pub fn calls(&self) -> Vec<String> {
            self.inner.lock().calls.clone()
        }

        pub fn calls_for(&self, category_id: &str) -> usize {
            self.inner.lock().calls.iter().filter(|c| *c == category_id).count()
        }
    }

    #[async_trait]
    impl SourceCatalog for FakeCatalog {
        async fn fetch_items(
            &self,
            category: &Category,
        ) -> Result<Vec<CatalogItem>, RemoteError> {
            if let Some(hook) = &self.hook {
                hook(&category.id);
            }
            let response = {
                let mut state = self.inner.lock();
                state.calls.push(category.id.clone());
                match state.scripted.get_mut(&category.id).and_then(VecDeque::pop_front) {
                    Some(response) => response,
                    None => Ok(state.items.get(&category.id).cloned().unwrap_or_default()),
                }
            };
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            response
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeCatalog;
