// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Marketplace search capability: sellers matching a product in a price window

use crate::error::RemoteError;
use async_trait::async_trait;
use hv_core::SellerHit;
use serde::{Deserialize, Serialize};

/// One paginated seller search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub reference_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    /// 0-based page number
    pub page: u32,
}

impl SearchQuery {
    /// Query for `name` with the price window `[low × price, high × price]`.
    pub fn windowed(name: &str, reference_price: f64, low: f64, high: f64, page: u32) -> Self {
        Self {
            query: name.to_string(),
            reference_price,
            min_price: reference_price * low,
            max_price: reference_price * high,
            page,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub sellers: Vec<SellerHit>,
    pub has_more: bool,
}

impl SearchPage {
    pub fn new(sellers: Vec<SellerHit>, has_more: bool) -> Self {
        Self { sellers, has_more }
    }
}

#[async_trait]
pub trait MarketplaceSearch: Clone + Send + Sync + 'static {
    async fn search_sellers(&self, query: &SearchQuery) -> Result<SearchPage, RemoteError>;
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{MarketplaceSearch, RemoteError, SearchPage, SearchQuery};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeSearchState {
        /// One-shot responses per query string
        scripted: HashMap<String, VecDeque<Result<SearchPage, RemoteError>>>,
        /// Fixed pages per (query, page) once the script is empty
        pages: HashMap<(String, u32), SearchPage>,
        calls: Vec<SearchQuery>,
    }

    /// Scripted marketplace search for tests.
    ///
    /// Unscripted queries answer with an empty last page.
    #[derive(Clone, Default)]
    pub struct FakeSearch {
        inner: Arc<Mutex<FakeSearchState>>,
        latency: Option<Duration>,
    }

    impl FakeSearch {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fixed response for `query` at `page`.
        pub fn with_page(self, query: &str, page: u32, response: SearchPage) -> Self {
            self.inner.lock().pages.insert((query.to_string(), page), response);
            self
        }

        /// Queue a one-shot response for `query`, consumed before fixed pages.
        pub fn push(&self, query: &str, response: Result<SearchPage, RemoteError>) {
            self.inner
                .lock()
                .scripted
                .entry(query.to_string())
                .or_default()
                .push_back(response);
        }

        pub fn fail_times(&self, query: &str, err: RemoteError, count: usize) {
            for _ in 0..count {
                self.push(query, Err(err.clone()));
            }
        }

        /// Sleep this long (tokio time) inside every call.
        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = Some(latency);
            self
        }

        /// Every query received, in call order.
        pub fn calls(&self) -> Vec<SearchQuery> {
            self.inner.lock().calls.clone()
        }

        pub fn calls_for(&self, query: &str) -> usize {
            self.inner.lock().calls.iter().filter(|q| q.query == query).count()
        }
    }

    #[async_trait]
    impl MarketplaceSearch for FakeSearch {
        async fn search_sellers(&self, query: &SearchQuery) -> Result<SearchPage, RemoteError> {
            let response = {
                let mut state = self.inner.lock();
                state.calls.push(query.clone());
                match state.scripted.get_mut(&query.query).and_then(VecDeque::pop_front) {
                    Some(response) => response,
                    None => Ok(state
                        .pages
                        .get(&(query.query.clone(), query.page))
                        .cloned()
                        .unwrap_or_default()),
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
pub use fake::FakeSearch;
