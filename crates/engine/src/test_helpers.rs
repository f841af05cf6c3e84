// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for the engine crate.

use crate::config::EngineConfig;
use crate::runtime::{Runtime, RuntimeDeps};
use hv_adapters::{CatalogItem, FakeCatalog, FakeSearch, SearchPage};
use hv_core::test_support::{categories, org, seller};
use hv_core::{Category, FakeClock, Run};
use hv_storage::{FaultyStore, MemoryStore};
use std::time::Duration;

/// Convenience alias for the fully-typed test runtime.
pub(crate) type TestStore = FaultyStore<MemoryStore>;
pub(crate) type TestRuntime = Runtime<TestStore, FakeCatalog, FakeSearch, FakeClock>;

/// Test context holding the runtime and the fakes behind it.
pub(crate) struct TestContext {
    pub runtime: TestRuntime,
    pub store: TestStore,
    pub catalog: FakeCatalog,
    pub search: FakeSearch,
    pub clock: FakeClock,
}

/// Small, deterministic config: one worker, short search paging.
pub(crate) fn test_config() -> EngineConfig {
    EngineConfig {
        worker_count: 1,
        max_attempts: 3,
        failure_threshold: 3,
        search_page_cap: 2,
        ..EngineConfig::default()
    }
}

pub(crate) fn setup(catalog: FakeCatalog, search: FakeSearch) -> TestContext {
    setup_with(catalog, search, test_config())
}

pub(crate) fn setup_with(catalog: FakeCatalog, search: FakeSearch, config: EngineConfig) -> TestContext {
    setup_on(TestStore::new(MemoryStore::new()), catalog, search, config)
}

/// Runtime over an existing store, e.g. to simulate a process restart.
pub(crate) fn setup_on(
    store: TestStore,
    catalog: FakeCatalog,
    search: FakeSearch,
    config: EngineConfig,
) -> TestContext {
    let clock = FakeClock::new();
    let runtime = Runtime::new(
        RuntimeDeps { store: store.clone(), catalog: catalog.clone(), search: search.clone() },
        clock.clone(),
        config,
    );
    TestContext { runtime, store, catalog, search, clock }
}

/// Three categories over two departments.
pub(crate) fn kitchen_and_garden() -> Vec<Category> {
    categories(&[("c1", "kitchen"), ("c2", "kitchen"), ("c3", "garden")])
}

/// Catalog for [`kitchen_and_garden`]: c1 has two items, c2 none, c3 one.
pub(crate) fn stocked_catalog() -> FakeCatalog {
    FakeCatalog::new()
        .with_items(
            "c1",
            vec![CatalogItem::new("k-1", "Kettle", 40.0), CatalogItem::new("k-2", "Toaster", 60.0)],
        )
        .with_items("c3", vec![CatalogItem::new("g-1", "Rake", 25.0)])
}

/// Sellers for [`stocked_catalog`]: two distinct entities across four hits.
pub(crate) fn stocked_search() -> FakeSearch {
    FakeSearch::new()
        .with_page("Kettle", 0, SearchPage::new(vec![seller("Acme"), seller("Birch")], true))
        .with_page("Kettle", 1, SearchPage::new(vec![seller("acme")], false))
        .with_page("Toaster", 0, SearchPage::new(vec![seller("BIRCH")], false))
}

impl TestContext {
    /// Create a run over `cats` for org-a and start it.
    pub(crate) async fn started_run(&self, cats: Vec<Category>) -> Run {
        let run = self.runtime.create_run(&org("org-a"), "alice", cats, None).await.unwrap();
        self.runtime.start_run(&run.id).await.unwrap()
    }
}

/// Let the engine log into the test harness output; `RUST_LOG` filters.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub(crate) const LATENCY: Duration = Duration::from_secs(1);
