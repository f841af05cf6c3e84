// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared setup for workspace specs.

use hv_adapters::{CatalogItem, FakeCatalog, FakeSearch, SearchPage};
use hv_core::test_support::{categories, seller};
use hv_core::{Category, FakeClock};
use hv_engine::{open_store, EngineConfig, Runtime, RuntimeDeps};
use hv_storage::FileStore;
use std::path::Path;

pub type SpecRuntime = Runtime<FileStore, FakeCatalog, FakeSearch, FakeClock>;

pub fn config() -> EngineConfig {
    EngineConfig { worker_count: 2, search_page_cap: 2, ..EngineConfig::default() }
}

/// Runtime over the store in `state_dir`, as a fresh process would build it.
pub fn runtime_in(state_dir: &Path, catalog: FakeCatalog, search: FakeSearch) -> SpecRuntime {
    let store = open_store(state_dir).unwrap();
    Runtime::new(RuntimeDeps { store, catalog, search }, FakeClock::new(), config())
}

pub fn departments() -> Vec<Category> {
    categories(&[("mugs", "kitchen"), ("pans", "kitchen"), ("hoses", "garden"), ("rakes", "garden")])
}

pub fn catalog() -> FakeCatalog {
    FakeCatalog::new()
        .with_items("mugs", vec![CatalogItem::new("m-1", "Enamel Mug", 12.0)])
        .with_items(
            "pans",
            vec![CatalogItem::new("p-1", "Cast Iron Pan", 45.0), CatalogItem::new("p-2", "Wok", 30.0)],
        )
        .with_items("rakes", vec![CatalogItem::new("r-1", "Leaf Rake", 20.0)])
}

pub fn search() -> FakeSearch {
    FakeSearch::new()
        .with_page("Enamel Mug", 0, SearchPage::new(vec![seller("Camp Goods"), seller("Hearth")], true))
        .with_page("Enamel Mug", 1, SearchPage::new(vec![seller("Tin & Co")], false))
        .with_page("Cast Iron Pan", 0, SearchPage::new(vec![seller("hearth")], false))
        .with_page("Wok", 0, SearchPage::new(vec![seller("Hearth"), seller("Wok Shop")], false))
}
