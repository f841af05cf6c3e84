// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hv-adapters: remote capabilities consumed by the run engine
//!
//! The concrete scraping backends live outside this workspace. This crate
//! defines the two capabilities the engine calls, the error taxonomy they
//! report, and scripted fakes for tests.

pub mod catalog;
pub mod error;
pub mod search;

pub use catalog::{CatalogItem, SourceCatalog};
pub use error::RemoteError;
pub use search::{MarketplaceSearch, SearchPage, SearchQuery};

#[cfg(any(test, feature = "test-support"))]
pub use catalog::FakeCatalog;
#[cfg(any(test, feature = "test-support"))]
pub use search::FakeSearch;
