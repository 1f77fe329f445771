// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog model and the read interface the access layer secures

pub mod error;
pub mod events;
pub mod filter;
pub mod iterator;
pub mod memory;
pub mod model;
pub mod traits;

pub use error::{CatalogError, CatalogResult};
pub use events::{CatalogEvent, CatalogListener};
pub use filter::{Filter, Query, SortBy};
pub use iterator::CloseableIterator;
pub use memory::{CatalogSnapshot, MemoryCatalog};
pub use model::{
    CatalogInfo, InfoType, LayerGroupInfo, LayerGroupMode, LayerInfo, PublishedRef, ResourceInfo,
    ResourceKind, StoreInfo, StoreKind, StyleInfo, WorkspaceInfo,
};
pub use traits::Catalog;
