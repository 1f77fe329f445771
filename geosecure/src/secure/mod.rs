// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Secure view of the catalog

pub mod catalog;
pub mod policy;
pub mod wrapper;

pub use catalog::SecureCatalog;
pub use policy::{AccessLevel, Response, WrapperPolicy};
pub use wrapper::{
    Secured, SecuredInfo, SecuredLayerGroup, SecuredPublished, SecurityError, SecurityResult,
};
