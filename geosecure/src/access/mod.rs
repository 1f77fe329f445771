// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Access decisions over the catalog, OWS services and REST endpoints

pub mod containment;
pub mod filter;
pub mod limits;
pub mod manager;
pub mod service;
pub mod tree;

pub use containment::{GroupSummary, LayerGroupContainmentCache};
pub use filter::SecurityFilterBuilder;
pub use limits::{AccessLimits, DataAccessLimits, WorkspaceAccessLimits};
pub use manager::{AccessState, DefaultResourceAccessManager, ResourceAccessManager};
pub use service::{RestAccessManager, ServiceAccessManager};
pub use tree::{SecureTree, SecureTreeNode};
