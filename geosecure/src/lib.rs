// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! GeoSecure - resource access control for geospatial catalogs
//!
//! GeoSecure decides, per user and per operation, whether catalog objects
//! (workspaces, stores, resources, layers, layer groups and styles) may be
//! read, written or administered, and enforces those decisions over catalog
//! access.
//!
//! # Features
//!
//! - **Property file rules**: `workspace.layer.mode=roles` data rules,
//!   `service.method=roles` service rules and `path;METHODS=roles` REST rules
//! - **Rule tree**: most specific rule wins, unspecified nodes inherit
//! - **Layer group containment**: named, container, opaque and EO groups
//!   gate direct access to their members while serving WMS
//! - **Catalog modes**: hide, challenge or mixed treatment of denied objects
//! - **Security filters**: predicates for bulk listings that agree with the
//!   per object decisions
//! - **Role closure**: role hierarchy and group inherited roles
//!
//! # Usage
//!
//! ```ignore
//! let catalog = Arc::new(MemoryCatalog::from_json_file(path)?);
//! let security = GeoSecurity::from_config(SecurityConfig::with_data_dir("security"), catalog)?;
//! let ctx = SecurityContext::new(Authentication::anonymous(), RequestContext::ows("WMS", "GetMap"));
//! let states = security.catalog().layer_by_name(&ctx, "topp", "states");
//! ```

pub mod access;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod roles;
pub mod rules;
pub mod secure;
pub mod security;

pub use access::{DefaultResourceAccessManager, ResourceAccessManager};
pub use auth::{Authentication, RequestContext, SecurityContext};
pub use config::{LayerGroupVisibility, SecurityConfig};
pub use rules::{AccessMode, CatalogMode};
pub use secure::{SecureCatalog, Secured, SecurityError};
pub use security::GeoSecurity;

/// GeoSecure version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
