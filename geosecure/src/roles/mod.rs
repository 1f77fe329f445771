// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Role model, role hierarchy and role closure calculation

pub mod calculator;
pub mod error;
pub mod hierarchy;
pub mod model;
pub mod service;

pub use calculator::RoleCalculator;
pub use error::{RoleError, RoleResult};
pub use hierarchy::RoleHierarchyHelper;
pub use model::{Role, User, UserGroup};
pub use service::{MemoryRoleService, MemoryUserGroupService, RoleService, UserGroupService};
