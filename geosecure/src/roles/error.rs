// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for role resolution

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoleError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Cycle in role hierarchy: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("Role '{parent}' cannot be the parent of '{role}'")]
    InvalidParent { role: String, parent: String },

    #[error("Role name is reserved: {0}")]
    ReservedRole(String),

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Unknown group: {0}")]
    UnknownGroup(String),
}

pub type RoleResult<T> = Result<T, RoleError>;
