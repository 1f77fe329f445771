// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for access rule parsing and persistence

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Invalid rule key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Unknown access mode '{mode}' in rule key '{key}'")]
    InvalidMode { key: String, mode: String },

    #[error("Unknown HTTP method '{method}' in rule key '{key}'")]
    InvalidMethod { key: String, method: String },

    #[error("Invalid path pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("IO error: {0}")]
    Io(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl RuleError {
    pub(crate) fn invalid_key(key: &str, reason: impl Into<String>) -> Self {
        RuleError::InvalidKey {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// The rule key the error refers to, when it is about a single rule
    pub fn key(&self) -> Option<&str> {
        match self {
            RuleError::InvalidKey { key, .. }
            | RuleError::InvalidMode { key, .. }
            | RuleError::InvalidMethod { key, .. } => Some(key),
            RuleError::InvalidPattern { pattern, .. } => Some(pattern),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RuleError {
    fn from(err: std::io::Error) -> Self {
        RuleError::Io(err.to_string())
    }
}

pub type RuleResult<T> = Result<T, RuleError>;
