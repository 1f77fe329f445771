// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Typed outcomes for REST style rule management
//!
//! Every call either applies all of its rules or none of them, and persists
//! the result when the DAO is file backed.

use super::dao::{AccessRule, AccessRuleDao};
use super::error::RuleError;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleApiError {
    #[error("Rules already exist: {}", .0.join(", "))]
    Conflict(Vec<String>),

    #[error("Rules not found: {}", .0.join(", "))]
    NotFound(Vec<String>),

    #[error(transparent)]
    Invalid(#[from] RuleError),

    #[error("Failed to store rules: {0}")]
    Persistence(String),
}

impl RuleApiError {
    /// HTTP status the REST layer answers with
    pub fn status_code(&self) -> u16 {
        match self {
            RuleApiError::Conflict(_) => 409,
            RuleApiError::NotFound(_) => 404,
            RuleApiError::Invalid(_) => 422,
            RuleApiError::Persistence(_) => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Created(usize),
    Updated(usize),
    Removed(String),
}

impl RuleOutcome {
    pub fn status_code(&self) -> u16 {
        match self {
            RuleOutcome::Created(_) => 201,
            RuleOutcome::Updated(_) | RuleOutcome::Removed(_) => 200,
        }
    }
}

pub type RuleApiResult = Result<RuleOutcome, RuleApiError>;

pub struct RuleApi<R: AccessRule> {
    dao: Arc<AccessRuleDao<R>>,
}

impl<R: AccessRule> RuleApi<R> {
    pub fn new(dao: Arc<AccessRuleDao<R>>) -> Self {
        Self { dao }
    }

    /// Current rules as key/value pairs, in rule order
    pub fn list(&self) -> Vec<(String, String)> {
        self.dao
            .snapshot()
            .rules()
            .iter()
            .map(|r| (r.key(), r.value()))
            .collect()
    }

    pub fn add(&self, entries: &[(&str, &str)]) -> RuleApiResult {
        let rules = parse_all::<R>(entries)?;
        let count = rules.len();
        self.dao.add_rules(rules).map_err(RuleApiError::Conflict)?;
        self.persist()?;
        Ok(RuleOutcome::Created(count))
    }

    pub fn modify(&self, entries: &[(&str, &str)]) -> RuleApiResult {
        let rules = parse_all::<R>(entries)?;
        let count = rules.len();
        self.dao.update_rules(rules).map_err(RuleApiError::NotFound)?;
        self.persist()?;
        Ok(RuleOutcome::Updated(count))
    }

    pub fn delete(&self, key: &str) -> RuleApiResult {
        let rule = self
            .dao
            .rule(key)
            .ok_or_else(|| RuleApiError::NotFound(vec![key.to_string()]))?;
        if !self.dao.remove_rule(&rule) {
            return Err(RuleApiError::NotFound(vec![key.to_string()]));
        }
        self.persist()?;
        Ok(RuleOutcome::Removed(rule.key()))
    }

    fn persist(&self) -> Result<(), RuleApiError> {
        self.dao
            .store_rules()
            .map_err(|e| RuleApiError::Persistence(e.to_string()))
    }
}

fn parse_all<R: AccessRule>(entries: &[(&str, &str)]) -> Result<Vec<R>, RuleApiError> {
    entries
        .iter()
        .map(|(key, value)| R::parse(key, value).map_err(RuleApiError::from))
        .collect()
}
