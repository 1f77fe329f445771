// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Service access rules: `service.operation=role1,role2`

use super::dao::AccessRule;
use super::data_rule::ANY;
use super::error::{RuleError, RuleResult};
use super::properties::{join_roles, parse_roles};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccessRule {
    service: String,
    method: String,
    roles: BTreeSet<String>,
}

impl ServiceAccessRule {
    pub fn new<I, S>(service: &str, method: &str, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            service: service.to_string(),
            method: method.to_string(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Whether this rule covers `service`/`method`, wildcards included
    pub fn matches(&self, service: &str, method: &str) -> bool {
        (self.service == ANY || self.service.eq_ignore_ascii_case(service))
            && (self.method == ANY || self.method.eq_ignore_ascii_case(method))
    }

    /// Lower is more specific
    pub(crate) fn specificity(&self) -> u8 {
        match (self.service == ANY, self.method == ANY) {
            (false, false) => 0,
            (false, true) => 1,
            _ => 2,
        }
    }
}

impl AccessRule for ServiceAccessRule {
    const KIND: &'static str = "service";

    fn key(&self) -> String {
        format!("{}.{}", self.service, self.method)
    }

    fn value(&self) -> String {
        join_roles(&self.roles)
    }

    fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    fn parse(key: &str, value: &str) -> RuleResult<Self> {
        let elements: Vec<&str> = key.trim().split('.').map(str::trim).collect();
        if elements.len() != 2 {
            return Err(RuleError::invalid_key(key, "expected service.operation"));
        }
        if elements.iter().any(|e| e.is_empty()) {
            return Err(RuleError::invalid_key(key, "empty segment"));
        }
        if elements[0] == ANY && elements[1] != ANY {
            return Err(RuleError::invalid_key(
                key,
                "when the service is * the operation must be * too",
            ));
        }
        Ok(Self::new(elements[0], elements[1], parse_roles(value)))
    }
}

impl PartialEq for ServiceAccessRule {
    fn eq(&self, other: &Self) -> bool {
        self.service == other.service && self.method == other.method
    }
}

impl Eq for ServiceAccessRule {}

impl PartialOrd for ServiceAccessRule {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServiceAccessRule {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.service, &self.method).cmp(&(&other.service, &other.method))
    }
}

impl fmt::Display for ServiceAccessRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key(), self.value())
    }
}
