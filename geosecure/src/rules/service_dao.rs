// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Service rule store and OWS operation checks

use super::dao::{AccessRule, AccessRuleDao};
use super::service_rule::ServiceAccessRule;
use crate::auth::{Authentication, ANY_ROLE};

pub type ServiceAccessRuleDao = AccessRuleDao<ServiceAccessRule>;

impl AccessRuleDao<ServiceAccessRule> {
    /// Most specific rule covering `service`/`method`
    ///
    /// `service.method` beats `service.*`, which beats `*.*`.
    pub fn matching_rule(&self, service: &str, method: &str) -> Option<ServiceAccessRule> {
        self.snapshot()
            .rules()
            .iter()
            .filter(|r| r.matches(service, method))
            .min_by_key(|r| r.specificity())
            .cloned()
    }

    /// Whether `auth` may call `service`/`method`; unprotected operations are
    /// open to everybody
    pub fn can_access(&self, auth: &Authentication, service: &str, method: &str) -> bool {
        match self.matching_rule(service, method) {
            None => true,
            Some(rule) => {
                let roles = rule.roles();
                roles.contains(ANY_ROLE) || auth.has_any_authority(roles)
            }
        }
    }
}
