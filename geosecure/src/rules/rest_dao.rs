// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! REST rule store and first-match path checks

use super::dao::{AccessRule, AccessRuleDao};
use super::rest_rule::{HttpMethod, RestAccessRule};
use crate::auth::{Authentication, ANY_ROLE};

pub type RestAccessRuleDao = AccessRuleDao<RestAccessRule>;

/// Role value granting access to everybody, anonymous users included
pub const IS_AUTHENTICATED_ANONYMOUSLY: &str = "IS_AUTHENTICATED_ANONYMOUSLY";

/// Role value granting access to any logged in user
pub const IS_AUTHENTICATED_FULLY: &str = "IS_AUTHENTICATED_FULLY";

impl AccessRuleDao<RestAccessRule> {
    /// First rule, in file order, covering the request
    pub fn matching_rule(&self, path: &str, method: HttpMethod) -> Option<RestAccessRule> {
        self.snapshot()
            .rules()
            .iter()
            .find(|r| r.matches(path, method))
            .cloned()
    }

    /// Whether `auth` may send `method` to `path`
    ///
    /// Requests no rule covers are reserved to `admin_role`.
    pub fn can_access(
        &self,
        auth: &Authentication,
        path: &str,
        method: HttpMethod,
        admin_role: &str,
    ) -> bool {
        match self.matching_rule(path, method) {
            None => auth.has_authority(admin_role),
            Some(rule) => {
                let roles = rule.roles();
                roles.contains(ANY_ROLE)
                    || roles.contains(IS_AUTHENTICATED_ANONYMOUSLY)
                    || (roles.contains(IS_AUTHENTICATED_FULLY) && !auth.is_anonymous())
                    || auth.has_any_authority(roles)
            }
        }
    }
}
