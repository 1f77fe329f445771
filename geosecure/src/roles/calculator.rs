// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Computes the full set of roles a user holds
//!
//! The closure starts from the user's direct roles and the roles of every
//! enabled group the user belongs to, adds all their ancestors, maps the
//! service's local admin roles onto the global ones, personalizes template
//! properties and finally adds [`ROLE_AUTHENTICATED`].

use super::error::RoleResult;
use super::hierarchy::RoleHierarchyHelper;
use super::model::Role;
use super::service::{RoleService, UserGroupService};
use crate::auth::{Authentication, ROLE_ADMINISTRATOR, ROLE_AUTHENTICATED, ROLE_GROUP_ADMIN};
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct RoleCalculator {
    role_service: Arc<dyn RoleService>,
    user_group_service: Option<Arc<dyn UserGroupService>>,
}

impl RoleCalculator {
    pub fn new(role_service: Arc<dyn RoleService>) -> Self {
        Self {
            role_service,
            user_group_service: None,
        }
    }

    pub fn with_user_group_service(mut self, service: Arc<dyn UserGroupService>) -> Self {
        self.user_group_service = Some(service);
        self
    }

    pub fn calculate_roles(&self, username: &str) -> RoleResult<BTreeSet<Role>> {
        let mut roles: BTreeSet<Role> = self.role_service.roles_for_user(username);

        if let Some(ugs) = &self.user_group_service {
            for group in ugs.groups_for_user(username) {
                if group.is_enabled() {
                    roles.extend(self.role_service.roles_for_group(group.name()));
                } else {
                    log::debug!("Skipping roles of disabled group {}", group.name());
                }
            }
        }

        let helper = RoleHierarchyHelper::new(self.role_service.parent_mappings());
        let mut inherited = Vec::new();
        for role in &roles {
            if !helper.contains_role(role.name()) {
                continue;
            }
            for ancestor in helper.ancestors(role.name())? {
                match self.role_service.role(&ancestor) {
                    Some(parent) => inherited.push(parent),
                    None => inherited.push(Role::new(&ancestor)),
                }
            }
        }
        roles.extend(inherited);

        let holds = |local: Option<String>, roles: &BTreeSet<Role>| {
            local.is_some_and(|name| roles.iter().any(|r| r.name() == name))
        };
        if holds(self.role_service.admin_role(), &roles) {
            roles.insert(Role::new(ROLE_ADMINISTRATOR));
        }
        if holds(self.role_service.group_admin_role(), &roles) {
            roles.insert(Role::new(ROLE_GROUP_ADMIN));
        }

        if let Some(user) = self
            .user_group_service
            .as_ref()
            .and_then(|ugs| ugs.user(username))
        {
            roles = roles
                .into_iter()
                .map(|role| role.personalize(&user).unwrap_or(role))
                .collect();
        }

        roles.insert(Role::new(ROLE_AUTHENTICATED));
        Ok(roles)
    }

    /// Role names of [`Self::calculate_roles`]
    pub fn calculate_authorities(&self, username: &str) -> RoleResult<BTreeSet<String>> {
        Ok(self
            .calculate_roles(username)?
            .into_iter()
            .map(|r| r.name().to_string())
            .collect())
    }

    /// Authentication carrying the user's full role closure
    pub fn authentication(&self, username: &str) -> RoleResult<Authentication> {
        Ok(Authentication::user(username, self.calculate_authorities(username)?))
    }
}
