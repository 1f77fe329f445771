// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! OWS service and REST endpoint access checks

use crate::auth::SecurityContext;
use crate::rules::{HttpMethod, RestAccessRuleDao, ServiceAccessRuleDao};
use std::sync::Arc;

/// Gate on OWS service/method pairs
#[derive(Debug, Clone)]
pub struct ServiceAccessManager {
    dao: Arc<ServiceAccessRuleDao>,
    admin_role: String,
}

impl ServiceAccessManager {
    pub fn new(dao: Arc<ServiceAccessRuleDao>, admin_role: &str) -> Self {
        Self {
            dao,
            admin_role: admin_role.to_string(),
        }
    }

    pub fn dao(&self) -> &Arc<ServiceAccessRuleDao> {
        &self.dao
    }

    pub fn check(&self, ctx: &SecurityContext, service: &str, method: &str) -> bool {
        if ctx.auth.has_authority(&self.admin_role) {
            return true;
        }
        let allowed = self.dao.can_access(&ctx.auth, service, method);
        if !allowed {
            log::debug!("Denied {}.{} to {}", service, method, ctx.auth);
        }
        allowed
    }

    /// Check the service/method of the request in `ctx`; requests outside
    /// any OWS service pass
    pub fn check_request(&self, ctx: &SecurityContext) -> bool {
        match (ctx.request.service(), ctx.request.request()) {
            (Some(service), Some(method)) => self.check(ctx, service, method),
            _ => true,
        }
    }
}

/// Gate on REST paths and HTTP methods
#[derive(Debug, Clone)]
pub struct RestAccessManager {
    dao: Arc<RestAccessRuleDao>,
    admin_role: String,
}

impl RestAccessManager {
    pub fn new(dao: Arc<RestAccessRuleDao>, admin_role: &str) -> Self {
        Self {
            dao,
            admin_role: admin_role.to_string(),
        }
    }

    pub fn dao(&self) -> &Arc<RestAccessRuleDao> {
        &self.dao
    }

    pub fn check(&self, ctx: &SecurityContext, path: &str, method: HttpMethod) -> bool {
        if ctx.auth.has_authority(&self.admin_role) {
            return true;
        }
        self.dao.can_access(&ctx.auth, path, method, &self.admin_role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Authentication, RequestContext, ROLE_ADMINISTRATOR};
    use crate::rules::{AccessRule, ServiceAccessRule};

    #[test]
    fn test_service_check_with_admin_bypass() {
        let dao = Arc::new(ServiceAccessRuleDao::new(vec![
            ServiceAccessRule::parse("wfs.Transaction", "WRITER").unwrap(),
        ]));
        let manager = ServiceAccessManager::new(dao, ROLE_ADMINISTRATOR);
        let anon = SecurityContext::new(
            Authentication::anonymous(),
            RequestContext::ows("wfs", "Transaction"),
        );
        assert!(!manager.check_request(&anon));
        assert!(manager.check(&anon, "wfs", "GetFeature"));

        let admin = SecurityContext::from(Authentication::user("admin", [ROLE_ADMINISTRATOR]));
        assert!(manager.check(&admin, "wfs", "Transaction"));
        assert!(manager.check_request(&SecurityContext::anonymous()));
    }

    #[test]
    fn test_rest_defaults() {
        let manager = RestAccessManager::new(Arc::new(RestAccessRuleDao::with_defaults()), ROLE_ADMINISTRATOR);
        let anon = SecurityContext::anonymous();
        assert!(manager.check(&anon, "/rest/workspaces", HttpMethod::Get));
        assert!(!manager.check(&anon, "/rest/workspaces", HttpMethod::Post));
        let admin = SecurityContext::from(Authentication::user("admin", [ROLE_ADMINISTRATOR]));
        assert!(manager.check(&admin, "/rest/workspaces", HttpMethod::Post));
    }
}
