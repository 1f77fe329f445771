// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Wiring of the rule stores, access managers and secure catalog
//!
//! Everything is constructed from explicit references: the catalog is
//! handed in, the rule stores are read from the configured data directory
//! and the rename listener is registered on the catalog here.

use crate::access::{DefaultResourceAccessManager, ResourceAccessManager, RestAccessManager, ServiceAccessManager};
use crate::catalog::Catalog;
use crate::config::SecurityConfig;
use crate::rules::{
    DataAccessRule, DataAccessRuleDao, RestAccessRule, RestAccessRuleDao, RuleApi,
    RuleRenameListener, RuleResult, ServiceAccessRule, ServiceAccessRuleDao,
};
use crate::secure::SecureCatalog;
use std::sync::Arc;

pub struct GeoSecurity {
    config: SecurityConfig,
    data_rules: Arc<DataAccessRuleDao>,
    service_rules: Arc<ServiceAccessRuleDao>,
    rest_rules: Arc<RestAccessRuleDao>,
    manager: Arc<DefaultResourceAccessManager>,
    secure_catalog: SecureCatalog,
    services: ServiceAccessManager,
    rest: RestAccessManager,
}

impl GeoSecurity {
    /// Load the rule files from `config.data_dir` and secure `catalog`
    pub fn from_config(config: SecurityConfig, catalog: Arc<dyn Catalog>) -> RuleResult<Self> {
        let interval = config.rules_check_interval();
        let data_rules = Arc::new(DataAccessRuleDao::from_file(config.layers_path())?.with_check_interval(interval));
        let service_rules =
            Arc::new(ServiceAccessRuleDao::from_file(config.services_path())?.with_check_interval(interval));
        let rest_rules = Arc::new(RestAccessRuleDao::from_file(config.rest_path())?.with_check_interval(interval));
        log::info!(
            "Loaded {} data, {} service and {} REST rules from {}",
            data_rules.snapshot().len(),
            service_rules.snapshot().len(),
            rest_rules.snapshot().len(),
            config.data_dir.display()
        );
        Ok(Self::assemble(config, catalog, data_rules, service_rules, rest_rules))
    }

    /// Secure `catalog` with the given rule stores
    pub fn with_rules(
        config: SecurityConfig,
        catalog: Arc<dyn Catalog>,
        data_rules: DataAccessRuleDao,
        service_rules: ServiceAccessRuleDao,
        rest_rules: RestAccessRuleDao,
    ) -> Self {
        Self::assemble(
            config,
            catalog,
            Arc::new(data_rules),
            Arc::new(service_rules),
            Arc::new(rest_rules),
        )
    }

    fn assemble(
        config: SecurityConfig,
        catalog: Arc<dyn Catalog>,
        data_rules: Arc<DataAccessRuleDao>,
        service_rules: Arc<ServiceAccessRuleDao>,
        rest_rules: Arc<RestAccessRuleDao>,
    ) -> Self {
        catalog.add_listener(Arc::new(RuleRenameListener::new(data_rules.clone())));
        let manager = Arc::new(DefaultResourceAccessManager::new(
            data_rules.clone(),
            catalog.clone(),
            config.clone(),
        ));
        let secure_catalog = SecureCatalog::new(catalog, manager.clone() as Arc<dyn ResourceAccessManager>);
        let services = ServiceAccessManager::new(service_rules.clone(), &config.admin_role);
        let rest = RestAccessManager::new(rest_rules.clone(), &config.admin_role);
        Self {
            config,
            data_rules,
            service_rules,
            rest_rules,
            manager,
            secure_catalog,
            services,
            rest,
        }
    }

    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    pub fn data_rules(&self) -> &Arc<DataAccessRuleDao> {
        &self.data_rules
    }

    pub fn service_rules(&self) -> &Arc<ServiceAccessRuleDao> {
        &self.service_rules
    }

    pub fn rest_rules(&self) -> &Arc<RestAccessRuleDao> {
        &self.rest_rules
    }

    pub fn access_manager(&self) -> &Arc<DefaultResourceAccessManager> {
        &self.manager
    }

    pub fn catalog(&self) -> &SecureCatalog {
        &self.secure_catalog
    }

    pub fn services(&self) -> &ServiceAccessManager {
        &self.services
    }

    pub fn rest(&self) -> &RestAccessManager {
        &self.rest
    }

    pub fn data_rules_api(&self) -> RuleApi<DataAccessRule> {
        RuleApi::new(self.data_rules.clone())
    }

    pub fn service_rules_api(&self) -> RuleApi<ServiceAccessRule> {
        RuleApi::new(self.service_rules.clone())
    }

    pub fn rest_rules_api(&self) -> RuleApi<RestAccessRule> {
        RuleApi::new(self.rest_rules.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Authentication, RequestContext, SecurityContext};
    use crate::catalog::{MemoryCatalog, ResourceKind, StoreKind};
    use crate::rules::{AccessRule, HttpMethod};

    #[test]
    fn test_from_empty_data_dir_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.add_workspace("topp").unwrap();
        catalog.add_store("topp", "s", StoreKind::DataStore).unwrap();
        catalog.add_layer("topp", "s", "states", ResourceKind::FeatureType).unwrap();

        let security = GeoSecurity::from_config(SecurityConfig::with_data_dir(dir.path()), catalog).unwrap();
        let anon = SecurityContext::new(Authentication::anonymous(), RequestContext::ows("WFS", "GetFeature"));
        let layer = security.catalog().layer_by_name(&anon, "topp", "states").unwrap();
        assert!(layer.data().is_ok());
        assert!(layer.writable().is_ok());
        assert!(security.services().check_request(&anon));
        assert!(!security.rest().check(&anon, "/rest/layers", HttpMethod::Delete));
    }

    #[test]
    fn test_rule_files_checked_at_configured_interval() {
        let dir = tempfile::tempdir().unwrap();
        let config = SecurityConfig {
            rules_check_interval_ms: 0,
            ..SecurityConfig::with_data_dir(dir.path())
        };
        let security = GeoSecurity::from_config(config, Arc::new(MemoryCatalog::new())).unwrap();
        assert_eq!(security.data_rules().rules().len(), 2);

        std::fs::write(dir.path().join("layers.properties"), "*.*.r=MILITARY\n").unwrap();
        let rules = security.data_rules().rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].value(), "MILITARY");
    }

    #[test]
    fn test_renames_reach_rules() {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.add_workspace("topp").unwrap();
        let security = GeoSecurity::with_rules(
            SecurityConfig::default(),
            catalog.clone(),
            DataAccessRuleDao::from_properties(&crate::rules::PropertyList::parse("topp.*.r=READER\n")),
            ServiceAccessRuleDao::with_defaults(),
            RestAccessRuleDao::with_defaults(),
        );
        catalog.rename_workspace("topp", "usa").unwrap();
        assert!(security.data_rules().rule("usa.*.r").is_some());
        assert!(security.data_rules().rule("topp.*.r").is_none());
    }
}
