// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Resource access manager
//!
//! Answers whether an authentication may read, write or administer a
//! catalog object. Decisions come from an immutable [`AccessState`] (rule
//! tree plus layer group containment index). The state is rebuilt off to the
//! side whenever the data rules or the catalog change and then swapped in, so
//! concurrent callers see either the old or the new state, never a mix.
//!
//! Layer group containment only gates READ access of objects addressed
//! directly while serving WMS (or no OWS service at all):
//!
//! - an object inside no structural group is reachable,
//! - otherwise it is reachable through any one of its groups:
//!   opaque containers never lead anywhere, containers lead on when the
//!   group is readable and itself reachable, named and EO groups lead on
//!   when they are reachable.

use super::containment::{GroupSummary, LayerGroupContainmentCache};
use super::filter::SecurityFilterBuilder;
use super::limits::{DataAccessLimits, WorkspaceAccessLimits};
use super::tree::SecureTree;
use crate::auth::{Authentication, SecurityContext};
use crate::catalog::{
    Catalog, CatalogEvent, CatalogInfo, CatalogListener, Filter, InfoType, LayerGroupInfo,
    LayerGroupMode, LayerInfo, PublishedRef, ResourceInfo, StoreInfo, StyleInfo, WorkspaceInfo,
};
use crate::config::{LayerGroupVisibility, SecurityConfig};
use crate::rules::{AccessMode, CatalogMode, DataAccessRuleDao};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Access decisions over catalog objects
pub trait ResourceAccessManager: Send + Sync {
    fn is_admin(&self, auth: &Authentication) -> bool;

    fn catalog_mode(&self) -> CatalogMode;

    fn layer_group_visibility(&self) -> LayerGroupVisibility;

    fn can_access_workspace(&self, ctx: &SecurityContext, workspace: &WorkspaceInfo, mode: AccessMode) -> bool;

    fn can_access_store(&self, ctx: &SecurityContext, store: &StoreInfo, mode: AccessMode) -> bool;

    fn can_access_resource(&self, ctx: &SecurityContext, resource: &ResourceInfo, mode: AccessMode) -> bool;

    fn can_access_layer(&self, ctx: &SecurityContext, layer: &LayerInfo, mode: AccessMode) -> bool;

    fn can_access_layer_group(&self, ctx: &SecurityContext, group: &LayerGroupInfo, mode: AccessMode) -> bool;

    fn can_access_style(&self, ctx: &SecurityContext, style: &StyleInfo) -> bool;

    /// Access to a layer or group reached through a parent group, skipping
    /// containment checks
    fn can_access_member(&self, ctx: &SecurityContext, member: &CatalogInfo, mode: AccessMode) -> bool;

    fn workspace_limits(&self, ctx: &SecurityContext, workspace: &WorkspaceInfo) -> Option<WorkspaceAccessLimits>;

    fn data_limits(&self, ctx: &SecurityContext, info: &CatalogInfo) -> Option<DataAccessLimits>;

    /// Predicate selecting exactly the objects of `info_type` readable in
    /// `ctx`
    fn security_filter(&self, ctx: &SecurityContext, info_type: InfoType) -> Filter;

    /// Dispatch on the object type
    fn can_access(&self, ctx: &SecurityContext, info: &CatalogInfo, mode: AccessMode) -> bool {
        match info {
            CatalogInfo::Workspace(ws) => self.can_access_workspace(ctx, ws, mode),
            CatalogInfo::Store(store) => self.can_access_store(ctx, store, mode),
            CatalogInfo::Resource(resource) => self.can_access_resource(ctx, resource, mode),
            CatalogInfo::Layer(layer) => self.can_access_layer(ctx, layer, mode),
            CatalogInfo::LayerGroup(group) => self.can_access_layer_group(ctx, group, mode),
            CatalogInfo::Style(style) => mode == AccessMode::Read && self.can_access_style(ctx, style),
        }
    }
}

/// Everything a decision needs, frozen at one rule revision and catalog
/// generation
#[derive(Debug)]
pub struct AccessState {
    pub tree: SecureTree,
    pub containment: LayerGroupContainmentCache,
    rules_revision: u64,
    catalog_generation: u64,
}

impl AccessState {
    fn is_older_than(&self, rules_revision: u64, catalog_generation: u64) -> bool {
        self.rules_revision < rules_revision || self.catalog_generation < catalog_generation
    }

    /// Whether `member` can be addressed on its own
    pub fn is_reachable(&self, auth: &Authentication, member: &PublishedRef) -> bool {
        let mut visiting = HashSet::new();
        self.reachable(auth, member, &mut visiting)
    }

    fn reachable(&self, auth: &Authentication, member: &PublishedRef, visiting: &mut HashSet<String>) -> bool {
        let containers = self.containment.structural_containers(member);
        if containers.is_empty() {
            return true;
        }
        containers
            .into_iter()
            .any(|group| self.leads_to(auth, group, visiting))
    }

    fn leads_to(&self, auth: &Authentication, group: &GroupSummary, visiting: &mut HashSet<String>) -> bool {
        if !visiting.insert(group.id.clone()) {
            return false;
        }
        let through = PublishedRef::Group(group.id.clone());
        match group.mode {
            LayerGroupMode::OpaqueContainer => false,
            LayerGroupMode::Container => {
                self.tree.can_access(auth, &group.tree_path(), AccessMode::Read)
                    && self.reachable(auth, &through, visiting)
            }
            LayerGroupMode::Named | LayerGroupMode::Eo | LayerGroupMode::Single => {
                self.reachable(auth, &through, visiting)
            }
        }
    }

    /// Tree decision for a layer or resource path
    pub fn layer_allowed(&self, auth: &Authentication, workspace: &str, name: &str, mode: AccessMode) -> bool {
        self.tree.can_access(auth, &[workspace, name], mode)
    }

    /// Tree decision for a group, plus the EO root layer requirement
    pub fn group_allowed(&self, auth: &Authentication, group: &LayerGroupInfo, catalog: &dyn Catalog, mode: AccessMode) -> bool {
        let path: Vec<&str> = match &group.workspace {
            Some(ws) => vec![ws.as_str(), group.name.as_str()],
            None => vec![group.name.as_str()],
        };
        if !self.tree.can_access(auth, &path, mode) {
            return false;
        }
        if group.mode == LayerGroupMode::Eo && mode == AccessMode::Read {
            if let Some(root) = group.root_layer.as_deref().and_then(|id| catalog.layer(id)) {
                return self.layer_allowed(auth, root.workspace(), root.name(), AccessMode::Read);
            }
        }
        true
    }
}

/// Bumps the catalog generation on structural changes and validates the
/// data rules when the catalog reloads
struct CatalogWatcher {
    generation: Arc<AtomicU64>,
    dao: Arc<DataAccessRuleDao>,
    catalog: Weak<dyn Catalog>,
}

impl CatalogListener for CatalogWatcher {
    fn on_event(&self, event: &CatalogEvent) {
        if !event.is_structural() {
            return;
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let CatalogEvent::Reloaded = event {
            if let Some(catalog) = self.catalog.upgrade() {
                let warnings = self.dao.validate_against(catalog.as_ref());
                log::info!("Catalog reloaded, {} data rule warning(s)", warnings.len());
            }
        }
    }
}

pub struct DefaultResourceAccessManager {
    dao: Arc<DataAccessRuleDao>,
    catalog: Arc<dyn Catalog>,
    config: SecurityConfig,
    state: RwLock<Arc<AccessState>>,
    catalog_generation: Arc<AtomicU64>,
    rebuilds: AtomicU64,
}

impl DefaultResourceAccessManager {
    /// Create a manager and subscribe it to catalog changes
    pub fn new(dao: Arc<DataAccessRuleDao>, catalog: Arc<dyn Catalog>, config: SecurityConfig) -> Self {
        let catalog_generation = Arc::new(AtomicU64::new(0));
        catalog.add_listener(Arc::new(CatalogWatcher {
            generation: catalog_generation.clone(),
            dao: dao.clone(),
            catalog: Arc::downgrade(&catalog),
        }));

        let snapshot = dao.snapshot();
        let state = AccessState {
            tree: SecureTree::build(snapshot.rules(), &config.admin_role),
            containment: LayerGroupContainmentCache::build(catalog.as_ref()),
            rules_revision: snapshot.revision(),
            catalog_generation: 0,
        };
        Self {
            dao,
            catalog,
            config,
            state: RwLock::new(Arc::new(state)),
            catalog_generation,
            rebuilds: AtomicU64::new(1),
        }
    }

    pub fn dao(&self) -> &Arc<DataAccessRuleDao> {
        &self.dao
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    /// How many times the access state has been built
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds.load(Ordering::SeqCst)
    }

    /// Current access state, rebuilt first when rules or catalog moved on
    pub fn state(&self) -> Arc<AccessState> {
        let snapshot = self.dao.snapshot();
        let generation = self.catalog_generation.load(Ordering::SeqCst);
        {
            let current = self.state.read();
            if !current.is_older_than(snapshot.revision(), generation) {
                return current.clone();
            }
        }

        let rebuilt = Arc::new(AccessState {
            tree: SecureTree::build(snapshot.rules(), &self.config.admin_role),
            containment: LayerGroupContainmentCache::build(self.catalog.as_ref()),
            rules_revision: snapshot.revision(),
            catalog_generation: generation,
        });

        let mut current = self.state.write();
        if current.is_older_than(snapshot.revision(), generation) {
            log::debug!(
                "Rebuilt access state at rule revision {} and catalog generation {}",
                snapshot.revision(),
                generation
            );
            *current = rebuilt.clone();
            self.rebuilds.fetch_add(1, Ordering::SeqCst);
            rebuilt
        } else {
            current.clone()
        }
    }

    fn applies_containment(ctx: &SecurityContext, mode: AccessMode) -> bool {
        mode == AccessMode::Read && ctx.request.applies_group_containment()
    }

    fn workspace_mode(ctx: &SecurityContext, mode: AccessMode) -> AccessMode {
        if mode == AccessMode::Read && ctx.request.is_admin_request() {
            AccessMode::Admin
        } else {
            mode
        }
    }

    fn data_limits_for(&self, readable: bool, writable: bool) -> Option<DataAccessLimits> {
        if readable && writable {
            return None;
        }
        Some(DataAccessLimits {
            mode: self.catalog_mode(),
            readable,
            writable,
        })
    }
}

impl ResourceAccessManager for DefaultResourceAccessManager {
    fn is_admin(&self, auth: &Authentication) -> bool {
        auth.has_authority(&self.config.admin_role)
    }

    fn catalog_mode(&self) -> CatalogMode {
        self.dao.catalog_mode_or(self.config.default_catalog_mode)
    }

    fn layer_group_visibility(&self) -> LayerGroupVisibility {
        self.config.layer_group_visibility
    }

    fn can_access_workspace(&self, ctx: &SecurityContext, workspace: &WorkspaceInfo, mode: AccessMode) -> bool {
        let mode = Self::workspace_mode(ctx, mode);
        self.state().tree.can_access(&ctx.auth, &[workspace.name.as_str()], mode)
    }

    fn can_access_store(&self, ctx: &SecurityContext, store: &StoreInfo, mode: AccessMode) -> bool {
        self.state().tree.can_access(&ctx.auth, &[store.workspace.as_str()], mode)
    }

    fn can_access_resource(&self, ctx: &SecurityContext, resource: &ResourceInfo, mode: AccessMode) -> bool {
        let state = self.state();
        if !state.layer_allowed(&ctx.auth, &resource.workspace, &resource.name, mode) {
            return false;
        }
        if self.is_admin(&ctx.auth) || !Self::applies_containment(ctx, mode) {
            return true;
        }
        let layers = state.containment.layers_for_resource(&resource.id);
        layers.is_empty()
            || layers
                .iter()
                .any(|id| state.is_reachable(&ctx.auth, &PublishedRef::Layer(id.clone())))
    }

    fn can_access_layer(&self, ctx: &SecurityContext, layer: &LayerInfo, mode: AccessMode) -> bool {
        let state = self.state();
        if !state.layer_allowed(&ctx.auth, layer.workspace(), layer.name(), mode) {
            return false;
        }
        if self.is_admin(&ctx.auth) || !Self::applies_containment(ctx, mode) {
            return true;
        }
        state.is_reachable(&ctx.auth, &PublishedRef::Layer(layer.id.clone()))
    }

    fn can_access_layer_group(&self, ctx: &SecurityContext, group: &LayerGroupInfo, mode: AccessMode) -> bool {
        let state = self.state();
        if !state.group_allowed(&ctx.auth, group, self.catalog.as_ref(), mode) {
            return false;
        }
        if self.is_admin(&ctx.auth) || !Self::applies_containment(ctx, mode) {
            return true;
        }
        state.is_reachable(&ctx.auth, &PublishedRef::Group(group.id.clone()))
    }

    fn can_access_style(&self, ctx: &SecurityContext, style: &StyleInfo) -> bool {
        match &style.workspace {
            None => true,
            Some(ws) => self.state().tree.can_access(&ctx.auth, &[ws.as_str()], AccessMode::Read),
        }
    }

    fn can_access_member(&self, ctx: &SecurityContext, member: &CatalogInfo, mode: AccessMode) -> bool {
        let state = self.state();
        match member {
            CatalogInfo::Layer(layer) => state.layer_allowed(&ctx.auth, layer.workspace(), layer.name(), mode),
            CatalogInfo::LayerGroup(group) => state.group_allowed(&ctx.auth, group, self.catalog.as_ref(), mode),
            other => self.can_access(ctx, other, mode),
        }
    }

    fn workspace_limits(&self, ctx: &SecurityContext, workspace: &WorkspaceInfo) -> Option<WorkspaceAccessLimits> {
        let state = self.state();
        let tree = &state.tree;
        let path = [workspace.name.as_str()];
        let readable = tree.can_access(&ctx.auth, &path, AccessMode::Read);
        let writable = tree.can_access(&ctx.auth, &path, AccessMode::Write);
        let adminable = tree.can_access(&ctx.auth, &path, AccessMode::Admin);
        if readable && writable && !(ctx.request.is_admin_request() && !adminable) {
            return None;
        }
        Some(WorkspaceAccessLimits {
            mode: self.catalog_mode(),
            readable,
            writable,
            adminable,
        })
    }

    fn data_limits(&self, ctx: &SecurityContext, info: &CatalogInfo) -> Option<DataAccessLimits> {
        let readable = self.can_access(ctx, info, AccessMode::Read);
        let writable = self.can_access(ctx, info, AccessMode::Write);
        self.data_limits_for(readable, writable)
    }

    fn security_filter(&self, ctx: &SecurityContext, info_type: InfoType) -> Filter {
        if self.is_admin(&ctx.auth) {
            return Filter::Include;
        }
        let state = self.state();
        let builder = SecurityFilterBuilder::new(&state, self.catalog.as_ref(), ctx);
        let filter = builder.build(info_type);
        log::debug!("Security filter for {} on {}: {}", ctx.auth, info_type, filter);
        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::RequestContext;
    use crate::catalog::{MemoryCatalog, ResourceKind, StoreKind};
    use crate::rules::{AccessRule, DataAccessRule};

    fn setup(rules: &[(&str, &str)]) -> (Arc<MemoryCatalog>, DefaultResourceAccessManager) {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.add_workspace("topp").unwrap();
        catalog.add_store("topp", "s", StoreKind::DataStore).unwrap();
        catalog.add_layer("topp", "s", "states", ResourceKind::FeatureType).unwrap();
        let rules = rules
            .iter()
            .map(|(k, v)| DataAccessRule::parse(k, v).unwrap())
            .collect();
        let dao = Arc::new(DataAccessRuleDao::new(rules));
        let manager = DefaultResourceAccessManager::new(dao, catalog.clone(), SecurityConfig::default());
        (catalog, manager)
    }

    #[test]
    fn test_state_rebuilt_only_when_stale() {
        let (catalog, manager) = setup(&[("*.*.r", "*")]);
        let ctx = SecurityContext::anonymous();
        let layer = catalog.layer_by_name("topp", "states").unwrap();
        assert!(manager.can_access_layer(&ctx, &layer, AccessMode::Read));
        assert!(manager.can_access_layer(&ctx, &layer, AccessMode::Read));
        assert_eq!(manager.rebuild_count(), 1);

        manager
            .dao()
            .update_rules(vec![DataAccessRule::parse("*.*.r", "READER").unwrap()])
            .unwrap();
        assert!(!manager.can_access_layer(&ctx, &layer, AccessMode::Read));
        assert_eq!(manager.rebuild_count(), 2);

        catalog.add_workspace("nurc").unwrap();
        manager.state();
        assert_eq!(manager.rebuild_count(), 3);
    }

    #[test]
    fn test_admin_request_needs_admin_on_workspace() {
        let (catalog, manager) = setup(&[("*.*.r", "*"), ("topp.*.a", "WS_ADMIN")]);
        let ws = catalog.workspace_by_name("topp").unwrap();
        let user = Authentication::user("bob", ["READER"]);
        let ows = SecurityContext::new(user.clone(), RequestContext::none());
        let admin_request = SecurityContext::new(user, RequestContext::admin());
        assert!(manager.can_access_workspace(&ows, &ws, AccessMode::Read));
        assert!(!manager.can_access_workspace(&admin_request, &ws, AccessMode::Read));

        let ws_admin = SecurityContext::new(Authentication::user("w", ["WS_ADMIN"]), RequestContext::admin());
        assert!(manager.can_access_workspace(&ws_admin, &ws, AccessMode::Read));
    }

    #[test]
    fn test_workspace_limits() {
        let (catalog, manager) = setup(&[("*.*.r", "*"), ("*.*.w", "*")]);
        let ws = catalog.workspace_by_name("topp").unwrap();
        let ctx = SecurityContext::anonymous();
        assert_eq!(manager.workspace_limits(&ctx, &ws), None);

        let admin_request = ctx.with_request(RequestContext::admin());
        let limits = manager.workspace_limits(&admin_request, &ws).unwrap();
        assert!(limits.readable && limits.writable && !limits.adminable);
    }

    #[test]
    fn test_data_limits_carry_catalog_mode() {
        let (catalog, manager) = setup(&[("*.*.r", "*"), ("*.*.w", "WRITER")]);
        manager.dao().set_catalog_mode(CatalogMode::Challenge);
        let layer = CatalogInfo::Layer(catalog.layer_by_name("topp", "states").unwrap());
        let limits = manager.data_limits(&SecurityContext::anonymous(), &layer).unwrap();
        assert_eq!(
            limits,
            DataAccessLimits {
                mode: CatalogMode::Challenge,
                readable: true,
                writable: false
            }
        );
    }
}
