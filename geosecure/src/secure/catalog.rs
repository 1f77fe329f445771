// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog decorator enforcing access decisions
//!
//! Every lookup resolves the object through the delegate, asks the access
//! manager and either hides the object or returns it wrapped with its policy.
//! Layer groups are re-secured recursively: members the user cannot see are
//! dropped together with their paired style, nested groups are secured as
//! members rather than as directly addressed objects.

use super::policy::WrapperPolicy;
use super::wrapper::{Secured, SecuredInfo, SecuredLayerGroup, SecuredPublished};
use crate::access::ResourceAccessManager;
use crate::auth::SecurityContext;
use crate::catalog::{
    Catalog, CatalogInfo, CloseableIterator, Filter, InfoType, LayerGroupInfo, LayerInfo,
    PublishedRef, Query, ResourceInfo, StoreInfo, StyleInfo, WorkspaceInfo,
};
use crate::config::LayerGroupVisibility;
use crate::rules::{AccessMode, CatalogMode};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Clone)]
pub struct SecureCatalog {
    delegate: Arc<dyn Catalog>,
    manager: Arc<dyn ResourceAccessManager>,
}

impl SecureCatalog {
    pub fn new(delegate: Arc<dyn Catalog>, manager: Arc<dyn ResourceAccessManager>) -> Self {
        Self { delegate, manager }
    }

    pub fn delegate(&self) -> &Arc<dyn Catalog> {
        &self.delegate
    }

    pub fn manager(&self) -> &Arc<dyn ResourceAccessManager> {
        &self.manager
    }

    fn policy<F>(&self, ctx: &SecurityContext, check: F) -> WrapperPolicy
    where
        F: Fn(AccessMode) -> bool,
    {
        let mode = self.manager.catalog_mode();
        if self.manager.is_admin(&ctx.auth) {
            return WrapperPolicy::admin(mode);
        }
        let readable = check(AccessMode::Read);
        let writable = check(AccessMode::Write);
        let adminable = readable && writable && check(AccessMode::Admin);
        WrapperPolicy::build(readable, writable, adminable, mode, &ctx.request)
    }

    fn wrap<T>(&self, ctx: &SecurityContext, info: T, name: String, policy: WrapperPolicy) -> Option<Secured<T>> {
        if policy.is_hidden() {
            log::debug!("Hiding {} from {}", name, ctx.auth);
            return None;
        }
        Some(Secured::new(info, policy, name, ctx.auth.is_anonymous()))
    }

    /// Whether listings can leave hidden objects to a delegate-side filter
    fn hides_denied(&self, ctx: &SecurityContext) -> bool {
        match self.manager.catalog_mode() {
            CatalogMode::Hide => true,
            CatalogMode::Challenge => false,
            CatalogMode::Mixed => ctx.request.is_get_capabilities(),
        }
    }

    // Workspaces

    pub fn secure_workspace(&self, ctx: &SecurityContext, ws: WorkspaceInfo) -> Option<Secured<WorkspaceInfo>> {
        let policy = self.policy(ctx, |mode| self.manager.can_access_workspace(ctx, &ws, mode));
        let name = ws.name.clone();
        self.wrap(ctx, ws, name, policy)
    }

    pub fn workspace_by_name(&self, ctx: &SecurityContext, name: &str) -> Option<Secured<WorkspaceInfo>> {
        let ws = self.delegate.workspace_by_name(name)?;
        self.secure_workspace(ctx, ws)
    }

    pub fn workspaces(&self, ctx: &SecurityContext) -> Vec<Secured<WorkspaceInfo>> {
        self.delegate
            .workspaces()
            .into_iter()
            .filter_map(|ws| self.secure_workspace(ctx, ws))
            .collect()
    }

    // Stores

    pub fn secure_store(&self, ctx: &SecurityContext, store: StoreInfo) -> Option<Secured<StoreInfo>> {
        let policy = self.policy(ctx, |mode| self.manager.can_access_store(ctx, &store, mode));
        let name = format!("{}:{}", store.workspace, store.name);
        self.wrap(ctx, store, name, policy)
    }

    pub fn store_by_name(&self, ctx: &SecurityContext, workspace: &str, name: &str) -> Option<Secured<StoreInfo>> {
        let store = self.delegate.store_by_name(workspace, name)?;
        self.secure_store(ctx, store)
    }

    pub fn stores(&self, ctx: &SecurityContext) -> Vec<Secured<StoreInfo>> {
        self.delegate
            .stores()
            .into_iter()
            .filter_map(|store| self.secure_store(ctx, store))
            .collect()
    }

    // Resources

    pub fn secure_resource(&self, ctx: &SecurityContext, resource: ResourceInfo) -> Option<Secured<ResourceInfo>> {
        let policy = self.policy(ctx, |mode| self.manager.can_access_resource(ctx, &resource, mode));
        let name = resource.prefixed_name();
        self.wrap(ctx, resource, name, policy)
    }

    pub fn resource_by_name(&self, ctx: &SecurityContext, workspace: &str, name: &str) -> Option<Secured<ResourceInfo>> {
        let resource = self.delegate.resource_by_name(workspace, name)?;
        self.secure_resource(ctx, resource)
    }

    pub fn resource(&self, ctx: &SecurityContext, id: &str) -> Option<Secured<ResourceInfo>> {
        let resource = self.delegate.resource(id)?;
        self.secure_resource(ctx, resource)
    }

    pub fn resources(&self, ctx: &SecurityContext) -> Vec<Secured<ResourceInfo>> {
        self.delegate
            .resources()
            .into_iter()
            .filter_map(|resource| self.secure_resource(ctx, resource))
            .collect()
    }

    // Layers

    pub fn secure_layer(&self, ctx: &SecurityContext, layer: LayerInfo) -> Option<Secured<LayerInfo>> {
        let policy = self.policy(ctx, |mode| self.manager.can_access_layer(ctx, &layer, mode));
        let name = layer.prefixed_name();
        self.wrap(ctx, layer, name, policy)
    }

    fn secure_member_layer(&self, ctx: &SecurityContext, layer: LayerInfo) -> Option<Secured<LayerInfo>> {
        let member = CatalogInfo::Layer(layer.clone());
        let policy = self.policy(ctx, |mode| self.manager.can_access_member(ctx, &member, mode));
        let name = layer.prefixed_name();
        self.wrap(ctx, layer, name, policy)
    }

    pub fn layer_by_name(&self, ctx: &SecurityContext, workspace: &str, name: &str) -> Option<Secured<LayerInfo>> {
        let layer = self.delegate.layer_by_name(workspace, name)?;
        self.secure_layer(ctx, layer)
    }

    pub fn layer(&self, ctx: &SecurityContext, id: &str) -> Option<Secured<LayerInfo>> {
        let layer = self.delegate.layer(id)?;
        self.secure_layer(ctx, layer)
    }

    pub fn layers(&self, ctx: &SecurityContext) -> Vec<Secured<LayerInfo>> {
        self.delegate
            .layers()
            .into_iter()
            .filter_map(|layer| self.secure_layer(ctx, layer))
            .collect()
    }

    // Layer groups

    pub fn secure_layer_group(&self, ctx: &SecurityContext, group: LayerGroupInfo) -> Option<SecuredLayerGroup> {
        let mut visiting = HashSet::new();
        let secured = self.secure_group(ctx, group, true, &mut visiting)?;
        if self.hides_empty(ctx) && secured.is_empty() {
            log::debug!("Hiding empty layer group {}", secured.name());
            return None;
        }
        Some(secured)
    }

    fn hides_empty(&self, ctx: &SecurityContext) -> bool {
        self.manager.layer_group_visibility() == LayerGroupVisibility::HideEmpty
            && !self.manager.is_admin(&ctx.auth)
    }

    fn secure_group(
        &self,
        ctx: &SecurityContext,
        group: LayerGroupInfo,
        direct: bool,
        visiting: &mut HashSet<String>,
    ) -> Option<SecuredLayerGroup> {
        let id = group.id.clone();
        if !visiting.insert(id.clone()) {
            log::warn!("Layer group {} contains itself, skipping", group.prefixed_name());
            return None;
        }
        let secured = self.filter_group(ctx, group, direct, visiting);
        visiting.remove(&id);
        secured
    }

    fn filter_group(
        &self,
        ctx: &SecurityContext,
        group: LayerGroupInfo,
        direct: bool,
        visiting: &mut HashSet<String>,
    ) -> Option<SecuredLayerGroup> {
        let policy = if direct {
            self.policy(ctx, |mode| self.manager.can_access_layer_group(ctx, &group, mode))
        } else {
            let member = CatalogInfo::LayerGroup(group.clone());
            self.policy(ctx, |mode| self.manager.can_access_member(ctx, &member, mode))
        };
        if policy.is_hidden() {
            log::debug!("Hiding layer group {} from {}", group.prefixed_name(), ctx.auth);
            return None;
        }

        let mut filtered = group.clone();
        filtered.layers.clear();
        filtered.styles.clear();
        let mut members = Vec::new();

        for (index, member) in group.layers.iter().enumerate() {
            let secured = match member {
                PublishedRef::Layer(layer_id) => self
                    .delegate
                    .layer(layer_id)
                    .and_then(|layer| self.secure_member_layer(ctx, layer))
                    .map(SecuredPublished::Layer),
                PublishedRef::Group(group_id) => self
                    .delegate
                    .layer_group(group_id)
                    .and_then(|child| self.secure_group(ctx, child, false, visiting))
                    .filter(|child| !(self.hides_empty(ctx) && child.is_empty()))
                    .map(|child| SecuredPublished::Group(Box::new(child))),
            };
            if let Some(secured) = secured {
                filtered.layers.push(member.clone());
                filtered.styles.push(group.styles.get(index).cloned().flatten());
                members.push(secured);
            }
        }

        let root_layer = group
            .root_layer
            .as_deref()
            .and_then(|layer_id| self.delegate.layer(layer_id))
            .and_then(|layer| self.secure_member_layer(ctx, layer));
        if root_layer.is_none() {
            filtered.root_layer = None;
            filtered.root_layer_style = None;
        }

        let name = filtered.prefixed_name();
        Some(SecuredLayerGroup {
            group: Secured::new(filtered, policy, name, ctx.auth.is_anonymous()),
            members,
            root_layer,
        })
    }

    pub fn layer_group_by_name(
        &self,
        ctx: &SecurityContext,
        workspace: Option<&str>,
        name: &str,
    ) -> Option<SecuredLayerGroup> {
        let group = self.delegate.layer_group_by_name(workspace, name)?;
        self.secure_layer_group(ctx, group)
    }

    pub fn layer_group(&self, ctx: &SecurityContext, id: &str) -> Option<SecuredLayerGroup> {
        let group = self.delegate.layer_group(id)?;
        self.secure_layer_group(ctx, group)
    }

    pub fn layer_groups(&self, ctx: &SecurityContext) -> Vec<SecuredLayerGroup> {
        self.delegate
            .layer_groups()
            .into_iter()
            .filter_map(|group| self.secure_layer_group(ctx, group))
            .collect()
    }

    // Styles

    pub fn secure_style(&self, ctx: &SecurityContext, style: StyleInfo) -> Option<Secured<StyleInfo>> {
        let workspace = style
            .workspace
            .as_deref()
            .and_then(|ws| self.delegate.workspace_by_name(ws));
        let policy = self.policy(ctx, |mode| match mode {
            AccessMode::Read => self.manager.can_access_style(ctx, &style),
            _ => workspace
                .as_ref()
                .map(|ws| self.manager.can_access_workspace(ctx, ws, mode))
                .unwrap_or(false),
        });
        let name = match &style.workspace {
            Some(ws) => format!("{}:{}", ws, style.name),
            None => style.name.clone(),
        };
        self.wrap(ctx, style, name, policy)
    }

    pub fn style_by_name(&self, ctx: &SecurityContext, workspace: Option<&str>, name: &str) -> Option<Secured<StyleInfo>> {
        let style = self.delegate.style_by_name(workspace, name)?;
        self.secure_style(ctx, style)
    }

    pub fn styles(&self, ctx: &SecurityContext) -> Vec<Secured<StyleInfo>> {
        self.delegate
            .styles()
            .into_iter()
            .filter_map(|style| self.secure_style(ctx, style))
            .collect()
    }

    // Generic access

    /// Secure any catalog object
    pub fn secure(&self, ctx: &SecurityContext, info: CatalogInfo) -> Option<SecuredInfo> {
        match info {
            CatalogInfo::Workspace(ws) => self.secure_workspace(ctx, ws).map(SecuredInfo::Workspace),
            CatalogInfo::Store(store) => self.secure_store(ctx, store).map(SecuredInfo::Store),
            CatalogInfo::Resource(r) => self.secure_resource(ctx, r).map(SecuredInfo::Resource),
            CatalogInfo::Layer(layer) => self.secure_layer(ctx, layer).map(SecuredInfo::Layer),
            CatalogInfo::LayerGroup(g) => self.secure_layer_group(ctx, g).map(SecuredInfo::LayerGroup),
            CatalogInfo::Style(style) => self.secure_style(ctx, style).map(SecuredInfo::Style),
        }
    }

    /// Listing with security applied
    ///
    /// When denied objects are hidden the security filter is pushed down into
    /// the delegate query, so paging counts only visible objects. Layer groups
    /// hidden for being empty are paged after securing instead. The returned
    /// iterator owns the delegate iterator: closing or dropping it closes the
    /// delegate.
    pub fn list(&self, ctx: &SecurityContext, query: &Query) -> CloseableIterator<SecuredInfo> {
        let mut delegate_query = query.clone();
        if self.hides_denied(ctx) && !self.manager.is_admin(&ctx.auth) {
            let security = self.manager.security_filter(ctx, query.info_type);
            if security == Filter::Exclude {
                return CloseableIterator::empty();
            }
            delegate_query.filter = Filter::and(vec![query.filter.clone(), security]);
        }
        // emptied groups only disappear once secured, so their pages are cut here
        let page_after_securing =
            query.info_type == InfoType::LayerGroup && query.is_paged() && self.hides_empty(ctx);
        if page_after_securing {
            delegate_query.offset = None;
            delegate_query.count = None;
        }
        let source = self.delegate.list(&delegate_query);
        let secure = self.clone();
        let ctx = ctx.clone();
        let secured = source.filter_map_items(move |info| secure.secure(&ctx, info));
        if page_after_securing {
            secured.paged(query.offset, query.count)
        } else {
            secured
        }
    }

    /// Number of objects a listing with `filter` would return
    pub fn count(&self, ctx: &SecurityContext, info_type: InfoType, filter: &Filter) -> usize {
        if self.manager.is_admin(&ctx.auth) {
            return self.delegate.count(info_type, filter);
        }
        if self.hides_denied(ctx) && info_type != InfoType::LayerGroup {
            let security = self.manager.security_filter(ctx, info_type);
            return self
                .delegate
                .count(info_type, &Filter::and(vec![filter.clone(), security]));
        }
        self.list(ctx, &Query::all(info_type).with_filter(filter.clone()))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::DefaultResourceAccessManager;
    use crate::auth::Authentication;
    use crate::catalog::{LayerGroupMode, MemoryCatalog, ResourceKind, StoreKind};
    use crate::config::SecurityConfig;
    use crate::rules::{AccessRule, DataAccessRule, DataAccessRuleDao};

    fn secure_catalog(rules: &[(&str, &str)], mode: CatalogMode) -> (Arc<MemoryCatalog>, SecureCatalog) {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.add_workspace("topp").unwrap();
        catalog.add_store("topp", "s", StoreKind::DataStore).unwrap();
        let states = catalog.add_layer("topp", "s", "states", ResourceKind::FeatureType).unwrap();
        let roads = catalog.add_layer("topp", "s", "roads", ResourceKind::FeatureType).unwrap();
        catalog
            .add_layer_group(
                LayerGroupInfo::new("base", Some("topp"), LayerGroupMode::Named)
                    .with_styled_layer(&states, "population")
                    .with_styled_layer(&roads, "simple_roads"),
            )
            .unwrap();
        let rules = rules
            .iter()
            .map(|(k, v)| DataAccessRule::parse(k, v).unwrap())
            .collect();
        let dao = Arc::new(DataAccessRuleDao::new(rules));
        dao.set_catalog_mode(mode);
        let manager = Arc::new(DefaultResourceAccessManager::new(
            dao,
            catalog.clone(),
            SecurityConfig::default(),
        ));
        (catalog.clone(), SecureCatalog::new(catalog, manager))
    }

    #[test]
    fn test_hide_mode_returns_none() {
        let (_, secure) = secure_catalog(&[("*.*.r", "*"), ("topp.states.r", "MILITARY")], CatalogMode::Hide);
        let ctx = SecurityContext::anonymous();
        assert!(secure.layer_by_name(&ctx, "topp", "states").is_none());
        assert!(secure.layer_by_name(&ctx, "topp", "roads").is_some());
    }

    #[test]
    fn test_group_members_filtered_with_styles() {
        let (_, secure) = secure_catalog(&[("*.*.r", "*"), ("topp.states.r", "MILITARY")], CatalogMode::Hide);
        let ctx = SecurityContext::anonymous();
        let group = secure.layer_group_by_name(&ctx, Some("topp"), "base").unwrap();
        assert_eq!(group.members().len(), 1);
        assert_eq!(group.members()[0].name(), "roads");
        assert_eq!(group.group().layers.len(), 1);
        assert_eq!(group.group().styles, vec![Some("simple_roads".to_string())]);
    }

    #[test]
    fn test_admin_sees_everything() {
        let (_, secure) = secure_catalog(&[("*.*.r", "NOBODY"), ("*.*.w", "NOBODY")], CatalogMode::Hide);
        let ctx = SecurityContext::from(Authentication::user("admin", ["ROLE_ADMINISTRATOR"]));
        let group = secure.layer_group_by_name(&ctx, Some("topp"), "base").unwrap();
        assert_eq!(group.members().len(), 2);
        assert!(secure.layer_by_name(&ctx, "topp", "states").unwrap().writable().is_ok());
    }

    #[test]
    fn test_list_closes_delegate() {
        let (_, secure) = secure_catalog(&[("*.*.r", "*")], CatalogMode::Challenge);
        let ctx = SecurityContext::anonymous();
        let mut iter = secure.list(&ctx, &Query::all(InfoType::Layer));
        assert!(iter.next().is_some());
        iter.close();
        assert!(iter.is_closed());
        assert!(iter.next().is_none());
    }
}
