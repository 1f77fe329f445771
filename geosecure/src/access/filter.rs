// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Translation of the rule tree into catalog filters
//!
//! The filter for a type accepts exactly the objects the manager would let
//! the user read. Tree decisions become workspace and name predicates; the
//! few objects the tree allows but containment or EO root layers deny are
//! excluded by id.

use super::manager::AccessState;
use crate::auth::SecurityContext;
use crate::catalog::{Catalog, Filter, InfoType, PublishedRef};
use crate::rules::AccessMode;

pub struct SecurityFilterBuilder<'a> {
    state: &'a AccessState,
    catalog: &'a dyn Catalog,
    ctx: &'a SecurityContext,
}

impl<'a> SecurityFilterBuilder<'a> {
    pub fn new(state: &'a AccessState, catalog: &'a dyn Catalog, ctx: &'a SecurityContext) -> Self {
        Self { state, catalog, ctx }
    }

    pub fn build(&self, info_type: InfoType) -> Filter {
        match info_type {
            InfoType::Workspace => {
                let mode = if self.ctx.request.is_admin_request() {
                    AccessMode::Admin
                } else {
                    AccessMode::Read
                };
                self.workspace_expr("name", mode)
            }
            InfoType::Store => self.workspace_expr("workspace.name", AccessMode::Read),
            InfoType::Style => Filter::or(vec![
                Filter::is_null("workspace.name"),
                self.workspace_expr("workspace.name", AccessMode::Read),
            ]),
            InfoType::Layer => Filter::and(vec![
                self.scoped_expr("resource.store.workspace.name", "resource.name"),
                Filter::not(Filter::in_list("id", self.unreachable_layers())),
            ]),
            InfoType::Resource => Filter::and(vec![
                self.scoped_expr("store.workspace.name", "name"),
                Filter::not(Filter::in_list("id", self.unreachable_resources())),
            ]),
            InfoType::LayerGroup => Filter::and(vec![
                Filter::or(vec![
                    Filter::and(vec![
                        Filter::is_null("workspace.name"),
                        self.workspace_expr("name", AccessMode::Read),
                    ]),
                    Filter::and(vec![
                        Filter::not_null("workspace.name"),
                        self.scoped_expr("workspace.name", "name"),
                    ]),
                ]),
                Filter::not(Filter::in_list("id", self.denied_groups())),
            ]),
        }
    }

    fn root_decision(&self, mode: AccessMode) -> bool {
        self.state
            .tree
            .root()
            .explicit_decision(&self.ctx.auth, mode)
            .unwrap_or(true)
    }

    /// Decision at the first tree level, keyed on `property`
    fn workspace_expr(&self, property: &str, mode: AccessMode) -> Filter {
        let default = self.root_decision(mode);
        let exceptions: Vec<&str> = self
            .state
            .tree
            .root()
            .children()
            .filter(|(_, node)| {
                node.explicit_decision(&self.ctx.auth, mode)
                    .map(|d| d != default)
                    .unwrap_or(false)
            })
            .map(|(name, _)| name)
            .collect();
        if default {
            Filter::not(Filter::in_list(property, exceptions))
        } else {
            Filter::in_list(property, exceptions)
        }
    }

    /// Decision at the second tree level: workspace default, minus denied
    /// names, plus allowed names
    fn scoped_expr(&self, ws_property: &str, name_property: &str) -> Filter {
        let mode = AccessMode::Read;
        let default = self.root_decision(mode);
        let mut allowed = Vec::new();
        let mut denied = Vec::new();
        for (ws, ws_node) in self.state.tree.root().children() {
            let inherited = ws_node
                .explicit_decision(&self.ctx.auth, mode)
                .unwrap_or(default);
            for (name, node) in ws_node.children() {
                match node.explicit_decision(&self.ctx.auth, mode) {
                    Some(decision) if decision != inherited => {
                        let pair = Filter::and(vec![
                            Filter::equals(ws_property, ws),
                            Filter::equals(name_property, name),
                        ]);
                        if decision {
                            allowed.push(pair);
                        } else {
                            denied.push(pair);
                        }
                    }
                    _ => {}
                }
            }
        }
        Filter::or(vec![
            Filter::and(vec![
                self.workspace_expr(ws_property, mode),
                Filter::not(Filter::or(denied)),
            ]),
            Filter::or(allowed),
        ])
    }

    fn applies_containment(&self) -> bool {
        self.ctx.request.applies_group_containment()
    }

    fn unreachable_layers(&self) -> Vec<String> {
        if !self.applies_containment() {
            return Vec::new();
        }
        let auth = &self.ctx.auth;
        self.catalog
            .layers()
            .into_iter()
            .filter(|layer| {
                self.state.layer_allowed(auth, layer.workspace(), layer.name(), AccessMode::Read)
                    && !self
                        .state
                        .is_reachable(auth, &PublishedRef::Layer(layer.id.clone()))
            })
            .map(|layer| layer.id)
            .collect()
    }

    fn unreachable_resources(&self) -> Vec<String> {
        if !self.applies_containment() {
            return Vec::new();
        }
        let auth = &self.ctx.auth;
        self.catalog
            .resources()
            .into_iter()
            .filter(|resource| {
                let layers = self.state.containment.layers_for_resource(&resource.id);
                self.state
                    .layer_allowed(auth, &resource.workspace, &resource.name, AccessMode::Read)
                    && !layers.is_empty()
                    && !layers
                        .iter()
                        .any(|id| self.state.is_reachable(auth, &PublishedRef::Layer(id.clone())))
            })
            .map(|resource| resource.id)
            .collect()
    }

    /// Groups the tree allows that EO root layers or containment deny
    fn denied_groups(&self) -> Vec<String> {
        let auth = &self.ctx.auth;
        let containment = self.applies_containment();
        self.catalog
            .layer_groups()
            .into_iter()
            .filter(|group| {
                let path: Vec<&str> = match &group.workspace {
                    Some(ws) => vec![ws.as_str(), group.name.as_str()],
                    None => vec![group.name.as_str()],
                };
                if !self.state.tree.decide(auth, &path, AccessMode::Read) {
                    return false;
                }
                let allowed = self
                    .state
                    .group_allowed(auth, group, self.catalog, AccessMode::Read)
                    && (!containment
                        || self
                            .state
                            .is_reachable(auth, &PublishedRef::Group(group.id.clone())));
                !allowed
            })
            .map(|group| group.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::manager::{DefaultResourceAccessManager, ResourceAccessManager};
    use crate::auth::{Authentication, RequestContext, SecurityContext};
    use crate::catalog::{Catalog, Filter, InfoType, MemoryCatalog, ResourceKind, StoreKind};
    use crate::config::SecurityConfig;
    use crate::rules::{AccessMode, AccessRule, DataAccessRule, DataAccessRuleDao};
    use std::sync::Arc;

    fn manager(rules: &[(&str, &str)]) -> (Arc<MemoryCatalog>, DefaultResourceAccessManager) {
        let catalog = Arc::new(MemoryCatalog::new());
        for ws in ["topp", "nurc"] {
            catalog.add_workspace(ws).unwrap();
            catalog.add_store(ws, "s", StoreKind::DataStore).unwrap();
        }
        catalog.add_layer("topp", "s", "states", ResourceKind::FeatureType).unwrap();
        catalog.add_layer("topp", "s", "roads", ResourceKind::FeatureType).unwrap();
        catalog.add_layer("nurc", "s", "arcgrid", ResourceKind::Coverage).unwrap();
        let rules = rules
            .iter()
            .map(|(k, v)| DataAccessRule::parse(k, v).unwrap())
            .collect();
        let dao = Arc::new(DataAccessRuleDao::new(rules));
        let manager = DefaultResourceAccessManager::new(dao, catalog.clone(), SecurityConfig::default());
        (catalog, manager)
    }

    #[test]
    fn test_wide_open_filter_is_include() {
        let (_, manager) = manager(&[("*.*.r", "*"), ("*.*.w", "*")]);
        let ctx = SecurityContext::anonymous();
        assert_eq!(manager.security_filter(&ctx, InfoType::Layer), Filter::Include);
        assert_eq!(manager.security_filter(&ctx, InfoType::Workspace), Filter::Include);
    }

    #[test]
    fn test_admin_filter_is_include() {
        let (_, manager) = manager(&[("*.*.r", "NOBODY")]);
        let ctx = SecurityContext::from(Authentication::user("admin", ["ROLE_ADMINISTRATOR"]));
        assert_eq!(manager.security_filter(&ctx, InfoType::Layer), Filter::Include);
    }

    #[test]
    fn test_layer_filter_matches_decisions() {
        let (catalog, manager) = manager(&[
            ("*.*.r", "*"),
            ("topp.*.r", "READER"),
            ("topp.states.r", "*"),
            ("nurc.arcgrid.r", "MILITARY"),
        ]);
        for auth in [
            Authentication::anonymous(),
            Authentication::user("r", ["READER"]),
            Authentication::user("m", ["MILITARY"]),
        ] {
            let ctx = SecurityContext::new(auth, RequestContext::ows("WFS", "GetFeature"));
            let filter = manager.security_filter(&ctx, InfoType::Layer);
            for info in catalog.all_of(InfoType::Layer) {
                assert_eq!(
                    filter.evaluate(&info),
                    manager.can_access(&ctx, &info, AccessMode::Read),
                    "{} on {}",
                    ctx.auth,
                    info.name()
                );
            }
        }
    }
}
