// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Data rule store: catalog mode, catalog validation and rename support

use super::access_mode::CatalogMode;
use super::dao::AccessRuleDao;
use super::data_rule::{DataAccessRule, ANY, MODE_KEY};
use crate::catalog::Catalog;

pub type DataAccessRuleDao = AccessRuleDao<DataAccessRule>;

impl AccessRuleDao<DataAccessRule> {
    /// Catalog mode stored in the rule file, `None` when the file has no
    /// usable `mode` line
    pub fn catalog_mode(&self) -> Option<CatalogMode> {
        let value = self.setting(MODE_KEY)?;
        match value.parse::<CatalogMode>() {
            Ok(mode) => Some(mode),
            Err(e) => {
                log::warn!("Ignoring catalog mode '{}': {}", value, e);
                None
            }
        }
    }

    pub fn catalog_mode_or(&self, fallback: CatalogMode) -> CatalogMode {
        self.catalog_mode().unwrap_or(fallback)
    }

    pub fn set_catalog_mode(&self, mode: CatalogMode) {
        self.set_setting(MODE_KEY, &mode.to_string());
    }

    /// Report rules naming workspaces, layers or groups the catalog does not
    /// know
    ///
    /// The rules stay in place: the referenced object may be created later.
    pub fn validate_against(&self, catalog: &dyn Catalog) -> Vec<String> {
        let mut warnings = Vec::new();
        for rule in self.snapshot().rules() {
            let root = rule.root();
            match rule.layer() {
                None => {
                    if catalog.layer_group_by_name(None, root).is_none() {
                        warnings.push(format!(
                            "Rule {} refers to unknown global layer group '{}'",
                            rule, root
                        ));
                    }
                }
                Some(layer) => {
                    if root == ANY {
                        continue;
                    }
                    if catalog.workspace_by_name(root).is_none() {
                        warnings.push(format!("Rule {} refers to unknown workspace '{}'", rule, root));
                        continue;
                    }
                    if layer != ANY
                        && catalog.resource_by_name(root, layer).is_none()
                        && catalog.layer_group_by_name(Some(root), layer).is_none()
                    {
                        warnings.push(format!(
                            "Rule {} refers to unknown layer or group '{}:{}'",
                            rule, root, layer
                        ));
                    }
                }
            }
        }
        for warning in &warnings {
            log::warn!("{}", warning);
        }
        warnings
    }

    /// Point workspace scoped rules at a renamed workspace
    pub fn rename_workspace(&self, old: &str, new: &str) -> usize {
        self.rewrite_rules(|rule| {
            (rule.root() == old && !rule.is_global_group_rule()).then(|| rule.with_root(new))
        })
    }

    /// Point rules at a renamed resource or workspace layer group
    pub fn rename_layer(&self, workspace: &str, old: &str, new: &str) -> usize {
        self.rewrite_rules(|rule| {
            (rule.root() == workspace && rule.layer() == Some(old)).then(|| rule.with_layer(new))
        })
    }

    /// Point rules at a renamed global layer group
    pub fn rename_global_group(&self, old: &str, new: &str) -> usize {
        self.rewrite_rules(|rule| {
            (rule.root() == old && rule.is_global_group_rule()).then(|| rule.with_root(new))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{AccessMode, AccessRule};

    fn dao() -> DataAccessRuleDao {
        DataAccessRuleDao::new(vec![
            DataAccessRule::new("topp", "states", AccessMode::Read, ["READER"]),
            DataAccessRule::new("topp", ANY, AccessMode::Write, ["WRITER"]),
            DataAccessRule::new("nurc", "states", AccessMode::Read, ["OTHER"]),
            DataAccessRule::global_group("topp", AccessMode::Read, ["GROUP"]),
        ])
    }

    #[test]
    fn test_defaults() {
        let dao = DataAccessRuleDao::with_defaults();
        let keys: Vec<String> = dao.rules().iter().map(|r| r.key()).collect();
        assert_eq!(keys, vec!["*.*.r", "*.*.w"]);
        assert_eq!(dao.catalog_mode(), None);
    }

    #[test]
    fn test_catalog_mode_round_trip() {
        let dao = DataAccessRuleDao::with_defaults();
        dao.set_catalog_mode(CatalogMode::Mixed);
        assert_eq!(dao.catalog_mode(), Some(CatalogMode::Mixed));
        assert_eq!(dao.to_properties().get("mode"), Some("MIXED"));
    }

    #[test]
    fn test_rename_workspace_leaves_global_groups() {
        let dao = dao();
        assert_eq!(dao.rename_workspace("topp", "topp2"), 2);
        let keys: Vec<String> = dao.rules().iter().map(|r| r.key()).collect();
        assert!(keys.contains(&"topp2.states.r".to_string()));
        assert!(keys.contains(&"topp2.*.w".to_string()));
        assert!(keys.contains(&"topp.r".to_string()));
        assert!(keys.contains(&"nurc.states.r".to_string()));
    }

    #[test]
    fn test_rename_layer_is_workspace_scoped() {
        let dao = dao();
        assert_eq!(dao.rename_layer("topp", "states", "usa"), 1);
        assert!(dao.rule("topp.usa.r").is_some());
        assert!(dao.rule("nurc.states.r").is_some());
        assert!(dao.rule("topp.states.r").is_none());
    }

    #[test]
    fn test_rename_global_group() {
        let dao = dao();
        assert_eq!(dao.rename_global_group("topp", "base"), 1);
        assert!(dao.rule("base.r").is_some());
        assert!(dao.rule("topp.states.r").is_some());
    }
}
