// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Data access rules: `workspace.layer.mode=role1,role2`
//!
//! The root segment is a workspace name (or `*`), the layer segment a
//! resource or layer group name (or `*`). A rule with only two segments,
//! `group.mode`, targets a global (workspace-less) layer group.

use super::access_mode::AccessMode;
use super::dao::AccessRule;
use super::error::{RuleError, RuleResult};
use super::properties::{escape_name, join_roles, parse_roles, split_escaped};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Wildcard matching any workspace or layer
pub const ANY: &str = "*";

/// Reserved key holding the catalog mode in the data rule file
pub const MODE_KEY: &str = "mode";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataAccessRule {
    root: String,
    layer: Option<String>,
    mode: AccessMode,
    roles: BTreeSet<String>,
}

impl DataAccessRule {
    pub fn new<I, S>(root: &str, layer: &str, mode: AccessMode, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            root: root.to_string(),
            layer: Some(layer.to_string()),
            mode,
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Rule for a global layer group, `group.mode=roles`
    pub fn global_group<I, S>(group: &str, mode: AccessMode, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            root: group.to_string(),
            layer: None,
            mode,
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// `*.*.r=*`
    pub fn read_all() -> Self {
        Self::new(ANY, ANY, AccessMode::Read, [ANY])
    }

    /// `*.*.w=*`
    pub fn write_all() -> Self {
        Self::new(ANY, ANY, AccessMode::Write, [ANY])
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn layer(&self) -> Option<&str> {
        self.layer.as_deref()
    }

    pub fn access_mode(&self) -> AccessMode {
        self.mode
    }

    pub fn is_global_group_rule(&self) -> bool {
        self.layer.is_none()
    }

    /// Same rule with a different root
    pub fn with_root(&self, root: &str) -> Self {
        Self {
            root: root.to_string(),
            ..self.clone()
        }
    }

    /// Same rule with a different layer
    pub fn with_layer(&self, layer: &str) -> Self {
        Self {
            layer: Some(layer.to_string()),
            ..self.clone()
        }
    }

    fn sort_key(&self) -> (&str, Option<&str>, AccessMode) {
        (&self.root, self.layer.as_deref(), self.mode)
    }
}

impl AccessRule for DataAccessRule {
    const KIND: &'static str = "data";
    const RESERVED_KEYS: &'static [&'static str] = &[MODE_KEY];

    fn key(&self) -> String {
        match &self.layer {
            Some(layer) => format!(
                "{}.{}.{}",
                escape_name(&self.root),
                escape_name(layer),
                self.mode.alias()
            ),
            None => format!("{}.{}", escape_name(&self.root), self.mode.alias()),
        }
    }

    fn value(&self) -> String {
        join_roles(&self.roles)
    }

    fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    fn parse(key: &str, value: &str) -> RuleResult<Self> {
        let elements = split_escaped(key.trim(), '.');
        if elements.len() < 2 || elements.len() > 3 {
            return Err(RuleError::invalid_key(
                key,
                "expected workspace.layer.mode or globalGroup.mode",
            ));
        }
        if elements.iter().any(|e| e.trim().is_empty()) {
            return Err(RuleError::invalid_key(key, "empty segment"));
        }

        let root = elements[0].trim();
        let layer = if elements.len() == 3 {
            Some(elements[1].trim())
        } else {
            None
        };
        let alias = elements[elements.len() - 1].trim();
        let mode = AccessMode::from_alias(alias).ok_or_else(|| RuleError::InvalidMode {
            key: key.to_string(),
            mode: alias.to_string(),
        })?;

        if root == ANY {
            match layer {
                None => {
                    return Err(RuleError::invalid_key(
                        key,
                        "a global layer group rule needs a group name",
                    ))
                }
                Some(l) if l != ANY => {
                    return Err(RuleError::invalid_key(
                        key,
                        "when the workspace is * the layer must be * too",
                    ))
                }
                _ => {}
            }
        }

        Ok(Self {
            root: root.to_string(),
            layer: layer.map(String::from),
            mode,
            roles: parse_roles(value),
        })
    }

    fn default_rules() -> Vec<Self> {
        vec![Self::read_all(), Self::write_all()]
    }
}

impl PartialEq for DataAccessRule {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for DataAccessRule {}

impl Hash for DataAccessRule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sort_key().hash(state);
    }
}

impl PartialOrd for DataAccessRule {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DataAccessRule {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for DataAccessRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key(), self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_layer_rule() {
        let rule = DataAccessRule::parse("topp.states.w", "WRITER, ADMIN").unwrap();
        assert_eq!(rule.root(), "topp");
        assert_eq!(rule.layer(), Some("states"));
        assert_eq!(rule.access_mode(), AccessMode::Write);
        assert_eq!(rule.value(), "ADMIN,WRITER");
        assert!(!rule.is_global_group_rule());
    }

    #[test]
    fn test_parse_global_group_rule() {
        let rule = DataAccessRule::parse("basemap.r", "MILITARY").unwrap();
        assert!(rule.is_global_group_rule());
        assert_eq!(rule.key(), "basemap.r");
    }

    #[test]
    fn test_parse_escaped_names() {
        let rule = DataAccessRule::parse("my\\.ws.my\\.layer.r", "*").unwrap();
        assert_eq!(rule.root(), "my.ws");
        assert_eq!(rule.layer(), Some("my.layer"));
        assert_eq!(rule.key(), "my\\.ws.my\\.layer.r");
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        assert!(matches!(
            DataAccessRule::parse("a.b.c.r", "*"),
            Err(RuleError::InvalidKey { .. })
        ));
        assert!(matches!(
            DataAccessRule::parse("r", "*"),
            Err(RuleError::InvalidKey { .. })
        ));
        assert!(matches!(
            DataAccessRule::parse("topp.states.x", "*"),
            Err(RuleError::InvalidMode { .. })
        ));
        assert!(matches!(
            DataAccessRule::parse("*.states.r", "*"),
            Err(RuleError::InvalidKey { .. })
        ));
        assert!(matches!(
            DataAccessRule::parse("*.r", "*"),
            Err(RuleError::InvalidKey { .. })
        ));
        assert!(matches!(
            DataAccessRule::parse("topp..r", "*"),
            Err(RuleError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_equality_ignores_roles() {
        let a = DataAccessRule::new("topp", "states", AccessMode::Read, ["A"]);
        let b = DataAccessRule::new("topp", "states", AccessMode::Read, ["B"]);
        let c = DataAccessRule::new("topp", "states", AccessMode::Write, ["A"]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a < c);
    }

    #[test]
    fn test_ordering_puts_wildcards_first() {
        let mut rules = vec![
            DataAccessRule::new("topp", "states", AccessMode::Read, ["A"]),
            DataAccessRule::read_all(),
            DataAccessRule::new("nurc", ANY, AccessMode::Read, ["B"]),
        ];
        rules.sort();
        let keys: Vec<String> = rules.iter().map(|r| r.key()).collect();
        assert_eq!(keys, vec!["*.*.r", "nurc.*.r", "topp.states.r"]);
    }
}
