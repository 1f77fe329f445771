// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Rule tree mirroring the workspace/layer hierarchy
//!
//! The root holds `*.*` rules, its children workspaces (and global layer
//! groups), their children layers and workspace groups. A node without a
//! rule for a mode inherits the nearest ancestor's roles; the root without a
//! rule grants everything.

use crate::auth::{Authentication, ANY_ROLE};
use crate::rules::{AccessMode, AccessRule, DataAccessRule, ANY};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecureTreeNode {
    authorized_roles: BTreeMap<AccessMode, BTreeSet<String>>,
    children: BTreeMap<String, SecureTreeNode>,
}

impl SecureTreeNode {
    pub fn child(&self, name: &str) -> Option<&SecureTreeNode> {
        self.children.get(name)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &SecureTreeNode)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Roles set by a rule on this very node
    pub fn authorized_roles(&self, mode: AccessMode) -> Option<&BTreeSet<String>> {
        self.authorized_roles.get(&mode)
    }

    /// Decision of this node's own rule, `None` when it has none for `mode`
    pub fn explicit_decision(&self, auth: &Authentication, mode: AccessMode) -> Option<bool> {
        self.authorized_roles(mode)
            .map(|roles| roles.contains(ANY_ROLE) || auth.has_any_authority(roles))
    }

    fn child_or_insert(&mut self, name: &str) -> &mut SecureTreeNode {
        self.children.entry(name.to_string()).or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecureTree {
    root: SecureTreeNode,
    admin_role: String,
}

impl SecureTree {
    /// Build the tree; when two rules land on the same node and mode the
    /// later one wins
    pub fn build(rules: &[DataAccessRule], admin_role: &str) -> Self {
        let mut root = SecureTreeNode::default();
        for rule in rules {
            let mut node = &mut root;
            if rule.root() != ANY {
                node = node.child_or_insert(rule.root());
                if let Some(layer) = rule.layer() {
                    if layer != ANY {
                        node = node.child_or_insert(layer);
                    }
                }
            }
            let previous = node
                .authorized_roles
                .insert(rule.access_mode(), rule.roles().clone());
            if previous.is_some() {
                log::warn!(
                    "Rule {} overrides an earlier rule for the same {} node",
                    rule,
                    rule.access_mode()
                );
            }
        }
        if !root.authorized_roles.contains_key(&AccessMode::Admin) {
            root.authorized_roles
                .insert(AccessMode::Admin, BTreeSet::from([admin_role.to_string()]));
        }
        Self {
            root,
            admin_role: admin_role.to_string(),
        }
    }

    pub fn root(&self) -> &SecureTreeNode {
        &self.root
    }

    pub fn admin_role(&self) -> &str {
        &self.admin_role
    }

    pub fn is_admin(&self, auth: &Authentication) -> bool {
        auth.has_authority(&self.admin_role)
    }

    /// Nodes from the root down to the deepest existing node along `path`
    pub fn node_chain(&self, path: &[&str]) -> Vec<&SecureTreeNode> {
        let mut chain = vec![&self.root];
        let mut node = &self.root;
        for segment in path {
            match node.child(segment) {
                Some(child) => {
                    chain.push(child);
                    node = child;
                }
                None => break,
            }
        }
        chain
    }

    /// Decision for `path` ignoring the administrator bypass
    pub fn decide(&self, auth: &Authentication, path: &[&str], mode: AccessMode) -> bool {
        self.node_chain(path)
            .iter()
            .rev()
            .find_map(|node| node.explicit_decision(auth, mode))
            .unwrap_or(true)
    }

    pub fn can_access(&self, auth: &Authentication, path: &[&str], mode: AccessMode) -> bool {
        self.is_admin(auth) || self.decide(auth, path, mode)
    }
}
