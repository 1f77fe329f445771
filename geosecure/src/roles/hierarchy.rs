// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Queries over the role parent graph
//!
//! The graph is given as a flat map from role name to optional parent name.
//! It should be a forest; every query checks the part of the graph it walks
//! and reports a cycle instead of looping.

use super::error::{RoleError, RoleResult};
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Default)]
pub struct RoleHierarchyHelper {
    parents: HashMap<String, Option<String>>,
}

impl RoleHierarchyHelper {
    pub fn new(parents: HashMap<String, Option<String>>) -> Self {
        Self { parents }
    }

    pub fn contains_role(&self, role: &str) -> bool {
        self.parents.contains_key(role)
    }

    pub fn parent(&self, role: &str) -> RoleResult<Option<String>> {
        self.ancestors(role)?;
        Ok(self.raw_parent(role).map(String::from))
    }

    pub fn is_root(&self, role: &str) -> RoleResult<bool> {
        Ok(self.parent(role)?.is_none())
    }

    /// Ancestors of `role`, nearest first
    pub fn ancestors(&self, role: &str) -> RoleResult<Vec<String>> {
        self.require(role)?;
        let mut path = vec![role.to_string()];
        let mut ancestors = Vec::new();
        let mut current = self.raw_parent(role);
        while let Some(parent) = current {
            if path.iter().any(|p| p == parent) {
                path.push(parent.to_string());
                return Err(RoleError::Cycle { path });
            }
            path.push(parent.to_string());
            ancestors.push(parent.to_string());
            current = self.raw_parent(parent);
        }
        Ok(ancestors)
    }

    /// Direct children of `role`, sorted by name
    pub fn children(&self, role: &str) -> RoleResult<Vec<String>> {
        self.ancestors(role)?;
        Ok(self.raw_children(role))
    }

    /// All roles below `role`, breadth first
    pub fn descendants(&self, role: &str) -> RoleResult<Vec<String>> {
        self.ancestors(role)?;
        let mut seen: HashSet<String> = HashSet::new();
        let mut result = Vec::new();
        let mut queue: VecDeque<String> = self.raw_children(role).into();
        while let Some(child) = queue.pop_front() {
            if child == role || !seen.insert(child.clone()) {
                return Err(RoleError::Cycle {
                    path: vec![role.to_string(), child],
                });
            }
            queue.extend(self.raw_children(&child));
            result.push(child);
        }
        Ok(result)
    }

    /// Roles without a parent, sorted by name
    pub fn root_roles(&self) -> RoleResult<Vec<String>> {
        self.validate_all()?;
        let mut roots: Vec<String> = self
            .parents
            .iter()
            .filter(|(_, parent)| parent.is_none())
            .map(|(role, _)| role.clone())
            .collect();
        roots.sort();
        Ok(roots)
    }

    /// Roles without children, sorted by name
    pub fn leaf_roles(&self) -> RoleResult<Vec<String>> {
        self.validate_all()?;
        let with_children: HashSet<&str> = self.parents.values().flatten().map(String::as_str).collect();
        let mut leaves: Vec<String> = self
            .parents
            .keys()
            .filter(|role| !with_children.contains(role.as_str()))
            .cloned()
            .collect();
        leaves.sort();
        Ok(leaves)
    }

    /// Whether `parent` may become the parent of `role` without creating a
    /// cycle
    pub fn is_valid_parent(&self, role: &str, parent: Option<&str>) -> RoleResult<bool> {
        let Some(parent) = parent else {
            return Ok(true);
        };
        self.require(role)?;
        self.require(parent)?;
        if parent == role {
            return Ok(false);
        }
        Ok(!self.descendants(role)?.iter().any(|d| d == parent))
    }

    fn require(&self, role: &str) -> RoleResult<()> {
        if self.contains_role(role) {
            Ok(())
        } else {
            Err(RoleError::UnknownRole(role.to_string()))
        }
    }

    fn validate_all(&self) -> RoleResult<()> {
        for role in self.parents.keys() {
            self.ancestors(role)?;
        }
        Ok(())
    }

    fn raw_parent(&self, role: &str) -> Option<&str> {
        self.parents.get(role).and_then(|p| p.as_deref())
    }

    fn raw_children(&self, role: &str) -> Vec<String> {
        let mut children: Vec<String> = self
            .parents
            .iter()
            .filter(|(_, parent)| parent.as_deref() == Some(role))
            .map(|(child, _)| child.clone())
            .collect();
        children.sort();
        children
    }
}
