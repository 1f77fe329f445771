// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Index of which layer groups contain which layers and groups
//!
//! Built from a catalog in one pass and rebuilt with the rule tree whenever
//! the catalog changes.

use crate::catalog::{Catalog, LayerGroupInfo, LayerGroupMode, PublishedRef};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
    pub id: String,
    pub name: String,
    pub workspace: Option<String>,
    pub mode: LayerGroupMode,
}

impl GroupSummary {
    fn new(group: &LayerGroupInfo) -> Self {
        Self {
            id: group.id.clone(),
            name: group.name.clone(),
            workspace: group.workspace.clone(),
            mode: group.mode,
        }
    }

    /// Path of the group in the rule tree
    pub fn tree_path(&self) -> Vec<&str> {
        match &self.workspace {
            Some(ws) => vec![ws.as_str(), self.name.as_str()],
            None => vec![self.name.as_str()],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LayerGroupContainmentCache {
    groups: HashMap<String, GroupSummary>,
    parents: HashMap<PublishedRef, Vec<String>>,
    resource_layers: HashMap<String, Vec<String>>,
}

impl LayerGroupContainmentCache {
    pub fn build(catalog: &dyn Catalog) -> Self {
        let mut cache = Self::default();
        for layer in catalog.layers() {
            cache
                .resource_layers
                .entry(layer.resource.id.clone())
                .or_default()
                .push(layer.id.clone());
        }
        for group in catalog.layer_groups() {
            for member in &group.layers {
                let parents = cache.parents.entry(member.clone()).or_default();
                if !parents.contains(&group.id) {
                    parents.push(group.id.clone());
                }
            }
            cache.groups.insert(group.id.clone(), GroupSummary::new(&group));
        }
        log::debug!(
            "Built layer group containment cache: {} groups, {} contained items",
            cache.groups.len(),
            cache.parents.len()
        );
        cache
    }

    pub fn group(&self, id: &str) -> Option<&GroupSummary> {
        self.groups.get(id)
    }

    /// Groups listing `member` directly, in any mode
    pub fn direct_containers(&self, member: &PublishedRef) -> Vec<&GroupSummary> {
        self.parents
            .get(member)
            .into_iter()
            .flatten()
            .filter_map(|id| self.groups.get(id))
            .collect()
    }

    /// Groups structurally containing `member`
    ///
    /// Single mode groups are transparent: their own containers stand in
    /// for them.
    pub fn structural_containers(&self, member: &PublishedRef) -> Vec<&GroupSummary> {
        let mut result = Vec::new();
        let mut seen = HashSet::new();
        self.collect_structural(member, &mut result, &mut seen);
        result
    }

    fn collect_structural<'a>(
        &'a self,
        member: &PublishedRef,
        result: &mut Vec<&'a GroupSummary>,
        seen: &mut HashSet<String>,
    ) {
        for group in self.direct_containers(member) {
            if !seen.insert(group.id.clone()) {
                continue;
            }
            if group.mode.is_structural() {
                result.push(group);
            } else {
                self.collect_structural(&PublishedRef::Group(group.id.clone()), result, seen);
            }
        }
    }

    /// Layers publishing a resource
    pub fn layers_for_resource(&self, resource_id: &str) -> &[String] {
        self.resource_layers
            .get(resource_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
