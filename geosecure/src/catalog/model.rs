// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog objects
//!
//! Objects refer to each other by workspace name and by id. A layer embeds a
//! copy of its resource, so the catalog keeps both in sync on rename.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InfoType {
    Workspace,
    Store,
    Resource,
    Layer,
    LayerGroup,
    Style,
}

impl fmt::Display for InfoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InfoType::Workspace => "workspace",
            InfoType::Store => "store",
            InfoType::Resource => "resource",
            InfoType::Layer => "layer",
            InfoType::LayerGroup => "layer group",
            InfoType::Style => "style",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    pub id: String,
    pub name: String,
}

impl WorkspaceInfo {
    pub fn new(name: &str) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreKind {
    DataStore,
    CoverageStore,
    WmsStore,
    WmtsStore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreInfo {
    pub id: String,
    pub name: String,
    pub workspace: String,
    pub kind: StoreKind,
}

impl StoreInfo {
    pub fn new(workspace: &str, name: &str, kind: StoreKind) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            workspace: workspace.to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    FeatureType,
    Coverage,
    WmsLayer,
    WmtsLayer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub id: String,
    pub name: String,
    pub workspace: String,
    pub store: String,
    pub kind: ResourceKind,
}

impl ResourceInfo {
    pub fn new(workspace: &str, store: &str, name: &str, kind: ResourceKind) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            workspace: workspace.to_string(),
            store: store.to_string(),
            kind,
        }
    }

    /// `workspace:name`
    pub fn prefixed_name(&self) -> String {
        format!("{}:{}", self.workspace, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerInfo {
    pub id: String,
    pub resource: ResourceInfo,
    #[serde(default)]
    pub default_style: Option<String>,
}

impl LayerInfo {
    pub fn new(resource: ResourceInfo) -> Self {
        Self {
            id: new_id(),
            resource,
            default_style: None,
        }
    }

    /// Layers are named after their resource
    pub fn name(&self) -> &str {
        &self.resource.name
    }

    pub fn workspace(&self) -> &str {
        &self.resource.workspace
    }

    pub fn prefixed_name(&self) -> String {
        self.resource.prefixed_name()
    }
}

/// How a layer group exposes its members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerGroupMode {
    /// A plain list of layers, no standalone identity of its own in
    /// capabilities and no influence on member visibility
    Single,
    /// A named tree node; members stay individually reachable
    Named,
    /// A tree node whose members are reachable only through it
    Container,
    /// A single opaque layer hiding its members
    OpaqueContainer,
    /// Earth observation group with a mandatory root layer
    Eo,
}

impl LayerGroupMode {
    /// Modes that make the group a structural parent of its members
    pub fn is_structural(&self) -> bool {
        !matches!(self, LayerGroupMode::Single)
    }
}

/// Reference from a layer group to one of its members
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PublishedRef {
    Layer(String),
    Group(String),
}

impl PublishedRef {
    pub fn id(&self) -> &str {
        match self {
            PublishedRef::Layer(id) | PublishedRef::Group(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerGroupInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub workspace: Option<String>,
    pub mode: LayerGroupMode,
    #[serde(default)]
    pub root_layer: Option<String>,
    #[serde(default)]
    pub root_layer_style: Option<String>,
    #[serde(default)]
    pub layers: Vec<PublishedRef>,
    /// Style per entry of `layers`, `None` for the member's default
    #[serde(default)]
    pub styles: Vec<Option<String>>,
}

impl LayerGroupInfo {
    pub fn new(name: &str, workspace: Option<&str>, mode: LayerGroupMode) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            workspace: workspace.map(String::from),
            mode,
            root_layer: None,
            root_layer_style: None,
            layers: Vec::new(),
            styles: Vec::new(),
        }
    }

    pub fn with_layer(self, layer: &LayerInfo) -> Self {
        self.with_member(PublishedRef::Layer(layer.id.clone()), None)
    }

    pub fn with_styled_layer(self, layer: &LayerInfo, style: &str) -> Self {
        self.with_member(PublishedRef::Layer(layer.id.clone()), Some(style.to_string()))
    }

    pub fn with_group(self, group: &LayerGroupInfo) -> Self {
        self.with_member(PublishedRef::Group(group.id.clone()), None)
    }

    pub fn with_root_layer(mut self, layer: &LayerInfo) -> Self {
        self.root_layer = Some(layer.id.clone());
        self
    }

    fn with_member(mut self, member: PublishedRef, style: Option<String>) -> Self {
        self.layers.push(member);
        self.styles.push(style);
        self
    }

    /// Style paired with the member at `index`
    pub fn style_at(&self, index: usize) -> Option<&str> {
        self.styles.get(index).and_then(|s| s.as_deref())
    }

    /// `workspace:name`, or the bare name for global groups
    pub fn prefixed_name(&self) -> String {
        match &self.workspace {
            Some(ws) => format!("{}:{}", ws, self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub workspace: Option<String>,
}

impl StyleInfo {
    pub fn new(name: &str, workspace: Option<&str>) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            workspace: workspace.map(String::from),
        }
    }
}

/// Any catalog object, as returned by generic listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogInfo {
    Workspace(WorkspaceInfo),
    Store(StoreInfo),
    Resource(ResourceInfo),
    Layer(LayerInfo),
    LayerGroup(LayerGroupInfo),
    Style(StyleInfo),
}

impl CatalogInfo {
    pub fn info_type(&self) -> InfoType {
        match self {
            CatalogInfo::Workspace(_) => InfoType::Workspace,
            CatalogInfo::Store(_) => InfoType::Store,
            CatalogInfo::Resource(_) => InfoType::Resource,
            CatalogInfo::Layer(_) => InfoType::Layer,
            CatalogInfo::LayerGroup(_) => InfoType::LayerGroup,
            CatalogInfo::Style(_) => InfoType::Style,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            CatalogInfo::Workspace(i) => &i.id,
            CatalogInfo::Store(i) => &i.id,
            CatalogInfo::Resource(i) => &i.id,
            CatalogInfo::Layer(i) => &i.id,
            CatalogInfo::LayerGroup(i) => &i.id,
            CatalogInfo::Style(i) => &i.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CatalogInfo::Workspace(i) => &i.name,
            CatalogInfo::Store(i) => &i.name,
            CatalogInfo::Resource(i) => &i.name,
            CatalogInfo::Layer(i) => i.name(),
            CatalogInfo::LayerGroup(i) => &i.name,
            CatalogInfo::Style(i) => &i.name,
        }
    }

    /// Workspace the object lives in, `None` for workspaces and global
    /// groups and styles
    pub fn workspace(&self) -> Option<&str> {
        match self {
            CatalogInfo::Workspace(_) => None,
            CatalogInfo::Store(i) => Some(&i.workspace),
            CatalogInfo::Resource(i) => Some(&i.workspace),
            CatalogInfo::Layer(i) => Some(i.workspace()),
            CatalogInfo::LayerGroup(i) => i.workspace.as_deref(),
            CatalogInfo::Style(i) => i.workspace.as_deref(),
        }
    }

    /// Value of a dotted property path, `None` when the property is null or
    /// unknown for this kind of object
    ///
    /// Paths follow the object graph: a layer exposes `resource.name` and
    /// `resource.store.workspace.name`.
    pub fn property(&self, path: &str) -> Option<String> {
        let value = match (self, path) {
            (_, "id") => Some(self.id()),
            (_, "name") => Some(self.name()),
            (CatalogInfo::Store(i), "workspace.name") => Some(i.workspace.as_str()),
            (CatalogInfo::Resource(i), "store.name") => Some(i.store.as_str()),
            (CatalogInfo::Resource(i), "store.workspace.name") => Some(i.workspace.as_str()),
            (CatalogInfo::Layer(i), "resource.id") => Some(i.resource.id.as_str()),
            (CatalogInfo::Layer(i), "resource.name") => Some(i.name()),
            (CatalogInfo::Layer(i), "resource.store.workspace.name") => Some(i.workspace()),
            (CatalogInfo::LayerGroup(i), "workspace.name") => i.workspace.as_deref(),
            (CatalogInfo::Style(i), "workspace.name") => i.workspace.as_deref(),
            _ => None,
        };
        value.map(String::from)
    }
}
