// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory catalog
//!
//! Holds the catalog state behind a single lock and notifies listeners after
//! the lock is released, so listeners may read the catalog again. Snapshots
//! serialize to JSON for the command line tool.

use super::error::{CatalogError, CatalogResult};
use super::events::{CatalogEvent, CatalogListener};
use super::model::{
    InfoType, LayerGroupInfo, LayerInfo, PublishedRef, ResourceInfo, ResourceKind, StoreInfo,
    StoreKind, StyleInfo, WorkspaceInfo,
};
use super::traits::Catalog;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Serializable catalog content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSnapshot {
    pub workspaces: Vec<WorkspaceInfo>,
    pub stores: Vec<StoreInfo>,
    pub resources: Vec<ResourceInfo>,
    pub layers: Vec<LayerInfo>,
    pub layer_groups: Vec<LayerGroupInfo>,
    pub styles: Vec<StyleInfo>,
}

#[derive(Debug, Default)]
struct CatalogState {
    workspaces: BTreeMap<String, WorkspaceInfo>,
    stores: BTreeMap<String, StoreInfo>,
    resources: BTreeMap<String, ResourceInfo>,
    layers: BTreeMap<String, LayerInfo>,
    layer_groups: BTreeMap<String, LayerGroupInfo>,
    styles: BTreeMap<String, StyleInfo>,
}

impl CatalogState {
    fn workspace_by_name(&self, name: &str) -> Option<&WorkspaceInfo> {
        self.workspaces.values().find(|w| w.name == name)
    }

    fn resource_by_name(&self, workspace: &str, name: &str) -> Option<&ResourceInfo> {
        self.resources
            .values()
            .find(|r| r.workspace == workspace && r.name == name)
    }

    fn group_by_name(&self, workspace: Option<&str>, name: &str) -> Option<&LayerGroupInfo> {
        self.layer_groups
            .values()
            .find(|g| g.workspace.as_deref() == workspace && g.name == name)
    }

    fn require_workspace(&self, name: &str) -> CatalogResult<()> {
        match self.workspace_by_name(name) {
            Some(_) => Ok(()),
            None => Err(CatalogError::NotFound(format!("workspace {}", name))),
        }
    }

    fn check_members(&self, group: &LayerGroupInfo) -> CatalogResult<()> {
        if group.layers.len() != group.styles.len() {
            return Err(CatalogError::InvalidOperation(format!(
                "layer group {} has {} layers but {} styles",
                group.name,
                group.layers.len(),
                group.styles.len()
            )));
        }
        for member in &group.layers {
            let known = match member {
                PublishedRef::Layer(id) => self.layers.contains_key(id),
                PublishedRef::Group(id) => self.layer_groups.contains_key(id),
            };
            if !known {
                return Err(CatalogError::NotFound(format!("group member {}", member.id())));
            }
            if member.id() == group.id {
                return Err(CatalogError::InvalidOperation(format!(
                    "layer group {} cannot contain itself",
                    group.name
                )));
            }
        }
        if let Some(root) = &group.root_layer {
            if !self.layers.contains_key(root) {
                return Err(CatalogError::NotFound(format!("root layer {}", root)));
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCatalog {
    state: RwLock<CatalogState>,
    listeners: RwLock<Vec<Arc<dyn CatalogListener>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        let catalog = Self::new();
        {
            let mut state = catalog.state.write();
            state.workspaces = snapshot.workspaces.into_iter().map(|i| (i.id.clone(), i)).collect();
            state.stores = snapshot.stores.into_iter().map(|i| (i.id.clone(), i)).collect();
            state.resources = snapshot.resources.into_iter().map(|i| (i.id.clone(), i)).collect();
            state.layers = snapshot.layers.into_iter().map(|i| (i.id.clone(), i)).collect();
            state.layer_groups = snapshot
                .layer_groups
                .into_iter()
                .map(|i| (i.id.clone(), i))
                .collect();
            state.styles = snapshot.styles.into_iter().map(|i| (i.id.clone(), i)).collect();
        }
        catalog
    }

    pub fn from_json_file(path: &Path) -> CatalogResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let snapshot: CatalogSnapshot = serde_json::from_str(&text)?;
        log::info!(
            "Loaded catalog snapshot from {} ({} workspaces, {} layers, {} layer groups)",
            path.display(),
            snapshot.workspaces.len(),
            snapshot.layers.len(),
            snapshot.layer_groups.len()
        );
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        let state = self.state.read();
        CatalogSnapshot {
            workspaces: state.workspaces.values().cloned().collect(),
            stores: state.stores.values().cloned().collect(),
            resources: state.resources.values().cloned().collect(),
            layers: state.layers.values().cloned().collect(),
            layer_groups: state.layer_groups.values().cloned().collect(),
            styles: state.styles.values().cloned().collect(),
        }
    }

    pub fn add_workspace(&self, name: &str) -> CatalogResult<WorkspaceInfo> {
        let ws = WorkspaceInfo::new(name);
        {
            let mut state = self.state.write();
            if state.workspace_by_name(name).is_some() {
                return Err(CatalogError::AlreadyExists(format!("workspace {}", name)));
            }
            state.workspaces.insert(ws.id.clone(), ws.clone());
        }
        self.fire(CatalogEvent::Added {
            info_type: InfoType::Workspace,
            id: ws.id.clone(),
        });
        Ok(ws)
    }

    pub fn add_store(&self, workspace: &str, name: &str, kind: StoreKind) -> CatalogResult<StoreInfo> {
        let store = StoreInfo::new(workspace, name, kind);
        {
            let mut state = self.state.write();
            state.require_workspace(workspace)?;
            if state
                .stores
                .values()
                .any(|s| s.workspace == workspace && s.name == name)
            {
                return Err(CatalogError::AlreadyExists(format!("store {}:{}", workspace, name)));
            }
            state.stores.insert(store.id.clone(), store.clone());
        }
        self.fire(CatalogEvent::Added {
            info_type: InfoType::Store,
            id: store.id.clone(),
        });
        Ok(store)
    }

    /// Add a resource and the layer publishing it
    pub fn add_layer(
        &self,
        workspace: &str,
        store: &str,
        name: &str,
        kind: ResourceKind,
    ) -> CatalogResult<LayerInfo> {
        let resource = ResourceInfo::new(workspace, store, name, kind);
        let layer = LayerInfo::new(resource.clone());
        {
            let mut state = self.state.write();
            state.require_workspace(workspace)?;
            if !state
                .stores
                .values()
                .any(|s| s.workspace == workspace && s.name == store)
            {
                return Err(CatalogError::NotFound(format!("store {}:{}", workspace, store)));
            }
            if state.resource_by_name(workspace, name).is_some() {
                return Err(CatalogError::AlreadyExists(format!("resource {}:{}", workspace, name)));
            }
            state.resources.insert(resource.id.clone(), resource.clone());
            state.layers.insert(layer.id.clone(), layer.clone());
        }
        self.fire(CatalogEvent::Added {
            info_type: InfoType::Resource,
            id: resource.id,
        });
        self.fire(CatalogEvent::Added {
            info_type: InfoType::Layer,
            id: layer.id.clone(),
        });
        Ok(layer)
    }

    pub fn add_layer_group(&self, group: LayerGroupInfo) -> CatalogResult<LayerGroupInfo> {
        {
            let mut state = self.state.write();
            if let Some(ws) = &group.workspace {
                state.require_workspace(ws)?;
            }
            if state.group_by_name(group.workspace.as_deref(), &group.name).is_some() {
                return Err(CatalogError::AlreadyExists(format!(
                    "layer group {}",
                    group.prefixed_name()
                )));
            }
            state.check_members(&group)?;
            state.layer_groups.insert(group.id.clone(), group.clone());
        }
        self.fire(CatalogEvent::Added {
            info_type: InfoType::LayerGroup,
            id: group.id.clone(),
        });
        Ok(group)
    }

    /// Replace an existing group's definition, keeping its id
    pub fn update_layer_group(&self, group: LayerGroupInfo) -> CatalogResult<()> {
        {
            let mut state = self.state.write();
            if !state.layer_groups.contains_key(&group.id) {
                return Err(CatalogError::NotFound(format!("layer group {}", group.id)));
            }
            state.check_members(&group)?;
            state.layer_groups.insert(group.id.clone(), group.clone());
        }
        self.fire(CatalogEvent::Modified {
            info_type: InfoType::LayerGroup,
            id: group.id,
        });
        Ok(())
    }

    pub fn add_style(&self, workspace: Option<&str>, name: &str) -> CatalogResult<StyleInfo> {
        let style = StyleInfo::new(name, workspace);
        {
            let mut state = self.state.write();
            if let Some(ws) = workspace {
                state.require_workspace(ws)?;
            }
            if state
                .styles
                .values()
                .any(|s| s.workspace.as_deref() == workspace && s.name == name)
            {
                return Err(CatalogError::AlreadyExists(format!("style {}", name)));
            }
            state.styles.insert(style.id.clone(), style.clone());
        }
        self.fire(CatalogEvent::Added {
            info_type: InfoType::Style,
            id: style.id.clone(),
        });
        Ok(style)
    }

    /// Rename a workspace and move everything it contains along
    pub fn rename_workspace(&self, old: &str, new: &str) -> CatalogResult<()> {
        let id = {
            let mut state = self.state.write();
            if state.workspace_by_name(new).is_some() {
                return Err(CatalogError::AlreadyExists(format!("workspace {}", new)));
            }
            let ws = state
                .workspaces
                .values_mut()
                .find(|w| w.name == old)
                .ok_or_else(|| CatalogError::NotFound(format!("workspace {}", old)))?;
            ws.name = new.to_string();
            let id = ws.id.clone();

            for store in state.stores.values_mut().filter(|s| s.workspace == old) {
                store.workspace = new.to_string();
            }
            for resource in state.resources.values_mut().filter(|r| r.workspace == old) {
                resource.workspace = new.to_string();
            }
            for layer in state.layers.values_mut().filter(|l| l.resource.workspace == old) {
                layer.resource.workspace = new.to_string();
            }
            for group in state
                .layer_groups
                .values_mut()
                .filter(|g| g.workspace.as_deref() == Some(old))
            {
                group.workspace = Some(new.to_string());
            }
            for style in state
                .styles
                .values_mut()
                .filter(|s| s.workspace.as_deref() == Some(old))
            {
                style.workspace = Some(new.to_string());
            }
            id
        };
        self.fire(CatalogEvent::Renamed {
            info_type: InfoType::Workspace,
            id,
            workspace: None,
            old_name: old.to_string(),
            new_name: new.to_string(),
        });
        Ok(())
    }

    /// Rename a resource; its layer follows
    pub fn rename_resource(&self, workspace: &str, old: &str, new: &str) -> CatalogResult<()> {
        let id = {
            let mut state = self.state.write();
            if state.resource_by_name(workspace, new).is_some() {
                return Err(CatalogError::AlreadyExists(format!("resource {}:{}", workspace, new)));
            }
            let resource = state
                .resources
                .values_mut()
                .find(|r| r.workspace == workspace && r.name == old)
                .ok_or_else(|| CatalogError::NotFound(format!("resource {}:{}", workspace, old)))?;
            resource.name = new.to_string();
            let id = resource.id.clone();
            for layer in state.layers.values_mut().filter(|l| l.resource.id == id) {
                layer.resource.name = new.to_string();
            }
            id
        };
        self.fire(CatalogEvent::Renamed {
            info_type: InfoType::Resource,
            id,
            workspace: Some(workspace.to_string()),
            old_name: old.to_string(),
            new_name: new.to_string(),
        });
        Ok(())
    }

    pub fn rename_layer_group(
        &self,
        workspace: Option<&str>,
        old: &str,
        new: &str,
    ) -> CatalogResult<()> {
        let id = {
            let mut state = self.state.write();
            if state.group_by_name(workspace, new).is_some() {
                return Err(CatalogError::AlreadyExists(format!("layer group {}", new)));
            }
            let group = state
                .layer_groups
                .values_mut()
                .find(|g| g.workspace.as_deref() == workspace && g.name == old)
                .ok_or_else(|| CatalogError::NotFound(format!("layer group {}", old)))?;
            group.name = new.to_string();
            group.id.clone()
        };
        self.fire(CatalogEvent::Renamed {
            info_type: InfoType::LayerGroup,
            id,
            workspace: workspace.map(String::from),
            old_name: old.to_string(),
            new_name: new.to_string(),
        });
        Ok(())
    }

    /// Remove a layer and its resource, dropping it from every group
    pub fn remove_layer(&self, id: &str) -> CatalogResult<()> {
        {
            let mut state = self.state.write();
            let layer = state
                .layers
                .remove(id)
                .ok_or_else(|| CatalogError::NotFound(format!("layer {}", id)))?;
            state.resources.remove(&layer.resource.id);
            for group in state.layer_groups.values_mut() {
                remove_member(group, &PublishedRef::Layer(id.to_string()));
                if group.root_layer.as_deref() == Some(id) {
                    group.root_layer = None;
                }
            }
        }
        self.fire(CatalogEvent::Removed {
            info_type: InfoType::Layer,
            id: id.to_string(),
        });
        Ok(())
    }

    /// Remove a layer group, dropping it from every group containing it
    pub fn remove_layer_group(&self, id: &str) -> CatalogResult<()> {
        {
            let mut state = self.state.write();
            state
                .layer_groups
                .remove(id)
                .ok_or_else(|| CatalogError::NotFound(format!("layer group {}", id)))?;
            for group in state.layer_groups.values_mut() {
                remove_member(group, &PublishedRef::Group(id.to_string()));
            }
        }
        self.fire(CatalogEvent::Removed {
            info_type: InfoType::LayerGroup,
            id: id.to_string(),
        });
        Ok(())
    }

    /// Tell listeners the whole catalog may have changed
    pub fn reload(&self) {
        self.fire(CatalogEvent::Reloaded);
    }

    fn fire(&self, event: CatalogEvent) {
        let listeners: Vec<Arc<dyn CatalogListener>> = self.listeners.read().clone();
        log::debug!("Catalog event {:?} to {} listener(s)", event, listeners.len());
        for listener in listeners {
            listener.on_event(&event);
        }
    }
}

fn remove_member(group: &mut LayerGroupInfo, member: &PublishedRef) {
    let mut index = 0;
    while index < group.layers.len() {
        if &group.layers[index] == member {
            group.layers.remove(index);
            if index < group.styles.len() {
                group.styles.remove(index);
            }
        } else {
            index += 1;
        }
    }
}

impl Catalog for MemoryCatalog {
    fn workspaces(&self) -> Vec<WorkspaceInfo> {
        self.state.read().workspaces.values().cloned().collect()
    }

    fn workspace_by_name(&self, name: &str) -> Option<WorkspaceInfo> {
        self.state.read().workspace_by_name(name).cloned()
    }

    fn stores(&self) -> Vec<StoreInfo> {
        self.state.read().stores.values().cloned().collect()
    }

    fn store_by_name(&self, workspace: &str, name: &str) -> Option<StoreInfo> {
        self.state
            .read()
            .stores
            .values()
            .find(|s| s.workspace == workspace && s.name == name)
            .cloned()
    }

    fn resources(&self) -> Vec<ResourceInfo> {
        self.state.read().resources.values().cloned().collect()
    }

    fn resource(&self, id: &str) -> Option<ResourceInfo> {
        self.state.read().resources.get(id).cloned()
    }

    fn resource_by_name(&self, workspace: &str, name: &str) -> Option<ResourceInfo> {
        self.state.read().resource_by_name(workspace, name).cloned()
    }

    fn layers(&self) -> Vec<LayerInfo> {
        self.state.read().layers.values().cloned().collect()
    }

    fn layer(&self, id: &str) -> Option<LayerInfo> {
        self.state.read().layers.get(id).cloned()
    }

    fn layer_by_name(&self, workspace: &str, name: &str) -> Option<LayerInfo> {
        self.state
            .read()
            .layers
            .values()
            .find(|l| l.workspace() == workspace && l.name() == name)
            .cloned()
    }

    fn layer_groups(&self) -> Vec<LayerGroupInfo> {
        self.state.read().layer_groups.values().cloned().collect()
    }

    fn layer_group(&self, id: &str) -> Option<LayerGroupInfo> {
        self.state.read().layer_groups.get(id).cloned()
    }

    fn layer_group_by_name(&self, workspace: Option<&str>, name: &str) -> Option<LayerGroupInfo> {
        self.state.read().group_by_name(workspace, name).cloned()
    }

    fn styles(&self) -> Vec<StyleInfo> {
        self.state.read().styles.values().cloned().collect()
    }

    fn style_by_name(&self, workspace: Option<&str>, name: &str) -> Option<StyleInfo> {
        self.state
            .read()
            .styles
            .values()
            .find(|s| s.workspace.as_deref() == workspace && s.name == name)
            .cloned()
    }

    fn add_listener(&self, listener: Arc<dyn CatalogListener>) {
        self.listeners.write().push(listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Filter, LayerGroupMode, Query};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<CatalogEvent>>);

    impl CatalogListener for Recorder {
        fn on_event(&self, event: &CatalogEvent) {
            self.0.lock().push(event.clone());
        }
    }

    fn catalog() -> MemoryCatalog {
        let catalog = MemoryCatalog::new();
        catalog.add_workspace("topp").unwrap();
        catalog.add_store("topp", "shapes", StoreKind::DataStore).unwrap();
        catalog
            .add_layer("topp", "shapes", "states", ResourceKind::FeatureType)
            .unwrap();
        catalog
    }

    #[test]
    fn test_rename_workspace_moves_content() {
        let catalog = catalog();
        let recorder = Arc::new(Recorder::default());
        catalog.add_listener(recorder.clone());

        catalog.rename_workspace("topp", "usa").unwrap();
        assert!(catalog.workspace_by_name("topp").is_none());
        assert!(catalog.layer_by_name("usa", "states").is_some());
        assert!(catalog.store_by_name("usa", "shapes").is_some());

        let events = recorder.0.lock();
        assert!(matches!(
            &events[0],
            CatalogEvent::Renamed { info_type: InfoType::Workspace, old_name, .. } if old_name == "topp"
        ));
    }

    #[test]
    fn test_rename_resource_updates_layer() {
        let catalog = catalog();
        catalog.rename_resource("topp", "states", "usa").unwrap();
        assert!(catalog.layer_by_name("topp", "usa").is_some());
        assert!(catalog.resource_by_name("topp", "states").is_none());
    }

    #[test]
    fn test_group_validation() {
        let catalog = catalog();
        let states = catalog.layer_by_name("topp", "states").unwrap();
        let mut bad = LayerGroupInfo::new("g", None, LayerGroupMode::Named).with_layer(&states);
        bad.styles.clear();
        assert!(matches!(
            catalog.add_layer_group(bad),
            Err(CatalogError::InvalidOperation(_))
        ));
        let missing = LayerGroupInfo::new("g", Some("nowhere"), LayerGroupMode::Named);
        assert!(matches!(catalog.add_layer_group(missing), Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn test_remove_layer_drops_group_members() {
        let catalog = catalog();
        let states = catalog.layer_by_name("topp", "states").unwrap();
        let group = catalog
            .add_layer_group(
                LayerGroupInfo::new("g", None, LayerGroupMode::Named).with_styled_layer(&states, "red"),
            )
            .unwrap();
        catalog.remove_layer(&states.id).unwrap();
        let group = catalog.layer_group(&group.id).unwrap();
        assert!(group.layers.is_empty());
        assert!(group.styles.is_empty());
    }

    #[test]
    fn test_list_and_snapshot_round_trip() {
        let catalog = catalog();
        catalog.add_workspace("nurc").unwrap();
        let names: Vec<String> = catalog
            .list(&Query::all(InfoType::Workspace).with_filter(Filter::equals("name", "nurc")))
            .map(|i| i.name().to_string())
            .collect();
        assert_eq!(names, vec!["nurc"]);

        let json = serde_json::to_string(&catalog.snapshot()).unwrap();
        let restored = MemoryCatalog::from_snapshot(serde_json::from_str(&json).unwrap());
        assert_eq!(restored.snapshot(), catalog.snapshot());
    }
}
