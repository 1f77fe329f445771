// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog interface consumed by the access layer
//!
//! The access layer only reads from the catalog. Implementations must be
//! safe to share between request threads.

use super::events::CatalogListener;
use super::filter::{Filter, Query};
use super::iterator::CloseableIterator;
use super::model::{
    CatalogInfo, InfoType, LayerGroupInfo, LayerInfo, PublishedRef, ResourceInfo, StoreInfo,
    StyleInfo, WorkspaceInfo,
};
use std::sync::Arc;

pub trait Catalog: Send + Sync {
    fn workspaces(&self) -> Vec<WorkspaceInfo>;

    fn workspace_by_name(&self, name: &str) -> Option<WorkspaceInfo>;

    fn stores(&self) -> Vec<StoreInfo>;

    fn store_by_name(&self, workspace: &str, name: &str) -> Option<StoreInfo>;

    fn resources(&self) -> Vec<ResourceInfo>;

    fn resource(&self, id: &str) -> Option<ResourceInfo>;

    fn resource_by_name(&self, workspace: &str, name: &str) -> Option<ResourceInfo>;

    fn layers(&self) -> Vec<LayerInfo>;

    fn layer(&self, id: &str) -> Option<LayerInfo>;

    fn layer_by_name(&self, workspace: &str, name: &str) -> Option<LayerInfo>;

    /// Layers publishing the given resource
    fn layers_for_resource(&self, resource_id: &str) -> Vec<LayerInfo> {
        self.layers()
            .into_iter()
            .filter(|l| l.resource.id == resource_id)
            .collect()
    }

    fn layer_groups(&self) -> Vec<LayerGroupInfo>;

    fn layer_group(&self, id: &str) -> Option<LayerGroupInfo>;

    /// `workspace` is `None` for global groups
    fn layer_group_by_name(&self, workspace: Option<&str>, name: &str) -> Option<LayerGroupInfo>;

    fn styles(&self) -> Vec<StyleInfo>;

    fn style_by_name(&self, workspace: Option<&str>, name: &str) -> Option<StyleInfo>;

    fn add_listener(&self, listener: Arc<dyn CatalogListener>);

    /// Resolve a group member reference
    fn published(&self, member: &PublishedRef) -> Option<CatalogInfo> {
        match member {
            PublishedRef::Layer(id) => self.layer(id).map(CatalogInfo::Layer),
            PublishedRef::Group(id) => self.layer_group(id).map(CatalogInfo::LayerGroup),
        }
    }

    /// Every object of one type
    fn all_of(&self, info_type: InfoType) -> Vec<CatalogInfo> {
        match info_type {
            InfoType::Workspace => self.workspaces().into_iter().map(CatalogInfo::Workspace).collect(),
            InfoType::Store => self.stores().into_iter().map(CatalogInfo::Store).collect(),
            InfoType::Resource => self.resources().into_iter().map(CatalogInfo::Resource).collect(),
            InfoType::Layer => self.layers().into_iter().map(CatalogInfo::Layer).collect(),
            InfoType::LayerGroup => self
                .layer_groups()
                .into_iter()
                .map(CatalogInfo::LayerGroup)
                .collect(),
            InfoType::Style => self.styles().into_iter().map(CatalogInfo::Style).collect(),
        }
    }

    /// Filtered, sorted and paged listing
    fn list(&self, query: &Query) -> CloseableIterator<CatalogInfo> {
        let mut items: Vec<CatalogInfo> = self
            .all_of(query.info_type)
            .into_iter()
            .filter(|info| query.filter.evaluate(info))
            .collect();
        if !query.sort_by.is_empty() {
            items.sort_by(|a, b| {
                query
                    .sort_by
                    .iter()
                    .map(|s| s.compare(a, b))
                    .find(|o| o.is_ne())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        let offset = query.offset.unwrap_or(0);
        let count = query.count.unwrap_or(usize::MAX);
        CloseableIterator::new(items.into_iter().skip(offset).take(count))
    }

    fn count(&self, info_type: InfoType, filter: &Filter) -> usize {
        self.all_of(info_type)
            .iter()
            .filter(|info| filter.evaluate(info))
            .count()
    }
}
