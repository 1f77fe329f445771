// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Secured catalog objects
//!
//! A single generic wrapper carries the object plus the policy decided for
//! it. Metadata is always readable from a returned wrapper; data and write
//! access go through checked accessors that fail according to the policy.

use super::policy::{AccessLevel, Response, WrapperPolicy};
use crate::catalog::{
    InfoType, LayerGroupInfo, LayerInfo, ResourceInfo, StoreInfo, StyleInfo, WorkspaceInfo,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecurityError {
    #[error("Access to {resource} denied")]
    AccessDenied { resource: String },

    #[error("Authentication required to access {resource}")]
    Unauthenticated { resource: String },

    #[error("{resource} is read only")]
    ReadOnly { resource: String },
}

pub type SecurityResult<T> = Result<T, SecurityError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secured<T> {
    info: T,
    policy: WrapperPolicy,
    resource: String,
    anonymous: bool,
}

impl<T> Secured<T> {
    pub fn new(info: T, policy: WrapperPolicy, resource: impl Into<String>, anonymous: bool) -> Self {
        Self {
            info,
            policy,
            resource: resource.into(),
            anonymous,
        }
    }

    /// Descriptive metadata, always available
    pub fn info(&self) -> &T {
        &self.info
    }

    pub fn policy(&self) -> &WrapperPolicy {
        &self.policy
    }

    pub fn resource_name(&self) -> &str {
        &self.resource
    }

    /// Give up the wrapper and return the raw object
    pub fn unwrap(self) -> T {
        self.info
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Secured<U> {
        Secured {
            info: f(self.info),
            policy: self.policy,
            resource: self.resource,
            anonymous: self.anonymous,
        }
    }

    fn denial(&self) -> SecurityError {
        if self.anonymous {
            SecurityError::Unauthenticated {
                resource: self.resource.clone(),
            }
        } else {
            SecurityError::AccessDenied {
                resource: self.resource.clone(),
            }
        }
    }

    pub fn check_read(&self) -> SecurityResult<()> {
        if self.policy.can_read() {
            Ok(())
        } else {
            Err(self.denial())
        }
    }

    pub fn check_write(&self) -> SecurityResult<()> {
        if self.policy.can_write() {
            return Ok(());
        }
        if self.policy.level == AccessLevel::ReadOnly && self.policy.response == Response::Hide {
            return Err(SecurityError::ReadOnly {
                resource: self.resource.clone(),
            });
        }
        Err(self.denial())
    }

    /// Data access entry point
    pub fn data(&self) -> SecurityResult<&T> {
        self.check_read()?;
        Ok(&self.info)
    }

    /// Write access entry point
    pub fn writable(&self) -> SecurityResult<&T> {
        self.check_write()?;
        Ok(&self.info)
    }
}

/// A layer group whose member list only holds what the user may see
///
/// The wrapped group's `layers` and `styles` are filtered together, so they
/// stay paired by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecuredLayerGroup {
    pub(crate) group: Secured<LayerGroupInfo>,
    pub(crate) members: Vec<SecuredPublished>,
    pub(crate) root_layer: Option<Secured<LayerInfo>>,
}

impl SecuredLayerGroup {
    pub fn group(&self) -> &LayerGroupInfo {
        self.group.info()
    }

    pub fn secured(&self) -> &Secured<LayerGroupInfo> {
        &self.group
    }

    pub fn policy(&self) -> &WrapperPolicy {
        self.group.policy()
    }

    pub fn name(&self) -> &str {
        &self.group.info().name
    }

    pub fn members(&self) -> &[SecuredPublished] {
        &self.members
    }

    pub fn root_layer(&self) -> Option<&Secured<LayerInfo>> {
        self.root_layer.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Every layer reachable through the group, depth first
    pub fn layers(&self) -> Vec<&Secured<LayerInfo>> {
        let mut result = Vec::new();
        for member in &self.members {
            match member {
                SecuredPublished::Layer(layer) => result.push(layer),
                SecuredPublished::Group(group) => result.extend(group.layers()),
            }
        }
        result
    }

    pub fn check_read(&self) -> SecurityResult<()> {
        self.group.check_read()
    }

    pub fn unwrap(self) -> LayerGroupInfo {
        self.group.unwrap()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecuredPublished {
    Layer(Secured<LayerInfo>),
    Group(Box<SecuredLayerGroup>),
}

impl SecuredPublished {
    pub fn name(&self) -> &str {
        match self {
            SecuredPublished::Layer(layer) => layer.info().name(),
            SecuredPublished::Group(group) => group.name(),
        }
    }

    pub fn policy(&self) -> &WrapperPolicy {
        match self {
            SecuredPublished::Layer(layer) => layer.policy(),
            SecuredPublished::Group(group) => group.policy(),
        }
    }
}

/// Listing result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecuredInfo {
    Workspace(Secured<WorkspaceInfo>),
    Store(Secured<StoreInfo>),
    Resource(Secured<ResourceInfo>),
    Layer(Secured<LayerInfo>),
    LayerGroup(SecuredLayerGroup),
    Style(Secured<StyleInfo>),
}

impl SecuredInfo {
    pub fn info_type(&self) -> InfoType {
        match self {
            SecuredInfo::Workspace(_) => InfoType::Workspace,
            SecuredInfo::Store(_) => InfoType::Store,
            SecuredInfo::Resource(_) => InfoType::Resource,
            SecuredInfo::Layer(_) => InfoType::Layer,
            SecuredInfo::LayerGroup(_) => InfoType::LayerGroup,
            SecuredInfo::Style(_) => InfoType::Style,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SecuredInfo::Workspace(s) => &s.info().name,
            SecuredInfo::Store(s) => &s.info().name,
            SecuredInfo::Resource(s) => &s.info().name,
            SecuredInfo::Layer(s) => s.info().name(),
            SecuredInfo::LayerGroup(g) => g.name(),
            SecuredInfo::Style(s) => &s.info().name,
        }
    }

    pub fn policy(&self) -> &WrapperPolicy {
        match self {
            SecuredInfo::Workspace(s) => s.policy(),
            SecuredInfo::Store(s) => s.policy(),
            SecuredInfo::Resource(s) => s.policy(),
            SecuredInfo::Layer(s) => s.policy(),
            SecuredInfo::LayerGroup(g) => g.policy(),
            SecuredInfo::Style(s) => s.policy(),
        }
    }
}
