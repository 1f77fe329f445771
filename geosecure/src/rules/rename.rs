// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Keeps data rules pointing at catalog objects across renames
//!
//! The catalog fires listeners synchronously, so by the time a rename call
//! returns the rules have been rewritten and stored.

use super::data_dao::DataAccessRuleDao;
use crate::catalog::{CatalogEvent, CatalogListener, InfoType};
use std::sync::Arc;

pub struct RuleRenameListener {
    dao: Arc<DataAccessRuleDao>,
}

impl RuleRenameListener {
    pub fn new(dao: Arc<DataAccessRuleDao>) -> Self {
        Self { dao }
    }

    fn rename(&self, info_type: InfoType, workspace: Option<&str>, old: &str, new: &str) -> usize {
        match (info_type, workspace) {
            (InfoType::Workspace, _) => self.dao.rename_workspace(old, new),
            (InfoType::Resource, Some(ws)) | (InfoType::Layer, Some(ws)) => {
                self.dao.rename_layer(ws, old, new)
            }
            (InfoType::LayerGroup, Some(ws)) => self.dao.rename_layer(ws, old, new),
            (InfoType::LayerGroup, None) => self.dao.rename_global_group(old, new),
            _ => 0,
        }
    }
}

impl CatalogListener for RuleRenameListener {
    fn on_event(&self, event: &CatalogEvent) {
        let CatalogEvent::Renamed {
            info_type,
            workspace,
            old_name,
            new_name,
            ..
        } = event
        else {
            return;
        };
        if old_name == new_name {
            return;
        }

        let changed = self.rename(*info_type, workspace.as_deref(), old_name, new_name);
        if changed == 0 {
            return;
        }
        log::info!(
            "Renamed {} data rule(s) after {} rename {} -> {}",
            changed,
            info_type,
            old_name,
            new_name
        );
        if let Err(e) = self.dao.store_rules() {
            log::error!("Failed to store data rules after rename: {}", e);
        }
    }
}
