// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog change notifications

use super::model::InfoType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    Added {
        info_type: InfoType,
        id: String,
    },
    Modified {
        info_type: InfoType,
        id: String,
    },
    /// `workspace` is the workspace the object lives in after the rename,
    /// `None` for workspaces themselves and global objects
    Renamed {
        info_type: InfoType,
        id: String,
        workspace: Option<String>,
        old_name: String,
        new_name: String,
    },
    Removed {
        info_type: InfoType,
        id: String,
    },
    Reloaded,
}

impl CatalogEvent {
    /// Whether the event can change the outcome of an access decision
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            CatalogEvent::Modified {
                info_type: InfoType::Style | InfoType::Store,
                ..
            }
        )
    }
}

/// Receives catalog events synchronously, after the change is visible
pub trait CatalogListener: Send + Sync {
    fn on_event(&self, event: &CatalogEvent);
}
