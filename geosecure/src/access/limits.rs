// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Access limits handed to the secure catalog
//!
//! A manager returns `None` instead of limits when the user may do
//! everything the object supports.

use crate::rules::CatalogMode;
use serde::{Deserialize, Serialize};

pub trait AccessLimits {
    fn mode(&self) -> CatalogMode;

    fn is_readable(&self) -> bool;

    fn is_writable(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceAccessLimits {
    pub mode: CatalogMode,
    pub readable: bool,
    pub writable: bool,
    pub adminable: bool,
}

impl AccessLimits for WorkspaceAccessLimits {
    fn mode(&self) -> CatalogMode {
        self.mode
    }

    fn is_readable(&self) -> bool {
        self.readable
    }

    fn is_writable(&self) -> bool {
        self.writable
    }
}

/// Limits on a resource, layer or layer group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataAccessLimits {
    pub mode: CatalogMode,
    pub readable: bool,
    pub writable: bool,
}

impl AccessLimits for DataAccessLimits {
    fn mode(&self) -> CatalogMode {
        self.mode
    }

    fn is_readable(&self) -> bool {
        self.readable
    }

    fn is_writable(&self) -> bool {
        self.writable
    }
}
