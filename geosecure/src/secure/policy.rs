// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! How a secured object behaves once the access decision is made

use crate::auth::RequestContext;
use crate::rules::CatalogMode;
use serde::{Deserialize, Serialize};

/// What the user may do with a wrapped object, from least to most
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AccessLevel {
    /// Not returned at all
    Hidden,
    /// Descriptive metadata only, data access fails
    Metadata,
    ReadOnly,
    ReadWrite,
    Admin,
}

/// Reaction to a forbidden operation on a returned object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Response {
    /// Act as if the operation did not exist
    Hide,
    /// Fail with a security error so the client can authenticate
    Challenge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapperPolicy {
    pub level: AccessLevel,
    pub response: Response,
    pub mode: CatalogMode,
}

impl WrapperPolicy {
    pub fn hide(mode: CatalogMode) -> Self {
        Self {
            level: AccessLevel::Hidden,
            response: Response::Hide,
            mode,
        }
    }

    pub fn admin(mode: CatalogMode) -> Self {
        Self {
            level: AccessLevel::Admin,
            response: Response::Hide,
            mode,
        }
    }

    /// Derive the policy for an object from its read/write/admin decisions
    ///
    /// `Mixed` hides denied objects while building capabilities documents and
    /// challenges on every other request.
    pub fn build(
        readable: bool,
        writable: bool,
        adminable: bool,
        mode: CatalogMode,
        request: &RequestContext,
    ) -> Self {
        let challenges = match mode {
            CatalogMode::Hide => false,
            CatalogMode::Challenge => true,
            CatalogMode::Mixed => !request.is_get_capabilities(),
        };
        let response = if challenges { Response::Challenge } else { Response::Hide };

        let level = if readable && writable {
            if adminable {
                AccessLevel::Admin
            } else {
                AccessLevel::ReadWrite
            }
        } else if readable {
            AccessLevel::ReadOnly
        } else if challenges {
            AccessLevel::Metadata
        } else {
            AccessLevel::Hidden
        };

        Self { level, response, mode }
    }

    pub fn is_hidden(&self) -> bool {
        self.level == AccessLevel::Hidden
    }

    pub fn can_read(&self) -> bool {
        self.level >= AccessLevel::ReadOnly
    }

    pub fn can_write(&self) -> bool {
        self.level >= AccessLevel::ReadWrite
    }
}
