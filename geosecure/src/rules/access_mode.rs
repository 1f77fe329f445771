// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Access modes and catalog modes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Permission dimension evaluated independently per resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AccessMode {
    Read,
    Write,
    Admin,
}

impl AccessMode {
    pub const ALL: [AccessMode; 3] = [AccessMode::Read, AccessMode::Write, AccessMode::Admin];

    /// Single letter used in rule keys
    pub fn alias(&self) -> &'static str {
        match self {
            AccessMode::Read => "r",
            AccessMode::Write => "w",
            AccessMode::Admin => "a",
        }
    }

    pub fn from_alias(alias: &str) -> Option<Self> {
        AccessMode::ALL
            .into_iter()
            .find(|m| m.alias().eq_ignore_ascii_case(alias))
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccessMode::Read => "READ",
            AccessMode::Write => "WRITE",
            AccessMode::Admin => "ADMIN",
        };
        f.write_str(name)
    }
}

/// What the secure catalog does with objects the user cannot access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CatalogMode {
    /// Denied objects are invisible
    #[default]
    Hide,
    /// Denied objects are visible, touching their data fails
    Challenge,
    /// Hide for capabilities documents, challenge otherwise
    Mixed,
}

impl fmt::Display for CatalogMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CatalogMode::Hide => "HIDE",
            CatalogMode::Challenge => "CHALLENGE",
            CatalogMode::Mixed => "MIXED",
        };
        f.write_str(name)
    }
}

impl FromStr for CatalogMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HIDE" => Ok(CatalogMode::Hide),
            "CHALLENGE" => Ok(CatalogMode::Challenge),
            "MIXED" => Ok(CatalogMode::Mixed),
            other => Err(format!("Unknown catalog mode '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_lookup() {
        assert_eq!(AccessMode::from_alias("r"), Some(AccessMode::Read));
        assert_eq!(AccessMode::from_alias("W"), Some(AccessMode::Write));
        assert_eq!(AccessMode::from_alias("a"), Some(AccessMode::Admin));
        assert_eq!(AccessMode::from_alias("x"), None);
        assert_eq!(AccessMode::from_alias("read"), None);
    }

    #[test]
    fn test_catalog_mode_parse() {
        assert_eq!("hide".parse::<CatalogMode>(), Ok(CatalogMode::Hide));
        assert_eq!(" MIXED ".parse::<CatalogMode>(), Ok(CatalogMode::Mixed));
        assert!("open".parse::<CatalogMode>().is_err());
        assert_eq!(CatalogMode::Challenge.to_string(), "CHALLENGE");
    }
}
