// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Security subsystem configuration

use crate::auth::{ROLE_ADMINISTRATOR, ROLE_GROUP_ADMIN};
use crate::rules::CatalogMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding [`SecurityConfig::data_dir`]
pub const ENV_DATA_DIR: &str = "GEOSECURE_DATA_DIR";

/// Environment variable overriding [`SecurityConfig::default_catalog_mode`]
pub const ENV_CATALOG_MODE: &str = "GEOSECURE_CATALOG_MODE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Whether layer groups whose members are all hidden are shown at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LayerGroupVisibility {
    /// Groups stay visible even when all their layers are filtered out
    #[default]
    HideNever,
    /// Groups with no visible layers left are hidden
    HideEmpty,
}

/// Global configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Directory holding the rule property files
    pub data_dir: PathBuf,

    /// Data access rules file name, relative to `data_dir`
    pub layers_file: String,

    /// Service access rules file name
    pub services_file: String,

    /// REST access rules file name
    pub rest_file: String,

    /// Role that bypasses every check
    pub admin_role: String,

    /// Role administering users and groups
    pub group_admin_role: String,

    /// Treatment of layer groups emptied by security filtering
    pub layer_group_visibility: LayerGroupVisibility,

    /// Catalog mode used when the layers file does not set one
    pub default_catalog_mode: CatalogMode,

    /// Minimum time between checks of the rule files for external edits
    pub rules_check_interval_ms: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("security"),
            layers_file: "layers.properties".to_string(),
            services_file: "services.properties".to_string(),
            rest_file: "rest.properties".to_string(),
            admin_role: ROLE_ADMINISTRATOR.to_string(),
            group_admin_role: ROLE_GROUP_ADMIN.to_string(),
            layer_group_visibility: LayerGroupVisibility::HideNever,
            default_catalog_mode: CatalogMode::Hide,
            rules_check_interval_ms: 1000,
        }
    }
}

impl SecurityConfig {
    /// Load a JSON configuration file, then apply environment overrides
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut config: SecurityConfig = serde_json::from_str(&text)?;
        config.apply_env_overrides()?;
        log::info!("Loaded security configuration from {}", path.display());
        Ok(config)
    }

    /// Configuration rooted at `data_dir` with every other setting defaulted
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            log::debug!("{} overrides data directory with {}", ENV_DATA_DIR, dir);
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(mode) = std::env::var(ENV_CATALOG_MODE) {
            self.default_catalog_mode =
                mode.parse().map_err(|_| ConfigError::InvalidValue {
                    key: ENV_CATALOG_MODE.to_string(),
                    value: mode.clone(),
                })?;
        }
        Ok(())
    }

    pub fn rules_check_interval(&self) -> Duration {
        Duration::from_millis(self.rules_check_interval_ms)
    }

    pub fn layers_path(&self) -> PathBuf {
        self.data_dir.join(&self.layers_file)
    }

    pub fn services_path(&self) -> PathBuf {
        self.data_dir.join(&self.services_file)
    }

    pub fn rest_path(&self) -> PathBuf {
        self.data_dir.join(&self.rest_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SecurityConfig::default();
        assert_eq!(config.admin_role, ROLE_ADMINISTRATOR);
        assert_eq!(config.layer_group_visibility, LayerGroupVisibility::HideNever);
        assert_eq!(config.default_catalog_mode, CatalogMode::Hide);
        assert_eq!(config.rules_check_interval(), Duration::from_secs(1));
        assert_eq!(
            config.layers_path(),
            PathBuf::from("security").join("layers.properties")
        );
    }

    #[test]
    #[serial_test::serial]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "layer_group_visibility": "HideEmpty", "admin_role": "ROOT" }}"#
        )
        .unwrap();

        let config = SecurityConfig::from_file(file.path()).unwrap();
        assert_eq!(config.layer_group_visibility, LayerGroupVisibility::HideEmpty);
        assert_eq!(config.admin_role, "ROOT");
        assert_eq!(config.rest_file, "rest.properties");
    }

    #[test]
    #[serial_test::serial]
    fn test_env_overrides() {
        std::env::set_var(ENV_DATA_DIR, "/tmp/geosecure-env");
        std::env::set_var(ENV_CATALOG_MODE, "challenge");
        let mut config = SecurityConfig::default();
        let result = config.apply_env_overrides();
        std::env::remove_var(ENV_DATA_DIR);
        std::env::remove_var(ENV_CATALOG_MODE);

        result.unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/geosecure-env"));
        assert_eq!(config.default_catalog_mode, CatalogMode::Challenge);
    }

    #[test]
    #[serial_test::serial]
    fn test_invalid_env_mode() {
        std::env::set_var(ENV_CATALOG_MODE, "sometimes");
        let mut config = SecurityConfig::default();
        let result = config.apply_env_overrides();
        std::env::remove_var(ENV_CATALOG_MODE);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
