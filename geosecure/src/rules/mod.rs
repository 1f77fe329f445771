// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Access rules: data, service and REST rule families and their stores

pub mod access_mode;
pub mod api;
pub mod dao;
pub mod data_dao;
pub mod data_rule;
pub mod error;
pub mod properties;
pub mod rename;
pub mod rest_dao;
pub mod rest_rule;
pub mod service_dao;
pub mod service_rule;

pub use access_mode::{AccessMode, CatalogMode};
pub use api::{RuleApi, RuleApiError, RuleApiResult, RuleOutcome};
pub use dao::{AccessRule, AccessRuleDao, RuleSnapshot, DEFAULT_CHECK_INTERVAL};
pub use data_dao::DataAccessRuleDao;
pub use data_rule::{DataAccessRule, ANY, MODE_KEY};
pub use error::{RuleError, RuleResult};
pub use properties::PropertyList;
pub use rename::RuleRenameListener;
pub use rest_dao::{RestAccessRuleDao, IS_AUTHENTICATED_ANONYMOUSLY, IS_AUTHENTICATED_FULLY};
pub use rest_rule::{HttpMethod, RestAccessRule};
pub use service_dao::ServiceAccessRuleDao;
pub use service_rule::ServiceAccessRule;
