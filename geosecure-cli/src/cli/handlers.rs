// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI command handlers for GeoSecure

use colored::Colorize;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::commands::{ObjectKind, OutputFormat, RuleKind};
use super::output::{CheckReport, OutputFormatter};
use geosecure::auth::ROLE_AUTHENTICATED;
use geosecure::catalog::{Catalog, CatalogInfo, MemoryCatalog};
use geosecure::rules::{
    AccessRule, DataAccessRule, DataAccessRuleDao, PropertyList, RestAccessRule,
    RestAccessRuleDao, RuleApi, ServiceAccessRule, ServiceAccessRuleDao,
};
use geosecure::secure::SecuredInfo;
use geosecure::{
    AccessMode, Authentication, GeoSecurity, RequestContext, ResourceAccessManager,
    SecurityConfig, SecurityContext,
};

type CliResult = Result<(), Box<dyn Error>>;

/// Arguments of the check command
pub struct CheckOptions {
    pub data_dir: PathBuf,
    pub catalog: PathBuf,
    pub user: Option<String>,
    pub roles: Vec<String>,
    pub object: ObjectKind,
    pub name: String,
    pub service: Option<String>,
    pub request: Option<String>,
    pub admin_request: bool,
    pub format: OutputFormat,
}

fn load_config(data_dir: PathBuf) -> Result<SecurityConfig, Box<dyn Error>> {
    let mut config = SecurityConfig::with_data_dir(data_dir);
    config.apply_env_overrides()?;
    Ok(config)
}

/// Split `workspace:name`; a bare name has no workspace
fn split_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((ws, local)) => (Some(ws), local),
        None => (None, name),
    }
}

fn resolve(catalog: &dyn Catalog, kind: ObjectKind, name: &str) -> Option<CatalogInfo> {
    let (ws, local) = split_name(name);
    match (kind, ws) {
        (ObjectKind::Workspace, _) => catalog.workspace_by_name(name).map(CatalogInfo::Workspace),
        (ObjectKind::Store, Some(ws)) => catalog.store_by_name(ws, local).map(CatalogInfo::Store),
        (ObjectKind::Resource, Some(ws)) => catalog
            .resource_by_name(ws, local)
            .map(CatalogInfo::Resource),
        (ObjectKind::Layer, Some(ws)) => catalog.layer_by_name(ws, local).map(CatalogInfo::Layer),
        (ObjectKind::Group, ws) => catalog
            .layer_group_by_name(ws, local)
            .map(CatalogInfo::LayerGroup),
        (ObjectKind::Style, ws) => catalog.style_by_name(ws, local).map(CatalogInfo::Style),
        _ => None,
    }
}

fn authentication(user: Option<String>, roles: Vec<String>) -> Authentication {
    match user {
        Some(user) => Authentication::user(&user, roles).with_authority(ROLE_AUTHENTICATED),
        None => roles
            .iter()
            .fold(Authentication::anonymous(), |auth, role| auth.with_authority(role)),
    }
}

/// Handle the check command
pub fn handle_check(options: CheckOptions) -> CliResult {
    let catalog = Arc::new(MemoryCatalog::from_json_file(&options.catalog)?);
    let config = load_config(options.data_dir)?;
    let security = GeoSecurity::from_config(config, catalog.clone())?;

    let request = if options.admin_request {
        RequestContext::admin()
    } else {
        match &options.service {
            Some(service) => RequestContext::ows(service, options.request.as_deref().unwrap_or("")),
            None => RequestContext::none(),
        }
    };
    let ctx = SecurityContext::new(authentication(options.user, options.roles), request);

    let info = resolve(catalog.as_ref(), options.object, &options.name)
        .ok_or_else(|| format!("No {:?} named '{}' in the catalog", options.object, options.name))?;

    let manager = security.access_manager();
    let decisions = AccessMode::ALL
        .iter()
        .map(|mode| (*mode, manager.can_access(&ctx, &info, *mode)))
        .collect();
    let secured = security.catalog().secure(&ctx, info.clone());

    let report = CheckReport {
        object: options.name,
        info_type: info.info_type(),
        authentication: ctx.auth.to_string(),
        catalog_mode: manager.catalog_mode(),
        decisions,
        policy: secured.as_ref().map(|s| *s.policy()),
        members: match &secured {
            Some(SecuredInfo::LayerGroup(group)) => group
                .layers()
                .iter()
                .map(|layer| layer.info().prefixed_name())
                .collect(),
            _ => Vec::new(),
        },
    };
    print!("{}", OutputFormatter::check(&report, options.format));
    Ok(())
}

/// Handle the rules command
pub fn handle_rules(data_dir: PathBuf, kind: RuleKind, format: OutputFormat) -> CliResult {
    let config = load_config(data_dir)?;
    let rules = match kind {
        RuleKind::Data => RuleApi::new(Arc::new(DataAccessRuleDao::from_file(config.layers_path())?)).list(),
        RuleKind::Service => {
            RuleApi::new(Arc::new(ServiceAccessRuleDao::from_file(config.services_path())?)).list()
        }
        RuleKind::Rest => RuleApi::new(Arc::new(RestAccessRuleDao::from_file(config.rest_path())?)).list(),
    };
    print!("{}", OutputFormatter::rules(&rules, format));
    Ok(())
}

fn parse_errors<R: AccessRule>(path: &Path) -> Result<Vec<String>, Box<dyn Error>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let props = PropertyList::load(path)?;
    Ok(props
        .iter()
        .filter(|(key, _)| !R::RESERVED_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key)))
        .filter_map(|(key, value)| {
            R::parse(key, value)
                .err()
                .map(|e| format!("{}: {}={}: {}", path.display(), key, value, e))
        })
        .collect())
}

/// Handle the validate command
pub fn handle_validate(data_dir: PathBuf, catalog: Option<PathBuf>) -> CliResult {
    let config = load_config(data_dir)?;

    let mut errors = parse_errors::<DataAccessRule>(&config.layers_path())?;
    errors.extend(parse_errors::<ServiceAccessRule>(&config.services_path())?);
    errors.extend(parse_errors::<RestAccessRule>(&config.rest_path())?);

    let warnings = match catalog {
        Some(path) => {
            let catalog = MemoryCatalog::from_json_file(&path)?;
            DataAccessRuleDao::from_file(config.layers_path())?.validate_against(&catalog)
        }
        None => Vec::new(),
    };

    print!("{}", OutputFormatter::validation(&errors, &warnings));
    if errors.is_empty() {
        println!("{}", "Rules are valid".bold().green());
        Ok(())
    } else {
        Err(format!("{} invalid rule(s)", errors.len()).into())
    }
}
