// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Result formatting for CLI output

use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use geosecure::catalog::InfoType;
use geosecure::secure::{AccessLevel, WrapperPolicy};
use geosecure::{AccessMode, CatalogMode};

use super::commands::OutputFormat;

/// Outcome of an access check
pub struct CheckReport {
    pub object: String,
    pub info_type: InfoType,
    pub authentication: String,
    pub catalog_mode: CatalogMode,
    pub decisions: Vec<(AccessMode, bool)>,
    /// `None` when the secure catalog hides the object
    pub policy: Option<WrapperPolicy>,
    /// Layers visible through a layer group
    pub members: Vec<String>,
}

pub struct OutputFormatter;

impl OutputFormatter {
    pub fn check(report: &CheckReport, format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => Self::check_table(report),
            OutputFormat::Json => Self::check_json(report),
        }
    }

    fn check_table(report: &CheckReport) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{} {} for {}\n",
            report.info_type.to_string().bold(),
            report.object.bold().green(),
            report.authentication
        ));
        output.push_str(&format!("Catalog mode: {}\n\n", report.catalog_mode));

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            Cell::new("Mode").fg(Color::Green),
            Cell::new("Decision").fg(Color::Green),
        ]);
        for (mode, allowed) in &report.decisions {
            let cell = if *allowed {
                Cell::new("allowed").fg(Color::Green)
            } else {
                Cell::new("denied").fg(Color::Red)
            };
            table.add_row(vec![Cell::new(mode.to_string()), cell]);
        }
        output.push_str(&table.to_string());
        output.push('\n');

        match &report.policy {
            None => output.push_str(&format!("\n{}\n", "Hidden by the secure catalog".yellow())),
            Some(policy) => output.push_str(&format!(
                "\nSecure catalog returns it as {} ({:?} on denial)\n",
                Self::level_name(policy.level).bold(),
                policy.response
            )),
        }

        if !report.members.is_empty() {
            output.push_str(&format!("\n{}\n", "Visible layers:".bold()));
            for (i, member) in report.members.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, member));
            }
        }
        output
    }

    fn check_json(report: &CheckReport) -> String {
        let decisions: serde_json::Map<String, serde_json::Value> = report
            .decisions
            .iter()
            .map(|(mode, allowed)| (mode.to_string(), serde_json::Value::Bool(*allowed)))
            .collect();
        let json = serde_json::json!({
            "object": report.object,
            "type": report.info_type.to_string(),
            "authentication": report.authentication,
            "catalog_mode": report.catalog_mode.to_string(),
            "decisions": decisions,
            "visible": report.policy.is_some(),
            "level": report.policy.map(|p| Self::level_name(p.level)),
            "members": report.members,
        });
        let mut text = serde_json::to_string_pretty(&json)
            .unwrap_or_else(|_| "{\"status\": \"error\"}".to_string());
        text.push('\n');
        text
    }

    fn level_name(level: AccessLevel) -> &'static str {
        match level {
            AccessLevel::Hidden => "hidden",
            AccessLevel::Metadata => "metadata only",
            AccessLevel::ReadOnly => "read only",
            AccessLevel::ReadWrite => "read/write",
            AccessLevel::Admin => "admin",
        }
    }

    pub fn rules(rules: &[(String, String)], format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => {
                if rules.is_empty() {
                    return format!("{}\n", "No rules defined".yellow());
                }
                let mut table = Table::new();
                table.load_preset(UTF8_FULL);
                table.set_header(vec![
                    Cell::new("Rule").fg(Color::Green),
                    Cell::new("Roles").fg(Color::Green),
                ]);
                for (key, value) in rules {
                    table.add_row(vec![key.clone(), value.clone()]);
                }
                format!("{}\n", table)
            }
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = rules
                    .iter()
                    .map(|(key, value)| serde_json::json!({ "rule": key, "roles": value }))
                    .collect();
                let mut text = serde_json::to_string_pretty(&json).unwrap_or_else(|_| "[]".to_string());
                text.push('\n');
                text
            }
        }
    }

    pub fn validation(errors: &[String], warnings: &[String]) -> String {
        let mut output = String::new();
        if !errors.is_empty() {
            output.push_str(&format!("{}\n", "Errors:".bold().red()));
            for (i, error) in errors.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, error.red()));
            }
        }
        if !warnings.is_empty() {
            output.push_str(&format!("{}\n", "Warnings:".bold().yellow()));
            for (i, warning) in warnings.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, warning.yellow()));
            }
        }
        output
    }
}
