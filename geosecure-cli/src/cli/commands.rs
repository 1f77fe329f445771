// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Command line definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "geosecure")]
#[command(about = "Validate and query GeoSecure access rules", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<log::Level>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version information
    Version,

    /// Decide whether a user may access a catalog object
    Check {
        /// Directory holding layers.properties, services.properties and rest.properties
        #[arg(short, long)]
        data_dir: PathBuf,

        /// JSON catalog snapshot
        #[arg(short, long)]
        catalog: PathBuf,

        /// User name, anonymous when omitted
        #[arg(short, long)]
        user: Option<String>,

        /// Role granted to the user (repeatable)
        #[arg(short, long = "role")]
        roles: Vec<String>,

        /// Kind of object
        #[arg(short, long, value_enum)]
        object: ObjectKind,

        /// Object name, `workspace:name` for workspace scoped objects
        name: String,

        /// OWS service being served (WMS, WFS, ...)
        #[arg(long)]
        service: Option<String>,

        /// OWS request being served (GetMap, GetCapabilities, ...)
        #[arg(long, requires = "service")]
        request: Option<String>,

        /// Treat the request as an administrative one
        #[arg(long, conflicts_with = "service")]
        admin_request: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Print the normalized rules of a data directory
    Rules {
        #[arg(short, long)]
        data_dir: PathBuf,

        /// Rule family to print
        #[arg(short, long, value_enum, default_value = "data")]
        kind: RuleKind,

        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Report malformed rules and rules referring to missing catalog objects
    Validate {
        #[arg(short, long)]
        data_dir: PathBuf,

        /// JSON catalog snapshot to check references against
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleKind {
    Data,
    Service,
    Rest,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Workspace,
    Store,
    Resource,
    Layer,
    Group,
    Style,
}
