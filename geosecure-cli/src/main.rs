// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! GeoSecure CLI entry point

use clap::Parser;
use colored::Colorize;

mod cli;
use cli::{CheckOptions, Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        log::LevelFilter::Debug
    } else if let Some(level) = cli.log_level {
        level.to_level_filter()
    } else {
        // RUST_LOG can still raise this
        log::LevelFilter::Warn
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    match cli.command {
        Commands::Version => {
            println!("{} {}", "GeoSecure".bold().green(), geosecure::VERSION);
            println!("Resource access control for geospatial catalogs");
            Ok(())
        }

        Commands::Check {
            data_dir,
            catalog,
            user,
            roles,
            object,
            name,
            service,
            request,
            admin_request,
            format,
        } => cli::handle_check(CheckOptions {
            data_dir,
            catalog,
            user,
            roles,
            object,
            name,
            service,
            request,
            admin_request,
            format,
        }),

        Commands::Rules {
            data_dir,
            kind,
            format,
        } => cli::handle_rules(data_dir, kind, format),

        Commands::Validate { data_dir, catalog } => cli::handle_validate(data_dir, catalog),
    }
}
