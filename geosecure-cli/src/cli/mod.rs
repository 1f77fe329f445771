// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI module for GeoSecure
//!
//! Provides rule validation, normalized rule listing and one-off access
//! checks against a JSON catalog snapshot.

pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{Cli, Commands};
pub use handlers::{handle_check, handle_rules, handle_validate, CheckOptions};
