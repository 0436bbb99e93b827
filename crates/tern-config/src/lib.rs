// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Tern gateway client.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, environment variable overrides, an optional
//! overlay from the gateway's `appsettings.json`, and miette diagnostics with
//! typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use tern_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("gateway: {}:{}", config.connection.host, config.connection.port);
//! ```

pub mod appsettings;
pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::TernConfig;

/// Load configuration from the XDG hierarchy and validate it.
///
/// 1. Loads config from TOML files + env vars via Figment
/// 2. Applies the `appsettings.json` overlay if one is configured
/// 3. Runs post-deserialization validation
///
/// On Figment errors, returns diagnostics with typo suggestions.
pub fn load_and_validate() -> Result<TernConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => finish(config),
        Err(err) => {
            let toml_sources = collect_toml_sources();
            Err(diagnostic::figment_to_config_errors(err, &toml_sources))
        }
    }
}

/// Load configuration from an explicit file path and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<TernConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => finish(config),
        Err(err) => {
            let sources = std::fs::read_to_string(path)
                .map(|content| vec![(path.display().to_string(), content)])
                .unwrap_or_default();
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<TernConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => finish(config),
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

fn finish(mut config: TernConfig) -> Result<TernConfig, Vec<ConfigError>> {
    if let Some(path) = config.connection.appsettings_path.clone() {
        appsettings::apply_appsettings(&mut config.connection, Path::new(&path))
            .map_err(|e| vec![e])?;
    }
    validation::validate_config(&config)?;
    Ok(config)
}

/// Collect TOML source file contents for error span resolution.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates: Vec<PathBuf> = Vec::new();

    candidates.push(
        std::env::current_dir()
            .map(|d| d.join(loader::LOCAL_CONFIG_FILE))
            .unwrap_or_else(|_| PathBuf::from(loader::LOCAL_CONFIG_FILE)),
    );
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("tern").join(loader::LOCAL_CONFIG_FILE));
    }
    candidates.push(PathBuf::from(loader::SYSTEM_CONFIG_PATH));

    candidates
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
