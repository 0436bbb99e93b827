// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./tern.toml` > `~/.config/tern/tern.toml` > `/etc/tern/tern.toml`
//! with environment variable overrides via `TERN_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::TernConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/tern/tern.toml";

/// Local config file, resolved against the working directory.
pub const LOCAL_CONFIG_FILE: &str = "tern.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tern/tern.toml` (system-wide)
/// 3. `~/.config/tern/tern.toml` (user XDG config)
/// 4. `./tern.toml` (local directory)
/// 5. `TERN_*` environment variables
pub fn load_config() -> Result<TernConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<TernConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TernConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TernConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TernConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TernConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("tern").join(LOCAL_CONFIG_FILE))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: keys such as
/// `access_token` contain underscores, so `TERN_CONNECTION_ACCESS_TOKEN`
/// must become `connection.access_token`, not `connection.access.token`.
fn env_provider() -> Env {
    Env::prefixed("TERN_").map(|key| {
        let mapped = map_env_key(key.as_str());
        mapped.into()
    })
}

fn map_env_key(key: &str) -> String {
    const SECTIONS: &[&str] = &[
        "bot",
        "connection",
        "dispatch",
        "attachments",
        "collaborators",
    ];
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("connection_access_token"), "connection.access_token");
        assert_eq!(map_env_key("bot_log_level"), "bot.log_level");
        assert_eq!(map_env_key("dispatch_ordering"), "dispatch.ordering");
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }

    #[test]
    fn string_overrides_defaults() {
        let config = load_config_from_str("[connection]\nport = 3001\n").unwrap();
        assert_eq!(config.connection.port, 3001);
        assert_eq!(config.connection.host, "127.0.0.1");
    }
}
