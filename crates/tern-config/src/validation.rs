// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes: non-empty hosts, positive timeouts, and a coherent route table.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::{RouteKind, TernConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or every collected error
/// (does not fail fast).
pub fn validate_config(config: &TernConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.bot.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::validation(format!(
            "bot.log_level `{}` must be one of: {}",
            config.bot.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    let conn = &config.connection;
    if conn.host.trim().is_empty() {
        errors.push(ConfigError::validation("connection.host must not be empty"));
    }

    if conn.port == 0 {
        errors.push(ConfigError::validation("connection.port must not be 0"));
    }

    if !conn.path.starts_with('/') {
        errors.push(ConfigError::validation(format!(
            "connection.path `{}` must start with `/`",
            conn.path
        )));
    }

    if conn.action_timeout_ms == 0 {
        errors.push(ConfigError::validation(
            "connection.action_timeout_ms must be greater than 0",
        ));
    }

    if conn.connect_timeout_ms == 0 {
        errors.push(ConfigError::validation(
            "connection.connect_timeout_ms must be greater than 0",
        ));
    }

    if config.attachments.timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "attachments.timeout_secs must be greater than 0",
        ));
    }

    validate_routes(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_routes(config: &TernConfig, errors: &mut Vec<ConfigError>) {
    let mut seen = HashSet::new();

    for (i, route) in config.routes.iter().enumerate() {
        let global = route.kind.category().is_global();

        match (global, route.id) {
            (false, None) => errors.push(ConfigError::validation(format!(
                "routes[{i}] of kind {:?} requires an `id`",
                route.kind
            ))),
            (true, Some(_)) => errors.push(ConfigError::validation(format!(
                "routes[{i}] of kind {:?} is global and must not set `id`",
                route.kind
            ))),
            _ => {}
        }

        if (route.require_mention || route.require_admin) && route.kind != RouteKind::Group {
            errors.push(ConfigError::validation(format!(
                "routes[{i}]: require_mention/require_admin only apply to group routes"
            )));
        }

        if route.history_size > 0
            && !matches!(route.kind, RouteKind::Private | RouteKind::Group)
        {
            errors.push(ConfigError::validation(format!(
                "routes[{i}]: history_size only applies to private and group routes"
            )));
        }

        if !global && !seen.insert((route.kind, route.id)) {
            errors.push(ConfigError::validation(format!(
                "duplicate route for {:?} {}",
                route.kind,
                route.id.unwrap_or_default()
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RouteConfig;

    fn route(kind: RouteKind, id: Option<i64>) -> RouteConfig {
        RouteConfig {
            kind,
            id,
            plugins: vec![],
            require_mention: false,
            require_admin: false,
            history_size: 0,
            auto_download: false,
        }
    }

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&TernConfig::default()).is_ok());
    }

    #[test]
    fn zero_timeout_fails_validation() {
        let mut config = TernConfig::default();
        config.connection.action_timeout_ms = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "action_timeout_ms"));
    }

    #[test]
    fn errors_are_collected_not_fail_fast() {
        let mut config = TernConfig::default();
        config.connection.host = " ".into();
        config.connection.port = 0;
        config.bot.log_level = "loud".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn path_must_be_absolute() {
        let mut config = TernConfig::default();
        config.connection.path = "ws".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "connection.path"));
    }

    #[test]
    fn scoped_route_requires_id() {
        let mut config = TernConfig::default();
        config.routes = vec![route(RouteKind::Group, None)];
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "requires an `id`"));
    }

    #[test]
    fn global_route_rejects_id() {
        let mut config = TernConfig::default();
        config.routes = vec![route(RouteKind::OfflineFile, Some(3))];
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "must not set `id`"));
    }

    #[test]
    fn mention_guard_only_on_group_routes() {
        let mut config = TernConfig::default();
        let mut r = route(RouteKind::Private, Some(1));
        r.require_mention = true;
        config.routes = vec![r];
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "only apply to group routes"));
    }

    #[test]
    fn duplicate_routes_fail_validation() {
        let mut config = TernConfig::default();
        config.routes = vec![
            route(RouteKind::Group, Some(10)),
            route(RouteKind::Group, Some(10)),
            route(RouteKind::Private, Some(10)),
        ];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(has_message(&errors, "duplicate route"));
    }

    #[test]
    fn several_global_routes_are_allowed() {
        let mut config = TernConfig::default();
        config.routes = vec![
            route(RouteKind::AddRequest, None),
            route(RouteKind::AddRequest, None),
        ];
        assert!(validate_config(&config).is_ok());
    }
}
