// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Tern configuration system.

use std::io::Write;

use tern_config::diagnostic::ConfigError;
use tern_config::model::{DuplicatePolicy, OrderingPolicy, RouteKind};
use tern_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use tern_core::ConnectionMode;

/// Valid TOML with all sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_tern_config() {
    let toml = r#"
[bot]
name = "helper"
log_level = "debug"

[connection]
mode = "reverse"
host = "0.0.0.0"
port = 8081
access_token = "tok"
path = "/onebot/v11/ws"
action_timeout_ms = 2500

[dispatch]
ordering = "serialized"
duplicate_registration = "reject"

[attachments]
dir = "/tmp/tern-downloads"

[collaborators]
semantic_memory = true
proxy = "http://127.0.0.1:7890"

[[routes]]
kind = "group"
id = 12345
plugins = ["echo"]
require_mention = true
history_size = 10

[[routes]]
kind = "add_request"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.bot.name, "helper");
    assert_eq!(config.connection.mode, ConnectionMode::Reverse);
    assert_eq!(config.connection.port, 8081);
    assert_eq!(config.connection.access_token.as_deref(), Some("tok"));
    assert_eq!(config.connection.action_timeout_ms, 2500);
    assert_eq!(config.dispatch.ordering, OrderingPolicy::Serialized);
    assert_eq!(config.dispatch.duplicate_registration, DuplicatePolicy::Reject);
    assert_eq!(config.attachments.dir, "/tmp/tern-downloads");
    assert!(config.collaborators.semantic_memory);
    assert!(!config.collaborators.web_search);
    assert_eq!(config.routes.len(), 2);
    assert_eq!(config.routes[0].kind, RouteKind::Group);
    assert_eq!(config.routes[0].id, Some(12345));
    assert_eq!(config.routes[0].plugins, vec!["echo"]);
    assert_eq!(config.routes[1].kind, RouteKind::AddRequest);
}

/// Omitting everything yields the documented defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults validate");
    assert_eq!(config.bot.name, "tern");
    assert_eq!(config.connection.mode, ConnectionMode::Forward);
    assert_eq!(config.connection.host, "127.0.0.1");
    assert_eq!(config.connection.port, 8080);
    assert_eq!(config.connection.action_timeout_ms, 10_000);
    assert_eq!(config.dispatch.ordering, OrderingPolicy::Concurrent);
    assert_eq!(config.dispatch.duplicate_registration, DuplicatePolicy::Replace);
    assert!(config.routes.is_empty());
}

/// A typo in a section key produces an UnknownKey diagnostic with a suggestion.
#[test]
fn typo_produces_suggestion() {
    let toml = r#"
[connection]
prot = 9000
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject unknown key");
    let found = errors.iter().any(|e| match e {
        ConfigError::UnknownKey { key, suggestion, .. } => {
            key == "prot" && suggestion.as_deref() == Some("port")
        }
        _ => false,
    });
    assert!(found, "expected UnknownKey for `prot`, got {errors:?}");
}

/// An unknown connection mode is rejected.
#[test]
fn unknown_mode_is_rejected() {
    let toml = r#"
[connection]
mode = "sideways"
"#;
    assert!(load_and_validate_str(toml).is_err());
}

/// Wrong value types surface as InvalidType.
#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[connection]
port = "eighty"
"#;
    let errors = load_and_validate_str(toml).expect_err("port must be numeric");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. } | ConfigError::Other(_))),
        "got {errors:?}"
    );
}

/// Semantic validation runs after deserialization.
#[test]
fn validation_errors_surface_through_loader() {
    let toml = r#"
[connection]
action_timeout_ms = 0
"#;
    let errors = load_and_validate_str(toml).expect_err("zero timeout is invalid");
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("action_timeout_ms"))
    ));
}

/// The appsettings overlay replaces connection settings from the TOML.
#[test]
fn appsettings_overlay_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    let settings_path = dir.path().join("appsettings.json");
    std::fs::write(
        &settings_path,
        r#"{"Implementations":[{"Type":"ReverseWebSocket","Host":"127.0.0.1","Port":8099,"Suffix":"/ws"}]}"#,
    )
    .unwrap();

    let toml = format!(
        "[connection]\nappsettings_path = \"{}\"\nport = 1234\n",
        settings_path.display()
    );
    let config = load_and_validate_str(&toml).expect("overlay should validate");
    assert_eq!(config.connection.mode, ConnectionMode::Reverse);
    assert_eq!(config.connection.port, 8099);
    assert_eq!(config.connection.path, "/ws");
}

/// A broken appsettings file is a validation error, not a panic.
#[test]
fn malformed_appsettings_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let settings_path = dir.path().join("appsettings.json");
    std::fs::write(&settings_path, "{ not json").unwrap();

    let toml = format!(
        "[connection]\nappsettings_path = \"{}\"\n",
        settings_path.display()
    );
    let errors = load_and_validate_str(&toml).expect_err("malformed JSON");
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}

/// Loading from an explicit path works and reports spans from that file.
#[test]
fn load_from_explicit_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[bot]\nname = \"from-file\"").unwrap();
    let config = load_and_validate_path(file.path()).expect("file config should load");
    assert_eq!(config.bot.name, "from-file");
}
