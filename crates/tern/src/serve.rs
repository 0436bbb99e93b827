// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tern serve` and `tern check-config`.
//!
//! Serve builds the connector for the configured mode, installs the route
//! table and runs one connection lifecycle until interrupted.

use std::fmt::Write as _;

use tern_config::TernConfig;
use tern_core::TernError;
use tern_runtime::{PluginRegistry, RuntimeBuilder, install_signal_handler};
use tracing::{info, warn};

use crate::routes::install_routes;

/// Runs the `tern serve` command.
pub async fn run_serve(config: TernConfig) -> Result<(), TernError> {
    init_tracing(&config.bot.log_level);

    info!(
        name = %config.bot.name,
        mode = %config.connection.mode,
        host = %config.connection.host,
        port = config.connection.port,
        "starting tern serve"
    );

    let connector = tern_transport::connector_from_config(&config.connection);
    let runtime = RuntimeBuilder::from_config(connector, &config)?.build();

    let plugins = PluginRegistry::with_builtins();
    let handles = install_routes(runtime.registry(), &config.routes, &plugins)?;
    if handles.is_empty() {
        warn!("no routes configured; events will be received but not handled");
    } else {
        info!(count = handles.len(), "routes installed");
    }

    let collaborators = runtime.collaborators();
    info!(
        history_persistence = collaborators.history_persistence,
        semantic_memory = collaborators.semantic_memory,
        web_search = collaborators.web_search,
        port = ?collaborators.port,
        proxy = collaborators.proxy.is_some(),
        "collaborator toggles"
    );

    let shutdown = install_signal_handler();
    runtime.run(shutdown).await?;

    info!("tern serve shutdown complete");
    Ok(())
}

/// Human-readable summary printed by `tern check-config`.
pub fn summary(config: &TernConfig) -> String {
    let conn = &config.connection;
    let mut out = String::new();
    let _ = writeln!(out, "config OK");
    let _ = writeln!(out, "  bot:        {} (log level {})", config.bot.name, config.bot.log_level);
    let _ = writeln!(
        out,
        "  connection: {} {}:{}{}{}",
        conn.mode,
        conn.host,
        conn.port,
        conn.path,
        if conn.access_token.is_some() { " (token set)" } else { "" }
    );
    let _ = writeln!(
        out,
        "  timeouts:   action {}ms, connect {}ms",
        conn.action_timeout_ms, conn.connect_timeout_ms
    );
    let _ = writeln!(
        out,
        "  dispatch:   ordering {:?}, duplicates {:?}",
        config.dispatch.ordering, config.dispatch.duplicate_registration
    );
    let _ = writeln!(out, "  routes:     {}", config.routes.len());
    out
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "tern={log_level},tern_runtime={log_level},tern_transport={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_hides_token() {
        let mut config = TernConfig::default();
        config.connection.access_token = Some("hunter2".into());
        let text = summary(&config);
        assert!(text.contains("forward 127.0.0.1:8080/ (token set)"));
        assert!(!text.contains("hunter2"));
        assert!(text.contains("routes:     0"));
    }
}
