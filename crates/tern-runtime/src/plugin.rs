// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named plugins that run ahead of a handler.
//!
//! A plugin sees the session first and may answer the event itself. If it
//! finishes the session, the wrapped handler is skipped.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tern_core::TernError;
use tracing::{debug, warn};

use crate::registry::Handler;
use crate::session::SessionContext;

/// A reusable pre-handler step, looked up by name.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    async fn apply(&self, ctx: &mut SessionContext) -> Result<(), TernError>;
}

/// Built-in `echo`: `\echo <text>` is answered with `<text>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoPlugin;

const ECHO_COMMAND: &str = "\\echo";

#[async_trait]
impl Plugin for EchoPlugin {
    fn name(&self) -> &str {
        "echo"
    }

    async fn apply(&self, ctx: &mut SessionContext) -> Result<(), TernError> {
        let Some(message) = ctx.message() else {
            return Ok(());
        };
        let text = message.raw_message.trim();
        let Some(rest) = text.strip_prefix(ECHO_COMMAND) else {
            return Ok(());
        };
        if !(rest.is_empty() || rest.starts_with(char::is_whitespace)) {
            return Ok(());
        }
        let reply = rest.trim().to_string();

        if !reply.is_empty()
            && let Some(Err(e)) = ctx.send_message(reply).await
        {
            warn!(error = %e, "echo reply failed");
        }
        ctx.finish_session();
        Ok(())
    }
}

/// Plugins by name.
#[derive(Default, Clone)]
pub struct PluginRegistry {
    plugins: HashMap<String, Arc<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-loaded with the built-in plugins.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(EchoPlugin));
        registry
    }

    /// Add a plugin, replacing any other with the same name.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        let name = plugin.name().to_string();
        if self.plugins.insert(name.clone(), plugin).is_some() {
            warn!(plugin = %name, "plugin already registered, replacing it");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.plugins.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Put the named plugins in front of `inner` (or in front of nothing).
    pub fn wrap(
        &self,
        names: &[String],
        inner: Option<Arc<dyn Handler>>,
    ) -> Result<Arc<dyn Handler>, TernError> {
        let plugins = names
            .iter()
            .map(|name| {
                self.get(name)
                    .ok_or_else(|| TernError::Config(format!("unknown plugin `{name}`")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Arc::new(PluginChain { plugins, inner }))
    }
}

struct PluginChain {
    plugins: Vec<Arc<dyn Plugin>>,
    inner: Option<Arc<dyn Handler>>,
}

#[async_trait]
impl Handler for PluginChain {
    async fn handle(&self, mut ctx: SessionContext) -> Result<(), TernError> {
        for plugin in &self.plugins {
            plugin.apply(&mut ctx).await?;
            if ctx.is_finished() {
                debug!(plugin = plugin.name(), "plugin finished the session");
                return Ok(());
            }
        }
        match &self.inner {
            Some(handler) => handler.handle(ctx).await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tern_core::{InboundEvent, MessageEvent, SenderInfo};
    use tern_test_utils::MockTransport;

    use super::*;
    use crate::connection::Connection;
    use crate::history::HistoryStore;
    use crate::registry::handler_fn;

    fn ctx_with(raw: &str) -> (SessionContext, MockTransport) {
        let (transport, mock) = MockTransport::pair();
        let conn = Arc::new(Connection::new(transport, Duration::from_millis(50)));
        let event = InboundEvent::PrivateMessage(MessageEvent {
            time: 0,
            self_id: 10,
            sub_type: None,
            message_id: 1,
            user_id: 42,
            group_id: None,
            message: Vec::new(),
            raw_message: raw.to_string(),
            font: 0,
            sender: SenderInfo::default(),
        });
        (
            SessionContext::new(event, conn, Arc::new(HistoryStore::new())),
            mock,
        )
    }

    fn counting() -> (Arc<AtomicUsize>, Arc<dyn Handler>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let handler = handler_fn(move |_ctx| {
            let h = h.clone();
            async move {
                h.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        (hits, handler)
    }

    #[tokio::test(start_paused = true)]
    async fn echo_answers_and_skips_handler() {
        let registry = PluginRegistry::with_builtins();
        let (hits, inner) = counting();
        let chain = registry.wrap(&["echo".to_string()], Some(inner)).unwrap();

        let (ctx, mock) = ctx_with("\\echo hello world");
        chain.handle(ctx).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        let sent = mock.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["params"]["message"], "hello world");
    }

    #[tokio::test]
    async fn non_command_reaches_handler() {
        let registry = PluginRegistry::with_builtins();
        let (hits, inner) = counting();
        let chain = registry.wrap(&["echo".to_string()], Some(inner)).unwrap();

        for raw in ["hello", "\\echoes are loud"] {
            let (ctx, mock) = ctx_with(raw);
            chain.handle(ctx).await.unwrap();
            assert!(mock.sent().is_empty());
        }
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unknown_plugin_is_a_config_error() {
        let registry = PluginRegistry::with_builtins();
        let err = match registry.wrap(&["nope".to_string()], None) {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        assert!(matches!(err, TernError::Config(_)));
        assert_eq!(registry.names(), vec!["echo"]);
    }
}
