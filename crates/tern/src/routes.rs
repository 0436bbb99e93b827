// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `[[routes]]` table: one registration per configured route.

use std::sync::Arc;

use async_trait::async_trait;
use tern_config::model::RouteConfig;
use tern_core::{Scope, TernError};
use tern_runtime::{
    GuardConfig, Handler, PluginRegistry, RegistrationHandle, RegistrationTable, SessionContext,
};
use tracing::{debug, info};

/// Logs every event a route receives. Runs after the route's plugins.
struct LogEvent;

#[async_trait]
impl Handler for LogEvent {
    async fn handle(&self, ctx: SessionContext) -> Result<(), TernError> {
        let event = ctx.event();
        info!(
            category = ?event.category(),
            scope = %event.scope(),
            user_id = ?event.user_id(),
            text = %ctx.raw_text(""),
            "event received"
        );
        Ok(())
    }
}

fn scope_for(route: &RouteConfig) -> Result<Scope, TernError> {
    let category = route.kind.category();
    if category.is_global() {
        return Ok(Scope::Global);
    }
    let id = route
        .id
        .ok_or_else(|| TernError::Config(format!("route `{category}` needs an id")))?;
    Ok(match category {
        tern_core::EventCategory::PrivateMessage => Scope::User(id),
        _ => Scope::Group(id),
    })
}

fn guards_for(route: &RouteConfig) -> GuardConfig {
    let mut guards = GuardConfig::default().history(route.history_size);
    if route.require_mention {
        guards = guards.require_mention();
    }
    if route.require_admin {
        guards = guards.require_admin();
    }
    if route.auto_download {
        guards = guards.auto_download();
    }
    // Several global routes are intended when configured.
    if route.kind.category().is_global() {
        guards = guards.ignore_warning();
    }
    guards
}

/// Register every route in `routes`.
pub fn install_routes(
    registry: &RegistrationTable,
    routes: &[RouteConfig],
    plugins: &PluginRegistry,
) -> Result<Vec<RegistrationHandle>, TernError> {
    let log: Arc<dyn Handler> = Arc::new(LogEvent);
    routes
        .iter()
        .map(|route| {
            let scope = scope_for(route)?;
            let handler = plugins.wrap(&route.plugins, Some(log.clone()))?;
            let handle =
                registry.register(route.kind.category(), scope, handler, guards_for(route))?;
            debug!(category = %handle.category, scope = %scope, plugins = ?route.plugins, "route installed");
            Ok(handle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tern_config::model::RouteKind;
    use tern_core::EventCategory;
    use tern_test_utils::{TestHarness, frames};

    use super::*;

    fn route(kind: RouteKind, id: Option<i64>) -> RouteConfig {
        RouteConfig {
            kind,
            id,
            plugins: Vec::new(),
            require_mention: false,
            require_admin: false,
            history_size: 0,
            auto_download: false,
        }
    }

    #[test]
    fn scopes_follow_route_kind() {
        assert_eq!(scope_for(&route(RouteKind::Private, Some(1))).unwrap(), Scope::User(1));
        assert_eq!(scope_for(&route(RouteKind::Group, Some(2))).unwrap(), Scope::Group(2));
        assert_eq!(
            scope_for(&route(RouteKind::GroupIncrease, Some(3))).unwrap(),
            Scope::Group(3)
        );
        assert_eq!(scope_for(&route(RouteKind::AddRequest, None)).unwrap(), Scope::Global);
        assert!(scope_for(&route(RouteKind::Private, None)).is_err());
    }

    #[test]
    fn install_rejects_unknown_plugins_and_bad_guards() {
        let registry = RegistrationTable::new(Default::default());
        let plugins = PluginRegistry::with_builtins();

        let mut unknown = route(RouteKind::Private, Some(1));
        unknown.plugins = vec!["nope".into()];
        assert!(matches!(
            install_routes(&registry, &[unknown], &plugins),
            Err(TernError::Config(_))
        ));

        let mut mention = route(RouteKind::Private, Some(1));
        mention.require_mention = true;
        assert!(matches!(
            install_routes(&registry, &[mention], &plugins),
            Err(TernError::Registration(_))
        ));
    }

    #[test]
    fn installs_one_registration_per_route() {
        let registry = RegistrationTable::new(Default::default());
        let plugins = PluginRegistry::with_builtins();
        let routes = vec![
            route(RouteKind::Private, Some(1)),
            route(RouteKind::Group, Some(2)),
            route(RouteKind::OfflineFile, None),
            route(RouteKind::OfflineFile, None),
        ];
        let handles = install_routes(&registry, &routes, &plugins).unwrap();
        assert_eq!(handles.len(), 4);
        assert!(registry.lookup(EventCategory::GroupMessage, Scope::Group(2)).is_some());
        assert_eq!(registry.globals(EventCategory::OfflineFile).len(), 2);
    }

    #[tokio::test]
    async fn echo_route_answers_in_group() {
        let mut harness = TestHarness::builder()
            .with_reply("send_group_msg", json!({"message_id": 3}))
            .build()
            .await
            .unwrap();
        let mut echo = route(RouteKind::Group, Some(5));
        echo.plugins = vec!["echo".into()];
        install_routes(harness.registry(), &[echo], &PluginRegistry::with_builtins()).unwrap();

        harness.start_running().await.unwrap();
        harness.inject(frames::group_message(5, 42, "\\echo ping"));

        let sent = harness.transport().wait_for_sent(2).await;
        assert_eq!(sent[1]["action"], "send_group_msg");
        assert_eq!(sent[1]["params"]["group_id"], 5);
        assert_eq!(sent[1]["params"]["message"], "ping");
        harness.stop().await.unwrap();
    }
}
