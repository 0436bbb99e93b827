// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Tern gateway client.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};
use tern_core::{ConnectionMode, EventCategory};

/// Top-level Tern configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TernConfig {
    /// Bot identity and logging.
    #[serde(default)]
    pub bot: BotConfig,

    /// Gateway connection settings.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Dispatch policies.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Attachment download settings.
    #[serde(default)]
    pub attachments: AttachmentConfig,

    /// Toggles forwarded to external collaborators.
    #[serde(default)]
    pub collaborators: CollaboratorConfig,

    /// Built-in route table used by `tern serve`.
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// Bot identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name used in logs.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_bot_name() -> String {
    "tern".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// How to reach the gateway.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// `forward` dials out, `reverse` accepts one inbound connection.
    #[serde(default)]
    pub mode: ConnectionMode,

    /// Gateway host (forward) or bind address (reverse).
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token sent (forward) or required (reverse).
    #[serde(default)]
    pub access_token: Option<String>,

    /// URL path of the WebSocket endpoint.
    #[serde(default = "default_path")]
    pub path: String,

    /// Upper bound on waiting for a single action reply.
    #[serde(default = "default_action_timeout_ms")]
    pub action_timeout_ms: u64,

    /// Upper bound on establishing the connection.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Optional gateway `appsettings.json` to take connection settings from.
    #[serde(default)]
    pub appsettings_path: Option<String>,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("mode", &self.mode)
            .field("host", &self.host)
            .field("port", &self.port)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("path", &self.path)
            .field("action_timeout_ms", &self.action_timeout_ms)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("appsettings_path", &self.appsettings_path)
            .finish()
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            mode: ConnectionMode::default(),
            host: default_host(),
            port: default_port(),
            access_token: None,
            path: default_path(),
            action_timeout_ms: default_action_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            appsettings_path: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_path() -> String {
    "/".to_string()
}

fn default_action_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

/// Whether handlers for the same scope may overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingPolicy {
    /// Every event is dispatched on its own task.
    #[default]
    Concurrent,
    /// Events for one scope run one at a time, in arrival order.
    Serialized,
}

/// What happens when a second registration targets an occupied scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Last writer wins, with a warning.
    #[default]
    Replace,
    /// The later registration is refused.
    Reject,
}

/// Dispatch engine policies.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    #[serde(default)]
    pub ordering: OrderingPolicy,

    #[serde(default)]
    pub duplicate_registration: DuplicatePolicy,
}

/// Attachment auto-download configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AttachmentConfig {
    /// Directory downloaded images are written to.
    #[serde(default = "default_attachment_dir")]
    pub dir: String,

    /// Per-download HTTP timeout.
    #[serde(default = "default_attachment_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            dir: default_attachment_dir(),
            timeout_secs: default_attachment_timeout_secs(),
        }
    }
}

fn default_attachment_dir() -> String {
    "downloads".to_string()
}

fn default_attachment_timeout_secs() -> u64 {
    30
}

/// Toggles for auxiliary collaborators. Not interpreted by the runtime.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CollaboratorConfig {
    #[serde(default)]
    pub history_persistence: bool,

    #[serde(default)]
    pub semantic_memory: bool,

    #[serde(default)]
    pub web_search: bool,

    /// Port for a collaborator-hosted service (e.g. a tool server).
    #[serde(default)]
    pub port: Option<u16>,

    /// Outbound proxy for collaborators that reach the internet.
    #[serde(default)]
    pub proxy: Option<String>,
}

/// Route kinds accepted in `[[routes]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    Private,
    Group,
    GroupIncrease,
    OfflineFile,
    AddRequest,
}

impl RouteKind {
    pub fn category(self) -> EventCategory {
        match self {
            RouteKind::Private => EventCategory::PrivateMessage,
            RouteKind::Group => EventCategory::GroupMessage,
            RouteKind::GroupIncrease => EventCategory::GroupIncrease,
            RouteKind::OfflineFile => EventCategory::OfflineFile,
            RouteKind::AddRequest => EventCategory::AddRequest,
        }
    }
}

/// One entry of the built-in route table.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    pub kind: RouteKind,

    /// User or group id. Omitted for global kinds.
    #[serde(default)]
    pub id: Option<i64>,

    /// Named plugins run in order before the route's handler.
    #[serde(default)]
    pub plugins: Vec<String>,

    #[serde(default)]
    pub require_mention: bool,

    #[serde(default)]
    pub require_admin: bool,

    /// Recent-history buffer capacity; 0 disables the buffer.
    #[serde(default)]
    pub history_size: usize,

    #[serde(default)]
    pub auto_download: bool,
}
