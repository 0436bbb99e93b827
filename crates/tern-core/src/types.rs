// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common identifiers shared by the transport, dispatch and lifecycle layers.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Numeric account identifier on the chat platform.
pub type UserId = i64;

/// Numeric group identifier on the chat platform.
pub type GroupId = i64;

/// The conversation a registration is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// One private conversation, keyed by the peer's user id.
    User(UserId),
    /// One group conversation.
    Group(GroupId),
    /// Unscoped categories (offline files, add requests).
    Global,
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::User(id) => write!(f, "user:{id}"),
            Scope::Group(id) => write!(f, "group:{id}"),
            Scope::Global => write!(f, "global"),
        }
    }
}

/// Dispatchable event categories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    PrivateMessage,
    GroupMessage,
    GroupIncrease,
    OfflineFile,
    AddRequest,
}

impl EventCategory {
    /// Categories whose registrations are not tied to one conversation.
    pub fn is_global(self) -> bool {
        matches!(self, EventCategory::OfflineFile | EventCategory::AddRequest)
    }

    /// Whether `scope` is an acceptable key for this category.
    pub fn accepts(self, scope: Scope) -> bool {
        match self {
            EventCategory::PrivateMessage => matches!(scope, Scope::User(_)),
            EventCategory::GroupMessage | EventCategory::GroupIncrease => {
                matches!(scope, Scope::Group(_))
            }
            EventCategory::OfflineFile | EventCategory::AddRequest => scope == Scope::Global,
        }
    }
}

/// Which side opens the socket.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMode {
    /// Dial out to the gateway.
    #[default]
    Forward,
    /// Listen and accept exactly one inbound connection from the gateway.
    Reverse,
}

/// The bot's own account, learned from the identity query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub nickname: String,
}
