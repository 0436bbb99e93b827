// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed inbound events.
//!
//! These are the payload structs the classifier produces from raw event
//! frames. Unknown fields are tolerated since gateways add extensions freely.

use serde::{Deserialize, Serialize};

use crate::segment::{Segment, deserialize_segments};
use crate::types::{EventCategory, GroupId, Scope, UserId};

/// Sender block attached to message events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SenderInfo {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub nickname: Option<String>,
    /// Group card (display name inside the group).
    #[serde(default)]
    pub card: Option<String>,
    /// `owner`, `admin` or `member` for group messages.
    #[serde(default)]
    pub role: Option<String>,
}

/// A private or group chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub self_id: UserId,
    #[serde(default)]
    pub sub_type: Option<String>,
    #[serde(default)]
    pub message_id: i64,
    pub user_id: UserId,
    #[serde(default)]
    pub group_id: Option<GroupId>,
    #[serde(default, deserialize_with = "deserialize_segments")]
    pub message: Vec<Segment>,
    #[serde(default)]
    pub raw_message: String,
    #[serde(default)]
    pub font: i64,
    #[serde(default)]
    pub sender: SenderInfo,
}

impl MessageEvent {
    /// Image segments in this message.
    pub fn images(&self) -> impl Iterator<Item = &Segment> {
        self.message.iter().filter(|s| s.kind == "image")
    }
}

/// Someone joined a group (`notice_type = group_increase`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupIncreaseNotice {
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub self_id: UserId,
    /// `approve` or `invite`.
    #[serde(default)]
    pub sub_type: Option<String>,
    pub group_id: GroupId,
    pub user_id: UserId,
    #[serde(default)]
    pub operator_id: UserId,
}

/// File metadata carried by an offline file notice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfflineFile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub url: String,
}

/// A peer sent a file outside of a conversation (`notice_type = offline_file`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineFileNotice {
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub self_id: UserId,
    pub user_id: UserId,
    #[serde(default)]
    pub file: OfflineFile,
}

/// Which kind of add request arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    #[serde(alias = "private")]
    Friend,
    Group,
}

/// A friend request or a group join/invite request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddRequest {
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub self_id: UserId,
    #[serde(rename = "request_type")]
    pub kind: RequestKind,
    /// `add` or `invite` for group requests.
    #[serde(default)]
    pub sub_type: Option<String>,
    pub user_id: UserId,
    #[serde(default)]
    pub group_id: Option<GroupId>,
    #[serde(default)]
    pub comment: String,
    /// Opaque token to pass back when approving or rejecting.
    #[serde(default)]
    pub flag: String,
}

/// Heartbeat, lifecycle, or a synthetic placeholder for hook contexts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaEvent {
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub self_id: UserId,
    #[serde(default)]
    pub meta_event_type: String,
}

impl MetaEvent {
    /// The placeholder event wrapped by bootstrap contexts (identify, hooks, jobs).
    pub fn bootstrap() -> Self {
        Self {
            time: 0,
            self_id: 0,
            meta_event_type: "bootstrap".to_string(),
        }
    }
}

/// A classified inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    PrivateMessage(MessageEvent),
    GroupMessage(MessageEvent),
    GroupIncrease(GroupIncreaseNotice),
    OfflineFile(OfflineFileNotice),
    AddRequest(AddRequest),
    Meta(MetaEvent),
}

impl InboundEvent {
    /// The dispatch category, or `None` for meta/bootstrap events.
    pub fn category(&self) -> Option<EventCategory> {
        match self {
            InboundEvent::PrivateMessage(_) => Some(EventCategory::PrivateMessage),
            InboundEvent::GroupMessage(_) => Some(EventCategory::GroupMessage),
            InboundEvent::GroupIncrease(_) => Some(EventCategory::GroupIncrease),
            InboundEvent::OfflineFile(_) => Some(EventCategory::OfflineFile),
            InboundEvent::AddRequest(_) => Some(EventCategory::AddRequest),
            InboundEvent::Meta(_) => None,
        }
    }

    /// The registration key this event is looked up under.
    pub fn scope(&self) -> Scope {
        match self {
            InboundEvent::PrivateMessage(m) => Scope::User(m.user_id),
            InboundEvent::GroupMessage(m) => match m.group_id {
                Some(g) => Scope::Group(g),
                None => Scope::User(m.user_id),
            },
            InboundEvent::GroupIncrease(n) => Scope::Group(n.group_id),
            InboundEvent::OfflineFile(_) | InboundEvent::AddRequest(_) | InboundEvent::Meta(_) => {
                Scope::Global
            }
        }
    }

    pub fn time(&self) -> i64 {
        match self {
            InboundEvent::PrivateMessage(m) | InboundEvent::GroupMessage(m) => m.time,
            InboundEvent::GroupIncrease(n) => n.time,
            InboundEvent::OfflineFile(n) => n.time,
            InboundEvent::AddRequest(r) => r.time,
            InboundEvent::Meta(m) => m.time,
        }
    }

    /// The acting user, when the event has one.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            InboundEvent::PrivateMessage(m) | InboundEvent::GroupMessage(m) => Some(m.user_id),
            InboundEvent::GroupIncrease(n) => Some(n.user_id),
            InboundEvent::OfflineFile(n) => Some(n.user_id),
            InboundEvent::AddRequest(r) => Some(r.user_id),
            InboundEvent::Meta(_) => None,
        }
    }

    pub fn group_id(&self) -> Option<GroupId> {
        match self {
            InboundEvent::PrivateMessage(_) => None,
            InboundEvent::GroupMessage(m) => m.group_id,
            InboundEvent::GroupIncrease(n) => Some(n.group_id),
            InboundEvent::AddRequest(r) => r.group_id,
            InboundEvent::OfflineFile(_) | InboundEvent::Meta(_) => None,
        }
    }

    /// The message payload for message events.
    pub fn as_message(&self) -> Option<&MessageEvent> {
        match self {
            InboundEvent::PrivateMessage(m) | InboundEvent::GroupMessage(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_message_mut(&mut self) -> Option<&mut MessageEvent> {
        match self {
            InboundEvent::PrivateMessage(m) | InboundEvent::GroupMessage(m) => Some(m),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn message_event_accepts_string_body() {
        let ev: MessageEvent = serde_json::from_value(json!({
            "user_id": 10,
            "message": "hello there",
            "raw_message": "hello there"
        }))
        .unwrap();
        assert_eq!(ev.message.len(), 1);
        assert_eq!(ev.message[0].as_text(), Some("hello there"));
    }

    #[test]
    fn group_message_scope_is_group() {
        let ev: MessageEvent = serde_json::from_value(json!({
            "user_id": 10,
            "group_id": 99,
            "message": [{"type": "text", "data": {"text": "x"}}]
        }))
        .unwrap();
        let inbound = InboundEvent::GroupMessage(ev);
        assert_eq!(inbound.scope(), Scope::Group(99));
        assert_eq!(inbound.category(), Some(EventCategory::GroupMessage));
        assert_eq!(inbound.user_id(), Some(10));
    }

    #[test]
    fn add_request_reads_request_type() {
        let req: AddRequest = serde_json::from_value(json!({
            "request_type": "group",
            "sub_type": "invite",
            "user_id": 5,
            "group_id": 6,
            "flag": "abc"
        }))
        .unwrap();
        assert_eq!(req.kind, RequestKind::Group);
        assert_eq!(req.flag, "abc");
        assert_eq!(InboundEvent::AddRequest(req).scope(), Scope::Global);
    }

    #[test]
    fn bootstrap_meta_has_no_category() {
        let ev = InboundEvent::Meta(MetaEvent::bootstrap());
        assert_eq!(ev.category(), None);
        assert_eq!(ev.user_id(), None);
    }
}
