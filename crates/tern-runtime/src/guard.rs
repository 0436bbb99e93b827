// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pre-handler guards.
//!
//! A guard inspects (and may rewrite) the session before the handler runs and
//! either lets dispatch continue or aborts it. The built-in guards run in a
//! fixed order: admin check, mention strip, auto-download, then any custom
//! guards in the order they were added.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tern_core::{InboundEvent, MessageEvent, Segment, UserId};
use tracing::{debug, warn};

use crate::attachments::AttachmentFetcher;
use crate::registry::GuardConfig;
use crate::session::SessionContext;

/// Verdict of one guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Continue,
    Abort(String),
}

/// A composable pre-handler check or transform.
#[async_trait]
pub trait Guard: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self, ctx: &mut SessionContext) -> GuardOutcome;
}

/// The sender must be owner or admin of the group.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireAdmin;

#[async_trait]
impl Guard for RequireAdmin {
    fn name(&self) -> &str {
        "require_admin"
    }

    async fn check(&self, ctx: &mut SessionContext) -> GuardOutcome {
        let (group_id, user_id) = match ctx.event() {
            InboundEvent::GroupMessage(m) => match m.group_id {
                Some(g) => (g, m.user_id),
                None => return GuardOutcome::Abort("message has no group".into()),
            },
            _ => return GuardOutcome::Abort("not a group message".into()),
        };

        match ctx.get_group_member_info(group_id, user_id, true).await {
            Ok(info) => match info.get("role").and_then(Value::as_str) {
                Some("owner" | "admin") => GuardOutcome::Continue,
                role => GuardOutcome::Abort(format!(
                    "sender role is {}",
                    role.unwrap_or("unknown")
                )),
            },
            Err(e) => GuardOutcome::Abort(format!("role lookup failed: {e}")),
        }
    }
}

/// The message must open with a mention of the bot; the mention is removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireMention;

#[async_trait]
impl Guard for RequireMention {
    fn name(&self) -> &str {
        "require_mention"
    }

    async fn check(&self, ctx: &mut SessionContext) -> GuardOutcome {
        let Some(self_id) = ctx.self_id() else {
            return GuardOutcome::Abort("own account id not known yet".into());
        };
        let nickname = ctx.nickname().map(str::to_string);
        match ctx.event_mut().as_message_mut() {
            Some(message) => {
                if strip_mention(message, self_id, nickname.as_deref()) {
                    GuardOutcome::Continue
                } else {
                    GuardOutcome::Abort("first segment is not a mention of the bot".into())
                }
            }
            None => GuardOutcome::Abort("not a message".into()),
        }
    }
}

/// Remove a leading mention of `self_id` from the segments and the raw text.
///
/// `nickname` is the bot's display name, used to find the end of an `@Name`
/// prefix in the raw text. Returns `false`, leaving the message untouched, if
/// the first segment is not such a mention.
pub fn strip_mention(message: &mut MessageEvent, self_id: UserId, nickname: Option<&str>) -> bool {
    let target = self_id.to_string();
    let mentioned = message
        .message
        .first()
        .and_then(Segment::at_target)
        .is_some_and(|t| t == target);
    if !mentioned {
        return false;
    }

    message.message.remove(0);
    if let Some(first) = message.message.first_mut()
        && first.kind == "text"
        && let Some(Value::String(text)) = first.data.get_mut("text")
    {
        let trimmed = text.trim_start().to_string();
        *text = trimmed;
    }
    message.raw_message = strip_raw_mention(&message.raw_message, &target, nickname).to_string();
    true
}

/// Drop `[CQ:at,qq=<id>...]` or an `@Name` prefix from the start of `raw`.
///
/// With a known nickname only `@<nickname>` is removed. Without one the
/// first whitespace-delimited token is taken as the name.
fn strip_raw_mention<'a>(raw: &'a str, target: &str, nickname: Option<&str>) -> &'a str {
    let cq_prefix = format!("[CQ:at,qq={target}");
    let rest = if let Some(rest) = raw.strip_prefix(cq_prefix.as_str())
        && (rest.starts_with(']') || rest.starts_with(','))
        && let Some(end) = rest.find(']')
    {
        &rest[end + 1..]
    } else if let Some(named) = raw.strip_prefix('@') {
        match nickname.filter(|n| !n.is_empty()) {
            Some(nick) => named.strip_prefix(nick).unwrap_or(raw),
            None => raw.find(char::is_whitespace).map_or("", |i| &raw[i..]),
        }
    } else {
        raw
    };
    rest.trim_start()
}

/// Saves every image in the message in the background. Never aborts.
pub struct AutoDownload {
    fetcher: Arc<dyn AttachmentFetcher>,
}

impl AutoDownload {
    pub fn new(fetcher: Arc<dyn AttachmentFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Guard for AutoDownload {
    fn name(&self) -> &str {
        "auto_download"
    }

    async fn check(&self, ctx: &mut SessionContext) -> GuardOutcome {
        let Some(message) = ctx.message() else {
            return GuardOutcome::Continue;
        };
        for image in message.images() {
            let Some(url) = image.image_url() else {
                continue;
            };
            let url = url.to_string();
            let name = image.file_name().map(str::to_string);
            let fetcher = self.fetcher.clone();
            tokio::spawn(async move {
                if let Err(e) = fetcher.fetch(&url, name.as_deref()).await {
                    warn!(url = %url, error = %e, "image auto-download failed");
                }
            });
        }
        GuardOutcome::Continue
    }
}

/// A guard aborted dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardAbort {
    pub guard: String,
    pub reason: String,
}

/// Ordered list of guards for one registration.
#[derive(Clone, Default)]
pub struct GuardChain {
    guards: Vec<Arc<dyn Guard>>,
}

impl GuardChain {
    pub fn new(guards: Vec<Arc<dyn Guard>>) -> Self {
        Self { guards }
    }

    /// Build the chain a registration's config asks for.
    ///
    /// Auto-download is skipped when no fetcher is available.
    pub fn for_config(config: &GuardConfig, fetcher: Option<&Arc<dyn AttachmentFetcher>>) -> Self {
        let mut guards: Vec<Arc<dyn Guard>> = Vec::new();
        if config.require_admin {
            guards.push(Arc::new(RequireAdmin));
        }
        if config.require_mention {
            guards.push(Arc::new(RequireMention));
        }
        if config.auto_download {
            match fetcher {
                Some(fetcher) => guards.push(Arc::new(AutoDownload::new(fetcher.clone()))),
                None => debug!("auto_download requested but no attachment fetcher is configured"),
            }
        }
        guards.extend(config.extra.iter().cloned());
        Self { guards }
    }

    pub fn names(&self) -> Vec<&str> {
        self.guards.iter().map(|g| g.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Run every guard in order, stopping at the first abort.
    pub async fn run(&self, ctx: &mut SessionContext) -> Result<(), GuardAbort> {
        for guard in &self.guards {
            if let GuardOutcome::Abort(reason) = guard.check(ctx).await {
                return Err(GuardAbort {
                    guard: guard.name().to_string(),
                    reason,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tern_core::SenderInfo;

    use super::*;

    fn group_message(segments: Vec<Segment>, raw: &str) -> MessageEvent {
        MessageEvent {
            time: 0,
            self_id: 10,
            sub_type: None,
            message_id: 1,
            user_id: 42,
            group_id: Some(7),
            message: segments,
            raw_message: raw.to_string(),
            font: 0,
            sender: SenderInfo::default(),
        }
    }

    #[test]
    fn strips_leading_self_mention() {
        let mut m = group_message(vec![Segment::at(10), Segment::text("hello")], "@Bot hello");
        assert!(strip_mention(&mut m, 10, Some("Bot")));
        assert_eq!(m.message, vec![Segment::text("hello")]);
        assert_eq!(m.raw_message, "hello");
    }

    #[test]
    fn strips_cq_coded_prefix() {
        let mut m = group_message(
            vec![Segment::at(10), Segment::text(" ping")],
            "[CQ:at,qq=10] ping",
        );
        assert!(strip_mention(&mut m, 10, None));
        assert_eq!(m.message, vec![Segment::text("ping")]);
        assert_eq!(m.raw_message, "ping");

        let mut named = group_message(vec![Segment::at(10)], "[CQ:at,qq=10,name=Bot]go");
        assert!(strip_mention(&mut named, 10, None));
        assert_eq!(named.raw_message, "go");
    }

    #[test]
    fn string_qq_is_accepted() {
        let at = Segment::new("at", json!({"qq": "10"}));
        let mut m = group_message(vec![at, Segment::text("x")], "@Bot x");
        assert!(strip_mention(&mut m, 10, None));
    }

    #[test]
    fn other_mentions_are_left_alone() {
        let mut m = group_message(vec![Segment::at(99), Segment::text("hi")], "@Other hi");
        assert!(!strip_mention(&mut m, 10, None));
        assert_eq!(m.message.len(), 2);
        assert_eq!(m.raw_message, "@Other hi");

        let mut late = group_message(vec![Segment::text("hi "), Segment::at(10)], "hi @Bot");
        assert!(!strip_mention(&mut late, 10, None));

        let mut empty = group_message(Vec::new(), "");
        assert!(!strip_mention(&mut empty, 10, None));
    }

    #[test]
    fn raw_mention_only_leaves_empty_text() {
        assert_eq!(strip_raw_mention("@Bot", "10", None), "");
        assert_eq!(strip_raw_mention("@Bot", "10", Some("Bot")), "");
        assert_eq!(strip_raw_mention("[CQ:at,qq=10]", "10", Some("Bot")), "");
        assert_eq!(strip_raw_mention("plain", "10", None), "plain");
    }

    #[test]
    fn multi_word_nickname_is_removed_whole() {
        let mut m = group_message(
            vec![Segment::at(10), Segment::text(" hello")],
            "@Tern Bot hello",
        );
        assert!(strip_mention(&mut m, 10, Some("Tern Bot")));
        assert_eq!(m.message, vec![Segment::text("hello")]);
        assert_eq!(m.raw_message, "hello");
    }

    #[test]
    fn nickname_without_trailing_space_keeps_text() {
        let mut m = group_message(vec![Segment::at(10), Segment::text("hello")], "@Bothello");
        assert!(strip_mention(&mut m, 10, Some("Bot")));
        assert_eq!(m.raw_message, "hello");
    }

    #[test]
    fn unmatched_nickname_leaves_raw_text() {
        assert_eq!(strip_raw_mention("@Someone hi", "10", Some("Bot")), "@Someone hi");
    }

    #[test]
    fn chain_follows_declared_order() {
        let config = GuardConfig::default().require_mention().require_admin();
        let chain = GuardChain::for_config(&config, None);
        assert_eq!(chain.names(), vec!["require_admin", "require_mention"]);

        let config = GuardConfig::default().auto_download();
        assert!(GuardChain::for_config(&config, None).is_empty());
    }
}
