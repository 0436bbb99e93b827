// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The named action catalog on [`SessionContext`].
//!
//! Each method only marshals its parameters and forwards to
//! [`SessionContext::call`]. Parameter names match the gateway's wire names.

use serde_json::{Value, json};
use tern_core::{Action, ActionError, GroupId, Identity, MessageBody, UserId};

use crate::session::SessionContext;

/// Destination for [`SessionContext::send_msg`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTarget {
    Private(UserId),
    Group(GroupId),
}

/// Default mute length for [`SessionContext::set_group_ban`], in seconds.
pub const DEFAULT_BAN_SECS: u64 = 30 * 60;

type ActionResult = Result<Value, ActionError>;

impl SessionContext {
    // Messages

    /// Send a private message with CQ codes interpreted.
    pub async fn send_private_msg(
        &self,
        user_id: UserId,
        message: impl Into<MessageBody> + Send,
    ) -> ActionResult {
        let message = message.into();
        self.call(
            Action::SendPrivateMsg,
            json!({ "user_id": user_id, "message": message, "auto_escape": false }),
        )
        .await
    }

    /// Send a group message with CQ codes interpreted.
    pub async fn send_group_msg(
        &self,
        group_id: GroupId,
        message: impl Into<MessageBody> + Send,
    ) -> ActionResult {
        let message = message.into();
        self.call(
            Action::SendGroupMsg,
            json!({ "group_id": group_id, "message": message, "auto_escape": false }),
        )
        .await
    }

    /// Generic send. `auto_escape` sends CQ codes as literal text.
    pub async fn send_msg(
        &self,
        target: MessageTarget,
        message: impl Into<MessageBody> + Send,
        auto_escape: bool,
    ) -> ActionResult {
        let message = message.into();
        let params = match target {
            MessageTarget::Private(user_id) => json!({
                "message_type": "private",
                "user_id": user_id,
                "message": message,
                "auto_escape": auto_escape,
            }),
            MessageTarget::Group(group_id) => json!({
                "message_type": "group",
                "group_id": group_id,
                "message": message,
                "auto_escape": auto_escape,
            }),
        };
        self.call(Action::SendMsg, params).await
    }

    pub async fn delete_msg(&self, message_id: i64) -> ActionResult {
        self.call(Action::DeleteMsg, json!({ "message_id": message_id }))
            .await
    }

    pub async fn get_msg(&self, message_id: i64) -> ActionResult {
        self.call(Action::GetMsg, json!({ "message_id": message_id }))
            .await
    }

    pub async fn get_forward_msg(&self, id: &str) -> ActionResult {
        self.call(Action::GetForwardMsg, json!({ "id": id })).await
    }

    /// Send `times` profile likes. Most accounts are limited to 10 per day.
    pub async fn send_like(&self, user_id: UserId, times: u32) -> ActionResult {
        self.call(Action::SendLike, json!({ "user_id": user_id, "times": times }))
            .await
    }

    // Group administration

    pub async fn set_group_kick(
        &self,
        group_id: GroupId,
        user_id: UserId,
        reject_add_request: bool,
    ) -> ActionResult {
        self.call(
            Action::SetGroupKick,
            json!({
                "group_id": group_id,
                "user_id": user_id,
                "reject_add_request": reject_add_request,
            }),
        )
        .await
    }

    /// Mute a member for `duration` seconds. Zero lifts the mute.
    pub async fn set_group_ban(
        &self,
        group_id: GroupId,
        user_id: UserId,
        duration: u64,
    ) -> ActionResult {
        self.call(
            Action::SetGroupBan,
            json!({ "group_id": group_id, "user_id": user_id, "duration": duration }),
        )
        .await
    }

    /// Mute an anonymous member identified by the `flag` from their message.
    pub async fn set_group_anonymous_ban(
        &self,
        group_id: GroupId,
        anonymous_flag: &str,
        duration: u64,
    ) -> ActionResult {
        self.call(
            Action::SetGroupAnonymousBan,
            json!({
                "group_id": group_id,
                "anonymous_flag": anonymous_flag,
                "duration": duration,
            }),
        )
        .await
    }

    pub async fn set_group_whole_ban(&self, group_id: GroupId, enable: bool) -> ActionResult {
        self.call(
            Action::SetGroupWholeBan,
            json!({ "group_id": group_id, "enable": enable }),
        )
        .await
    }

    pub async fn set_group_admin(
        &self,
        group_id: GroupId,
        user_id: UserId,
        enable: bool,
    ) -> ActionResult {
        self.call(
            Action::SetGroupAdmin,
            json!({ "group_id": group_id, "user_id": user_id, "enable": enable }),
        )
        .await
    }

    pub async fn set_group_anonymous(&self, group_id: GroupId, enable: bool) -> ActionResult {
        self.call(
            Action::SetGroupAnonymous,
            json!({ "group_id": group_id, "enable": enable }),
        )
        .await
    }

    /// Set a member's group card. An empty card clears it.
    pub async fn set_group_card(
        &self,
        group_id: GroupId,
        user_id: UserId,
        card: &str,
    ) -> ActionResult {
        self.call(
            Action::SetGroupCard,
            json!({ "group_id": group_id, "user_id": user_id, "card": card }),
        )
        .await
    }

    pub async fn set_group_name(&self, group_id: GroupId, group_name: &str) -> ActionResult {
        self.call(
            Action::SetGroupName,
            json!({ "group_id": group_id, "group_name": group_name }),
        )
        .await
    }

    /// Leave the group, or dismiss it if the bot is the owner and `is_dismiss` is set.
    pub async fn set_group_leave(&self, group_id: GroupId, is_dismiss: bool) -> ActionResult {
        self.call(
            Action::SetGroupLeave,
            json!({ "group_id": group_id, "is_dismiss": is_dismiss }),
        )
        .await
    }

    /// `duration` of -1 makes the title permanent.
    pub async fn set_group_special_title(
        &self,
        group_id: GroupId,
        user_id: UserId,
        special_title: &str,
        duration: i64,
    ) -> ActionResult {
        self.call(
            Action::SetGroupSpecialTitle,
            json!({
                "group_id": group_id,
                "user_id": user_id,
                "special_title": special_title,
                "duration": duration,
            }),
        )
        .await
    }

    // Requests

    pub async fn set_friend_add_request(
        &self,
        flag: &str,
        approve: bool,
        remark: &str,
    ) -> ActionResult {
        self.call(
            Action::SetFriendAddRequest,
            json!({ "flag": flag, "approve": approve, "remark": remark }),
        )
        .await
    }

    /// `sub_type` must echo the request's `add` or `invite`.
    pub async fn set_group_add_request(
        &self,
        flag: &str,
        sub_type: &str,
        approve: bool,
        reason: &str,
    ) -> ActionResult {
        self.call(
            Action::SetGroupAddRequest,
            json!({ "flag": flag, "sub_type": sub_type, "approve": approve, "reason": reason }),
        )
        .await
    }

    // Account and group queries

    /// The bot's own account id and nickname.
    pub async fn get_login_info(&self) -> Result<Identity, ActionError> {
        self.call_as(Action::GetLoginInfo, json!({})).await
    }

    pub async fn get_stranger_info(&self, user_id: UserId, no_cache: bool) -> ActionResult {
        self.call(
            Action::GetStrangerInfo,
            json!({ "user_id": user_id, "no_cache": no_cache }),
        )
        .await
    }

    pub async fn get_friend_list(&self) -> ActionResult {
        self.call(Action::GetFriendList, json!({})).await
    }

    pub async fn get_group_info(&self, group_id: GroupId, no_cache: bool) -> ActionResult {
        self.call(
            Action::GetGroupInfo,
            json!({ "group_id": group_id, "no_cache": no_cache }),
        )
        .await
    }

    pub async fn get_group_list(&self) -> ActionResult {
        self.call(Action::GetGroupList, json!({})).await
    }

    pub async fn get_group_member_info(
        &self,
        group_id: GroupId,
        user_id: UserId,
        no_cache: bool,
    ) -> ActionResult {
        self.call(
            Action::GetGroupMemberInfo,
            json!({ "group_id": group_id, "user_id": user_id, "no_cache": no_cache }),
        )
        .await
    }

    pub async fn get_group_member_list(&self, group_id: GroupId) -> ActionResult {
        self.call(Action::GetGroupMemberList, json!({ "group_id": group_id }))
            .await
    }

    /// `kind` is one of `talkative`, `performer`, `legend`, `strong_newbie`,
    /// `emotion` or `all`.
    pub async fn get_group_honor_info(&self, group_id: GroupId, kind: &str) -> ActionResult {
        self.call(
            Action::GetGroupHonorInfo,
            json!({ "group_id": group_id, "type": kind }),
        )
        .await
    }

    // Credentials

    pub async fn get_cookies(&self, domain: &str) -> ActionResult {
        self.call(Action::GetCookies, json!({ "domain": domain }))
            .await
    }

    pub async fn get_csrf_token(&self) -> ActionResult {
        self.call(Action::GetCsrfToken, json!({})).await
    }

    pub async fn get_credentials(&self, domain: &str) -> ActionResult {
        self.call(Action::GetCredentials, json!({ "domain": domain }))
            .await
    }

    // Media

    /// Fetch a voice record converted to `out_format` (`mp3`, `amr`, `wav`, ...).
    pub async fn get_record(&self, file: &str, out_format: &str) -> ActionResult {
        self.call(
            Action::GetRecord,
            json!({ "file": file, "out_format": out_format }),
        )
        .await
    }

    pub async fn get_image(&self, file: &str) -> ActionResult {
        self.call(Action::GetImage, json!({ "file": file })).await
    }

    pub async fn can_send_image(&self) -> ActionResult {
        self.call(Action::CanSendImage, json!({})).await
    }

    pub async fn can_send_record(&self) -> ActionResult {
        self.call(Action::CanSendRecord, json!({})).await
    }

    // Gateway

    pub async fn get_status(&self) -> ActionResult {
        self.call(Action::GetStatus, json!({})).await
    }

    pub async fn get_version_info(&self) -> ActionResult {
        self.call(Action::GetVersionInfo, json!({})).await
    }

    pub async fn set_restart(&self, delay_ms: u64) -> ActionResult {
        self.call(Action::SetRestart, json!({ "delay": delay_ms }))
            .await
    }

    pub async fn clean_cache(&self) -> ActionResult {
        self.call(Action::CleanCache, json!({})).await
    }

    // Files

    /// Upload a local file (path on the gateway host) to a private chat.
    pub async fn upload_private_file(
        &self,
        user_id: UserId,
        file: &str,
        name: &str,
    ) -> ActionResult {
        self.call(
            Action::UploadPrivateFile,
            json!({ "user_id": user_id, "file": file, "name": name }),
        )
        .await
    }

    pub async fn upload_group_file(
        &self,
        group_id: GroupId,
        file: &str,
        name: &str,
    ) -> ActionResult {
        self.call(
            Action::UploadGroupFile,
            json!({ "group_id": group_id, "file": file, "name": name }),
        )
        .await
    }

    // Group notices

    pub async fn send_group_notice(&self, group_id: GroupId, content: &str) -> ActionResult {
        self.call(
            Action::SendGroupNotice,
            json!({ "group_id": group_id, "content": content }),
        )
        .await
    }

    pub async fn get_group_notice(&self, group_id: GroupId) -> ActionResult {
        self.call(Action::GetGroupNotice, json!({ "group_id": group_id }))
            .await
    }

    // History

    /// Up to `count` messages before `message_id`, or the latest if `None`.
    pub async fn get_friend_msg_history(
        &self,
        user_id: UserId,
        message_id: Option<i64>,
        count: u32,
    ) -> ActionResult {
        self.call(
            Action::GetFriendMsgHistory,
            history_params("user_id", user_id, message_id, count),
        )
        .await
    }

    pub async fn get_group_msg_history(
        &self,
        group_id: GroupId,
        message_id: Option<i64>,
        count: u32,
    ) -> ActionResult {
        self.call(
            Action::GetGroupMsgHistory,
            history_params("group_id", group_id, message_id, count),
        )
        .await
    }
}

fn history_params(key: &str, id: i64, message_id: Option<i64>, count: u32) -> Value {
    let mut params = serde_json::Map::new();
    params.insert(key.to_string(), json!(id));
    params.insert("count".to_string(), json!(count));
    if let Some(message_id) = message_id {
        params.insert("message_id".to_string(), json!(message_id));
    }
    Value::Object(params)
}
