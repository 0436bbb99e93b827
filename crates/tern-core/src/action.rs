// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The fixed catalog of gateway actions.

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Every action the session context can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    SendPrivateMsg,
    SendGroupMsg,
    SendMsg,
    DeleteMsg,
    GetMsg,
    GetForwardMsg,
    SendLike,
    SetGroupKick,
    SetGroupBan,
    SetGroupAnonymousBan,
    SetGroupWholeBan,
    SetGroupAdmin,
    SetGroupAnonymous,
    SetGroupCard,
    SetGroupName,
    SetGroupLeave,
    SetGroupSpecialTitle,
    SetFriendAddRequest,
    SetGroupAddRequest,
    GetLoginInfo,
    GetStrangerInfo,
    GetFriendList,
    GetGroupInfo,
    GetGroupList,
    GetGroupMemberInfo,
    GetGroupMemberList,
    GetGroupHonorInfo,
    GetCookies,
    GetCsrfToken,
    GetCredentials,
    GetRecord,
    GetImage,
    CanSendImage,
    CanSendRecord,
    GetStatus,
    GetVersionInfo,
    SetRestart,
    CleanCache,
    UploadPrivateFile,
    UploadGroupFile,
    #[strum(serialize = "_send_group_notice")]
    SendGroupNotice,
    #[strum(serialize = "_get_group_notice")]
    GetGroupNotice,
    GetFriendMsgHistory,
    GetGroupMsgHistory,
}

impl Action {
    /// Wire name of the action.
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn wire_names() {
        assert_eq!(Action::SendPrivateMsg.as_str(), "send_private_msg");
        assert_eq!(Action::GetCsrfToken.as_str(), "get_csrf_token");
        assert_eq!(Action::SendGroupNotice.as_str(), "_send_group_notice");
        assert_eq!(Action::GetGroupNotice.to_string(), "_get_group_notice");
    }

    #[test]
    fn names_parse_back() {
        for action in Action::iter() {
            assert_eq!(Action::from_str(action.as_str()).unwrap(), action);
        }
    }
}
