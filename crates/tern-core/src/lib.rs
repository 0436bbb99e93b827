// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Tern gateway client.
//!
//! Provides the error taxonomy, wire frames, typed events, message segments,
//! the action catalog and the transport traits shared by every other crate
//! in the workspace.

pub mod action;
pub mod error;
pub mod event;
pub mod frame;
pub mod segment;
pub mod traits;
pub mod types;

pub use action::Action;
pub use error::{ActionError, TernError};
pub use event::{
    AddRequest, GroupIncreaseNotice, InboundEvent, MessageEvent, MetaEvent, OfflineFile,
    OfflineFileNotice, RequestKind, SenderInfo,
};
pub use frame::{ActionRequest, ActionResponse, FrameKind};
pub use segment::{MessageBody, Segment};
pub use traits::{Connector, Transport};
pub use types::{ConnectionMode, EventCategory, GroupId, Identity, Scope, UserId};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tern_error_has_all_variants() {
        let _config = TernError::Config("test".into());
        let _transport = TernError::Transport {
            message: "test".into(),
            source: Some(Box::new(std::io::Error::other("test"))),
        };
        let _identify = TernError::Identify(ActionError::Closed);
        let _registration = TernError::Registration("test".into());
        let _handler = TernError::Handler("test".into());
        let _action = TernError::Action(ActionError::Decode {
            message: "test".into(),
        });
        let _internal = TernError::Internal("test".into());
    }

    #[test]
    fn transport_shorthand_has_no_source() {
        use std::error::Error as _;
        let err = TernError::transport("socket closed");
        assert_eq!(err.to_string(), "transport error: socket closed");
        assert!(err.source().is_none());
    }
}
