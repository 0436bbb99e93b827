// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Tern gateway client.
//!
//! Two layers exist. [`ActionError`] is the failure value handed back to
//! handler code by every protocol action; it never escapes as a panic.
//! [`TernError`] is the process-level error used by the lifecycle, the
//! configuration bridge and handler return values.

use std::time::Duration;

use thiserror::Error;

/// Failure value returned by a single outbound action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// The frame could not be written to the socket.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// No reply with a matching echo arrived in time.
    #[error("action `{action}` timed out after {duration:?}")]
    Timeout { action: String, duration: Duration },

    /// The gateway answered but rejected the action.
    #[error("action `{action}` failed with retcode {retcode}: {message}")]
    Protocol {
        action: String,
        retcode: i64,
        message: String,
    },

    /// The session context was finished before the call.
    #[error("session already finished, refusing `{action}`")]
    SessionEnded { action: String },

    /// The connection closed while the request was pending.
    #[error("connection closed")]
    Closed,

    /// The reply payload did not have the expected shape.
    #[error("failed to decode reply: {message}")]
    Decode { message: String },
}

impl ActionError {
    /// Whether this failure originated locally without touching the socket.
    pub fn is_local(&self) -> bool {
        matches!(self, ActionError::SessionEnded { .. })
    }
}

/// The primary error type for lifecycle, configuration and handler failures.
#[derive(Debug, Error)]
pub enum TernError {
    /// Configuration errors (invalid TOML, bad values, unreadable overlay files).
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection establishment or socket failures outside of a single action.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The identity query failed during startup. Always fatal.
    #[error("identify failed: {0}")]
    Identify(#[source] ActionError),

    /// A handler registration was refused.
    #[error("registration error: {0}")]
    Registration(String),

    /// A handler or hook reported failure.
    #[error("handler error: {0}")]
    Handler(String),

    /// An action call failed and the handler propagated it with `?`.
    #[error(transparent)]
    Action(#[from] ActionError),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TernError {
    /// Shorthand for a transport error without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        TernError::Transport {
            message: message.into(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_error_converts_into_tern_error() {
        let err: TernError = ActionError::Closed.into();
        assert!(matches!(err, TernError::Action(ActionError::Closed)));
        assert_eq!(err.to_string(), "connection closed");
    }

    #[test]
    fn protocol_error_carries_gateway_message() {
        let err = ActionError::Protocol {
            action: "send_group_msg".into(),
            retcode: 100,
            message: "group not found".into(),
        };
        let text = err.to_string();
        assert!(text.contains("send_group_msg"));
        assert!(text.contains("100"));
        assert!(text.contains("group not found"));
    }

    #[test]
    fn only_session_ended_is_local() {
        assert!(ActionError::SessionEnded { action: "x".into() }.is_local());
        assert!(!ActionError::Closed.is_local());
        assert!(
            !ActionError::Timeout {
                action: "x".into(),
                duration: Duration::from_secs(1)
            }
            .is_local()
        );
    }

    #[test]
    fn identify_error_exposes_source() {
        use std::error::Error as _;
        let err = TernError::Identify(ActionError::Closed);
        assert!(err.source().is_some());
    }
}
