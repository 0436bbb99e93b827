// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The one live gateway connection and the identity negotiated over it.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tern_core::{ConnectionMode, Identity, Transport, UserId};

use crate::correlation::ActionClient;

/// A connected transport, its action client, and the bot's own identity once known.
///
/// Constructed by the lifecycle manager and shared with every session context
/// through an `Arc`. There is no process-wide instance.
pub struct Connection {
    mode: ConnectionMode,
    client: ActionClient,
    identity: OnceLock<Identity>,
}

impl Connection {
    pub fn new(transport: Arc<dyn Transport>, action_timeout: Duration) -> Self {
        Self {
            mode: transport.mode(),
            client: ActionClient::new(transport, action_timeout),
            identity: OnceLock::new(),
        }
    }

    pub fn mode(&self) -> ConnectionMode {
        self.mode
    }

    pub fn client(&self) -> &ActionClient {
        &self.client
    }

    /// The bot's own account, `None` until identify completes.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.get()
    }

    pub fn self_id(&self) -> Option<UserId> {
        self.identity.get().map(|i| i.user_id)
    }

    /// Record the identity. Returns `false` if one was already set.
    pub fn set_identity(&self, identity: Identity) -> bool {
        self.identity.set(identity).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use tern_test_utils::MockTransport;

    use super::*;

    #[test]
    fn identity_is_set_once() {
        let (transport, _mock) = MockTransport::pair();
        let conn = Connection::new(transport, Duration::from_secs(1));
        assert!(conn.identity().is_none());

        assert!(conn.set_identity(Identity {
            user_id: 10,
            nickname: "bot".into()
        }));
        assert!(!conn.set_identity(Identity {
            user_id: 11,
            nickname: "other".into()
        }));
        assert_eq!(conn.self_id(), Some(10));
        assert_eq!(conn.mode(), ConnectionMode::Forward);
    }
}
