// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime for the Tern gateway client.
//!
//! Wires a [`Transport`](tern_core::Transport) into the echo-correlated
//! [`ActionClient`], classifies inbound events, dispatches them through the
//! per-scope [`RegistrationTable`] and guard chain, and drives the whole
//! connection through its [`LifecycleState`]s.

pub mod actions;
pub mod attachments;
pub mod classifier;
pub mod connection;
pub mod correlation;
pub mod dispatch;
pub mod guard;
pub mod history;
pub mod lifecycle;
pub mod plugin;
pub mod registry;
pub mod schedule;
pub mod session;
pub mod shutdown;

pub use actions::{DEFAULT_BAN_SECS, MessageTarget};
pub use attachments::{AttachmentFetcher, HttpAttachmentFetcher};
pub use classifier::{Classified, IgnoreReason, classify};
pub use connection::Connection;
pub use correlation::{ActionClient, DEFAULT_ACTION_TIMEOUT, Routed};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use guard::{Guard, GuardChain, GuardOutcome, RequireAdmin, RequireMention};
pub use history::{HistoryBuffer, HistoryStore};
pub use lifecycle::{LifecycleState, Runtime, RuntimeBuilder};
pub use plugin::{EchoPlugin, Plugin, PluginRegistry};
pub use registry::{
    GuardConfig, Handler, RegistrationError, RegistrationHandle, RegistrationTable, handler_fn,
};
pub use schedule::{ScheduledJob, Trigger};
pub use session::SessionContext;
pub use shutdown::install_signal_handler;
