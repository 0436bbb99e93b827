// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handler registration.
//!
//! Scoped categories (private messages, group messages, group joins) hold at
//! most one registration per scope. Global categories (offline files, add
//! requests) hold a list and invoke every entry.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use tern_config::model::DuplicatePolicy;
use tern_core::{EventCategory, Scope, TernError};
use thiserror::Error;
use tracing::{error, warn};

use crate::guard::Guard;
use crate::session::SessionContext;

/// User code invoked for a dispatched event.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: SessionContext) -> Result<(), TernError>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(SessionContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), TernError>> + Send + 'static,
{
    async fn handle(&self, ctx: SessionContext) -> Result<(), TernError> {
        (self.0)(ctx).await
    }
}

/// Adapt an async closure into a [`Handler`].
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn Handler>
where
    F: Fn(SessionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TernError>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Run a handler, catching both errors and panics. Returns whether it succeeded.
pub async fn run_handler(handler: &Arc<dyn Handler>, ctx: SessionContext, label: &str) -> bool {
    match AssertUnwindSafe(handler.handle(ctx)).catch_unwind().await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            error!(handler = label, error = %e, "handler failed");
            false
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            error!(handler = label, panic = %message, "handler panicked");
            false
        }
    }
}

/// Per-registration guard settings.
#[derive(Clone, Default)]
pub struct GuardConfig {
    /// Group messages only: the message must open with a mention of the bot.
    pub require_mention: bool,
    /// Group messages only: the sender must be owner or admin.
    pub require_admin: bool,
    /// Capacity of the recent-history buffer. Zero disables it.
    pub history_size: usize,
    /// Save image attachments in the background.
    pub auto_download: bool,
    /// Silence the warning for stacking global registrations.
    pub ignore_warning: bool,
    /// Custom guards, run after the built-in ones.
    pub extra: Vec<Arc<dyn Guard>>,
}

impl std::fmt::Debug for GuardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardConfig")
            .field("require_mention", &self.require_mention)
            .field("require_admin", &self.require_admin)
            .field("history_size", &self.history_size)
            .field("auto_download", &self.auto_download)
            .field("ignore_warning", &self.ignore_warning)
            .field(
                "extra",
                &self.extra.iter().map(|g| g.name().to_string()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl GuardConfig {
    pub fn require_mention(mut self) -> Self {
        self.require_mention = true;
        self
    }

    pub fn require_admin(mut self) -> Self {
        self.require_admin = true;
        self
    }

    pub fn history(mut self, size: usize) -> Self {
        self.history_size = size;
        self
    }

    pub fn auto_download(mut self) -> Self {
        self.auto_download = true;
        self
    }

    pub fn ignore_warning(mut self) -> Self {
        self.ignore_warning = true;
        self
    }

    pub fn guard(mut self, guard: Arc<dyn Guard>) -> Self {
        self.extra.push(guard);
        self
    }
}

/// Why a registration was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("scope {scope} is not valid for {category} registrations")]
    ScopeMismatch {
        category: EventCategory,
        scope: Scope,
    },

    #[error("{guard} is not supported on {category} registrations")]
    IllegalGuard {
        category: EventCategory,
        guard: &'static str,
    },

    #[error("a {category} handler is already registered for {scope}")]
    Duplicate {
        category: EventCategory,
        scope: Scope,
    },
}

impl From<RegistrationError> for TernError {
    fn from(e: RegistrationError) -> Self {
        TernError::Registration(e.to_string())
    }
}

/// Identifies one registration, for [`RegistrationTable::unregister`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationHandle {
    pub id: u64,
    pub category: EventCategory,
    pub scope: Scope,
}

/// A registered handler and its guard settings.
pub struct Registration {
    pub id: u64,
    pub category: EventCategory,
    pub scope: Scope,
    pub handler: Arc<dyn Handler>,
    pub guards: GuardConfig,
}

impl Registration {
    /// Short name for logs.
    pub fn label(&self) -> String {
        format!("{}@{}#{}", self.category, self.scope, self.id)
    }

    pub fn handle(&self) -> RegistrationHandle {
        RegistrationHandle {
            id: self.id,
            category: self.category,
            scope: self.scope,
        }
    }
}

fn validate(
    category: EventCategory,
    scope: Scope,
    guards: &GuardConfig,
) -> Result<(), RegistrationError> {
    if !category.accepts(scope) {
        return Err(RegistrationError::ScopeMismatch { category, scope });
    }
    let group_only = category == EventCategory::GroupMessage;
    let message = matches!(
        category,
        EventCategory::PrivateMessage | EventCategory::GroupMessage
    );
    let illegal = if guards.require_mention && !group_only {
        Some("require_mention")
    } else if guards.require_admin && !group_only {
        Some("require_admin")
    } else if guards.history_size > 0 && !message {
        Some("history")
    } else if guards.auto_download && !message {
        Some("auto_download")
    } else {
        None
    };
    match illegal {
        Some(guard) => Err(RegistrationError::IllegalGuard { category, guard }),
        None => Ok(()),
    }
}

/// The live registration table.
pub struct RegistrationTable {
    scoped: DashMap<(EventCategory, Scope), Arc<Registration>>,
    global: DashMap<EventCategory, Vec<Arc<Registration>>>,
    next_id: AtomicU64,
    policy: DuplicatePolicy,
}

impl Default for RegistrationTable {
    fn default() -> Self {
        Self::new(DuplicatePolicy::default())
    }
}

impl RegistrationTable {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            scoped: DashMap::new(),
            global: DashMap::new(),
            next_id: AtomicU64::new(1),
            policy,
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Register `handler` for `(category, scope)`.
    pub fn register(
        &self,
        category: EventCategory,
        scope: Scope,
        handler: Arc<dyn Handler>,
        guards: GuardConfig,
    ) -> Result<RegistrationHandle, RegistrationError> {
        validate(category, scope, &guards)?;

        let registration = Arc::new(Registration {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            category,
            scope,
            handler,
            guards,
        });
        let handle = registration.handle();

        if category.is_global() {
            let mut list = self.global.entry(category).or_default();
            if !list.is_empty() && !registration.guards.ignore_warning {
                warn!(
                    category = %category,
                    existing = list.len(),
                    "another global handler registered; all of them will run"
                );
            }
            list.push(registration);
            return Ok(handle);
        }

        match self.scoped.entry((category, scope)) {
            Entry::Occupied(mut slot) => match self.policy {
                DuplicatePolicy::Replace => {
                    warn!(
                        category = %category,
                        scope = %scope,
                        replaced = %slot.get().label(),
                        "handler already registered for scope, replacing it"
                    );
                    slot.insert(registration);
                }
                DuplicatePolicy::Reject => {
                    return Err(RegistrationError::Duplicate { category, scope });
                }
            },
            Entry::Vacant(slot) => {
                slot.insert(registration);
            }
        }
        Ok(handle)
    }

    /// Shorthand for [`register`](Self::register) with an async closure.
    pub fn on<F, Fut>(
        &self,
        category: EventCategory,
        scope: Scope,
        guards: GuardConfig,
        f: F,
    ) -> Result<RegistrationHandle, RegistrationError>
    where
        F: Fn(SessionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TernError>> + Send + 'static,
    {
        self.register(category, scope, handler_fn(f), guards)
    }

    /// Remove exactly the registration `handle` refers to.
    ///
    /// Returns `false` if it is gone already, including when it was replaced.
    pub fn unregister(&self, handle: &RegistrationHandle) -> bool {
        if handle.category.is_global() {
            let Some(mut list) = self.global.get_mut(&handle.category) else {
                return false;
            };
            let before = list.len();
            list.retain(|r| r.id != handle.id);
            return list.len() != before;
        }
        self.scoped
            .remove_if(&(handle.category, handle.scope), |_, r| r.id == handle.id)
            .is_some()
    }

    /// The sole registration for a scoped category.
    pub fn lookup(&self, category: EventCategory, scope: Scope) -> Option<Arc<Registration>> {
        self.scoped.get(&(category, scope)).map(|r| r.clone())
    }

    /// Every registration for a global category, in registration order.
    pub fn globals(&self, category: EventCategory) -> Vec<Arc<Registration>> {
        self.global
            .get(&category)
            .map(|list| list.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.scoped.len() + self.global.iter().map(|e| e.value().len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
