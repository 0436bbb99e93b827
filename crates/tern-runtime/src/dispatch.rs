// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing classified events to their registered handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tern_config::model::OrderingPolicy;
use tern_core::{EventCategory, InboundEvent, Scope};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::attachments::AttachmentFetcher;
use crate::connection::Connection;
use crate::guard::GuardChain;
use crate::history::HistoryStore;
use crate::registry::{Registration, RegistrationTable, run_handler};
use crate::session::SessionContext;

/// What happened to one dispatched event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No registration for the event's scope.
    NoHandler,
    /// Meta or bootstrap events are never dispatched.
    Ignored,
    /// A guard stopped the event before the handler.
    Aborted { guard: String },
    /// The handler ran and returned `Ok`.
    Handled,
    /// The handler returned an error or panicked.
    Failed,
    /// Handlers were started in the background.
    Spawned(usize),
}

/// Queue feeding one serialized scope's worker task.
struct Lane {
    id: u64,
    tx: mpsc::UnboundedSender<InboundEvent>,
}

/// Looks up handlers for events and runs them with their guard chains.
pub struct Dispatcher {
    registry: Arc<RegistrationTable>,
    history: Arc<HistoryStore>,
    conn: Arc<Connection>,
    fetcher: Option<Arc<dyn AttachmentFetcher>>,
    ordering: OrderingPolicy,
    lanes: DashMap<Scope, Lane>,
    next_lane: AtomicU64,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<RegistrationTable>,
        history: Arc<HistoryStore>,
        conn: Arc<Connection>,
    ) -> Self {
        Self {
            registry,
            history,
            conn,
            fetcher: None,
            ordering: OrderingPolicy::default(),
            lanes: DashMap::new(),
            next_lane: AtomicU64::new(0),
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn AttachmentFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_ordering(mut self, ordering: OrderingPolicy) -> Self {
        self.ordering = ordering;
        self
    }

    fn context(&self, event: InboundEvent) -> SessionContext {
        SessionContext::new(event, self.conn.clone(), self.history.clone())
    }

    /// Dispatch one event and wait for its handler (message categories only;
    /// other categories start their handlers and return immediately).
    pub async fn dispatch(&self, event: InboundEvent) -> DispatchOutcome {
        let Some(category) = event.category() else {
            return DispatchOutcome::Ignored;
        };
        let scope = event.scope();

        match category {
            EventCategory::PrivateMessage | EventCategory::GroupMessage => {
                match self.registry.lookup(category, scope) {
                    Some(registration) => self.run_message(registration, event).await,
                    None => {
                        trace!(category = %category, scope = %scope, "no handler registered");
                        DispatchOutcome::NoHandler
                    }
                }
            }
            EventCategory::GroupIncrease => match self.registry.lookup(category, scope) {
                Some(registration) => {
                    self.spawn_handler(registration, event);
                    DispatchOutcome::Spawned(1)
                }
                None => DispatchOutcome::NoHandler,
            },
            EventCategory::OfflineFile | EventCategory::AddRequest => {
                let registrations = self.registry.globals(category);
                if registrations.is_empty() {
                    return DispatchOutcome::NoHandler;
                }
                let count = registrations.len();
                for registration in registrations {
                    self.spawn_handler(registration, event.clone());
                }
                DispatchOutcome::Spawned(count)
            }
        }
    }

    async fn run_message(
        &self,
        registration: Arc<Registration>,
        event: InboundEvent,
    ) -> DispatchOutcome {
        let scope = event.scope();
        let mut ctx = self.context(event);

        let chain = GuardChain::for_config(&registration.guards, self.fetcher.as_ref());
        if let Err(abort) = chain.run(&mut ctx).await {
            debug!(
                handler = %registration.label(),
                guard = %abort.guard,
                reason = %abort.reason,
                "dispatch aborted by guard"
            );
            return DispatchOutcome::Aborted { guard: abort.guard };
        }

        let capacity = registration.guards.history_size;
        let seen = (capacity > 0).then(|| ctx.event().clone());

        let ok = run_handler(&registration.handler, ctx, &registration.label()).await;

        if let Some(event) = seen {
            self.history.append(scope, capacity, event);
        }
        if ok {
            DispatchOutcome::Handled
        } else {
            DispatchOutcome::Failed
        }
    }

    fn spawn_handler(&self, registration: Arc<Registration>, event: InboundEvent) {
        let ctx = self.context(event);
        tokio::spawn(async move {
            run_handler(&registration.handler, ctx, &registration.label()).await;
        });
    }

    /// Hand an event off according to the ordering policy, without waiting.
    pub fn submit(self: &Arc<Self>, event: InboundEvent) {
        match self.ordering {
            OrderingPolicy::Concurrent => {
                let this = Arc::clone(self);
                tokio::spawn(async move {
                    this.dispatch(event).await;
                });
            }
            OrderingPolicy::Serialized => {
                let scope = event.scope();
                // Sending under the entry lock keeps a reaping worker from
                // dropping its lane between our lookup and our send.
                let mut lane = self
                    .lanes
                    .entry(scope)
                    .or_insert_with(|| self.spawn_lane(scope));
                if let Err(mpsc::error::SendError(event)) = lane.tx.send(event) {
                    *lane = self.spawn_lane(scope);
                    let _ = lane.tx.send(event);
                }
            }
        }
    }

    /// Start the worker for `scope`. The worker removes its own lane once the
    /// queue is empty, so idle scopes hold no task.
    fn spawn_lane(self: &Arc<Self>, scope: Scope) -> Lane {
        let id = self.next_lane.fetch_add(1, Ordering::Relaxed);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let this = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                this.dispatch(event).await;
                let reaped = this
                    .lanes
                    .remove_if(&scope, |_, lane| lane.id == id && rx.is_empty())
                    .is_some();
                if reaped {
                    break;
                }
            }
            trace!(scope = %scope, "dispatch lane closed");
        });
        Lane { id, tx }
    }

    /// Number of serialized scopes with a live worker.
    pub fn active_lanes(&self) -> usize {
        self.lanes.len()
    }

    /// Close every serialized lane. Queued events still drain.
    pub fn close_lanes(&self) {
        self.lanes.clear();
    }
}
