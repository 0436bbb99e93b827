// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The lifecycle manager.
//!
//! `disconnected -> connecting -> identifying -> ready -> running -> closing -> disconnected`
//!
//! [`Runtime::run`] walks that sequence once. Identify failure aborts before
//! `ready`. An external shutdown signal or loss of the transport moves a
//! running runtime to `closing`, where all shutdown hooks are awaited
//! together before the socket is closed.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use strum::Display;
use tern_config::TernConfig;
use tern_config::model::{CollaboratorConfig, DuplicatePolicy, OrderingPolicy};
use tern_core::{Connector, InboundEvent, TernError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::attachments::{AttachmentFetcher, HttpAttachmentFetcher};
use crate::classifier::{Classified, classify};
use crate::connection::Connection;
use crate::correlation::{DEFAULT_ACTION_TIMEOUT, Routed};
use crate::dispatch::Dispatcher;
use crate::history::HistoryStore;
use crate::registry::{Handler, RegistrationTable, run_handler};
use crate::schedule::{ScheduledJob, spawn_job};
use crate::session::SessionContext;

/// Where the runtime is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum LifecycleState {
    Disconnected,
    Connecting,
    Identifying,
    Ready,
    Running,
    Closing,
}

/// Configures a [`Runtime`].
pub struct RuntimeBuilder {
    connector: Arc<dyn Connector>,
    action_timeout: Duration,
    ordering: OrderingPolicy,
    duplicates: DuplicatePolicy,
    fetcher: Option<Arc<dyn AttachmentFetcher>>,
    startup: Vec<Arc<dyn Handler>>,
    shutdown: Vec<Arc<dyn Handler>>,
    jobs: Vec<Arc<ScheduledJob>>,
    collaborators: CollaboratorConfig,
}

impl RuntimeBuilder {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            action_timeout: DEFAULT_ACTION_TIMEOUT,
            ordering: OrderingPolicy::default(),
            duplicates: DuplicatePolicy::default(),
            fetcher: None,
            startup: Vec::new(),
            shutdown: Vec::new(),
            jobs: Vec::new(),
            collaborators: CollaboratorConfig::default(),
        }
    }

    /// Take timeouts, policies, the attachment fetcher and collaborator
    /// toggles from a loaded configuration.
    pub fn from_config(connector: Arc<dyn Connector>, config: &TernConfig) -> Result<Self, TernError> {
        let fetcher = HttpAttachmentFetcher::from_config(&config.attachments)?;
        Ok(Self::new(connector)
            .action_timeout(Duration::from_millis(config.connection.action_timeout_ms))
            .ordering(config.dispatch.ordering)
            .duplicate_policy(config.dispatch.duplicate_registration)
            .fetcher(Arc::new(fetcher))
            .collaborators(config.collaborators.clone()))
    }

    pub fn action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout = timeout;
        self
    }

    pub fn ordering(mut self, ordering: OrderingPolicy) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn AttachmentFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Add a startup hook. Every hook added runs, each with its own bootstrap context.
    pub fn on_startup(mut self, hook: Arc<dyn Handler>) -> Self {
        self.startup.push(hook);
        self
    }

    /// Add a shutdown hook. All of them are awaited before the socket closes.
    pub fn on_shutdown(mut self, hook: Arc<dyn Handler>) -> Self {
        self.shutdown.push(hook);
        self
    }

    pub fn schedule(mut self, job: ScheduledJob) -> Self {
        self.jobs.push(Arc::new(job));
        self
    }

    pub fn collaborators(mut self, collaborators: CollaboratorConfig) -> Self {
        self.collaborators = collaborators;
        self
    }

    pub fn build(self) -> Runtime {
        let (state, _) = watch::channel(LifecycleState::Disconnected);
        Runtime {
            connector: self.connector,
            registry: Arc::new(RegistrationTable::new(self.duplicates)),
            history: Arc::new(HistoryStore::new()),
            action_timeout: self.action_timeout,
            ordering: self.ordering,
            fetcher: self.fetcher,
            startup: self.startup,
            shutdown: self.shutdown,
            jobs: self.jobs,
            collaborators: self.collaborators,
            state,
        }
    }
}

/// Owns the registration table and drives one connection through its lifecycle.
pub struct Runtime {
    connector: Arc<dyn Connector>,
    registry: Arc<RegistrationTable>,
    history: Arc<HistoryStore>,
    action_timeout: Duration,
    ordering: OrderingPolicy,
    fetcher: Option<Arc<dyn AttachmentFetcher>>,
    startup: Vec<Arc<dyn Handler>>,
    shutdown: Vec<Arc<dyn Handler>>,
    jobs: Vec<Arc<ScheduledJob>>,
    collaborators: CollaboratorConfig,
    state: watch::Sender<LifecycleState>,
}

impl Runtime {
    pub fn builder(connector: Arc<dyn Connector>) -> RuntimeBuilder {
        RuntimeBuilder::new(connector)
    }

    /// The registration table. Registrations may be added before or during `run`.
    pub fn registry(&self) -> &Arc<RegistrationTable> {
        &self.registry
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    /// Collaborator toggles, passed through untouched.
    pub fn collaborators(&self) -> &CollaboratorConfig {
        &self.collaborators
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Watch lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    fn set_state(&self, next: LifecycleState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            info!(from = %previous, to = %next, "lifecycle transition");
        }
    }

    /// Connect, identify, run until `shutdown` is cancelled or the transport
    /// is lost, then close.
    ///
    /// Returns `Ok` after a requested shutdown, [`TernError::Identify`] if the
    /// identity query fails, and a transport error if connecting fails or the
    /// connection drops while running.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), TernError> {
        self.set_state(LifecycleState::Connecting);
        let transport = tokio::select! {
            _ = shutdown.cancelled() => {
                info!("shutdown requested before the gateway connected");
                self.set_state(LifecycleState::Disconnected);
                return Ok(());
            }
            result = self.connector.connect() => match result {
                Ok(transport) => transport,
                Err(e) => {
                    error!(error = %e, "failed to connect to gateway");
                    self.set_state(LifecycleState::Disconnected);
                    return Err(e);
                }
            },
        };

        let conn = Arc::new(Connection::new(transport.clone(), self.action_timeout));
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let lost = CancellationToken::new();
        let reader = spawn_reader(conn.clone(), event_tx, lost.clone());

        self.set_state(LifecycleState::Identifying);
        let bootstrap = SessionContext::bootstrap(conn.clone(), self.history.clone());
        match bootstrap.get_login_info().await {
            Ok(identity) => {
                info!(user_id = identity.user_id, nickname = %identity.nickname, "identified");
                conn.set_identity(identity);
            }
            Err(e) => {
                error!(error = %e, "identity query failed, aborting startup");
                conn.client().close();
                if let Err(close_err) = transport.close().await {
                    debug!(error = %close_err, "closing transport after failed identify");
                }
                reader.abort();
                self.set_state(LifecycleState::Disconnected);
                return Err(TernError::Identify(e));
            }
        }

        self.set_state(LifecycleState::Ready);
        let mut dispatcher =
            Dispatcher::new(self.registry.clone(), self.history.clone(), conn.clone())
                .with_ordering(self.ordering);
        if let Some(fetcher) = &self.fetcher {
            dispatcher = dispatcher.with_fetcher(fetcher.clone());
        }
        let dispatcher = Arc::new(dispatcher);
        let consumer = spawn_consumer(dispatcher.clone(), event_rx);

        for (i, hook) in self.startup.iter().enumerate() {
            let hook = hook.clone();
            let ctx = SessionContext::bootstrap(conn.clone(), self.history.clone());
            tokio::spawn(async move {
                run_handler(&hook, ctx, &format!("startup hook {i}")).await;
            });
        }

        let stop_jobs = CancellationToken::new();
        let jobs: Vec<JoinHandle<()>> = self
            .jobs
            .iter()
            .map(|job| {
                spawn_job(
                    job.clone(),
                    conn.clone(),
                    self.history.clone(),
                    stop_jobs.clone(),
                )
            })
            .collect();

        self.set_state(LifecycleState::Running);

        let transport_lost = tokio::select! {
            _ = shutdown.cancelled() => false,
            _ = lost.cancelled() => true,
        };
        if transport_lost {
            warn!("connection to gateway lost");
        }

        self.set_state(LifecycleState::Closing);
        stop_jobs.cancel();
        join_all(jobs).await;

        let hooks = self.shutdown.iter().enumerate().map(|(i, hook)| {
            let ctx = SessionContext::bootstrap(conn.clone(), self.history.clone());
            let label = format!("shutdown hook {i}");
            async move { run_handler(hook, ctx, &label).await }
        });
        join_all(hooks).await;

        dispatcher.close_lanes();
        if let Err(e) = transport.close().await {
            warn!(error = %e, "error while closing transport");
        }
        conn.client().close();
        if let Err(e) = reader.await {
            debug!(error = %e, "reader task ended abnormally");
        }
        consumer.abort();

        self.set_state(LifecycleState::Disconnected);
        if transport_lost {
            Err(TernError::transport("connection to gateway lost"))
        } else {
            Ok(())
        }
    }
}

/// Feed inbound frames through correlation and classification.
///
/// Events go to `events` whether or not dispatch has started yet; the channel
/// buffers them until the consumer runs.
fn spawn_reader(
    conn: Arc<Connection>,
    events: mpsc::UnboundedSender<InboundEvent>,
    lost: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let transport = conn.client().transport().clone();
        while let Some(text) = transport.receive().await {
            if let Routed::Event(frame) = conn.client().route_text(&text)
                && let Classified::Event(event) = classify(&frame)
                && events.send(event).is_err()
            {
                break;
            }
        }
        conn.client().close();
        lost.cancel();
        debug!("reader stopped");
    })
}

fn spawn_consumer(
    dispatcher: Arc<Dispatcher>,
    mut events: mpsc::UnboundedReceiver<InboundEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            dispatcher.submit(event);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_names() {
        assert_eq!(LifecycleState::Identifying.to_string(), "identifying");
        assert_eq!(LifecycleState::Disconnected.to_string(), "disconnected");
    }
}
