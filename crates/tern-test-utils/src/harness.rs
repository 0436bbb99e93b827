// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end runtime tests.
//!
//! `TestHarness` wires a [`Runtime`] to a [`MockTransport`] answered by a
//! [`MockGateway`], so tests can register handlers, inject frames and
//! inspect what the runtime wrote without a network.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tern_core::{TernError, UserId};
use tern_runtime::{LifecycleState, RegistrationTable, Runtime, RuntimeBuilder};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::mock_gateway::MockGateway;
use crate::mock_transport::{MockConnector, MockTransport};

type Customize = Box<dyn FnOnce(RuntimeBuilder) -> RuntimeBuilder + Send>;
type ScriptGateway = Box<dyn FnOnce(MockGateway) -> MockGateway + Send>;

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    action_timeout: Duration,
    customize: Vec<Customize>,
    script: Vec<ScriptGateway>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            action_timeout: Duration::from_secs(2),
            customize: Vec::new(),
            script: Vec::new(),
        }
    }

    pub fn with_action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout = timeout;
        self
    }

    pub fn with_identity(mut self, user_id: UserId, nickname: &str) -> Self {
        let nickname = nickname.to_string();
        self.script
            .push(Box::new(move |g| g.with_identity(user_id, &nickname)));
        self
    }

    /// Script the gateway's answer to `action`.
    pub fn with_reply(mut self, action: &str, data: Value) -> Self {
        let action = action.to_string();
        self.script.push(Box::new(move |g| g.with_reply(&action, data)));
        self
    }

    pub fn with_failure(mut self, action: &str, retcode: i64, message: &str) -> Self {
        let (action, message) = (action.to_string(), message.to_string());
        self.script
            .push(Box::new(move |g| g.with_failure(&action, retcode, &message)));
        self
    }

    /// Leave `action` unanswered.
    pub fn with_silent(mut self, action: &str) -> Self {
        let action = action.to_string();
        self.script.push(Box::new(move |g| g.with_silent(&action)));
        self
    }

    /// Adjust the runtime builder (hooks, jobs, policies).
    pub fn with_runtime(
        mut self,
        f: impl FnOnce(RuntimeBuilder) -> RuntimeBuilder + Send + 'static,
    ) -> Self {
        self.customize.push(Box::new(f));
        self
    }

    /// Build the harness and start the scripted gateway. The runtime is not
    /// started until [`TestHarness::start`].
    pub async fn build(self) -> Result<TestHarness, TernError> {
        let (transport, mock) = MockTransport::pair();

        let mut gateway = MockGateway::new(mock.clone());
        for script in self.script {
            gateway = script(gateway);
        }
        let gateway = gateway.spawn();

        let mut builder = RuntimeBuilder::new(Arc::new(MockConnector::new(transport)))
            .action_timeout(self.action_timeout);
        for customize in self.customize {
            builder = customize(builder);
        }

        Ok(TestHarness {
            runtime: Arc::new(builder.build()),
            transport: mock,
            shutdown: CancellationToken::new(),
            run: None,
            gateway,
        })
    }
}

/// A runtime on a mock connection.
pub struct TestHarness {
    runtime: Arc<Runtime>,
    transport: MockTransport,
    shutdown: CancellationToken,
    run: Option<JoinHandle<Result<(), TernError>>>,
    gateway: JoinHandle<()>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    pub fn registry(&self) -> &Arc<RegistrationTable> {
        self.runtime.registry()
    }

    pub fn transport(&self) -> &MockTransport {
        &self.transport
    }

    /// Spawn [`Runtime::run`] in the background.
    pub fn start(&mut self) {
        let runtime = self.runtime.clone();
        let shutdown = self.shutdown.clone();
        self.run = Some(tokio::spawn(async move { runtime.run(shutdown).await }));
    }

    /// Start and wait until the runtime reaches `running`.
    pub async fn start_running(&mut self) -> Result<(), TernError> {
        self.start();
        self.wait_for_state(LifecycleState::Running).await
    }

    /// Wait until the runtime is in `state`.
    pub async fn wait_for_state(&self, state: LifecycleState) -> Result<(), TernError> {
        let mut rx = self.runtime.subscribe();
        rx.wait_for(|s| *s == state)
            .await
            .map(|_| ())
            .map_err(|e| TernError::Internal(format!("lifecycle channel closed: {e}")))
    }

    /// Deliver an inbound frame, as if sent by the gateway.
    pub fn inject(&self, frame: Value) {
        self.transport.push(frame);
    }

    /// Frames the runtime wrote whose `action` is `action`.
    pub fn sent_actions(&self, action: &str) -> Vec<Value> {
        self.transport
            .sent()
            .into_iter()
            .filter(|f| f["action"] == action)
            .collect()
    }

    /// Wait for the background run to end on its own.
    pub async fn join(&mut self) -> Result<(), TernError> {
        match self.run.take() {
            Some(task) => task
                .await
                .map_err(|e| TernError::Internal(format!("runtime task failed: {e}")))?,
            None => Ok(()),
        }
    }

    /// Request shutdown and wait for `run` to return.
    pub async fn stop(mut self) -> Result<(), TernError> {
        self.shutdown.cancel();
        self.join().await
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        self.gateway.abort();
        if let Some(run) = &self.run {
            run.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reaches_running_and_stops_cleanly() {
        let mut harness = TestHarness::builder()
            .with_identity(77, "Harness")
            .build()
            .await
            .unwrap();
        harness.start_running().await.unwrap();

        assert_eq!(harness.sent_actions("get_login_info").len(), 1);
        let state = harness.runtime().subscribe();
        harness.stop().await.unwrap();
        assert_eq!(*state.borrow(), LifecycleState::Disconnected);
    }
}
