// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic jobs driven by a cron expression or a fixed interval.
//!
//! Jobs start when the runtime enters `running` and stop when it begins
//! closing. Each firing gets a fresh bootstrap [`SessionContext`]. A firing
//! runs to completion before the next occurrence is computed, so a slow job
//! skips occurrences rather than overlapping itself.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use croner::Cron;
use tern_core::TernError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::connection::Connection;
use crate::history::HistoryStore;
use crate::registry::{Handler, run_handler};
use crate::session::SessionContext;

/// When a job fires.
pub enum Trigger {
    /// Cron expression, evaluated in local time.
    Cron { expr: String, schedule: Cron },
    /// Fixed period, first firing one period after start.
    Every(Duration),
}

impl std::fmt::Debug for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::Cron { expr, .. } => f.debug_tuple("Cron").field(expr).finish(),
            Trigger::Every(period) => f.debug_tuple("Every").field(period).finish(),
        }
    }
}

impl Trigger {
    pub fn cron(expr: &str) -> Result<Self, TernError> {
        let schedule = expr
            .parse::<Cron>()
            .map_err(|e| TernError::Config(format!("invalid cron expression `{expr}`: {e}")))?;
        Ok(Trigger::Cron {
            expr: expr.to_string(),
            schedule,
        })
    }

    pub fn every(period: Duration) -> Result<Self, TernError> {
        if period.is_zero() {
            return Err(TernError::Config("job interval must be greater than zero".into()));
        }
        Ok(Trigger::Every(period))
    }

    /// Time until the next firing after `now`, or `None` if there is none.
    pub fn next_delay(&self, now: DateTime<Local>) -> Option<Duration> {
        match self {
            Trigger::Every(period) => Some(*period),
            Trigger::Cron { schedule, .. } => {
                let next = schedule.find_next_occurrence(&now, false).ok()?;
                Some((next - now).to_std().unwrap_or_default())
            }
        }
    }
}

/// A named callback on a trigger.
pub struct ScheduledJob {
    pub name: String,
    pub trigger: Trigger,
    pub handler: Arc<dyn Handler>,
}

impl ScheduledJob {
    pub fn new(name: impl Into<String>, trigger: Trigger, handler: Arc<dyn Handler>) -> Self {
        Self {
            name: name.into(),
            trigger,
            handler,
        }
    }
}

/// Run `job` until `stop` is cancelled.
pub(crate) fn spawn_job(
    job: Arc<ScheduledJob>,
    conn: Arc<Connection>,
    history: Arc<HistoryStore>,
    stop: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!(job = %job.name, trigger = ?job.trigger, "job started");
        loop {
            let Some(delay) = job.trigger.next_delay(Local::now()) else {
                warn!(job = %job.name, "job has no further occurrences");
                break;
            };
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            let ctx = SessionContext::bootstrap(conn.clone(), history.clone());
            run_handler(&job.handler, ctx, &job.name).await;
        }
        debug!(job = %job.name, "job stopped");
    })
}
