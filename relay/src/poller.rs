//! Timer-driven dispatch loop for the poll transport.
//!
//! Each cycle drains the gateway's queue, executes the batch sequentially
//! against the local target, and reports an execution status per command.
//! Every failure is absorbed locally: a failed fetch degrades to an empty
//! batch, a failed report is logged, and the loop keeps running across
//! target outages.

use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::RelayConfig;
use crate::executor::{ExecutionOutcome, Executor};
use crate::session::{Session, SessionError};
use crate::types::{Command, StatusUpdate};

const COMMANDS_PATH: &str = "api/v1/commands";
const UPDATE_STATUS_PATH: &str = "api/v1/updateStatus";

/// Synthetic report when the target never produced a response.
const SYNTHETIC_FAILURE_STATUS: u16 = 500;
const SYNTHETIC_FAILURE_BODY: &str = "No response";

/// Why a fetch produced no work this cycle.
enum FetchFailure {
    Timeout,
    ConnectionRefused,
    ServerError(u16),
    Malformed(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Timeout => write!(f, "timeout while fetching commands"),
            FetchFailure::ConnectionRefused => write!(f, "unable to reach the gateway"),
            FetchFailure::ServerError(status) => {
                write!(f, "gateway returned status {}", status)
            }
            FetchFailure::Malformed(reason) => {
                write!(f, "gateway returned an unreadable body: {}", reason)
            }
        }
    }
}

pub struct Poller {
    gateway: Session,
    executor: Executor,
    interval: Duration,
}

impl Poller {
    pub fn from_config(config: &RelayConfig) -> anyhow::Result<Self> {
        let gateway = Session::new(
            &config.gateway_url,
            config.request_timeout,
            config.api_key.clone(),
            config.max_attempts,
        )?;
        let target = Session::new(
            &config.target_url,
            config.request_timeout,
            None,
            config.max_attempts,
        )?;
        Ok(Self {
            gateway,
            executor: Executor::new(target),
            interval: config.poll_interval,
        })
    }

    pub fn new(gateway: Session, executor: Executor, interval: Duration) -> Self {
        Self {
            gateway,
            executor,
            interval,
        }
    }

    /// Loop until process termination. Shutdown is not cooperative: the
    /// process exits and in-flight calls time out naturally.
    pub async fn run(&self) {
        info!(
            "Command execution service started, polling every {:?}",
            self.interval
        );
        let mut interval = tokio::time::interval(self.interval);
        loop {
            interval.tick().await;
            self.cycle().await;
        }
    }

    /// One Idle -> Fetching -> Executing -> Idle pass.
    pub async fn cycle(&self) {
        let batch = self.fetch().await;
        if batch.is_empty() {
            return;
        }

        info!("Fetched {} commands", batch.len());
        // Sequential on purpose: parallel execution would reorder
        // target-side effects within a batch.
        for command in &batch {
            let outcome = self.executor.execute(command).await;
            self.report(command, outcome).await;
        }
    }

    /// Drain the gateway queue. Never raises: any failure is logged and
    /// degrades to an empty batch.
    async fn fetch(&self) -> Vec<Command> {
        debug!("Fetching commands from the gateway");
        let response = match self.gateway.get(COMMANDS_PATH).await {
            Ok(response) => response,
            Err(SessionError::Timeout { .. }) => return self.no_work(FetchFailure::Timeout),
            Err(SessionError::Connection { .. }) => {
                return self.no_work(FetchFailure::ConnectionRefused)
            }
            Err(SessionError::Request { reason, .. }) => {
                return self.no_work(FetchFailure::Malformed(reason))
            }
        };

        let status = response.status();
        if !status.is_success() {
            return self.no_work(FetchFailure::ServerError(status.as_u16()));
        }

        let items: Vec<Value> = match response.json().await {
            Ok(items) => items,
            Err(e) => return self.no_work(FetchFailure::Malformed(e.to_string())),
        };

        items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Command>(item.clone()) {
                Ok(command) => Some(command),
                Err(e) => {
                    error!("Malformed command skipped: {} ({})", item, e);
                    None
                }
            })
            .collect()
    }

    fn no_work(&self, failure: FetchFailure) -> Vec<Command> {
        error!("No work this cycle: {}", failure);
        Vec::new()
    }

    /// Post the execution report back to the gateway. Best-effort: failures
    /// are logged, never retried beyond the session's own policy, because
    /// re-reporting could duplicate side effects on the correlator.
    async fn report(&self, command: &Command, outcome: ExecutionOutcome) {
        let (status_code, body) = match outcome {
            ExecutionOutcome::Completed { status_code, body } => (status_code, body),
            ExecutionOutcome::TransportFailed { .. } => (
                SYNTHETIC_FAILURE_STATUS,
                SYNTHETIC_FAILURE_BODY.to_string(),
            ),
            ExecutionOutcome::Skipped { reason } => {
                warn!(
                    "Command {} skipped ({}), no status reported",
                    command.id, reason
                );
                return;
            }
        };

        let update = StatusUpdate {
            command: command.clone(),
            status_code,
            response: body,
        };
        let payload = match serde_json::to_value(&update) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to serialize status update for {}: {}", command.id, e);
                return;
            }
        };

        match self.gateway.post_json(UPDATE_STATUS_PATH, &payload).await {
            Ok(response) if response.status().is_success() => {
                debug!("Status update for {} delivered", command.id);
            }
            Ok(response) => {
                warn!(
                    "Failed to update status for {}: {}",
                    command.id,
                    response.status()
                );
            }
            Err(e) => {
                error!("Status update for {} not delivered: {}", command.id, e);
            }
        }
    }
}
