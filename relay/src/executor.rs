//! Command execution against the local presentation application.

use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::session::Session;
use crate::types::{Command, CommandMethod, TriggerMessage};

/// Endpoint name of the specialized message-trigger command.
pub const TRIGGER_ENDPOINT: &str = "trigger";

/// What happened to a single command.
#[derive(Debug)]
pub enum ExecutionOutcome {
    /// The target answered; its status and body get reported verbatim.
    Completed { status_code: u16, body: String },

    /// The target was unreachable after the transport's retries; a
    /// synthetic failure status is reported instead.
    TransportFailed { reason: String },

    /// Local validation failed before any request was sent. Logged only,
    /// nothing is reported.
    Skipped { reason: String },
}

pub struct Executor {
    target: Session,
}

impl Executor {
    pub fn new(target: Session) -> Self {
        Self { target }
    }

    pub async fn execute(&self, command: &Command) -> ExecutionOutcome {
        info!("Executing command {} ({})", command.id, command.endpoint);
        if command.endpoint == TRIGGER_ENDPOINT {
            self.execute_trigger(command).await
        } else {
            self.execute_generic(command).await
        }
    }

    /// Trigger a message on the presentation application:
    /// `POST /v1/message/{id}/trigger` with the token/content body shape it
    /// expects.
    async fn execute_trigger(&self, command: &Command) -> ExecutionOutcome {
        let message = match TriggerMessage::from_payload(&command.payload) {
            Ok(message) => message,
            Err(reason) => {
                error!("Command {}: {}, not sent", command.id, reason);
                return ExecutionOutcome::Skipped { reason };
            }
        };

        let path = format!("v1/message/{}/trigger", message.message_id);
        let body = json!([
            {
                "name": message.message_token,
                "text": { "text": message.message_content }
            }
        ]);

        self.dispatch(command, CommandMethod::Post, &path, Some(&body))
            .await
    }

    async fn execute_generic(&self, command: &Command) -> ExecutionOutcome {
        let path = format!("v1/{}", command.endpoint.trim_start_matches('/'));
        let body = Value::Object(command.payload.clone());
        match command.method {
            CommandMethod::Get => self.dispatch(command, CommandMethod::Get, &path, None).await,
            CommandMethod::Post => {
                self.dispatch(command, CommandMethod::Post, &path, Some(&body))
                    .await
            }
        }
    }

    async fn dispatch(
        &self,
        command: &Command,
        method: CommandMethod,
        path: &str,
        body: Option<&Value>,
    ) -> ExecutionOutcome {
        let result = match (method, body) {
            (CommandMethod::Get, _) => self.target.get(path).await,
            (CommandMethod::Post, Some(body)) => self.target.post_json(path, body).await,
            (CommandMethod::Post, None) => self.target.post_json(path, &Value::Null).await,
        };

        match result {
            Ok(response) => {
                let status_code = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                debug!(
                    "Command {} executed with status {}",
                    command.id, status_code
                );
                ExecutionOutcome::Completed { status_code, body }
            }
            Err(e) => {
                error!("Command {} failed: {}", command.id, e);
                ExecutionOutcome::TransportFailed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
