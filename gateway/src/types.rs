//! Wire and domain types for the command relay.
//!
//! Validation happens once, at the boundary: a raw JSON body is parsed into
//! [`NewCommand`] which enforces the required fields, and the queue turns it
//! into a [`Command`] with an assigned id. Handlers and stores never poke at
//! untyped maps after that point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::ValidationError;

/// HTTP method a command is executed with on the worker side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CommandMethod {
    #[serde(rename = "GET")]
    Get,
    #[default]
    #[serde(rename = "POST")]
    Post,
}

/// A queued unit of work. The id is assigned by the queue at enqueue time,
/// never by the caller; the serialized shape round-trips unchanged through
/// the drain endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    pub id: Uuid,
    pub endpoint: String,
    pub method: CommandMethod,
    #[serde(default)]
    pub payload: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

/// A command as submitted by a caller, before the queue assigns an id.
#[derive(Debug, Clone)]
pub struct NewCommand {
    pub endpoint: String,
    pub method: CommandMethod,
    pub payload: Map<String, Value>,
}

/// Endpoint name of the specialized message-trigger command.
pub const TRIGGER_ENDPOINT: &str = "trigger";

/// Trigger commands carry the message fields of the presentation
/// application; all three must be present and non-empty.
const TRIGGER_FIELDS: [&str; 3] = ["messageID", "messageToken", "messageContent"];

impl NewCommand {
    /// Parse and validate a raw request body. Any caller-supplied `id` is
    /// ignored; the queue assigns its own.
    pub fn parse(body: &Value) -> Result<Self, ValidationError> {
        let object = body.as_object().ok_or(ValidationError::NotAnObject)?;

        let endpoint = match object.get("endpoint").and_then(Value::as_str) {
            Some(s) if !s.trim().is_empty() => s.to_string(),
            Some(_) => return Err(ValidationError::EmptyField { field: "endpoint" }),
            None => return Err(ValidationError::MissingField { field: "endpoint" }),
        };

        let method = match object.get("method") {
            None | Some(Value::Null) => CommandMethod::default(),
            Some(value) => serde_json::from_value(value.clone()).map_err(|_| {
                ValidationError::InvalidMethod {
                    value: value.to_string(),
                }
            })?,
        };

        let payload = match object.get("payload") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => return Err(ValidationError::PayloadNotAnObject),
        };

        if endpoint == TRIGGER_ENDPOINT {
            for field in TRIGGER_FIELDS {
                match payload.get(field).and_then(Value::as_str) {
                    Some(s) if !s.trim().is_empty() => {}
                    Some(_) => return Err(ValidationError::EmptyField { field }),
                    None => return Err(ValidationError::MissingField { field }),
                }
            }
        }

        Ok(Self {
            endpoint,
            method,
            payload,
        })
    }

    pub fn into_command(self, id: Uuid) -> Command {
        Command {
            id,
            endpoint: self.endpoint,
            method: self.method,
            payload: self.payload,
            created_at: Utc::now(),
        }
    }
}

/// A worker's report for an executed command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub command: CommandRef,
    pub status_code: u16,
    pub response: String,
}

/// The command a status update refers to. Workers echo the full command
/// back; only the id matters for correlation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRef {
    pub id: Uuid,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// The stored outcome of a command, served back to the original caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub command_id: Uuid,
    pub status_code: u16,
    #[serde(rename = "response")]
    pub body: String,
    pub received_at: DateTime<Utc>,
}

impl CommandResponse {
    pub fn from_update(update: &StatusUpdate) -> Self {
        Self {
            command_id: update.command.id,
            status_code: update.status_code,
            body: update.response.clone(),
            received_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test]
    fn parse_assigns_defaults() {
        let body = json!({"endpoint": "stage/message"});
        let command = NewCommand::parse(&body).unwrap();
        assert_eq!(command.endpoint, "stage/message");
        assert_eq!(command.method, CommandMethod::Post);
        assert!(command.payload.is_empty());
    }

    #[test]
    fn parse_keeps_payload_fields() {
        let body = json!({
            "endpoint": "trigger",
            "method": "POST",
            "payload": {
                "messageID": "m1",
                "messageToken": "t1",
                "messageContent": "hi"
            }
        });
        let command = NewCommand::parse(&body).unwrap();
        assert_eq!(command.payload.get("messageID").unwrap(), "m1");
    }

    #[test_case(json!(["not", "an", "object"]); "array body")]
    #[test_case(json!("plain string"); "string body")]
    #[test_case(json!({"method": "POST"}); "missing endpoint")]
    #[test_case(json!({"endpoint": "  "}); "blank endpoint")]
    #[test_case(json!({"endpoint": "version", "method": "PUT"}); "unsupported method")]
    #[test_case(json!({"endpoint": "version", "payload": [1, 2]}); "payload not an object")]
    #[test_case(json!({"endpoint": "trigger", "payload": {"messageID": "m1"}}); "trigger missing fields")]
    #[test_case(json!({"endpoint": "trigger", "payload": {"messageID": "m1", "messageToken": "", "messageContent": "hi"}}); "trigger empty token")]
    fn parse_rejects_invalid_bodies(body: Value) {
        assert!(NewCommand::parse(&body).is_err());
    }

    #[test]
    fn command_serializes_wire_shape() {
        let command = NewCommand::parse(&json!({"endpoint": "version", "method": "GET"}))
            .unwrap()
            .into_command(Uuid::new_v4());
        let wire = serde_json::to_value(&command).unwrap();
        assert_eq!(wire["endpoint"], "version");
        assert_eq!(wire["method"], "GET");
        assert!(wire["id"].is_string());
        assert!(wire["created_at"].is_string());
    }

    #[test]
    fn status_update_roundtrip() {
        let id = Uuid::new_v4();
        let raw = json!({
            "command": {"id": id, "endpoint": "trigger"},
            "status_code": 200,
            "response": "ok"
        });
        let update: StatusUpdate = serde_json::from_value(raw).unwrap();
        assert_eq!(update.command.id, id);
        let response = CommandResponse::from_update(&update);
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "ok");

        let wire = serde_json::to_value(&response).unwrap();
        assert_eq!(wire["response"], "ok");
        assert_eq!(wire["status_code"], 200);
    }
}
