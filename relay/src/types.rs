//! Relay-side wire types.
//!
//! The gateway owns the canonical command schema; the relay parses what it
//! drains and skips anything malformed rather than failing the batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandMethod {
    #[serde(rename = "GET")]
    Get,
    #[serde(rename = "POST")]
    Post,
}

/// A command drained from the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    pub id: Uuid,
    pub endpoint: String,
    pub method: CommandMethod,
    #[serde(default)]
    pub payload: Map<String, Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Execution report posted back to the gateway. The full command is echoed
/// so the gateway can correlate by id.
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub command: Command,
    pub status_code: u16,
    pub response: String,
}

/// The message fields a trigger command must carry. Parsed from the
/// payload once, before any request is built.
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerMessage {
    #[serde(rename = "messageID")]
    pub message_id: String,
    #[serde(rename = "messageToken")]
    pub message_token: String,
    #[serde(rename = "messageContent")]
    pub message_content: String,
}

impl TriggerMessage {
    /// Extract and validate the trigger fields. All three must be present
    /// and non-empty.
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, String> {
        let message: TriggerMessage =
            serde_json::from_value(Value::Object(payload.clone()))
                .map_err(|e| format!("missing required trigger fields: {}", e))?;

        for (field, value) in [
            ("messageID", &message.message_id),
            ("messageToken", &message.message_token),
            ("messageContent", &message.message_content),
        ] {
            if value.trim().is_empty() {
                return Err(format!("trigger field '{}' is empty", field));
            }
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn trigger_message_parses_complete_payload() {
        let message = TriggerMessage::from_payload(&payload(json!({
            "messageID": "m1",
            "messageToken": "t1",
            "messageContent": "hi"
        })))
        .unwrap();
        assert_eq!(message.message_id, "m1");
        assert_eq!(message.message_token, "t1");
        assert_eq!(message.message_content, "hi");
    }

    #[test_case(json!({}); "all fields missing")]
    #[test_case(json!({"messageID": "m1", "messageToken": "t1"}); "content missing")]
    #[test_case(json!({"messageID": "", "messageToken": "t1", "messageContent": "hi"}); "empty id")]
    #[test_case(json!({"messageID": "m1", "messageToken": "  ", "messageContent": "hi"}); "blank token")]
    fn trigger_message_rejects_incomplete_payload(raw: Value) {
        assert!(TriggerMessage::from_payload(&payload(raw)).is_err());
    }

    #[test]
    fn command_parses_gateway_wire_shape() {
        let raw = json!({
            "id": Uuid::new_v4(),
            "endpoint": "trigger",
            "method": "POST",
            "payload": {"messageID": "m1"},
            "created_at": Utc::now()
        });
        let command: Command = serde_json::from_value(raw).unwrap();
        assert_eq!(command.endpoint, "trigger");
        assert_eq!(command.method, CommandMethod::Post);
    }

    #[test]
    fn command_tolerates_missing_optional_fields() {
        let raw = json!({"id": Uuid::new_v4(), "endpoint": "version", "method": "GET"});
        let command: Command = serde_json::from_value(raw).unwrap();
        assert!(command.payload.is_empty());
        assert!(command.created_at.is_none());
    }
}
