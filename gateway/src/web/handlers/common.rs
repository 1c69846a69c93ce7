// Shared acknowledgment types for API handlers

use serde::Serialize;
use uuid::Uuid;

/// Ack for a successfully enqueued command.
#[derive(Debug, Serialize)]
pub struct QueuedAck {
    pub status: &'static str,
    pub uuid: Uuid,
}

impl QueuedAck {
    pub fn new(uuid: Uuid) -> Self {
        Self {
            status: "queued",
            uuid,
        }
    }
}

/// Ack for a single-command removal.
#[derive(Debug, Serialize)]
pub struct RemovedAck {
    pub status: &'static str,
    pub uuid: Uuid,
}

impl RemovedAck {
    pub fn new(uuid: Uuid) -> Self {
        Self {
            status: "removed",
            uuid,
        }
    }
}

/// Ack with a fixed status word ("cleared", "received", "pending").
#[derive(Debug, Serialize)]
pub struct StatusAck {
    pub status: &'static str,
}

impl StatusAck {
    pub fn cleared() -> Self {
        Self { status: "cleared" }
    }

    pub fn received() -> Self {
        Self { status: "received" }
    }

    pub fn pending() -> Self {
        Self { status: "pending" }
    }
}
