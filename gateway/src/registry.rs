//! Worker registry and request/reply correlation for the push transport.
//!
//! Connected workers hold a persistent channel to the gateway. The registry
//! maps a worker id to its live connection handle (last registration wins);
//! the pending-reply table maps an in-flight request id to the original
//! requester's oneshot and the worker the request was sent to.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::NotFoundError;

/// Events pushed from the gateway to a connected worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BrokerEvent {
    VersionRequest { request_id: Uuid },
}

/// Events received from a connected worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerEvent {
    Register {
        client_id: String,
    },
    VersionResponse {
        request_id: Uuid,
        client_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

/// A worker's reply, routed back to the awaiting requester.
#[derive(Debug, Clone)]
pub struct WorkerReply {
    pub worker_id: String,
    pub version: Option<Value>,
    pub error: Option<String>,
}

/// Live connection handle for a registered worker.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    pub connection_id: Uuid,
    pub sender: mpsc::Sender<BrokerEvent>,
}

pub struct WorkerRegistry {
    workers: RwLock<HashMap<String, WorkerHandle>>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self {
            workers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a worker, overwriting any prior handle for the same id.
    pub async fn register(&self, worker_id: &str, handle: WorkerHandle) {
        let mut workers = self.workers.write().await;
        if let Some(previous) = workers.insert(worker_id.to_string(), handle) {
            info!(
                "Worker '{}' re-registered, replacing connection {}",
                worker_id, previous.connection_id
            );
        } else {
            info!("Worker '{}' registered", worker_id);
        }
    }

    /// Remove whichever worker currently maps to `connection_id`. Returns
    /// the removed worker id, or None when the registration was already
    /// superseded by a newer connection.
    pub async fn unregister_connection(&self, connection_id: Uuid) -> Option<String> {
        let mut workers = self.workers.write().await;
        let worker_id = workers
            .iter()
            .find(|(_, handle)| handle.connection_id == connection_id)
            .map(|(id, _)| id.clone())?;
        workers.remove(&worker_id);
        info!("Worker '{}' unregistered", worker_id);
        Some(worker_id)
    }

    /// Look up the live handle for a worker, if connected.
    pub async fn lookup(&self, worker_id: &str) -> Result<WorkerHandle, NotFoundError> {
        let workers = self.workers.read().await;
        workers
            .get(worker_id)
            .cloned()
            .ok_or_else(|| NotFoundError::WorkerNotConnected {
                worker_id: worker_id.to_string(),
            })
    }

    pub async fn connected_workers(&self) -> Vec<String> {
        let workers = self.workers.read().await;
        let mut ids: Vec<String> = workers.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for WorkerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

struct PendingEntry {
    target_worker_id: String,
    reply: oneshot::Sender<WorkerReply>,
}

/// In-flight push requests, keyed by request id. Each entry is single-use:
/// the first matching reply consumes it.
pub struct PendingReplies {
    entries: Mutex<HashMap<Uuid, PendingEntry>>,
}

/// Why a worker reply was not relayed to a requester.
#[derive(Debug, PartialEq, Eq)]
pub enum DeliverError {
    /// No pending entry for the request id (stale or duplicate reply).
    UnknownRequest,
    /// The reply came from a different worker than the request was sent to.
    SenderMismatch { expected: String },
}

impl PendingReplies {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Record an in-flight request before pushing it to `target_worker_id`.
    pub async fn insert(
        &self,
        request_id: Uuid,
        target_worker_id: &str,
        reply: oneshot::Sender<WorkerReply>,
    ) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            request_id,
            PendingEntry {
                target_worker_id: target_worker_id.to_string(),
                reply,
            },
        );
        debug!(
            "Forwarded request {} to worker '{}'",
            request_id, target_worker_id
        );
    }

    /// Route a worker's reply back to the awaiting requester. A reply whose
    /// sender does not match the recorded target is rejected and the entry
    /// kept; a reply for an unknown id is dropped.
    pub async fn deliver(
        &self,
        request_id: Uuid,
        sender_worker_id: &str,
        reply: WorkerReply,
    ) -> Result<(), DeliverError> {
        use std::collections::hash_map::Entry;

        let mut entries = self.entries.lock().await;
        match entries.entry(request_id) {
            Entry::Vacant(_) => {
                warn!(
                    "Dropping reply for unknown or already-answered request {} from '{}'",
                    request_id, sender_worker_id
                );
                Err(DeliverError::UnknownRequest)
            }
            Entry::Occupied(occupied) => {
                if occupied.get().target_worker_id != sender_worker_id {
                    let expected = occupied.get().target_worker_id.clone();
                    warn!(
                        "Rejecting reply for request {}: sent to '{}' but answered by '{}'",
                        request_id, expected, sender_worker_id
                    );
                    return Err(DeliverError::SenderMismatch { expected });
                }

                let entry = occupied.remove();
                if entry.reply.send(reply).is_err() {
                    // Requester gave up (timeout) between our lookup and
                    // the send.
                    debug!("Requester for {} is gone, reply discarded", request_id);
                }
                Ok(())
            }
        }
    }

    /// Drop an in-flight entry whose requester stopped waiting.
    pub async fn abandon(&self, request_id: Uuid) {
        let mut entries = self.entries.lock().await;
        if entries.remove(&request_id).is_some() {
            debug!("Abandoned pending request {}", request_id);
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

impl Default for PendingReplies {
    fn default() -> Self {
        Self::new()
    }
}
