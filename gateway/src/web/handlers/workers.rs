// Push-variant endpoints: worker listing and request/reply forwarding

use axum::extract::{Path, State};
use axum::response::Json;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{GatewayError, NotFoundError, UpstreamError};
use crate::registry::BrokerEvent;
use crate::web::AppState;

#[derive(Debug, Serialize)]
pub struct WorkerList {
    pub workers: Vec<String>,
}

/// List the push workers currently holding a live channel.
pub async fn list_workers(State(state): State<AppState>) -> Json<WorkerList> {
    let workers = state.workers.connected_workers().await;
    Json(WorkerList { workers })
}

#[derive(Debug, Serialize)]
pub struct VersionResult {
    pub worker_id: String,
    pub version: Value,
}

/// Ask a specific connected worker for its presentation application's
/// version and wait for the asynchronous reply.
pub async fn request_version(
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
) -> Result<Json<VersionResult>, GatewayError> {
    let handle = state.workers.lookup(&worker_id).await?;

    let request_id = Uuid::new_v4();
    let (reply_tx, reply_rx) = oneshot::channel();
    state.pending.insert(request_id, &worker_id, reply_tx).await;

    let event = BrokerEvent::VersionRequest { request_id };
    if handle.sender.send(event).await.is_err() {
        // The channel closed under us; the registry will catch up when the
        // connection task exits.
        state.pending.abandon(request_id).await;
        warn!("Worker '{}' channel closed before forward", worker_id);
        return Err(NotFoundError::WorkerNotConnected { worker_id }.into());
    }

    info!("Forwarded version request {} to '{}'", request_id, worker_id);

    let deadline = Duration::from_secs(state.config.reply_timeout_seconds);
    let reply = match timeout(deadline, reply_rx).await {
        Ok(Ok(reply)) => reply,
        Ok(Err(_)) | Err(_) => {
            state.pending.abandon(request_id).await;
            warn!(
                "Version request {} to '{}' timed out after {:?}",
                request_id, worker_id, deadline
            );
            return Err(UpstreamError::ReplyTimeout { worker_id }.into());
        }
    };

    if let Some(message) = reply.error {
        return Err(UpstreamError::WorkerError { worker_id, message }.into());
    }

    Ok(Json(VersionResult {
        worker_id,
        version: reply.version.unwrap_or(Value::Null),
    }))
}
