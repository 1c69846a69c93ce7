// Command queue endpoints: enqueue, drain, cancellation

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::Json;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use super::common::{QueuedAck, RemovedAck, StatusAck};
use crate::errors::{GatewayError, ValidationError};
use crate::types::{Command, NewCommand};
use crate::web::AppState;

/// Add a new command to the queue and register it with the correlator so
/// callers can poll for its eventual response.
///
/// The body is parsed by hand so malformed input maps to this API's own
/// 400 shape instead of the framework's rejection.
pub async fn enqueue_command(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<QueuedAck>, GatewayError> {
    let body: Value =
        serde_json::from_slice(&body).map_err(|e| ValidationError::MalformedBody {
            reason: e.to_string(),
        })?;
    debug!("enqueue_command called with payload: {}", body);
    let command = NewCommand::parse(&body)?;

    let id = state.queue.enqueue(command).await;
    state.correlator.register(id).await;

    Ok(Json(QueuedAck::new(id)))
}

/// Fetch and clear all queued commands in one atomic step. This is the
/// delivery point: commands returned here are never handed out again.
pub async fn drain_commands(State(state): State<AppState>) -> Json<Vec<Command>> {
    let commands = state.queue.drain().await;
    debug!("Drained {} commands", commands.len());
    Json(commands)
}

/// Remove a single queued command by id.
pub async fn remove_command(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RemovedAck>, GatewayError> {
    state.queue.remove_by_id(id).await?;
    Ok(Json(RemovedAck::new(id)))
}

/// Clear the whole queue.
pub async fn clear_commands(State(state): State<AppState>) -> Json<StatusAck> {
    state.queue.clear_all().await;
    info!("Cleared all queued commands");
    Json(StatusAck::cleared())
}
