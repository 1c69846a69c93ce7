// Response correlation endpoints: worker status reports and caller polling

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::debug;
use uuid::Uuid;

use super::common::StatusAck;
use crate::correlator::ReadOutcome;
use crate::errors::{GatewayError, NotFoundError, ValidationError};
use crate::types::{CommandResponse, StatusUpdate};
use crate::web::AppState;

/// Store a worker's execution report under the command's id.
pub async fn update_status(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StatusAck>, GatewayError> {
    let update: StatusUpdate =
        serde_json::from_slice(&body).map_err(|e| ValidationError::MalformedBody {
            reason: e.to_string(),
        })?;
    debug!(
        "Status update for command {}: {}",
        update.command.id, update.status_code
    );
    let response = CommandResponse::from_update(&update);
    state.correlator.update(response).await?;
    Ok(Json(StatusAck::received()))
}

/// Poll for the response to a previously enqueued command.
///
/// Three distinct outcomes: 200 with the stored response, 202 while the
/// command is registered but unanswered, 404 when the id was never seen.
pub async fn get_response(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, GatewayError> {
    match state.correlator.read(id).await {
        ReadOutcome::Ready(response) => Ok(ready_response(response)),
        ReadOutcome::Pending => {
            debug!("Response not available yet for command {}", id);
            Ok((StatusCode::ACCEPTED, Json(StatusAck::pending())).into_response())
        }
        ReadOutcome::NotRegistered => Err(NotFoundError::UnknownCommand { id }.into()),
    }
}

fn ready_response(response: CommandResponse) -> Response {
    (StatusCode::OK, Json(response)).into_response()
}
