//! Error types for the gateway.
//!
//! Handlers map every store-level failure into this taxonomy and return
//! structured JSON; a fault never escapes to the transport layer unshaped.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;
use tracing::error;
use uuid::Uuid;

/// Main error type for the gateway.
#[derive(Debug)]
pub enum GatewayError {
    /// Malformed or incomplete request body (400)
    Validation(ValidationError),

    /// Unknown command, worker, or request id (404)
    NotFound(NotFoundError),

    /// Missing or mismatched API key (401)
    Unauthorized,

    /// A connected worker failed to produce a usable reply (502/504)
    Upstream(UpstreamError),

    /// Unexpected fault (500, always logged with context)
    Internal(String),
}

/// Validation error variants
#[derive(Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Request body is not parseable JSON of the expected shape
    MalformedBody { reason: String },

    /// Request body is not a JSON object
    NotAnObject,

    /// A required field is absent
    MissingField { field: &'static str },

    /// A required field is present but empty
    EmptyField { field: &'static str },

    /// Method is not one of GET/POST
    InvalidMethod { value: String },

    /// `payload` is present but not a JSON object
    PayloadNotAnObject,
}

/// Not-found error variants
#[derive(Debug)]
pub enum NotFoundError {
    /// No queued command with this id
    CommandNotQueued { id: Uuid },

    /// The correlator has never seen this id
    UnknownCommand { id: Uuid },

    /// No live push channel for this worker
    WorkerNotConnected { worker_id: String },
}

/// Upstream (worker-side) failure variants
#[derive(Debug)]
pub enum UpstreamError {
    /// The worker did not reply before the deadline
    ReplyTimeout { worker_id: String },

    /// The worker replied with an error instead of a result
    WorkerError { worker_id: String, message: String },
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Validation(e) => write!(f, "{}", e),
            GatewayError::NotFound(e) => write!(f, "{}", e),
            GatewayError::Unauthorized => write!(f, "Unauthorized"),
            GatewayError::Upstream(e) => write!(f, "{}", e),
            GatewayError::Internal(msg) => write!(f, "Internal server error: {}", msg),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MalformedBody { reason } => {
                write!(f, "Invalid request body: {}", reason)
            }
            ValidationError::NotAnObject => {
                write!(f, "Invalid command format: expected a JSON object")
            }
            ValidationError::MissingField { field } => {
                write!(f, "Invalid command format: missing field '{}'", field)
            }
            ValidationError::EmptyField { field } => {
                write!(f, "Invalid command format: field '{}' is empty", field)
            }
            ValidationError::InvalidMethod { value } => {
                write!(
                    f,
                    "Invalid command format: method {} is not GET or POST",
                    value
                )
            }
            ValidationError::PayloadNotAnObject => {
                write!(f, "Invalid command format: payload must be a JSON object")
            }
        }
    }
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundError::CommandNotQueued { id } => {
                write!(f, "Command {} not found in queue", id)
            }
            NotFoundError::UnknownCommand { id } => {
                write!(f, "Command ID {} not found", id)
            }
            NotFoundError::WorkerNotConnected { worker_id } => {
                write!(f, "Worker '{}' is not connected", worker_id)
            }
        }
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamError::ReplyTimeout { worker_id } => {
                write!(f, "Worker '{}' did not reply in time", worker_id)
            }
            UpstreamError::WorkerError { worker_id, message } => {
                write!(f, "Worker '{}' reported an error: {}", worker_id, message)
            }
        }
    }
}

impl std::error::Error for GatewayError {}
impl std::error::Error for ValidationError {}
impl std::error::Error for NotFoundError {}
impl std::error::Error for UpstreamError {}

impl From<ValidationError> for GatewayError {
    fn from(err: ValidationError) -> Self {
        GatewayError::Validation(err)
    }
}

impl From<NotFoundError> for GatewayError {
    fn from(err: NotFoundError) -> Self {
        GatewayError::NotFound(err)
    }
}

impl From<UpstreamError> for GatewayError {
    fn from(err: UpstreamError) -> Self {
        GatewayError::Upstream(err)
    }
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::Upstream(UpstreamError::ReplyTimeout { .. }) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        if let GatewayError::Internal(ref msg) = self {
            error!("Internal error: {}", msg);
        }
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
