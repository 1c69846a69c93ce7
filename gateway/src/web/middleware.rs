//! Cross-cutting request middleware.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::errors::GatewayError;
use crate::web::AppState;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Shared-secret check applied uniformly over the whole router. When the
/// gateway is configured without a key the layer passes everything through;
/// otherwise every request must carry an exactly matching `X-API-Key`
/// header and is rejected before any store is touched.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let Some(expected) = state.config.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    match provided {
        Some(key) if key == expected => Ok(next.run(request).await),
        _ => {
            tracing::warn!("Unauthorized access attempt");
            Err(GatewayError::Unauthorized)
        }
    }
}
