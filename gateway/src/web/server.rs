// Router assembly and listener startup

use anyhow::Result;
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::web::{handlers, middleware::require_api_key, ws, AppState};

pub async fn start_web_server(state: AppState) -> Result<()> {
    let addr = state.config.bind_addr();
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the full route table. Split out from startup so integration tests
/// can drive the router directly.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // === HEALTH ===
        .route("/api/v1", get(handlers::get_status))
        // === COMMAND QUEUE ===
        .route("/api/v1/command", post(handlers::enqueue_command))
        .route("/api/v1/command/{id}", delete(handlers::remove_command))
        .route(
            "/api/v1/commands",
            get(handlers::drain_commands).delete(handlers::clear_commands),
        )
        // === RESPONSE CORRELATION ===
        .route("/api/v1/getResponse/{id}", get(handlers::get_response))
        .route("/api/v1/updateStatus", post(handlers::update_status))
        // === PUSH WORKERS ===
        .route("/api/v1/workers", get(handlers::list_workers))
        .route(
            "/api/v1/workers/{worker_id}/version",
            get(handlers::request_version),
        )
        .route("/api/v1/ws", get(ws::worker_channel))
        // Add middleware
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
