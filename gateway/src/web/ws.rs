//! WebSocket ingress for push workers.
//!
//! Each connection carries one worker. The first event must be a
//! `register`; after that the connection serves forwarded requests and
//! feeds replies back into the pending-reply table. All traffic is typed
//! [`WorkerEvent`]/[`BrokerEvent`] JSON; unparseable frames are dropped
//! with a warning.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::registry::{BrokerEvent, WorkerEvent, WorkerHandle, WorkerReply};
use crate::web::AppState;

/// Outbound queue depth per worker connection.
const EVENT_CHANNEL_CAPACITY: usize = 32;

pub async fn worker_channel(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4();
    debug!("Worker channel {} opened", connection_id);

    let (mut sink, mut stream) = socket.split();
    let (event_tx, mut event_rx) = mpsc::channel::<BrokerEvent>(EVENT_CHANNEL_CAPACITY);

    // Outbound half: serialize broker events onto the socket.
    let send_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to serialize broker event: {}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let mut registered: Option<String> = None;

    while let Some(result) = stream.next().await {
        let message = match result {
            Ok(message) => message,
            Err(e) => {
                debug!("Worker channel {} read error: {}", connection_id, e);
                break;
            }
        };

        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            // Control frames are handled by the transport.
            Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => continue,
        };

        let event = match serde_json::from_str::<WorkerEvent>(text.as_str()) {
            Ok(event) => event,
            Err(e) => {
                warn!(
                    "Dropping unparseable frame on worker channel {}: {}",
                    connection_id, e
                );
                continue;
            }
        };

        match event {
            WorkerEvent::Register { client_id } => {
                state
                    .workers
                    .register(
                        &client_id,
                        WorkerHandle {
                            connection_id,
                            sender: event_tx.clone(),
                        },
                    )
                    .await;
                registered = Some(client_id);
            }
            WorkerEvent::VersionResponse {
                request_id,
                client_id,
                version,
                error,
            } => {
                // The connection's registered identity is authoritative;
                // the payload field only gets a consistency check.
                let Some(sender_id) = registered.as_deref() else {
                    warn!(
                        "Reply on unregistered worker channel {}, dropped",
                        connection_id
                    );
                    continue;
                };
                if client_id != sender_id {
                    warn!(
                        "Worker '{}' sent a reply claiming to be '{}'",
                        sender_id, client_id
                    );
                }

                let reply = WorkerReply {
                    worker_id: sender_id.to_string(),
                    version,
                    error,
                };
                // Unknown-request and sender-mismatch outcomes are logged
                // inside deliver and intentionally not relayed.
                let _ = state.pending.deliver(request_id, sender_id, reply).await;
            }
        }
    }

    if let Some(worker_id) = registered {
        if state.workers.unregister_connection(connection_id).await.is_none() {
            debug!(
                "Worker '{}' registration already superseded at disconnect",
                worker_id
            );
        }
    }
    send_task.abort();
    info!("Worker channel {} closed", connection_id);
}
