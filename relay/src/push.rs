//! Push transport: a persistent WebSocket channel to the gateway.
//!
//! The worker connects, registers its id, and serves forwarded requests as
//! they arrive, replying with the correlation id it was given. When the
//! channel drops it reconnects after a fixed delay.

use anyhow::{anyhow, Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::RelayConfig;
use crate::session::Session;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const VERSION_PATH: &str = "version";

/// Events pushed by the gateway.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BrokerEvent {
    VersionRequest { request_id: Uuid },
}

/// Events this worker sends to the gateway.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WorkerEvent {
    Register {
        client_id: String,
    },
    VersionResponse {
        request_id: Uuid,
        client_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        version: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

/// Run the push worker until process termination, reconnecting on channel
/// loss.
pub async fn run(config: RelayConfig) -> Result<()> {
    let target = Session::new(
        &config.target_url,
        config.request_timeout,
        None,
        config.max_attempts,
    )?;
    let ws_url = websocket_url(&config.gateway_url)?;

    loop {
        match connect_and_serve(&config, &ws_url, &target).await {
            Ok(()) => info!("Worker channel closed by the gateway"),
            Err(e) => warn!("Worker channel error: {}", e),
        }
        info!("Reconnecting in {:?}", RECONNECT_DELAY);
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

fn websocket_url(gateway_url: &str) -> Result<String> {
    let base = if let Some(rest) = gateway_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = gateway_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        return Err(anyhow!(
            "GATEWAY_URL must start with http:// or https://, got '{}'",
            gateway_url
        ));
    };
    Ok(format!("{}/api/v1/ws", base.trim_end_matches('/')))
}

async fn connect_and_serve(
    config: &RelayConfig,
    ws_url: &str,
    target: &Session,
) -> Result<()> {
    let mut request = ws_url
        .into_client_request()
        .context("invalid websocket URL")?;
    if let Some(key) = &config.api_key {
        request
            .headers_mut()
            .insert("X-API-Key", HeaderValue::from_str(key)?);
    }

    let (stream, _) = connect_async(request)
        .await
        .context("websocket connect failed")?;
    let (mut sink, mut stream) = stream.split();

    let register = WorkerEvent::Register {
        client_id: config.worker_id.clone(),
    };
    sink.send(Message::Text(serde_json::to_string(&register)?.into()))
        .await
        .context("failed to send registration")?;
    info!("Registered as '{}' with the gateway", config.worker_id);

    while let Some(message) = stream.next().await {
        let message = message.context("websocket read failed")?;
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => return Ok(()),
            _ => continue,
        };

        let event = match serde_json::from_str::<BrokerEvent>(text.as_str()) {
            Ok(event) => event,
            Err(e) => {
                warn!("Dropping unparseable gateway frame: {}", e);
                continue;
            }
        };

        match event {
            BrokerEvent::VersionRequest { request_id } => {
                info!("Received version request {}", request_id);
                let reply = version_reply(config, target, request_id).await;
                sink.send(Message::Text(serde_json::to_string(&reply)?.into()))
                    .await
                    .context("failed to send reply")?;
            }
        }
    }

    Ok(())
}

/// Query the presentation application's version and shape the reply. Target
/// failures become an error reply rather than a dropped request.
async fn version_reply(
    config: &RelayConfig,
    target: &Session,
    request_id: Uuid,
) -> WorkerEvent {
    let (version, error) = match target.get(VERSION_PATH).await {
        Ok(response) if response.status().is_success() => match response.json::<Value>().await {
            Ok(version) => (Some(version), None),
            Err(e) => (None, Some(format!("unreadable version body: {}", e))),
        },
        Ok(response) => (
            None,
            Some(format!("version endpoint returned {}", response.status())),
        ),
        Err(e) => {
            error!("Version request {} failed locally: {}", request_id, e);
            (None, Some(e.to_string()))
        }
    };

    WorkerEvent::VersionResponse {
        request_id,
        client_id: config.worker_id.clone(),
        version,
        error,
    }
}
