use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

mod config;
mod correlator;
mod errors;
mod queue;
mod registry;
mod types;
mod web;

use config::GatewayConfig;
use web::{start_web_server, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with reduced verbosity for transport crates
    let env_filter = EnvFilter::from_default_env()
        .add_directive("gateway=info".parse()?)
        .add_directive("tower_http=warn".parse()?)
        .add_directive("hyper=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting command relay gateway");

    let config_path = std::env::var("GATEWAY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config/gateway.toml"));
    let config = Arc::new(GatewayConfig::load(&config_path)?);

    if config.auth_enabled() {
        info!("API key check enabled for all routes");
    } else {
        warn!("No API key configured - all routes are open");
    }

    let state = AppState::new(config.clone());

    // Correlator entries are only evicted when a retention window is
    // configured; otherwise they accumulate for the process lifetime.
    if let Some(retention_hours) = config.response_retention_hours {
        let correlator = state.correlator.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
            loop {
                interval.tick().await;
                let evicted = correlator.evict_older_than(retention_hours).await;
                if evicted > 0 {
                    warn!(
                        "Evicted {} correlator entries older than {}h",
                        evicted, retention_hours
                    );
                }
            }
        });
        info!("Response eviction enabled: {}h retention", retention_hours);
    } else {
        info!("Response eviction disabled - correlator entries are kept indefinitely");
    }

    start_web_server(state).await
}
