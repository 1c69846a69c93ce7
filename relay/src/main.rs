use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use relay::config::{RelayConfig, Transport};
use relay::poller::Poller;

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("relay=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = RelayConfig::from_env()?;
    info!(
        "Starting relay worker '{}' (gateway: {}, target: {})",
        config.worker_id, config.gateway_url, config.target_url
    );

    match config.transport {
        Transport::Poll => {
            let poller = Poller::from_config(&config)?;
            poller.run().await;
            Ok(())
        }
        Transport::Push => relay::push::run(config).await,
    }
}
