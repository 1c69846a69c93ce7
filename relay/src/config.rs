//! Relay configuration, read entirely from environment variables.

use anyhow::{anyhow, Result};
use std::time::Duration;
use tracing::warn;

/// Which transport connects this relay to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Periodically drain the gateway's command queue.
    Poll,
    /// Hold a persistent channel and serve pushed requests.
    Push,
}

impl std::str::FromStr for Transport {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "poll" => Ok(Transport::Poll),
            "push" => Ok(Transport::Push),
            other => Err(anyhow!(
                "Invalid RELAY_TRANSPORT '{}': expected 'poll' or 'push'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Base URL of the externally reachable gateway.
    pub gateway_url: String,
    /// Base URL of the local presentation application.
    pub target_url: String,
    /// Shared-secret sent as `X-API-Key` to the gateway.
    pub api_key: Option<String>,
    /// Identifier this worker registers under (push transport).
    pub worker_id: String,
    pub transport: Transport,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    /// Total attempts per request, including the first.
    pub max_attempts: u32,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self> {
        let gateway_url = env_or("GATEWAY_URL", "http://localhost:8090");
        let target_url = env_or("TARGET_URL", "http://localhost:8000");

        let api_key = std::env::var("RELAY_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            warn!("RELAY_API_KEY not set - gateway requests are sent unauthenticated");
        }

        let transport: Transport = env_or("RELAY_TRANSPORT", "poll").parse()?;

        Ok(Self {
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
            target_url: target_url.trim_end_matches('/').to_string(),
            api_key,
            worker_id: env_or("WORKER_ID", "relay-worker"),
            transport,
            poll_interval: Duration::from_secs(env_parsed("POLL_INTERVAL_SECONDS", 5)?),
            request_timeout: Duration::from_secs(env_parsed("REQUEST_TIMEOUT_SECONDS", 5)?),
            max_attempts: env_parsed("RETRY_MAX_ATTEMPTS", 4)?,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| anyhow!("Invalid value for {}: {}", name, value)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_parses_case_insensitively() {
        assert_eq!("poll".parse::<Transport>().unwrap(), Transport::Poll);
        assert_eq!("PUSH".parse::<Transport>().unwrap(), Transport::Push);
        assert!("carrier-pigeon".parse::<Transport>().is_err());
    }
}
