//! HTTP transport with bounded retry.
//!
//! Every outbound call carries the configured timeout. Connection-level
//! failures, timeouts, and 5xx responses are retried with exponential
//! backoff up to `max_attempts` total attempts; the final response or
//! transport error is returned after that. 4xx responses are returned
//! immediately since retrying them cannot change the outcome.

use anyhow::Result;
use reqwest::{Client, Method, Response};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

const API_KEY_HEADER: &str = "X-API-Key";
const BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Transport-level failure after all attempts were exhausted.
#[derive(Debug)]
pub enum SessionError {
    Timeout { url: String },
    Connection { url: String },
    Request { url: String, reason: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Timeout { url } => write!(f, "Timeout while requesting {}", url),
            SessionError::Connection { url } => {
                write!(f, "Connection error - unable to reach {}", url)
            }
            SessionError::Request { url, reason } => {
                write!(f, "Request error for {}: {}", url, reason)
            }
        }
    }
}

impl std::error::Error for SessionError {}

pub struct Session {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    max_attempts: u32,
}

impl Session {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        api_key: Option<String>,
        max_attempts: u32,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            max_attempts: max_attempts.max(1),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get(&self, path: &str) -> Result<Response, SessionError> {
        self.execute(Method::GET, path, None).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Response, SessionError> {
        self.execute(Method::POST, path, Some(body)).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, SessionError> {
        let url = self.url(path);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let mut request = self.client.request(method.clone(), &url);
            if let Some(key) = &self.api_key {
                request = request.header(API_KEY_HEADER, key);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(response) if response.status().is_server_error() => {
                    if attempt >= self.max_attempts {
                        debug!(
                            "Giving up on {} after {} attempts ({})",
                            url,
                            attempt,
                            response.status()
                        );
                        return Ok(response);
                    }
                    warn!(
                        "{} returned {} (attempt {}/{}), retrying",
                        url,
                        response.status(),
                        attempt,
                        self.max_attempts
                    );
                }
                Ok(response) => return Ok(response),
                Err(e) if e.is_timeout() || e.is_connect() => {
                    if attempt >= self.max_attempts {
                        return Err(classify(e, url));
                    }
                    warn!(
                        "Request to {} failed (attempt {}/{}): {}",
                        url, attempt, self.max_attempts, e
                    );
                }
                Err(e) => return Err(classify(e, url)),
            }

            tokio::time::sleep(BACKOFF_BASE * 2u32.pow(attempt - 1)).await;
        }
    }
}

fn classify(error: reqwest::Error, url: String) -> SessionError {
    if error.is_timeout() {
        SessionError::Timeout { url }
    } else if error.is_connect() {
        SessionError::Connection { url }
    } else {
        SessionError::Request {
            url,
            reason: error.to_string(),
        }
    }
}
