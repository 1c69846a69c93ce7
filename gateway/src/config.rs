//! Gateway configuration.
//!
//! Loaded from a TOML file, with `HOST`, `PORT`, and `API_KEY` environment
//! overrides so containerized deployments can reconfigure without touching
//! the file.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared-secret API key. Empty or absent disables the check.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Retention window for correlator entries, in hours. Absent means no
    /// eviction ever runs and entries accumulate for the process lifetime.
    #[serde(default)]
    pub response_retention_hours: Option<u64>,

    /// How long a push request waits for the worker's reply.
    #[serde(default = "default_reply_timeout")]
    pub reply_timeout_seconds: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_reply_timeout() -> u64 {
    10
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_key: None,
            response_retention_hours: None,
            reply_timeout_seconds: default_reply_timeout(),
        }
    }
}

impl GatewayConfig {
    /// Load from `path`, falling back to defaults when the file is absent,
    /// then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| anyhow!("Failed to read config {}: {}", path.display(), e))?;
            toml::from_str(&content)
                .map_err(|e| anyhow!("Failed to parse config {}: {}", path.display(), e))?
        } else {
            warn!(
                "Config file {} not found, using defaults",
                path.display()
            );
            Self::default()
        };

        config.apply_env_overrides();
        config.normalize();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("HOST") {
            if !host.is_empty() {
                self.host = host;
            }
        }
        if let Ok(port) = std::env::var("PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => warn!("Ignoring unparseable PORT override: {}", port),
            }
        }
        if let Ok(api_key) = std::env::var("API_KEY") {
            self.api_key = Some(api_key);
        }
    }

    fn normalize(&mut self) {
        // An empty key means auth is disabled, same as no key at all.
        if self
            .api_key
            .as_ref()
            .is_some_and(|key| key.trim().is_empty())
        {
            self.api_key = None;
        }
    }

    pub fn auth_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_full_config() {
        let toml = r#"
            host = "127.0.0.1"
            port = 9000
            api_key = "secret"
            response_retention_hours = 24
            reply_timeout_seconds = 5
        "#;
        let config: GatewayConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.response_retention_hours, Some(24));
        assert_eq!(config.reply_timeout_seconds, 5);
    }

    #[test]
    fn defaults_apply_for_missing_fields() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.port, 8090);
        assert!(config.api_key.is_none());
        assert!(config.response_retention_hours.is_none());
    }

    #[test]
    fn empty_api_key_disables_auth() {
        let mut config: GatewayConfig = toml::from_str(r#"api_key = """#).unwrap();
        config.normalize();
        assert!(!config.auth_enabled());
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 9191").unwrap();
        let config = GatewayConfig::load(file.path()).unwrap();
        assert_eq!(config.port, 9191);
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let config = GatewayConfig::load(Path::new("does/not/exist.toml")).unwrap();
        assert_eq!(config.host, "0.0.0.0");
    }
}
