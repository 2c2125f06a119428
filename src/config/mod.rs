//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use reqwest::Url;

/// Upstream game service used when `UPSTREAM_BASE_URL` is unset
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://try-maze-runner.up.railway.app/api/v1";

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,

    /// Base URL of the upstream maze API
    pub upstream_base_url: Url,
    /// Timeout for each upstream request
    pub upstream_timeout_secs: u64,

    /// Allowed client origins for CORS (comma-separated)
    pub client_origin: String,

    /// Period between snapshot polls of a viewer
    pub poll_interval: Duration,
    /// Player actions per second allowed for one credential
    pub action_rate_limit: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        };

        let upstream_base_url = lookup("UPSTREAM_BASE_URL")
            .unwrap_or_else(|| DEFAULT_UPSTREAM_BASE_URL.to_string());
        let upstream_base_url = Url::parse(&upstream_base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or(ConfigError::Invalid("UPSTREAM_BASE_URL"))?;

        let poll_interval_ms = parse_or(&lookup, "POLL_INTERVAL_MS", 1000u64)?;
        if poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("POLL_INTERVAL_MS"));
        }

        let action_rate_limit = parse_or(&lookup, "ACTION_RATE_LIMIT", 10u32)?;
        if action_rate_limit == 0 {
            return Err(ConfigError::Invalid("ACTION_RATE_LIMIT"));
        }

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_json: lookup("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),

            upstream_base_url,
            upstream_timeout_secs: parse_or(&lookup, "UPSTREAM_TIMEOUT_SECS", 10)?,

            client_origin: lookup("CLIENT_ORIGIN")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),

            poll_interval: Duration::from_millis(poll_interval_ms),
            action_rate_limit,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
