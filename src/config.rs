//! Client configuration
//!
//! Loaded from the process environment (and a `.env` file when present):
//!
//! - `LOGIVITE_API_BASE_URL` (required) - backend base URL
//! - `LOGIVITE_REQUEST_TIMEOUT_SECS` - default request timeout, 30 s
//! - `LOGIVITE_AUTH_TIMEOUT_SECS` - timeout for auth-related paths, 20 s

use std::time::Duration;

use anyhow::Context;
use url::Url;

pub const ENV_BASE_URL: &str = "LOGIVITE_API_BASE_URL";
pub const ENV_REQUEST_TIMEOUT: &str = "LOGIVITE_REQUEST_TIMEOUT_SECS";
pub const ENV_AUTH_TIMEOUT: &str = "LOGIVITE_AUTH_TIMEOUT_SECS";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Always ends with `/` so request paths join beneath it.
    pub base_url: Url,
    pub request_timeout: Duration,
    pub auth_timeout: Duration,
    /// Path fragments that select `auth_timeout` instead of `request_timeout`.
    pub auth_path_markers: Vec<String>,
    pub login_route: String,
    pub home_route: String,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            auth_timeout: Duration::from_secs(DEFAULT_AUTH_TIMEOUT_SECS),
            auth_path_markers: vec!["/Account/".to_string(), "/GetTenantList".to_string()],
            login_route: "/login".to_string(),
            home_route: "/dashboard".to_string(),
        })
    }

    /// Build from the environment, reading `.env` first if one exists.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let base = std::env::var(ENV_BASE_URL).map_err(|_| ConfigError::Missing(ENV_BASE_URL))?;
        let mut config = Self::new(&base).context("Failed to parse backend base URL")?;

        if let Some(secs) = read_secs(ENV_REQUEST_TIMEOUT)? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = read_secs(ENV_AUTH_TIMEOUT)? {
            config.auth_timeout = Duration::from_secs(secs);
        }

        tracing::debug!(
            base_url = %config.base_url,
            request_timeout_secs = config.request_timeout.as_secs(),
            auth_timeout_secs = config.auth_timeout.as_secs(),
            "client configuration loaded"
        );
        Ok(config)
    }

    pub fn with_timeouts(mut self, request: Duration, auth: Duration) -> Self {
        self.request_timeout = request;
        self.auth_timeout = auth;
        self
    }

    /// Timeout window for a request path.
    pub fn timeout_for(&self, path: &str) -> Duration {
        if self.auth_path_markers.iter().any(|m| path.contains(m.as_str())) {
            self.auth_timeout
        } else {
            self.request_timeout
        }
    }

    /// Absolute URL for a backend path.
    pub fn url_for(&self, path: &str) -> Result<Url, ConfigError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ConfigError::InvalidBaseUrl {
                url: format!("{}{}", self.base_url, path),
                reason: e.to_string(),
            })
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    let url = Url::parse(&normalized).map_err(|e| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: "not a base URL".to_string(),
        });
    }
    Ok(url)
}

fn read_secs(name: &'static str) -> Result<Option<u64>, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_paths_get_shorter_timeout() {
        let config = ClientConfig::new("https://api.example.com/v1").unwrap();
        assert_eq!(config.timeout_for("/Account/Login"), Duration::from_secs(20));
        assert_eq!(config.timeout_for("/Tenant/GetTenantList"), Duration::from_secs(20));
        assert_eq!(config.timeout_for("/Dashboard/GetLocationList"), Duration::from_secs(30));
    }

    #[test]
    fn test_paths_join_under_base() {
        let config = ClientConfig::new("https://api.example.com/v1").unwrap();
        let url = config.url_for("/Account/Login").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/Account/Login");
    }

    #[test]
    fn test_rejects_garbage_base_url() {
        let err = ClientConfig::new("not a url").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));
    }
}
