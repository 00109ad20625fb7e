//! Client configuration loaded from the environment.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const API_BASE_ENV: &str = "WORKPORTAL_API_BASE";
pub const TOKEN_PATH_ENV: &str = "WORKPORTAL_TOKEN_PATH";
pub const HTTP_TIMEOUT_ENV: &str = "WORKPORTAL_HTTP_TIMEOUT_SECS";

pub const DEFAULT_API_BASE: &str = "http://localhost:8100";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API base URL must start with http:// or https://, got '{0}'")]
    InvalidApiBase(String),

    #[error("invalid WORKPORTAL_HTTP_TIMEOUT_SECS: '{0}'")]
    InvalidTimeout(String),

    #[error("no platform data directory; set WORKPORTAL_TOKEN_PATH")]
    NoDataDir,
}

/// Where the portal API lives and where the bearer credential is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base: String,
    pub token_path: PathBuf,
    /// Transport timeout of the HTTP client. The navigation guard itself
    /// never times out a session fetch.
    pub http_timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_base: impl Into<String>, token_path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base: normalize_api_base(api_base.into())?,
            token_path: token_path.into(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        })
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Load from `WORKPORTAL_*` variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base = lookup(API_BASE_ENV).unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let token_path = match lookup(TOKEN_PATH_ENV) {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => default_token_path()?,
        };

        let http_timeout = match lookup(HTTP_TIMEOUT_ENV) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| ConfigError::InvalidTimeout(raw.clone()))?,
            None => DEFAULT_HTTP_TIMEOUT,
        };

        Ok(Self::new(api_base, token_path)?.with_http_timeout(http_timeout))
    }

    /// Absolute URL for an API endpoint such as `/users/me/`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }
}

fn normalize_api_base(raw: String) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidApiBase(raw));
    }
    Ok(trimmed.to_string())
}

fn default_token_path() -> Result<PathBuf, ConfigError> {
    let base = dirs::data_local_dir().ok_or(ConfigError::NoDataDir)?;
    Ok(base.join("workportal").join("access_token"))
}
