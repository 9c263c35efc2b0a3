//! Client configuration (code > env > defaults).

use std::path::PathBuf;
use std::time::Duration;

use bon::Builder;
use reqwest::Url;

use crate::auth::StoreConfig;
use crate::error::ClientError;

pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh/";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_REFRESH_TIMEOUT: Duration = crate::auth::coordinator::DEFAULT_REFRESH_TIMEOUT;

/// Environment variables read by [`ClientConfig::from_env`].
pub const ENV_BASE_URL: &str = "TOKENWARD_BASE_URL";
pub const ENV_REFRESH_PATH: &str = "TOKENWARD_REFRESH_PATH";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "TOKENWARD_REQUEST_TIMEOUT_SECS";
pub const ENV_REFRESH_TIMEOUT_SECS: &str = "TOKENWARD_REFRESH_TIMEOUT_SECS";
pub const ENV_STORAGE_DIR: &str = "TOKENWARD_STORAGE_DIR";

/// Settings for an [`ApiClient`](crate::client::ApiClient).
///
/// # Example
/// ```
/// use std::time::Duration;
/// use tokenward::config::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("https://api.example.com/api")
///     .refresh_timeout(Duration::from_secs(10))
///     .build();
/// assert_eq!(
///     config.endpoint("/auth/me/").unwrap(),
///     "https://api.example.com/api/auth/me/"
/// );
/// ```
#[derive(Debug, Clone, Builder)]
pub struct ClientConfig {
    #[builder(into)]
    pub base_url: String,
    #[builder(into, default = DEFAULT_REFRESH_PATH.to_string())]
    pub refresh_path: String,
    #[builder(default = DEFAULT_REQUEST_TIMEOUT)]
    pub request_timeout: Duration,
    #[builder(default = DEFAULT_REFRESH_TIMEOUT)]
    pub refresh_timeout: Duration,
    #[builder(default = StoreConfig::default_dir())]
    pub storage_dir: PathBuf,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::builder().base_url(base_url).build()
    }

    /// Load from environment variables (and `.env` if present).
    ///
    /// `TOKENWARD_BASE_URL` is required; everything else falls back to the
    /// defaults.
    pub fn from_env() -> Result<Self, ClientError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        let base_url = std::env::var(ENV_BASE_URL).map_err(|_| {
            ClientError::Configuration(format!("Environment variable {ENV_BASE_URL} not set"))
        })?;
        let mut config = Self::new(base_url);

        if let Ok(path) = std::env::var(ENV_REFRESH_PATH) {
            config.refresh_path = path;
        }
        if let Some(timeout) = env_secs(ENV_REQUEST_TIMEOUT_SECS)? {
            config.request_timeout = timeout;
        }
        if let Some(timeout) = env_secs(ENV_REFRESH_TIMEOUT_SECS)? {
            config.refresh_timeout = timeout;
        }
        if let Some(dir) = std::env::var_os(ENV_STORAGE_DIR) {
            config.storage_dir = PathBuf::from(dir);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the base URL is an absolute http(s) URL.
    pub fn validate(&self) -> Result<(), ClientError> {
        let url = Url::parse(&self.base_url).map_err(|err| {
            ClientError::Configuration(format!("Invalid base URL {}: {err}", self.base_url))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ClientError::Configuration(format!(
                "Unsupported base URL scheme {other}"
            ))),
        }
    }

    /// Resolve `path` against the base URL. Absolute URLs pass through.
    pub fn endpoint(&self, path: &str) -> Result<String, ClientError> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(path.to_string());
        }
        self.validate()?;
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(format!("{base}/{path}"))
    }

    pub fn refresh_url(&self) -> Result<String, ClientError> {
        self.endpoint(&self.refresh_path)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.storage_dir.clone())
    }
}

fn env_secs(var: &str) -> Result<Option<Duration>, ClientError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| ClientError::Configuration(format!("{var} must be whole seconds, got {raw}"))),
        Err(_) => Ok(None),
    }
}
