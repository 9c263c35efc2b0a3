//! Error types for tokenward.

use strum::{Display, EnumString};
use thiserror::Error;

use crate::auth::AuthError;

/// Primary error type for every request issued through the client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server rejected the bearer credential (HTTP 401).
    #[error("Unauthorized (status {status}): {body}")]
    Unauthorized { status: u16, body: String },

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Broad error category, used for logging and CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    Authentication,
    Network,
    Timeout,
    Server,
    Api,
    Configuration,
    Serialization,
    Unknown,
}

impl ClientError {
    /// Build the error for a non-success HTTP status.
    ///
    /// 401 maps to [`ClientError::Unauthorized`]; everything else is an opaque
    /// [`ClientError::Api`] failure.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        if status == 401 {
            Self::Unauthorized { status, body }
        } else {
            Self::Api { status, body }
        }
    }

    /// Whether this failure may be recovered by refreshing the credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::Auth(AuthError::RefreshRejected { status, .. }) => Some(*status),
            Self::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized { .. } | Self::Auth(_) => ErrorCategory::Authentication,
            Self::Network(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                403 => ErrorCategory::Authentication,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::InvalidArgument(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether the caller should treat itself as logged out.
    ///
    /// True once a refresh has failed in a way that wiped the stored
    /// credentials.
    pub fn requires_login(&self) -> bool {
        match self {
            Self::Auth(err) => err.is_terminal(),
            _ => false,
        }
    }

    /// Extract a human-readable message from a JSON error body.
    ///
    /// Understands a bare JSON string, `{"detail": "..."}`, and field-error
    /// maps such as `{"email": ["already taken"]}` (first field wins).
    pub fn detail_message(&self) -> Option<String> {
        let body = match self {
            Self::Unauthorized { body, .. } | Self::Api { body, .. } => body,
            Self::Auth(AuthError::RefreshRejected { message, .. }) => message,
            _ => return None,
        };
        detail_from_body(body)
    }
}

fn detail_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value {
        serde_json::Value::String(text) => Some(text),
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::String(detail)) = map.get("detail") {
                return Some(detail.clone());
            }
            match map.values().next()? {
                serde_json::Value::Array(items) => match items.first()? {
                    serde_json::Value::String(text) => Some(text.clone()),
                    other => Some(other.to_string()),
                },
                serde_json::Value::String(text) => Some(text.clone()),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ClientError>;
