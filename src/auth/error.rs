use thiserror::Error;

/// Authentication and credential-lifecycle errors.
///
/// Cloneable so a single refresh outcome can be delivered to every request
/// waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("Missing refresh credential")]
    MissingRefreshCredential,
    #[error("Refresh rejected (status {status}): {message}")]
    RefreshRejected { status: u16, message: String },
    #[error("Refresh timed out after {0}ms")]
    RefreshTimeout(u64),
    #[error("Refresh abandoned before completion")]
    RefreshAbandoned,
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AuthError {
    /// Whether this failure ends the session.
    ///
    /// Every refresh failure wipes the credential store, transport errors and
    /// timeouts included. Only an abandoned refresh, whose exchange never
    /// finished, leaves the stored pair for the next request.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::RefreshAbandoned)
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<crate::util::timeout::Elapsed> for AuthError {
    fn from(elapsed: crate::util::timeout::Elapsed) -> Self {
        Self::RefreshTimeout(elapsed.millis)
    }
}
