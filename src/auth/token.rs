use std::fmt;

use serde::{Deserialize, Serialize};

/// Access/refresh credential pair held by the credential store.
///
/// Replaced as a unit; never patched field by field.
///
/// # Example
/// ```
/// use tokenward::auth::CredentialPair;
///
/// let pair = CredentialPair::new("access", "refresh");
/// assert_eq!(pair.refresh.as_deref(), Some("refresh"));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    pub access: String,
    pub refresh: Option<String>,
}

impl CredentialPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: Some(refresh.into()),
        }
    }

    /// A pair without a refresh credential; an expired access token cannot be
    /// recovered from it.
    pub fn access_only(access: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: None,
        }
    }
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access", &"<redacted>")
            .field("refresh", &self.refresh.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Body of `POST /auth/refresh/` (and `POST /auth/logout/`).
#[derive(Debug, Clone, Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Token pair returned by the refresh endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

impl From<TokenPairResponse> for CredentialPair {
    fn from(response: TokenPairResponse) -> Self {
        Self::new(response.access, response.refresh)
    }
}
