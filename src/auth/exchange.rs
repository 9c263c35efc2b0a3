//! Refresh-token exchange against `POST /auth/refresh/`.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::debug;

use super::error::AuthError;
use super::token::{CredentialPair, RefreshRequest, TokenPairResponse};

/// Trades a refresh credential for a brand-new credential pair.
#[async_trait]
pub trait RefreshExchange: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<CredentialPair, AuthError>;
}

/// HTTP implementation posting `{"refresh": ...}` and expecting
/// `{"access": ..., "refresh": ...}` back.
///
/// Any non-2xx status is reported as [`AuthError::RefreshRejected`].
pub struct HttpRefreshExchange {
    client: reqwest::Client,
    refresh_url: String,
}

impl HttpRefreshExchange {
    pub fn new(refresh_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            refresh_url: refresh_url.into(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn refresh_url(&self) -> &str {
        &self.refresh_url
    }
}

#[async_trait]
impl RefreshExchange for HttpRefreshExchange {
    async fn refresh(&self, refresh_token: &str) -> Result<CredentialPair, AuthError> {
        debug!(url = %self.refresh_url, "Exchanging refresh credential");
        let resp = self
            .client
            .post(&self.refresh_url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&RefreshRequest {
                refresh: refresh_token,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(AuthError::RefreshRejected {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        let payload: TokenPairResponse = serde_json::from_str(&body).map_err(|err| {
            AuthError::InvalidResponse(format!("Refresh response missing token pair: {err}"))
        })?;
        Ok(payload.into())
    }
}
