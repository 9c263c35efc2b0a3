//! Single-attempt request execution.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use super::{ApiResponse, RequestDescriptor};
use crate::config::ClientConfig;
use crate::error::ClientError;

/// Performs exactly one outbound call. Never retries or refreshes.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(
        &self,
        request: &RequestDescriptor,
        access_token: Option<&str>,
    ) -> Result<ApiResponse, ClientError>;
}

/// Classify a raw response: 2xx passes through, 401 becomes
/// [`ClientError::Unauthorized`], anything else [`ClientError::Api`].
pub fn classify(response: ApiResponse) -> Result<ApiResponse, ClientError> {
    if (200..300).contains(&response.status) {
        Ok(response)
    } else {
        Err(ClientError::from_status(response.status, response.body))
    }
}

/// Build request headers, with `Authorization: Bearer <token>` when a token
/// is present.
pub fn request_headers(
    access_token: Option<&str>,
    extra: &[(String, String)],
) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    for (name, value) in extra {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ClientError::InvalidArgument(format!("invalid header name: {name}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| ClientError::InvalidArgument(format!("invalid value for header {name}")))?;
        headers.insert(name, value);
    }
    if let Some(token) = access_token {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            ClientError::InvalidArgument("access token is not a valid header value".to_string())
        })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

/// reqwest-backed executor resolving paths against the configured base URL.
pub struct HttpExecutor {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpExecutor {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = build_client(config.request_timeout)?;
        Ok(Self { client, config })
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, ClientError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(
        &self,
        request: &RequestDescriptor,
        access_token: Option<&str>,
    ) -> Result<ApiResponse, ClientError> {
        let url = self.config.endpoint(&request.path)?;
        let headers = request_headers(access_token, &request.headers)?;

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(|err| {
            if err.is_timeout() {
                ClientError::Timeout(self.config.request_timeout.as_millis() as u64)
            } else {
                ClientError::Network(err)
            }
        })?;

        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.text().await?;
        debug!(
            request_id = %request.id,
            method = %request.method,
            path = %request.path,
            status,
            "Request completed"
        );

        classify(ApiResponse {
            status,
            headers,
            body,
        })
    }
}
