//! Request descriptors, responses and the executor that sends them.

pub mod executor;

pub use executor::{classify, HttpExecutor, RequestExecutor};

use bon::Builder;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::ClientError;

/// An immutable description of one logical request.
///
/// Replays reuse the same descriptor; only the bearer credential changes.
///
/// # Example
/// ```
/// use tokenward::http::RequestDescriptor;
/// use reqwest::Method;
///
/// let request = RequestDescriptor::builder()
///     .method(Method::PATCH)
///     .path("/auth/me/")
///     .body(serde_json::json!({ "phone": "+55 11 5555-0000" }))
///     .build();
/// assert_eq!(request.method, Method::PATCH);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct RequestDescriptor {
    #[builder(default = Method::GET)]
    pub method: Method,
    /// Path relative to the configured base URL.
    #[builder(into)]
    pub path: String,
    #[builder(default)]
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    #[builder(default)]
    pub headers: Vec<(String, String)>,
    /// Correlates log lines for the first attempt and its replay.
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,
}

impl RequestDescriptor {
    pub fn get(path: impl Into<String>) -> Self {
        Self::builder().path(path).build()
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::builder().method(Method::DELETE).path(path).build()
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::builder()
            .method(Method::POST)
            .path(path)
            .body(body)
            .build()
    }

    pub fn put(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::builder()
            .method(Method::PUT)
            .path(path)
            .body(body)
            .build()
    }

    pub fn patch(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::builder()
            .method(Method::PATCH)
            .path(path)
            .body(body)
            .build()
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl ApiResponse {
    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }
}
