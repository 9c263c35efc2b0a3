//! tokenward: bearer-token API client with single-flight refresh
//!
//! Attaches the stored access token to every request and, when the server
//! answers 401, refreshes the credential pair exactly once no matter how many
//! requests failed at the same time. Every affected request is then replayed
//! once with the new token, or failed with the refresh error.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokenward::prelude::*;
//!
//! # async fn example() -> tokenward::error::Result<()> {
//! let client = Arc::new(ApiClient::from_config(ClientConfig::from_env()?)?);
//! let session = SessionService::new(client.clone());
//! session.login(&LoginRequest::new("ana@example.com", "s3cret")).await?;
//!
//! let response = client.request(&RequestDescriptor::get("/companies/themes/")).await?;
//! println!("{}", response.body);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod prelude;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
