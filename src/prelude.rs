//! Convenience re-exports for common use.

pub use crate::auth::{
    AuthError, AuthUser, CompanyMembership, CredentialPair, CredentialStore, LoginRequest,
    SessionService,
};
pub use crate::client::ApiClient;
pub use crate::config::ClientConfig;
pub use crate::error::{ClientError, Result};
pub use crate::http::{ApiResponse, RequestDescriptor};
