//! Credential storage, refresh exchange and single-flight refresh coordination.

pub mod coordinator;
pub mod credentials;
pub mod error;
pub mod exchange;
pub mod session;
pub mod store;
pub mod token;
pub mod user;

pub use coordinator::{RefreshCoordinator, Settlement};
pub use credentials::CredentialStore;
pub use error::AuthError;
pub use exchange::{HttpRefreshExchange, RefreshExchange};
pub use session::{LoginRequest, PasswordChange, ProfileUpdate, SessionService};
pub use store::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, StoreConfig};
pub use token::CredentialPair;
pub use user::{AuthUser, Company, CompanyMembership};
