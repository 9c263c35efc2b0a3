//! The client facade: authenticated requests with transparent refresh.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::auth::{
    CredentialPair, CredentialStore, FileKeyValueStore, HttpRefreshExchange, RefreshCoordinator,
    RefreshExchange,
};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{ApiResponse, HttpExecutor, RequestDescriptor, RequestExecutor};

/// A request is replayed at most this many times after an unauthorized
/// response.
pub const MAX_REPLAYS: u32 = 1;

/// Entry point for every request to the backend.
///
/// Attaches the stored bearer credential, and on a 401 hands off to the
/// [`RefreshCoordinator`] before replaying the request once with the new
/// token.
///
/// # Example
/// ```no_run
/// use tokenward::client::ApiClient;
/// use tokenward::config::ClientConfig;
/// use tokenward::http::RequestDescriptor;
///
/// # async fn example() -> tokenward::error::Result<()> {
/// let client = ApiClient::from_config(ClientConfig::new("https://api.example.com/api"))?;
/// let response = client.request(&RequestDescriptor::get("/auth/me/")).await?;
/// println!("{}", response.body);
/// # Ok(())
/// # }
/// ```
pub struct ApiClient {
    executor: Arc<dyn RequestExecutor>,
    credentials: Arc<CredentialStore>,
    coordinator: RefreshCoordinator,
}

impl ApiClient {
    /// Assemble a client from its parts.
    pub fn new(
        executor: Arc<dyn RequestExecutor>,
        exchange: Arc<dyn RefreshExchange>,
        credentials: Arc<CredentialStore>,
    ) -> Self {
        let coordinator = RefreshCoordinator::new(credentials.clone(), exchange);
        Self {
            executor,
            credentials,
            coordinator,
        }
    }

    /// HTTP client over file-backed credentials under `config.storage_dir`.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let backend = Arc::new(FileKeyValueStore::new(config.store_config()));
        let credentials = Arc::new(CredentialStore::load(backend)?);
        Self::with_credentials(config, credentials)
    }

    /// HTTP client over caller-supplied credentials.
    pub fn with_credentials(
        config: ClientConfig,
        credentials: Arc<CredentialStore>,
    ) -> Result<Self> {
        config.validate()?;
        let refresh_timeout = config.refresh_timeout;
        // The coordinator owns the exchange deadline; the exchange client has none.
        let exchange = HttpRefreshExchange::new(config.refresh_url()?);
        let executor = HttpExecutor::new(config)?;
        Ok(Self::new(Arc::new(executor), Arc::new(exchange), credentials)
            .with_refresh_timeout(refresh_timeout))
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.coordinator = self.coordinator.with_refresh_timeout(timeout);
        self
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    pub fn current_credential(&self) -> Option<CredentialPair> {
        self.credentials.get()
    }

    /// Execute `request` with the stored credential, refreshing and replaying
    /// once if the server answers 401.
    ///
    /// Non-auth failures and a second 401 are returned unchanged.
    pub async fn request(&self, request: &RequestDescriptor) -> Result<ApiResponse> {
        let mut access = self.credentials.access_token();
        let mut replays = 0;
        loop {
            match self.executor.execute(request, access.as_deref()).await {
                Err(err) if err.is_unauthorized() && replays < MAX_REPLAYS => {
                    replays += 1;
                    debug!(
                        request_id = %request.id,
                        path = %request.path,
                        "Unauthorized; awaiting refreshed credential"
                    );
                    let fresh = self.coordinator.recover(access.as_deref()).await?;
                    access = Some(fresh);
                }
                outcome => return outcome,
            }
        }
    }

    /// [`request`](Self::request) and decode the JSON body.
    pub async fn request_json<T: DeserializeOwned>(&self, request: &RequestDescriptor) -> Result<T> {
        self.request(request).await?.json()
    }

    /// Send once with the current credential; a 401 is returned as-is.
    pub async fn send_once(&self, request: &RequestDescriptor) -> Result<ApiResponse> {
        let access = self.credentials.access_token();
        self.executor.execute(request, access.as_deref()).await
    }

    /// Send without any credential (login and similar endpoints).
    pub async fn send_anonymous(&self, request: &RequestDescriptor) -> Result<ApiResponse> {
        self.executor.execute(request, None).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("credentials", &self.credentials)
            .field("coordinator", &self.coordinator)
            .finish()
    }
}
