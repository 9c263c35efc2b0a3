//! Credential store: the current access/refresh pair plus the cached session
//! records that must disappear together with it.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use super::error::AuthError;
use super::store::{KeyValueStore, MemoryKeyValueStore};
use super::token::CredentialPair;
use super::user::{AuthUser, CompanyMembership};

/// Persisted keys touched on credential lifecycle events.
pub mod keys {
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const REFRESH_TOKEN: &str = "refresh_token";
    pub const USER: &str = "user";
    pub const SELECTED_COMPANY: &str = "selected_company";

    /// Every key removed by [`CredentialStore::clear`](super::CredentialStore::clear).
    pub const ALL: [&str; 4] = [ACCESS_TOKEN, REFRESH_TOKEN, USER, SELECTED_COMPANY];
}

/// Holds the current credential pair and mirrors it into a [`KeyValueStore`].
///
/// Reads are served from memory. `set` and `clear` swap the whole pair under a
/// write lock, so readers observe either the old pair or the new one. Backend
/// I/O never runs while the lock is held.
pub struct CredentialStore {
    backend: Arc<dyn KeyValueStore>,
    current: RwLock<Option<CredentialPair>>,
}

impl CredentialStore {
    /// Create an empty store on top of `backend` without reading it.
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            current: RwLock::new(None),
        }
    }

    /// Create a store hydrated from whatever `backend` already holds.
    pub fn load(backend: Arc<dyn KeyValueStore>) -> Result<Self, AuthError> {
        let access = backend.get(keys::ACCESS_TOKEN)?;
        let refresh = backend.get(keys::REFRESH_TOKEN)?;
        let current = access.map(|access| CredentialPair { access, refresh });
        debug!(present = current.is_some(), "Loaded stored credentials");
        Ok(Self {
            backend,
            current: RwLock::new(current),
        })
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::new()))
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.backend
    }

    /// Current credential pair, if any.
    pub fn get(&self) -> Option<CredentialPair> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.get().map(|pair| pair.access)
    }

    /// Replace the pair.
    ///
    /// The backend is written first and the lock is taken only for the
    /// in-memory swap. The swap happens even if persisting fails; the
    /// persistence error is still returned.
    pub fn set(&self, pair: CredentialPair) -> Result<(), AuthError> {
        let persisted = self.persist(&pair);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(pair);
        persisted
    }

    fn persist(&self, pair: &CredentialPair) -> Result<(), AuthError> {
        self.backend.set(keys::ACCESS_TOKEN, &pair.access)?;
        match &pair.refresh {
            Some(refresh) => self.backend.set(keys::REFRESH_TOKEN, refresh),
            None => self.backend.remove(keys::REFRESH_TOKEN),
        }
    }

    /// Drop the pair and every related persisted key.
    ///
    /// Removal continues past individual failures; the first one is returned.
    pub fn clear(&self) -> Result<(), AuthError> {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
        let mut first_error = None;
        for key in keys::ALL {
            if let Err(err) = self.backend.remove(key) {
                warn!(key, error = %err, "Failed to remove persisted credential key");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn user(&self) -> Result<Option<AuthUser>, AuthError> {
        self.read_json(keys::USER)
    }

    pub fn set_user(&self, user: &AuthUser) -> Result<(), AuthError> {
        self.write_json(keys::USER, user)
    }

    pub fn selected_company(&self) -> Result<Option<CompanyMembership>, AuthError> {
        self.read_json(keys::SELECTED_COMPANY)
    }

    /// Persist the tenant selection, or remove it when `None`.
    pub fn set_selected_company(
        &self,
        company: Option<&CompanyMembership>,
    ) -> Result<(), AuthError> {
        match company {
            Some(company) => self.write_json(keys::SELECTED_COMPANY, company),
            None => self.backend.remove(keys::SELECTED_COMPANY),
        }
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AuthError> {
        match self.backend.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn write_json<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<(), AuthError> {
        let raw = serde_json::to_string(value)?;
        self.backend.set(key, &raw)
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("current", &self.get())
            .finish()
    }
}
