use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::credentials::CredentialStore;
use super::error::AuthError;
use super::token::{CredentialPair, RefreshRequest};
use super::user::{AuthUser, CompanyMembership};
use crate::client::ApiClient;
use crate::error::{ClientError, Result};
use crate::http::RequestDescriptor;

pub const LOGIN_PATH: &str = "/auth/login/";
pub const LOGOUT_PATH: &str = "/auth/logout/";
pub const ME_PATH: &str = "/auth/me/";
pub const PASSWORD_PATH: &str = "/auth/me/password/";

/// Credentials posted to `POST /auth/login/`.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct LoginResponse {
    access: String,
    refresh: String,
    user: AuthUser,
}

/// Fields accepted by `PATCH /auth/me/`; unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Body of `POST /auth/me/password/`.
#[derive(Clone, Serialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    #[serde(default)]
    detail: Option<String>,
}

/// Session lifecycle on top of an [`ApiClient`]: login, logout and the
/// account endpoints.
///
/// Everything except login goes through [`ApiClient::request`], so it
/// benefits from transparent refresh.
pub struct SessionService {
    client: Arc<ApiClient>,
}

impl SessionService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    fn credentials(&self) -> &CredentialStore {
        self.client.credentials()
    }

    /// Exchange email/password for a credential pair and cache the account.
    ///
    /// Sent without a bearer credential, so a wrong password is reported as
    /// [`ClientError::Unauthorized`] and never triggers a refresh. A user
    /// with exactly one company has it selected; otherwise the selection is
    /// cleared.
    pub async fn login(&self, login: &LoginRequest) -> Result<AuthUser> {
        let request = RequestDescriptor::post(LOGIN_PATH, serde_json::to_value(login)?);
        let payload: LoginResponse = self.client.send_anonymous(&request).await?.json()?;

        let credentials = self.credentials();
        credentials.set(CredentialPair::new(payload.access, payload.refresh))?;
        credentials.set_user(&payload.user)?;
        match payload.user.companies.as_slice() {
            [only] => credentials.set_selected_company(Some(only))?,
            _ => credentials.set_selected_company(None)?,
        }
        info!(email = %payload.user.email, "Logged in");
        Ok(payload.user)
    }

    /// Forget the session locally, after asking the server to blacklist the
    /// refresh token.
    ///
    /// The server call is best effort: its failure is logged, and local state
    /// is cleared regardless.
    pub async fn logout(&self) -> Result<()> {
        if let Some(refresh) = self.credentials().get().and_then(|pair| pair.refresh) {
            let body = serde_json::to_value(RefreshRequest { refresh: &refresh })?;
            let request = RequestDescriptor::post(LOGOUT_PATH, body);
            if let Err(err) = self.client.send_once(&request).await {
                warn!(error = %err, "Server-side logout failed; clearing local session anyway");
            }
        }
        self.credentials().clear()?;
        info!("Logged out");
        Ok(())
    }

    /// Fetch the authenticated account and refresh the cached copy.
    pub async fn current_user(&self) -> Result<AuthUser> {
        let user: AuthUser = self.client.request_json(&RequestDescriptor::get(ME_PATH)).await?;
        self.credentials().set_user(&user)?;
        Ok(user)
    }

    /// Update name/phone. The cached account is updated only if one exists.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<AuthUser> {
        let request = RequestDescriptor::patch(ME_PATH, serde_json::to_value(update)?);
        let user: AuthUser = self.client.request_json(&request).await?;
        if self.credentials().user()?.is_some() {
            self.credentials().set_user(&user)?;
        }
        Ok(user)
    }

    /// Change the password; returns the server's confirmation message.
    pub async fn change_password(&self, change: &PasswordChange) -> Result<Option<String>> {
        if change.new_password != change.new_password_confirm {
            return Err(ClientError::InvalidArgument(
                "new password and confirmation differ".to_string(),
            ));
        }
        let request = RequestDescriptor::post(PASSWORD_PATH, serde_json::to_value(change)?);
        let response = self.client.request(&request).await?;
        if response.is_empty() {
            return Ok(None);
        }
        Ok(response.json::<DetailResponse>()?.detail)
    }

    /// The cached account, if logged in.
    pub fn user(&self) -> Result<Option<AuthUser>> {
        Ok(self.credentials().user()?)
    }

    pub fn selected_company(&self) -> Result<Option<CompanyMembership>> {
        Ok(self.credentials().selected_company()?)
    }

    /// Persist (or clear) the active company.
    pub fn select_company(&self, company: Option<&CompanyMembership>) -> Result<()> {
        Ok(self.credentials().set_selected_company(company)?)
    }

    /// Select the membership whose uuid or company uuid matches `id`.
    pub fn select_company_by_id(&self, id: &str) -> Result<CompanyMembership> {
        let user = self.user()?.ok_or(AuthError::NotLoggedIn)?;
        let membership = user
            .companies
            .into_iter()
            .find(|m| m.uuid == id || m.company.uuid == id)
            .ok_or_else(|| ClientError::InvalidArgument(format!("no membership matches {id}")))?;
        self.select_company(Some(&membership))?;
        Ok(membership)
    }

    /// Whether a cached account and an access token are both present.
    pub fn is_authenticated(&self) -> bool {
        let has_user = matches!(self.credentials().user(), Ok(Some(_)));
        has_user && self.credentials().get().is_some()
    }

    /// Whether the account must pick a company before continuing.
    pub fn needs_company_selection(&self) -> Result<bool> {
        let Some(user) = self.user()? else {
            return Ok(false);
        };
        Ok(user.companies.len() > 1 && self.selected_company()?.is_none())
    }
}

impl std::fmt::Debug for PasswordChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordChange { .. }")
    }
}
