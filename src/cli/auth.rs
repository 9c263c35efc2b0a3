//! CLI session command handlers: login, logout, status, whoami and company
//! selection.

use std::io::Write;
use std::sync::Arc;

use crate::auth::{AuthUser, LoginRequest, SessionService};
use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::ClientError;

fn session(config: ClientConfig) -> Result<SessionService, ClientError> {
    Ok(SessionService::new(Arc::new(ApiClient::from_config(config)?)))
}

fn prompt_password() -> Result<String, Box<dyn std::error::Error>> {
    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut password = String::new();
    std::io::stdin().read_line(&mut password)?;
    let password = password.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err("No password provided".into());
    }
    Ok(password)
}

fn print_user(user: &AuthUser) {
    let name = format!("{} {}", user.first_name, user.last_name);
    println!("  {} <{}>", name.trim(), user.email);
    for membership in &user.companies {
        println!(
            "  - {} ({}) [{}]",
            membership.company.trade_name, membership.role, membership.uuid
        );
    }
}

/// Handle `tokenward login <email>`.
pub async fn handle_login(
    config: ClientConfig,
    email: &str,
    password: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let password = match password {
        Some(password) => password,
        None => prompt_password()?,
    };
    let session = session(config)?;

    let user = match session.login(&LoginRequest::new(email, password)).await {
        Ok(user) => user,
        Err(err) => {
            let message = err.detail_message().unwrap_or_else(|| err.to_string());
            return Err(format!("Login failed: {message}").into());
        }
    };

    println!("✅ Logged in");
    print_user(&user);
    if session.needs_company_selection()? {
        println!("📌 Pick a company with `tokenward select-company <id>`");
    }
    Ok(())
}

/// Handle `tokenward logout`.
pub async fn handle_logout(config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    session(config)?.logout().await?;
    println!("✅ Logged out");
    Ok(())
}

/// Handle `tokenward status`. Reads local state only.
pub async fn handle_status(config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔐 Session Status\n");
    println!("  Server: {}", config.base_url);
    println!("  Storage: {}", config.storage_dir.display());

    let session = session(config)?;
    if !session.is_authenticated() {
        println!("  ❌ Not logged in");
        return Ok(());
    }
    if let Some(user) = session.user()? {
        println!("  ✅ Logged in as {}", user.email);
    }
    let has_refresh = session
        .client()
        .current_credential()
        .is_some_and(|pair| pair.refresh.is_some());
    if !has_refresh {
        println!("  ⚠️  No refresh token stored; the session ends when the access token expires");
    }
    match session.selected_company()? {
        Some(membership) => println!("  Company: {}", membership.company.trade_name),
        None if session.needs_company_selection()? => println!("  Company: ⚠️  not selected"),
        None => {}
    }
    Ok(())
}

/// Handle `tokenward whoami`.
pub async fn handle_whoami(config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let session = session(config)?;
    match session.current_user().await {
        Ok(user) => {
            print_user(&user);
            Ok(())
        }
        Err(err) if err.requires_login() => {
            Err("Session expired or missing; run `tokenward login <email>`".into())
        }
        Err(err) => Err(err.into()),
    }
}

/// Handle `tokenward select-company <id>`.
pub async fn handle_select_company(
    config: ClientConfig,
    id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let membership = session(config)?.select_company_by_id(id)?;
    println!("✅ Selected {}", membership.company.trade_name);
    Ok(())
}
