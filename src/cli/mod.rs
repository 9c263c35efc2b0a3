//! CLI entry point for tokenward.

pub mod auth;
pub mod request;

use clap::{Parser, Subcommand};

use crate::config::ClientConfig;
use crate::error::ClientError;

/// tokenward CLI
#[derive(Parser, Debug)]
#[command(name = "tokenward", version, about = "Authenticated API client with token refresh")]
pub struct Cli {
    /// API base URL, e.g. https://api.example.com/api
    #[arg(long, global = true, env = "TOKENWARD_BASE_URL")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Login with email and password
    Login(LoginArgs),
    /// Clear the stored session
    Logout,
    /// Show whether a session is stored
    Status,
    /// Fetch the authenticated account from the server
    Whoami,
    /// Choose the active company
    SelectCompany(SelectCompanyArgs),
    /// Send an authenticated request
    Request(RequestArgs),
}

/// Arguments for `tokenward login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Account email
    pub email: String,

    /// Password; prompted on stdin when omitted
    #[arg(long, env = "TOKENWARD_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Arguments for `tokenward select-company`.
#[derive(Parser, Debug)]
pub struct SelectCompanyArgs {
    /// Membership or company uuid
    pub id: String,
}

/// Arguments for `tokenward request`.
#[derive(Parser, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE)
    pub method: String,

    /// Path relative to the base URL
    pub path: String,

    /// JSON request body
    #[arg(long)]
    pub body: Option<String>,

    /// Query parameter as key=value (repeatable)
    #[arg(short, long = "query")]
    pub query: Vec<String>,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Client settings from the environment, with `--base-url` taking
    /// precedence.
    pub fn client_config(&self) -> Result<ClientConfig, ClientError> {
        let Some(base_url) = &self.base_url else {
            return ClientConfig::from_env();
        };
        let mut config = ClientConfig::from_env().unwrap_or_else(|_| ClientConfig::new(base_url));
        config.base_url = base_url.clone();
        config.validate()?;
        Ok(config)
    }
}
