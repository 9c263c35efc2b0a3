//! tokenward CLI binary entry point.

use tokenward::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse_args();

    let result = run(cli).await;
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TOKENWARD_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = cli.client_config()?;
    match cli.command {
        Commands::Login(args) => {
            tokenward::cli::auth::handle_login(config, &args.email, args.password).await
        }
        Commands::Logout => tokenward::cli::auth::handle_logout(config).await,
        Commands::Status => tokenward::cli::auth::handle_status(config).await,
        Commands::Whoami => tokenward::cli::auth::handle_whoami(config).await,
        Commands::SelectCompany(args) => {
            tokenward::cli::auth::handle_select_company(config, &args.id).await
        }
        Commands::Request(args) => tokenward::cli::request::handle_request(config, &args).await,
    }
}
