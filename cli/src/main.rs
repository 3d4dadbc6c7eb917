//! Volley CLI - Main Entry Point
//!
//! Forward webhooks from Volley to a local development endpoint.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use volley_cli::commands::{self, ListenArgs};
use volley_cli::config::Config;

/// Volley CLI - Webhook as a Service
///
/// Forward webhooks to your local development environment.
#[derive(Parser)]
#[command(name = "volley")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default is $HOME/.config/volley/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// API endpoint URL (overrides config file)
    #[arg(long, global = true, env = "VOLLEY_API_URL")]
    api_url: Option<String>,

    /// API key for authentication (overrides config file)
    #[arg(long, global = true, env = "VOLLEY_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forward webhooks to a local endpoint
    ///
    /// Polls for new webhook events and forwards them to your local server.
    ///
    /// Example:
    ///   volley listen --source abc123xyz --forward-to http://localhost:3000/webhook
    Listen(ListenArgs),

    /// Authenticate with Volley
    Login,

    /// Log out and clear credentials
    Logout,

    /// Check authentication status
    Status,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "volley=debug,volley_cli=debug"
    } else {
        "volley=error,volley_cli=error"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before parsing so VOLLEY_* variables reach clap
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let mut config = Config::resolve(cli.api_url, cli.api_key, cli.config, cli.verbose);
    debug!(
        config_file = %config.config_path.display(),
        api_url = %config.api_url,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Listen(args) => commands::listen::execute(&config, args).await,
        Commands::Login => commands::auth::login(&mut config).await,
        Commands::Logout => commands::auth::logout(&mut config),
        Commands::Status => commands::auth::status(&config).await,
    }
}
