//! Listen command - forward webhooks to a local endpoint

use anyhow::{bail, Context, Result};
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::api::ApiClient;
use crate::config::Config;
use crate::relay::Relay;

/// Arguments for the listen command
#[derive(Debug, Args)]
pub struct ListenArgs {
    /// URL to forward webhooks to
    #[arg(short = 'f', long = "forward-to")]
    pub forward_to: String,

    /// Source ingestion ID
    #[arg(short, long)]
    pub source: String,
}

/// Parse and check the forward target.
pub fn parse_forward_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("invalid forward URL '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("forward URL must use http or https, got '{}'", url.scheme());
    }
    Ok(url)
}

/// Execute the listen command
pub async fn execute(config: &Config, args: ListenArgs) -> Result<()> {
    let token = config
        .credential()
        .context("not authenticated. Run 'volley login' first")?;
    let forward_url = parse_forward_url(&args.forward_to)?;

    let client = ApiClient::new(&config.api_url)?.with_token(token);
    let relay = Relay::initialize(client, &args.source, forward_url).await?;

    let session = relay.session();
    println!(
        "Ready! Forwarding webhooks from source '{}' to {}",
        args.source, session.forward_url
    );
    println!(
        "Source: {} (ID: {})",
        session.target.source_slug, session.target.source_id
    );
    println!(
        "Connection: {} (ID: {})",
        session.target.connection_name, session.target.connection_id
    );
    println!("Press Ctrl+C to stop\n");

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    let stats = relay.run(shutdown).await;
    debug!(?stats, "Listen finished");
    Ok(())
}

/// Cancel `token` on Ctrl+C or SIGTERM.
async fn cancel_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    debug!("Received shutdown signal");
    token.cancel();
}
