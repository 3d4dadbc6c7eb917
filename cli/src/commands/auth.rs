//! Authentication Commands
//!
//! `login` runs the pairing-code flow: the API hands out a pairing code and a
//! browser URL, the user approves there, and the CLI polls until a token is
//! issued. `logout` clears the stored token; `status` shows who it belongs to.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::time::{interval_at, Instant};
use tracing::debug;

use crate::api::ApiClient;
use crate::config::{Config, Settings};

/// Interval between pairing polls.
const LOGIN_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Give up on the pairing after this long.
const LOGIN_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Delay before opening the browser, so the pairing code is on screen first.
const BROWSER_DELAY: Duration = Duration::from_millis(500);

/// Execute the login command
pub async fn login(config: &mut Config) -> Result<()> {
    let client = ApiClient::new(&config.api_url)?;

    let start = client
        .start_cli_auth()
        .await
        .context("failed to start authentication")?;

    println!("Your pairing code is: {}", start.pairing_code);
    println!();
    println!("This pairing code verifies your authentication with Volley.");
    println!();
    println!("Opening browser automatically...");
    println!("(If the browser doesn't open, visit: {})", start.auth_url);
    println!("(^C to quit)");

    open_browser_later(start.auth_url.clone());

    println!();
    println!("Waiting for authentication...");

    let token = wait_for_token(&client, &start.device_code, LOGIN_POLL_INTERVAL, LOGIN_TIMEOUT).await?;

    let mut settings = config.settings.clone();
    settings.token.clone_from(&token);
    settings.api_url = Some(config.api_url.clone());
    config
        .save_settings(settings)
        .context("failed to save token")?;

    println!("✓ Successfully logged in!");
    match client.with_token(token).current_user().await {
        Ok(user) => println!("Welcome, {}!", user.name),
        Err(e) => debug!(error = %e, "Failed to fetch user after login"),
    }
    Ok(())
}

/// Poll the pairing until it completes, fails, or `timeout` elapses.
///
/// Transient poll errors are ignored; the next tick tries again.
pub async fn wait_for_token(
    client: &ApiClient,
    device_code: &str,
    poll_interval: Duration,
    timeout: Duration,
) -> Result<String> {
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);
    let mut ticker = interval_at(Instant::now() + poll_interval, poll_interval);

    loop {
        tokio::select! {
            () = &mut deadline => bail!("authentication timeout - please try again"),
            _ = ticker.tick() => {
                let poll = match client.poll_cli_auth(device_code).await {
                    Ok(poll) => poll,
                    Err(e) => {
                        debug!(error = %e, "Pairing poll failed");
                        continue;
                    }
                };

                if poll.is_complete() {
                    return poll
                        .token
                        .filter(|t| !t.is_empty())
                        .context("authentication completed without a token");
                }
                if poll.is_terminal_failure() {
                    bail!(
                        "authentication {}: {}",
                        poll.status,
                        poll.error.as_deref().unwrap_or("please try again")
                    );
                }
            }
        }
    }
}

/// Open `url` in the default browser from a detached task. Failures are
/// ignored; the URL is already printed.
fn open_browser_later(url: String) {
    tokio::spawn(async move {
        tokio::time::sleep(BROWSER_DELAY).await;
        if let Err(e) = open::that_detached(&url) {
            debug!(error = %e, "Failed to open browser");
        }
    });
}

/// Execute the logout command
pub fn logout(config: &mut Config) -> Result<()> {
    let settings = Settings {
        token: String::new(),
        email: String::new(),
        ..config.settings.clone()
    };
    config
        .save_settings(settings)
        .context("failed to clear credentials")?;

    println!("✓ Successfully logged out");
    Ok(())
}

/// Execute the status command
pub async fn status(config: &Config) -> Result<()> {
    let Some(token) = config.credential() else {
        println!("Not authenticated. Run 'volley login' to authenticate.");
        return Ok(());
    };

    let client = ApiClient::new(&config.api_url)?.with_token(token);
    let user = client
        .current_user()
        .await
        .context("failed to get user info")?;

    println!("Authentication Status: ✓ Authenticated");
    println!("Email: {}", user.email);
    println!("Name: {}", user.name);
    println!("User ID: {}", user.id);

    match client.current_organization().await {
        Ok(org) => println!("\nCurrent Organization: {} (ID: {})", org.name, org.id),
        Err(e) => debug!(error = %e, "No current organization"),
    }
    Ok(())
}
