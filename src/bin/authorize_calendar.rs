//! Provision a user's calendar token ahead of their first booking.
//!
//! Usage: `authorize_calendar <discord-user-id>`

use calendar_assistant::components::google_calendar::{LocalServerConsent, OAuthClient, TokenStore};
use calendar_assistant::config::Config;
use calendar_assistant::error::{other_error, BotResult};
use calendar_assistant::startup;
use std::sync::Arc;

#[tokio::main]
async fn main() -> miette::Result<()> {
    let _log_guard = startup::init_logging()?;
    run().await?;
    Ok(())
}

async fn run() -> BotResult<()> {
    let user_id = std::env::args()
        .nth(1)
        .ok_or_else(|| other_error("Usage: authorize_calendar <discord-user-id>"))?
        .parse::<u64>()
        .map_err(|_| other_error("The user id must be a number"))?;

    // Load configuration
    let config = Config::load()?;

    let consent = Arc::new(LocalServerConsent::from_config(&config));
    let tokens = TokenStore::new(
        config.token_dir.clone(),
        OAuthClient::from_config(&config),
        consent,
    );

    println!("Checking calendar authorization for user {}...", user_id);
    tokens.get_valid_token(user_id).await?;

    println!(
        "Token for user {} saved to {}",
        user_id,
        tokens.token_path(user_id).display()
    );

    Ok(())
}
