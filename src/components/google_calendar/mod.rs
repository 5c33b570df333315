mod client;
pub mod consent;
pub mod models;
pub mod token;

pub use client::{CalendarClient, GoogleCalendarClient};
pub use consent::{ConsentFlow, LocalServerConsent};
pub use models::StoredToken;
pub use token::{OAuthClient, TokenStore};

use crate::config::Config;
use crate::error::BotResult;
use std::sync::Arc;

/// Wire the token store, consent flow and calendar client from configuration
pub fn calendar_from_config(config: &Config) -> BotResult<GoogleCalendarClient> {
    let consent = Arc::new(LocalServerConsent::from_config(config));
    let tokens = TokenStore::new(
        config.token_dir.clone(),
        OAuthClient::from_config(config),
        consent,
    );
    GoogleCalendarClient::from_config(config, tokens)
}
