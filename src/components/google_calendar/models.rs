use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds before the recorded expiry at which a token stops counting as valid
pub const EXPIRY_SKEW_SECS: i64 = 60;

/// OAuth credential persisted for one user
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Unix timestamp (seconds) when the access token expires
    pub expires_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl StoredToken {
    pub fn is_valid_at(&self, now: i64) -> bool {
        !self.access_token.is_empty() && self.expires_at - EXPIRY_SKEW_SECS > now
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now().timestamp())
    }
}

impl fmt::Debug for StoredToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredToken")
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Response of the OAuth token endpoint
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Convert into a stored token, keeping `previous_refresh` when the
    /// endpoint does not issue a new refresh token
    pub fn into_stored(self, now: i64, previous_refresh: Option<String>) -> StoredToken {
        StoredToken {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            expires_at: now + self.expires_in.unwrap_or(3600),
            token_type: self.token_type,
            scope: self.scope,
        }
    }
}

/// Start or end of an event in the Calendar API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    pub date_time: String,
    pub time_zone: String,
}

/// Body of an `events.insert` request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewEvent {
    pub summary: String,
    pub description: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
}

/// The part of an inserted event the bot cares about
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub html_link: Option<String>,
}
