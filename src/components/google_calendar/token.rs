use super::consent::ConsentFlow;
use super::models::{StoredToken, TokenResponse};
use crate::config::Config;
use crate::error::{credential_error, BotResult};
use chrono::Utc;
use reqwest::Client;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, warn};

/// Bound for token endpoint requests unless configured
const DEFAULT_TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Talks to the OAuth token endpoint
#[derive(Debug, Clone)]
pub struct OAuthClient {
    client: Client,
    client_id: String,
    client_secret: String,
    token_url: String,
}

impl OAuthClient {
    pub fn new(client_id: &str, client_secret: &str, token_url: &str) -> Self {
        Self {
            client: http_client(DEFAULT_TOKEN_REQUEST_TIMEOUT),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            token_url: token_url.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.google_client_id,
            &config.google_client_secret,
            &config.google_token_url,
        )
        .with_timeout(config.calendar_timeout)
    }

    /// Bound every token endpoint request by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Exchange an authorization code for a token
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> BotResult<StoredToken> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        let response = self.request_token(&params, "exchange authorization code").await?;
        Ok(response.into_stored(Utc::now().timestamp(), None))
    }

    /// Refresh an expired token
    pub async fn refresh(&self, refresh_token: &str) -> BotResult<StoredToken> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self.request_token(&params, "refresh token").await?;
        Ok(response.into_stored(Utc::now().timestamp(), Some(refresh_token.to_string())))
    }

    async fn request_token(
        &self,
        params: &[(&str, &str)],
        operation: &str,
    ) -> BotResult<TokenResponse> {
        let response = self
            .client
            .post(&self.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| credential_error(&format!("Failed to {}: {}", operation, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(credential_error(&format!(
                "Failed to {}: HTTP {} - {}",
                operation, status, error_body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| credential_error(&format!("Failed to parse token response: {}", e)))
    }
}

fn http_client(timeout: Duration) -> Client {
    Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        warn!("Failed to build token HTTP client, using defaults: {}", e);
        Client::new()
    })
}

/// Per-user token files with refresh and consent fallback
#[derive(Clone)]
pub struct TokenStore {
    dir: PathBuf,
    oauth: OAuthClient,
    consent: Arc<dyn ConsentFlow>,
}

impl TokenStore {
    pub fn new(dir: impl Into<PathBuf>, oauth: OAuthClient, consent: Arc<dyn ConsentFlow>) -> Self {
        Self {
            dir: dir.into(),
            oauth,
            consent,
        }
    }

    /// Location of a user's token file
    pub fn token_path(&self, user_id: u64) -> PathBuf {
        self.dir.join(format!("{}_token.json", user_id))
    }

    /// Return a usable token for the user.
    ///
    /// Valid tokens are returned as-is, expired ones are refreshed, and a
    /// missing or corrupted token starts the consent flow.
    pub async fn get_valid_token(&self, user_id: u64) -> BotResult<StoredToken> {
        if let Some(token) = self.load(user_id).await {
            if token.is_valid() {
                debug!("Using stored token for user {}", user_id);
                return Ok(token);
            }

            if let Some(refresh_token) = token.refresh_token.as_deref() {
                info!("Refreshing expired token for user {}", user_id);
                let refreshed = self.oauth.refresh(refresh_token).await?;
                self.save(user_id, &refreshed).await?;
                return Ok(refreshed);
            }

            info!("Stored token for user {} cannot be refreshed", user_id);
        }

        info!("Starting consent flow for user {}", user_id);
        let token = self.consent.authorize(user_id).await?;
        self.save(user_id, &token).await?;
        Ok(token)
    }

    /// Load a user's token, discarding unreadable files
    pub async fn load(&self, user_id: u64) -> Option<StoredToken> {
        let path = self.token_path(user_id);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read token file {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_slice::<StoredToken>(&bytes) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(
                    "Discarding corrupted token file {}: {}",
                    path.display(),
                    e
                );
                discard(&path).await;
                None
            }
        }
    }

    /// Persist a user's token
    pub async fn save(&self, user_id: u64, token: &StoredToken) -> BotResult<()> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.token_path(user_id);
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(token)?;

        fs::write(&tmp_path, json).await?;
        fs::rename(&tmp_path, &path).await?;

        debug!("Saved token for user {} to {}", user_id, path.display());
        Ok(())
    }
}

async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            warn!("Failed to remove token file {}: {}", path.display(), e);
        }
    }
}
