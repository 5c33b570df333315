use super::models::StoredToken;
use super::token::OAuthClient;
use crate::config::Config;
use crate::error::{credential_error, BotResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use url::Url;

/// Scope needed to create events
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// Obtains a fresh token for a user through interactive consent
#[async_trait]
pub trait ConsentFlow: Send + Sync {
    async fn authorize(&self, user_id: u64) -> BotResult<StoredToken>;
}

/// Opens the consent page for an authorization URL
pub type BrowserLauncher = Arc<dyn Fn(&Url) + Send + Sync>;

/// Installed-application consent: a loopback server receives the redirect
#[derive(Clone)]
pub struct LocalServerConsent {
    oauth: OAuthClient,
    auth_url: String,
    port: u16,
    timeout: Duration,
    launcher: BrowserLauncher,
}

impl LocalServerConsent {
    pub fn new(oauth: OAuthClient, auth_url: &str, port: u16, timeout: Duration) -> Self {
        Self {
            oauth,
            auth_url: auth_url.to_string(),
            port,
            timeout,
            launcher: Arc::new(open_in_browser),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            OAuthClient::from_config(config),
            &config.google_auth_url,
            config.oauth_redirect_port,
            config.consent_timeout,
        )
    }

    /// Replace the way the consent page is opened
    pub fn with_launcher(mut self, launcher: BrowserLauncher) -> Self {
        self.launcher = launcher;
        self
    }

    /// Build the Google authorization URL
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> BotResult<Url> {
        Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.oauth.client_id()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("scope", CALENDAR_SCOPE),
                ("state", state),
            ],
        )
        .map_err(|e| credential_error(&format!("Invalid authorization URL: {}", e)))
    }
}

#[async_trait]
impl ConsentFlow for LocalServerConsent {
    async fn authorize(&self, user_id: u64) -> BotResult<StoredToken> {
        let server = tiny_http::Server::http(("127.0.0.1", self.port))
            .map_err(|e| credential_error(&format!("Failed to start callback server: {}", e)))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| credential_error("Callback server has no TCP address"))?;

        let redirect_uri = format!("http://127.0.0.1:{}", port);
        let state = uuid::Uuid::new_v4().to_string();
        let url = self.authorization_url(&redirect_uri, &state)?;

        info!(
            "Authorize calendar access for user {} at {}",
            user_id, url
        );
        (self.launcher)(&url);

        let timeout = self.timeout;
        let code = tokio::task::spawn_blocking(move || wait_for_callback(&server, &state, timeout))
            .await
            .map_err(|e| credential_error(&format!("Consent task failed: {}", e)))??;

        let token = self.oauth.exchange_code(&code, &redirect_uri).await?;
        info!("Consent granted for user {}", user_id);
        Ok(token)
    }
}

fn open_in_browser(url: &Url) {
    if let Err(e) = webbrowser::open(url.as_str()) {
        warn!("Could not open a browser for the consent page: {}", e);
    }
}

/// Block until the redirect arrives or the deadline passes
fn wait_for_callback(
    server: &tiny_http::Server,
    expected_state: &str,
    timeout: Duration,
) -> BotResult<String> {
    let deadline = Instant::now()
        .checked_add(timeout)
        .ok_or_else(|| credential_error("Consent timeout is too large"))?;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(credential_error("Timed out waiting for authorization"));
        }

        let request = match server.recv_timeout(remaining) {
            Ok(Some(request)) => request,
            Ok(None) => return Err(credential_error("Timed out waiting for authorization")),
            Err(e) => {
                return Err(credential_error(&format!(
                    "Failed to receive authorization callback: {}",
                    e
                )))
            }
        };

        let outcome = parse_callback(request.url(), expected_state);
        let (status, body) = match &outcome {
            Ok(Some(_)) => (200, "Authorization successful! You can close this window."),
            Ok(None) => (404, "Not found"),
            Err(_) => (400, "Authorization failed. You can close this window."),
        };
        let response = tiny_http::Response::from_string(body).with_status_code(status);
        if let Err(e) = request.respond(response) {
            warn!("Failed to answer authorization callback: {}", e);
        }

        match outcome {
            Ok(Some(code)) => return Ok(code),
            Ok(None) => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Interpret a request to the callback server.
///
/// `Ok(None)` means the request was not the OAuth redirect (a favicon fetch, say).
pub fn parse_callback(request_url: &str, expected_state: &str) -> BotResult<Option<String>> {
    let url = Url::parse("http://127.0.0.1")
        .and_then(|base| base.join(request_url))
        .map_err(|e| credential_error(&format!("Malformed callback URL: {}", e)))?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(credential_error(&format!("Authorization denied: {}", error)));
    }

    let Some(code) = code else {
        return Ok(None);
    };

    if state.as_deref() != Some(expected_state) {
        return Err(credential_error("Authorization state mismatch"));
    }

    Ok(Some(code))
}
