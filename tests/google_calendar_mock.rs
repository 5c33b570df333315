mod common;

use calendar_assistant::components::event_extractor::EventRequest;
use calendar_assistant::components::google_calendar::consent::BrowserLauncher;
use calendar_assistant::components::google_calendar::{
    CalendarClient, ConsentFlow, GoogleCalendarClient, LocalServerConsent, OAuthClient, TokenStore,
};
use chrono::NaiveDate;
use common::{in_an_hour, token, FakeConsent};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER: u64 = 5150;

fn team_sync() -> EventRequest {
    let start = NaiveDate::from_ymd_opt(2025, 3, 10)
        .unwrap()
        .and_hms_opt(11, 0, 0)
        .unwrap();
    EventRequest::new("Team sync", start, None, "weekly").unwrap()
}

/// Calendar client against the mock server with a valid token already stored
async fn client_with_token(server: &MockServer, dir: &tempfile::TempDir) -> GoogleCalendarClient {
    let tokens = TokenStore::new(
        dir.path(),
        OAuthClient::new("id", "secret", &format!("{}/token", server.uri())),
        FakeConsent::refusing(),
    );
    tokens
        .save(USER, &token("valid-access", Some("refresh"), in_an_hour()))
        .await
        .unwrap();

    GoogleCalendarClient::new(
        tokens,
        &format!("{}/calendar/v3", server.uri()),
        "primary",
        "Asia/Tehran",
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn test_create_event_returns_link() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/calendar/v3/calendars/primary/events"))
        .and(header("authorization", "Bearer valid-access"))
        .and(body_partial_json(serde_json::json!({
            "summary": "Team sync",
            "description": "weekly",
            "start": { "dateTime": "2025-03-10T11:00:00", "timeZone": "Asia/Tehran" },
            "end": { "dateTime": "2025-03-10T12:00:00", "timeZone": "Asia/Tehran" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "evt1",
            "status": "confirmed",
            "htmlLink": "https://www.google.com/calendar/event?eid=evt1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = client_with_token(&server, &dir).await;

    assert_eq!(
        client.create_event(USER, &team_sync()).await.as_deref(),
        Some("https://www.google.com/calendar/event?eid=evt1")
    );
}

#[tokio::test]
async fn test_remote_error_returns_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/calendar/v3/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "error": { "code": 403, "message": "insufficient permissions" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = client_with_token(&server, &dir).await;

    assert_eq!(client.create_event(USER, &team_sync()).await, None);
}

#[tokio::test]
async fn test_response_without_link_returns_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "evt1" })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = client_with_token(&server, &dir).await;

    assert_eq!(client.create_event(USER, &team_sync()).await, None);
}

#[tokio::test]
async fn test_slow_calendar_returns_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "htmlLink": "https://example.com" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let tokens = TokenStore::new(
        dir.path(),
        OAuthClient::new("id", "secret", &format!("{}/token", server.uri())),
        FakeConsent::refusing(),
    );
    tokens
        .save(USER, &token("valid-access", None, in_an_hour()))
        .await
        .unwrap();
    let client = GoogleCalendarClient::new(
        tokens,
        &server.uri(),
        "primary",
        "Asia/Tehran",
        Duration::from_millis(200),
    )
    .unwrap();

    assert_eq!(client.create_event(USER, &team_sync()).await, None);
}

#[tokio::test]
async fn test_missing_credentials_return_none_without_calling_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let consent = FakeConsent::refusing();
    let tokens = TokenStore::new(
        dir.path(),
        OAuthClient::new("id", "secret", &format!("{}/token", server.uri())),
        consent.clone(),
    );
    let client = GoogleCalendarClient::new(
        tokens,
        &server.uri(),
        "primary",
        "Asia/Tehran",
        Duration::from_secs(5),
    )
    .unwrap();

    assert_eq!(client.create_event(USER, &team_sync()).await, None);
    assert_eq!(consent.calls(), 1);
}

#[test]
fn test_event_body_uses_configured_zone() {
    let dir = tempfile::tempdir().unwrap();
    let tokens = TokenStore::new(
        dir.path(),
        OAuthClient::new("id", "secret", "http://127.0.0.1:9/token"),
        FakeConsent::refusing(),
    );
    let client = GoogleCalendarClient::new(
        tokens,
        "https://www.googleapis.com/calendar/v3",
        "primary",
        "Europe/Helsinki",
        Duration::from_secs(5),
    )
    .unwrap();

    let body = client.event_body(&team_sync());
    assert_eq!(body.start.time_zone, "Europe/Helsinki");
    assert_eq!(body.end.time_zone, "Europe/Helsinki");
    assert_eq!(body.end.date_time, "2025-03-10T12:00:00");
}

/// Launcher that plays the browser: follows the redirect with the given code
fn redirecting_launcher(code: &'static str) -> BrowserLauncher {
    Arc::new(move |url: &Url| {
        let pairs: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let callback = format!(
            "{}/?code={}&state={}",
            pairs["redirect_uri"], code, pairs["state"]
        );
        tokio::spawn(async move {
            let _ = reqwest::get(callback).await;
        });
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn test_consent_flow_exchanges_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "consented-access",
            "refresh_token": "consented-refresh",
            "expires_in": 3599,
            "scope": "https://www.googleapis.com/auth/calendar",
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let consent = LocalServerConsent::new(
        OAuthClient::new("id", "secret", &format!("{}/token", server.uri())),
        "https://accounts.google.com/o/oauth2/v2/auth",
        0,
        Duration::from_secs(10),
    )
    .with_launcher(redirecting_launcher("auth-code"));

    let token = consent.authorize(USER).await.unwrap();

    assert_eq!(token.access_token, "consented-access");
    assert_eq!(token.refresh_token.as_deref(), Some("consented-refresh"));
    assert!(token.is_valid());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_consent_flow_times_out() {
    let consent = LocalServerConsent::new(
        OAuthClient::new("id", "secret", "http://127.0.0.1:9/token"),
        "https://accounts.google.com/o/oauth2/v2/auth",
        0,
        Duration::from_millis(300),
    )
    .with_launcher(Arc::new(|_: &Url| {}));

    assert!(consent.authorize(USER).await.is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unbounded_consent_timeout_fails_cleanly() {
    let consent = LocalServerConsent::new(
        OAuthClient::new("id", "secret", "http://127.0.0.1:9/token"),
        "https://accounts.google.com/o/oauth2/v2/auth",
        0,
        Duration::MAX,
    )
    .with_launcher(Arc::new(|_: &Url| {}));

    assert!(consent.authorize(USER).await.is_err());
}
