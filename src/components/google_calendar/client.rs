use super::models::{CreatedEvent, EventDateTime, NewEvent};
use super::token::TokenStore;
use crate::components::event_extractor::EventRequest;
use crate::config::Config;
use crate::error::{google_calendar_error, BotResult};
use crate::utils::time::format_api_date_time;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info};
use url::Url;

/// Books events on behalf of a user
#[async_trait]
pub trait CalendarClient: Send + Sync {
    /// Create the event and return its link, `None` on any failure
    async fn create_event(&self, user_id: u64, event: &EventRequest) -> Option<String>;
}

/// Google Calendar v3 client
#[derive(Clone)]
pub struct GoogleCalendarClient {
    tokens: TokenStore,
    client: Client,
    api_base: Url,
    calendar_id: String,
    timezone: String,
}

impl GoogleCalendarClient {
    pub fn new(
        tokens: TokenStore,
        api_base: &str,
        calendar_id: &str,
        timezone: &str,
        request_timeout: Duration,
    ) -> BotResult<Self> {
        let api_base = Url::parse(api_base)
            .map_err(|e| google_calendar_error(&format!("Failed to parse URL: {}", e)))?;
        if api_base.cannot_be_a_base() {
            return Err(google_calendar_error("Calendar API URL must be a base URL"));
        }

        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| google_calendar_error(&format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            tokens,
            client,
            api_base,
            calendar_id: calendar_id.to_string(),
            timezone: timezone.to_string(),
        })
    }

    pub fn from_config(config: &Config, tokens: TokenStore) -> BotResult<Self> {
        Self::new(
            tokens,
            &config.google_api_base,
            &config.calendar_id,
            config.timezone.name(),
            config.calendar_timeout,
        )
    }

    fn events_url(&self) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["calendars", self.calendar_id.as_str(), "events"]);
        }
        url
    }

    /// Request body for an event, times pinned to the configured zone
    pub fn event_body(&self, event: &EventRequest) -> NewEvent {
        NewEvent {
            summary: event.summary.clone(),
            description: event.description.clone(),
            start: EventDateTime {
                date_time: format_api_date_time(&event.start),
                time_zone: self.timezone.clone(),
            },
            end: EventDateTime {
                date_time: format_api_date_time(&event.end),
                time_zone: self.timezone.clone(),
            },
        }
    }

    async fn try_create_event(&self, user_id: u64, event: &EventRequest) -> BotResult<String> {
        let token = self.tokens.get_valid_token(user_id).await?;

        let response = self
            .client
            .post(self.events_url())
            .bearer_auth(&token.access_token)
            .json(&self.event_body(event))
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to create event: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(google_calendar_error(&format!(
                "Failed to create event: HTTP {} - {}",
                status, error_body
            )));
        }

        let created: CreatedEvent = response.json().await.map_err(|e| {
            google_calendar_error(&format!("Failed to parse event response: {}", e))
        })?;

        info!(
            "Created event {} for user {}",
            created.id.as_deref().unwrap_or("<unknown>"),
            user_id
        );

        created
            .html_link
            .ok_or_else(|| google_calendar_error("Event response has no htmlLink"))
    }
}

#[async_trait]
impl CalendarClient for GoogleCalendarClient {
    async fn create_event(&self, user_id: u64, event: &EventRequest) -> Option<String> {
        match self.try_create_event(user_id, event).await {
            Ok(link) => Some(link),
            Err(e) => {
                error!("Error creating calendar event for user {}: {}", user_id, e);
                None
            }
        }
    }
}
