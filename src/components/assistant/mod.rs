pub mod messages;

use crate::components::event_extractor::{EventExtractor, EventRequest};
use crate::components::google_calendar::CalendarClient;
use crate::config::Config;
use crate::utils::time::format_event_time;
use chrono::{DateTime, NaiveDateTime, Utc};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, warn};

/// One inbound chat message
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub user_id: u64,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl RawMessage {
    pub fn new(user_id: u64, text: impl Into<String>) -> Self {
        Self {
            user_id,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// What happened to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No event could be extracted
    NotUnderstood,
    /// The event was booked
    Booked {
        summary: String,
        start: NaiveDateTime,
        link: String,
    },
    /// The calendar refused or could not be reached
    BookingFailed,
    /// Something unexpected went wrong while handling the request
    Failed,
}

impl Outcome {
    /// Text sent back to the user
    pub fn reply(&self) -> String {
        match self {
            Outcome::NotUnderstood => messages::not_understood(),
            Outcome::Booked {
                summary,
                start,
                link,
            } => messages::booked(summary, &format_event_time(start), link),
            Outcome::BookingFailed => messages::booking_failed(),
            Outcome::Failed => messages::processing_error(),
        }
    }
}

/// Routes chat text through extraction and booking
#[derive(Clone)]
pub struct Assistant {
    extractor: EventExtractor,
    calendar: Arc<dyn CalendarClient>,
    booking_timeout: Duration,
}

impl Assistant {
    pub fn new(
        extractor: EventExtractor,
        calendar: Arc<dyn CalendarClient>,
        booking_timeout: Duration,
    ) -> Self {
        Self {
            extractor,
            calendar,
            booking_timeout,
        }
    }

    /// Booking may have to wait for the consent flow before the API call itself
    pub fn from_config(
        config: &Config,
        extractor: EventExtractor,
        calendar: Arc<dyn CalendarClient>,
    ) -> Self {
        Self::new(
            extractor,
            calendar,
            config.calendar_timeout.saturating_add(config.consent_timeout),
        )
    }

    /// Onboarding text for the start and help commands
    pub fn welcome(&self) -> String {
        messages::welcome()
    }

    /// Handle a free-form message and produce the reply text.
    ///
    /// Always returns a reply, panics in the pipeline included.
    pub async fn handle_text(&self, message: &RawMessage) -> String {
        self.handle(message).await.reply()
    }

    /// Handle a free-form message and report the outcome
    pub async fn handle(&self, message: &RawMessage) -> Outcome {
        info!("Message received from user {}", message.user_id);

        match AssertUnwindSafe(self.process(message)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(_) => {
                error!("Panic while processing message from user {}", message.user_id);
                Outcome::Failed
            }
        }
    }

    async fn process(&self, message: &RawMessage) -> Outcome {
        let Some(event) = self.extractor.extract(&message.text).await else {
            warn!("Failed to extract event details for user {}", message.user_id);
            return Outcome::NotUnderstood;
        };

        self.book(message.user_id, event).await
    }

    async fn book(&self, user_id: u64, event: EventRequest) -> Outcome {
        let link = match timeout(self.booking_timeout, self.calendar.create_event(user_id, &event))
            .await
        {
            Ok(link) => link,
            Err(_) => {
                error!(
                    "Calendar booking for user {} timed out after {:?}",
                    user_id, self.booking_timeout
                );
                None
            }
        };

        match link {
            Some(link) => {
                info!("Event created successfully for user {}", user_id);
                Outcome::Booked {
                    summary: event.summary,
                    start: event.start,
                    link,
                }
            }
            None => {
                error!("Failed to create event in Google Calendar for user {}", user_id);
                Outcome::BookingFailed
            }
        }
    }
}
