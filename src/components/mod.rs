// Export components
pub mod assistant;
pub mod event_extractor;
pub mod google_calendar;

pub use assistant::{Assistant, Outcome, RawMessage};
pub use event_extractor::{EventExtractor, EventRequest};
pub use google_calendar::{CalendarClient, GoogleCalendarClient};

use crate::config::Config;
use crate::error::BotResult;
use std::sync::Arc;

/// Build the assistant with its production collaborators
pub fn build_assistant(config: &Config) -> BotResult<Assistant> {
    let llm = event_extractor::build_language_model(config)?;
    let extractor = EventExtractor::from_config(config, llm);
    let calendar = google_calendar::calendar_from_config(config)?;

    Ok(Assistant::from_config(config, extractor, Arc::new(calendar)))
}
