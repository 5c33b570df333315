mod json;
pub mod llm;
pub mod models;
pub mod prompts;

pub use json::first_json_object;
pub use llm::{build_language_model, LanguageModel, OllamaModel};
pub use models::{EventRequest, ExtractedFields};

use crate::config::Config;
use crate::utils::time::current_time_in;
use chrono_tz::Tz;
use prompts::{extraction_prompt, is_affirmative, time_check_prompt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Turns free-form text into an [`EventRequest`] with the help of a language model
#[derive(Clone)]
pub struct EventExtractor {
    llm: Arc<dyn LanguageModel>,
    timezone: Tz,
    call_timeout: Duration,
}

impl EventExtractor {
    pub fn new(llm: Arc<dyn LanguageModel>, timezone: Tz, call_timeout: Duration) -> Self {
        Self {
            llm,
            timezone,
            call_timeout,
        }
    }

    pub fn from_config(config: &Config, llm: Arc<dyn LanguageModel>) -> Self {
        Self::new(llm, config.timezone, config.llm_timeout)
    }

    /// Extract an event from a user message.
    ///
    /// Every failure (timeout, model error, missing or malformed JSON, missing
    /// fields, unparsable times) ends up as `None`.
    pub async fn extract(&self, message: &str) -> Option<EventRequest> {
        let message = message.trim();
        if message.is_empty() {
            return None;
        }

        let answer = self.ask(&time_check_prompt(message), "time check").await?;
        let current_time = if is_affirmative(&answer) {
            Some(current_time_in(self.timezone))
        } else {
            None
        };
        debug!("Current time needed: {}", current_time.is_some());

        let response = self
            .ask(
                &extraction_prompt(message, current_time.as_deref()),
                "extraction",
            )
            .await?;

        let event = parse_response(&response);
        match &event {
            Some(event) => info!("Extracted event '{}' starting {}", event.summary, event.start),
            None => warn!("Model response did not contain a usable event"),
        }
        event
    }

    /// One bounded model call, failures are logged and collapse to `None`
    async fn ask(&self, prompt: &str, stage: &str) -> Option<String> {
        match timeout(self.call_timeout, self.llm.complete(prompt)).await {
            Ok(Ok(response)) => Some(response),
            Ok(Err(e)) => {
                warn!("Language model {} call failed: {}", stage, e);
                None
            }
            Err(_) => {
                warn!(
                    "Language model {} call timed out after {:?}",
                    stage, self.call_timeout
                );
                None
            }
        }
    }
}

/// Parse a raw model response into a validated event
pub fn parse_response(response: &str) -> Option<EventRequest> {
    let Some(json) = first_json_object(response) else {
        debug!("No JSON object in model response: {}", response);
        return None;
    };

    let fields: ExtractedFields = match serde_json::from_str(json) {
        Ok(fields) => fields,
        Err(e) => {
            debug!("Failed to parse JSON from model response: {}", e);
            return None;
        }
    };

    fields.into_event_request()
}
