use crate::utils::time::parse_event_time;
use chrono::{Duration, NaiveDateTime};
use serde::Deserialize;

/// A validated event ready to be booked.
///
/// Times are wall-clock times in the calendar's configured zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRequest {
    pub summary: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub description: String,
}

impl EventRequest {
    /// Default length of an event whose end time is unknown
    pub fn default_duration() -> Duration {
        Duration::hours(1)
    }

    /// Build a request, filling in the default end time.
    ///
    /// Returns `None` when the summary is blank or the end is not after the start.
    pub fn new(
        summary: impl Into<String>,
        start: NaiveDateTime,
        end: Option<NaiveDateTime>,
        description: impl Into<String>,
    ) -> Option<Self> {
        let summary = summary.into().trim().to_string();
        if summary.is_empty() {
            return None;
        }

        let end = match end {
            Some(end) => end,
            None => start.checked_add_signed(Self::default_duration())?,
        };
        if end <= start {
            return None;
        }

        Some(Self {
            summary,
            start,
            end,
            description: description.into().trim().to_string(),
        })
    }
}

/// The JSON object the language model is asked to produce.
///
/// Every field may be `null`; unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractedFields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ExtractedFields {
    /// Validate the raw fields into an [`EventRequest`]
    pub fn into_event_request(self) -> Option<EventRequest> {
        let summary = self.summary.filter(|s| !s.trim().is_empty())?;
        let start = parse_event_time(&self.start_time?)?;
        let end = match self.end_time {
            Some(raw) => Some(parse_event_time(&raw)?),
            None => None,
        };

        EventRequest::new(summary, start, end, self.description.unwrap_or_default())
    }
}
