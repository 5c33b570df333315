use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Format the language model is asked to use for event times
pub const EVENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Format of the "current time" hint handed to the language model
pub const CURRENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Local date-time format understood by the Calendar API next to a `timeZone`
pub const API_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse an event time in `YYYY-MM-DD HH:MM` format
pub fn parse_event_time(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), EVENT_TIME_FORMAT).ok()
}

/// Format an event time as `YYYY-MM-DD HH:MM`
pub fn format_event_time(value: &NaiveDateTime) -> String {
    value.format(EVENT_TIME_FORMAT).to_string()
}

/// Format a wall-clock time for the Calendar API
pub fn format_api_date_time(value: &NaiveDateTime) -> String {
    value.format(API_DATE_TIME_FORMAT).to_string()
}

/// Current wall-clock time in the given zone
pub fn now_in(timezone: Tz) -> NaiveDateTime {
    Utc::now().with_timezone(&timezone).naive_local()
}

/// Current wall-clock time in the given zone, formatted for prompts
pub fn current_time_in(timezone: Tz) -> String {
    now_in(timezone).format(CURRENT_TIME_FORMAT).to_string()
}
