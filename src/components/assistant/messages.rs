//! User-facing texts, looked up in the active locale.

use rust_i18n::t;

pub fn welcome() -> String {
    t!("welcome").into()
}

pub fn not_understood() -> String {
    t!("extraction_failed").into()
}

pub fn booked(summary: &str, start: &str, link: &str) -> String {
    t!("event_created", summary = summary, start = start, link = link).into()
}

pub fn booking_failed() -> String {
    t!("booking_failed").into()
}

pub fn processing_error() -> String {
    t!("processing_error").into()
}
