mod common;

use calendar_assistant::components::assistant::messages;
use calendar_assistant::components::{Assistant, CalendarClient, Outcome, RawMessage};
use chrono::NaiveDate;
use common::{extractor, FakeCalendar, HangingCalendar, PanickingCalendar, ScriptedModel};
use std::sync::Arc;
use std::time::Duration;

const TEAM_SYNC: &str = r#"{"summary":"Team sync","start_time":"2025-03-10 11:00","end_time":null,"description":"weekly"}"#;
const LINK: &str = "https://www.google.com/calendar/event?eid=abc123";

fn assistant(responses: &[&str], calendar: Arc<dyn CalendarClient>) -> Assistant {
    Assistant::new(
        extractor(ScriptedModel::new(responses)),
        calendar,
        Duration::from_secs(30),
    )
}

#[tokio::test]
async fn test_successful_booking() {
    let calendar = FakeCalendar::returning(Some(LINK));
    let assistant = assistant(&["no", TEAM_SYNC], calendar.clone());

    let message = RawMessage::new(1001, "Team sync on March 10th at 11");
    let outcome = assistant.handle(&message).await;

    let start = NaiveDate::from_ymd_opt(2025, 3, 10)
        .unwrap()
        .and_hms_opt(11, 0, 0)
        .unwrap();
    assert_eq!(
        outcome,
        Outcome::Booked {
            summary: "Team sync".to_string(),
            start,
            link: LINK.to_string(),
        }
    );
    assert_eq!(
        outcome.reply(),
        messages::booked("Team sync", "2025-03-10 11:00", LINK)
    );

    let calls = calendar.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, 1001);
    assert_eq!(calls[0].1.description, "weekly");
}

#[tokio::test]
async fn test_success_reply_mentions_event() {
    let assistant = assistant(&["no", TEAM_SYNC], FakeCalendar::returning(Some(LINK)));
    let reply = assistant
        .handle_text(&RawMessage::new(7, "Team sync on March 10th at 11"))
        .await;

    assert!(reply.contains("Team sync"));
    assert!(reply.contains("2025-03-10 11:00"));
    assert!(reply.contains(LINK));
}

#[tokio::test]
async fn test_calendar_failure_gives_fixed_message() {
    let assistant = assistant(&["no", TEAM_SYNC], FakeCalendar::returning(None));
    let reply = assistant
        .handle_text(&RawMessage::new(1001, "Team sync on March 10th at 11"))
        .await;

    assert_eq!(reply, messages::booking_failed());
}

#[tokio::test]
async fn test_extraction_failure_skips_calendar() {
    let calendar = FakeCalendar::returning(Some(LINK));
    let assistant = assistant(&["no", "I am not sure what you mean."], calendar.clone());

    let outcome = assistant.handle(&RawMessage::new(1001, "hmm")).await;

    assert_eq!(outcome, Outcome::NotUnderstood);
    assert_eq!(outcome.reply(), messages::not_understood());
    assert!(calendar.calls().is_empty());
}

#[tokio::test]
async fn test_panic_becomes_generic_failure() {
    let assistant = assistant(&["no", TEAM_SYNC], Arc::new(PanickingCalendar));
    let outcome = assistant
        .handle(&RawMessage::new(1001, "Team sync on March 10th at 11"))
        .await;

    assert_eq!(outcome, Outcome::Failed);
    assert_eq!(outcome.reply(), messages::processing_error());
}

#[tokio::test(start_paused = true)]
async fn test_hung_booking_is_a_failed_booking() {
    let assistant = Assistant::new(
        extractor(ScriptedModel::new(&["no", TEAM_SYNC])),
        Arc::new(HangingCalendar),
        Duration::from_secs(10),
    );

    let outcome = assistant
        .handle(&RawMessage::new(1001, "Team sync on March 10th at 11"))
        .await;

    assert_eq!(outcome, Outcome::BookingFailed);
}

#[tokio::test]
async fn test_every_outcome_has_a_reply() {
    let assistant = assistant(&[], FakeCalendar::returning(None));
    assert!(!assistant.welcome().trim().is_empty());

    for outcome in [
        Outcome::NotUnderstood,
        Outcome::BookingFailed,
        Outcome::Failed,
        Outcome::Booked {
            summary: "x".to_string(),
            start: NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            link: LINK.to_string(),
        },
    ] {
        assert!(!outcome.reply().trim().is_empty());
    }
}
