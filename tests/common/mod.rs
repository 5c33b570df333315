//! Fakes shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use calendar_assistant::components::event_extractor::{EventExtractor, EventRequest, LanguageModel};
use calendar_assistant::components::google_calendar::{CalendarClient, ConsentFlow, StoredToken};
use calendar_assistant::error::{credential_error, llm_error, BotResult};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Language model that answers from a script and records prompts
#[derive(Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> BotResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| llm_error("script exhausted"))
    }
}

/// Language model that answers the first `answered` prompts and then never returns
pub struct HangingModel {
    answered: Mutex<VecDeque<String>>,
}

impl HangingModel {
    pub fn new(answered: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            answered: Mutex::new(answered.iter().map(|r| r.to_string()).collect()),
        })
    }
}

#[async_trait]
impl LanguageModel for HangingModel {
    async fn complete(&self, _prompt: &str) -> BotResult<String> {
        let next = self.answered.lock().unwrap().pop_front();
        match next {
            Some(answer) => Ok(answer),
            None => std::future::pending().await,
        }
    }
}

pub fn extractor(model: Arc<dyn LanguageModel>) -> EventExtractor {
    EventExtractor::new(model, chrono_tz::Asia::Tehran, Duration::from_secs(5))
}

/// Calendar that returns a fixed result and records what it was asked to book
pub struct FakeCalendar {
    link: Option<String>,
    calls: Mutex<Vec<(u64, EventRequest)>>,
}

impl FakeCalendar {
    pub fn returning(link: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            link: link.map(str::to_string),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(u64, EventRequest)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarClient for FakeCalendar {
    async fn create_event(&self, user_id: u64, event: &EventRequest) -> Option<String> {
        self.calls.lock().unwrap().push((user_id, event.clone()));
        self.link.clone()
    }
}

/// Calendar whose booking panics
pub struct PanickingCalendar;

#[async_trait]
impl CalendarClient for PanickingCalendar {
    async fn create_event(&self, _user_id: u64, _event: &EventRequest) -> Option<String> {
        panic!("calendar exploded");
    }
}

/// Calendar whose booking never finishes
pub struct HangingCalendar;

#[async_trait]
impl CalendarClient for HangingCalendar {
    async fn create_event(&self, _user_id: u64, _event: &EventRequest) -> Option<String> {
        std::future::pending().await
    }
}

/// Consent flow that hands out a fixed token or fails
pub struct FakeConsent {
    token: Option<StoredToken>,
    calls: AtomicUsize,
}

impl FakeConsent {
    pub fn granting(token: StoredToken) -> Arc<Self> {
        Arc::new(Self {
            token: Some(token),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn refusing() -> Arc<Self> {
        Arc::new(Self {
            token: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConsentFlow for FakeConsent {
    async fn authorize(&self, _user_id: u64) -> BotResult<StoredToken> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.token
            .clone()
            .ok_or_else(|| credential_error("consent refused"))
    }
}

pub fn token(access: &str, refresh: Option<&str>, expires_at: i64) -> StoredToken {
    StoredToken {
        access_token: access.to_string(),
        refresh_token: refresh.map(str::to_string),
        expires_at,
        token_type: Some("Bearer".to_string()),
        scope: None,
    }
}

pub fn in_an_hour() -> i64 {
    chrono::Utc::now().timestamp() + 3600
}

pub fn an_hour_ago() -> i64 {
    chrono::Utc::now().timestamp() - 3600
}
