use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Discord API error: {0}")]
    #[diagnostic(code(calendar_assistant::discord_api))]
    DiscordApi(#[from] serenity::Error),

    #[error("Environment error: {0}")]
    #[diagnostic(
        code(calendar_assistant::environment),
        help("set the variable in the environment or in a .env file")
    )]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(calendar_assistant::config))]
    Config(String),

    #[error("Google Calendar API error: {0}")]
    #[diagnostic(code(calendar_assistant::google_calendar))]
    GoogleCalendar(String),

    #[error("Credential error: {0}")]
    #[diagnostic(code(calendar_assistant::credential))]
    Credential(String),

    #[error("Language model error: {0}")]
    #[diagnostic(code(calendar_assistant::llm))]
    Llm(String),

    #[error(transparent)]
    #[diagnostic(code(calendar_assistant::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(calendar_assistant::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(calendar_assistant::other))]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type BotResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create Google Calendar errors
pub fn google_calendar_error(message: &str) -> Error {
    Error::GoogleCalendar(message.to_string())
}

/// Helper to create credential errors
pub fn credential_error(message: &str) -> Error {
    Error::Credential(message.to_string())
}

/// Helper to create language model errors
pub fn llm_error(message: &str) -> Error {
    Error::Llm(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
