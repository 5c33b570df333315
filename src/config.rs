use crate::error::{config_error, env_error, BotResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default activity text for the bot
pub const DEFAULT_ACTIVITY: &str = "Booking your events";
/// Time zone every event is booked in unless configured otherwise
pub const DEFAULT_TIMEZONE: &str = "Asia/Tehran";
pub const DEFAULT_CALENDAR_ID: &str = "primary";
pub const DEFAULT_LLM_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "mshojaei77/gemma3persian";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TOKEN_DIR: &str = "tokens";
pub const DEFAULT_LOCALE: &str = "fa";
pub const DEFAULT_CONFIG_FILE: &str = "config/assistant.toml";
pub const DEFAULT_GOOGLE_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const DEFAULT_GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CALENDAR_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONSENT_TIMEOUT_SECS: u64 = 300;
/// Upper bound for every configured timeout (one day)
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

/// Which language model backend answers extraction prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Local Ollama server
    Ollama,
    /// Google Gemini through rig
    Gemini,
}

impl FromStr for LlmProvider {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(LlmProvider::Ollama),
            "gemini" => Ok(LlmProvider::Gemini),
            other => Err(config_error(&format!("Unknown LLM provider: {}", other))),
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProvider::Ollama => write!(f, "ollama"),
            LlmProvider::Gemini => write!(f, "gemini"),
        }
    }
}

/// Main configuration structure for the bot
#[derive(Debug, Clone)]
pub struct Config {
    /// Discord bot token
    pub discord_token: String,
    /// Google OAuth client ID
    pub google_client_id: String,
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// Calendar that receives new events
    pub calendar_id: String,
    /// Time zone attached to every booked event
    pub timezone: Tz,
    pub llm_provider: LlmProvider,
    /// Base URL of the Ollama server
    pub llm_base_url: String,
    pub llm_model: String,
    pub gemini_api_key: Option<String>,
    /// Upper bound for a single language model call
    pub llm_timeout: Duration,
    /// Upper bound for a single calendar API request
    pub calendar_timeout: Duration,
    /// How long the consent flow waits for the browser redirect
    pub consent_timeout: Duration,
    /// Loopback port for the OAuth redirect, 0 picks a free one
    pub oauth_redirect_port: u16,
    /// Directory holding one token file per user
    pub token_dir: PathBuf,
    pub bot_locale: String,
    /// Bot activity status text
    pub activity: String,
    pub google_api_base: String,
    pub google_token_url: String,
    pub google_auth_url: String,
}

/// Non-secret settings that may come from the TOML config file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    pub calendar_id: Option<String>,
    pub timezone: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_base_url: Option<String>,
    pub llm_model: Option<String>,
    pub llm_timeout_secs: Option<u64>,
    pub calendar_timeout_secs: Option<u64>,
    pub consent_timeout_secs: Option<u64>,
    pub oauth_redirect_port: Option<u16>,
    pub token_dir: Option<String>,
    pub bot_locale: Option<String>,
    pub activity: Option<String>,
}

impl FileSettings {
    /// Read settings from a TOML file, an absent file yields defaults
    pub fn read(path: &Path) -> BotResult<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> BotResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let path = env::var("ASSISTANT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let file = FileSettings::read(Path::new(&path))?;

        Self::from_sources(|key| env::var(key).ok(), file)
    }

    /// Build configuration from a variable lookup and file settings.
    ///
    /// Variables win over the file, the file wins over built-in defaults.
    pub fn from_sources<F>(lookup: F, file: FileSettings) -> BotResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| var(key).ok_or_else(|| env_error(key));

        // Required values
        let discord_token = required("DISCORD_TOKEN")?;
        let google_client_id = required("GOOGLE_CLIENT_ID")?;
        let google_client_secret = required("GOOGLE_CLIENT_SECRET")?;

        let calendar_id = var("GOOGLE_CALENDAR_ID")
            .or(file.calendar_id)
            .unwrap_or_else(|| DEFAULT_CALENDAR_ID.to_string());

        let timezone_name = var("CALENDAR_TIMEZONE")
            .or(file.timezone)
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone: Tz = timezone_name
            .parse()
            .map_err(|_| config_error(&format!("Invalid time zone: {}", timezone_name)))?;

        let llm_provider = match var("LLM_PROVIDER") {
            Some(value) => value.parse()?,
            None => file.llm_provider.unwrap_or(LlmProvider::Ollama),
        };

        let default_model = match llm_provider {
            LlmProvider::Ollama => DEFAULT_OLLAMA_MODEL,
            LlmProvider::Gemini => DEFAULT_GEMINI_MODEL,
        };
        let llm_model = var("LLM_MODEL")
            .or(file.llm_model)
            .unwrap_or_else(|| default_model.to_string());

        let gemini_api_key = var("GEMINI_API_KEY");
        if llm_provider == LlmProvider::Gemini && gemini_api_key.is_none() {
            return Err(env_error("GEMINI_API_KEY"));
        }

        let llm_timeout_secs = parse_number(&var, "LLM_TIMEOUT_SECS", file.llm_timeout_secs)?
            .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS);
        let calendar_timeout_secs =
            parse_number(&var, "CALENDAR_TIMEOUT_SECS", file.calendar_timeout_secs)?
                .unwrap_or(DEFAULT_CALENDAR_TIMEOUT_SECS);
        let consent_timeout_secs =
            parse_number(&var, "CONSENT_TIMEOUT_SECS", file.consent_timeout_secs)?
                .unwrap_or(DEFAULT_CONSENT_TIMEOUT_SECS);
        let oauth_redirect_port =
            parse_number(&var, "OAUTH_REDIRECT_PORT", file.oauth_redirect_port)?.unwrap_or(0);

        for (name, secs) in [
            ("LLM_TIMEOUT_SECS", llm_timeout_secs),
            ("CALENDAR_TIMEOUT_SECS", calendar_timeout_secs),
            ("CONSENT_TIMEOUT_SECS", consent_timeout_secs),
        ] {
            if secs == 0 {
                return Err(config_error(&format!("{} must be greater than zero", name)));
            }
            if secs > MAX_TIMEOUT_SECS {
                return Err(config_error(&format!(
                    "{} must not exceed {} seconds",
                    name, MAX_TIMEOUT_SECS
                )));
            }
        }

        Ok(Config {
            discord_token,
            google_client_id,
            google_client_secret,
            calendar_id,
            timezone,
            llm_provider,
            llm_base_url: var("LLM_BASE_URL")
                .or(file.llm_base_url)
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            llm_model,
            gemini_api_key,
            llm_timeout: Duration::from_secs(llm_timeout_secs),
            calendar_timeout: Duration::from_secs(calendar_timeout_secs),
            consent_timeout: Duration::from_secs(consent_timeout_secs),
            oauth_redirect_port,
            token_dir: PathBuf::from(
                var("TOKEN_DIR")
                    .or(file.token_dir)
                    .unwrap_or_else(|| DEFAULT_TOKEN_DIR.to_string()),
            ),
            bot_locale: var("BOT_LOCALE")
                .or(file.bot_locale)
                .unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            activity: var("BOT_ACTIVITY")
                .or(file.activity)
                .unwrap_or_else(|| DEFAULT_ACTIVITY.to_string()),
            google_api_base: var("GOOGLE_API_BASE")
                .unwrap_or_else(|| DEFAULT_GOOGLE_API_BASE.to_string()),
            google_token_url: var("GOOGLE_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_GOOGLE_TOKEN_URL.to_string()),
            google_auth_url: var("GOOGLE_AUTH_URL")
                .unwrap_or_else(|| DEFAULT_GOOGLE_AUTH_URL.to_string()),
        })
    }
}

fn parse_number<T, F>(var: &F, key: &str, fallback: Option<T>) -> BotResult<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| config_error(&format!("Invalid {} format", key))),
        None => Ok(fallback),
    }
}
