//! Environment configuration
//!
//! Everything is read once at startup. A missing Groq key is not an
//! error: the assistant keeps answering from the glossary.

use crate::error::AssistantError;
use crate::memory::sessions::{DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_IDLE_SECS};
use crate::Result;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_GROQ_MODEL: &str = "llama3-8b-8192";
pub const DEFAULT_FUNDS_API_BASE_URL: &str = "http://0.0.0.0:8000";
pub const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PORT: u16 = 8080;

/// Values people leave in `.env` when copying the example file
const PLACEHOLDER_KEYS: &[&str] = &["your_key_here", "your_groq_api_key_here"];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub groq_api_key: Option<String>,
    pub groq_api_url: String,
    pub groq_model: String,
    pub completion_timeout: Duration,
    pub funds_api_base_url: String,
    pub glossary_path: Option<PathBuf>,
    pub session_idle_timeout: Duration,
    pub max_sessions: usize,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            groq_api_key: None,
            groq_api_url: DEFAULT_GROQ_API_URL.to_string(),
            groq_model: DEFAULT_GROQ_MODEL.to_string(),
            completion_timeout: Duration::from_secs(DEFAULT_COMPLETION_TIMEOUT_SECS),
            funds_api_base_url: DEFAULT_FUNDS_API_BASE_URL.to_string(),
            glossary_path: None,
            session_idle_timeout: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
            max_sessions: DEFAULT_MAX_SESSIONS,
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    /// Load from the process environment (call `dotenv` first if wanted)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup; lets tests avoid touching
    /// the real environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let groq_api_key = lookup("GROQ_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && !PLACEHOLDER_KEYS.contains(&k.as_str()));

        let completion_timeout = match lookup("COMPLETION_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_positive(&raw, "COMPLETION_TIMEOUT_SECS")?),
            None => defaults.completion_timeout,
        };

        let session_idle_timeout = match lookup("SESSION_IDLE_SECS") {
            Some(raw) => Duration::from_secs(parse_positive(&raw, "SESSION_IDLE_SECS")?),
            None => defaults.session_idle_timeout,
        };

        let max_sessions = match lookup("MAX_SESSIONS") {
            Some(raw) => parse_positive(&raw, "MAX_SESSIONS")?,
            None => defaults.max_sessions,
        };

        let port = match lookup("PORT").or_else(|| lookup("API_PORT")) {
            Some(raw) => parse_number(&raw, "PORT")?,
            None => defaults.port,
        };

        Ok(Self {
            groq_api_key,
            groq_api_url: non_empty(lookup("GROQ_API_URL")).unwrap_or(defaults.groq_api_url),
            groq_model: non_empty(lookup("GROQ_MODEL")).unwrap_or(defaults.groq_model),
            completion_timeout,
            funds_api_base_url: non_empty(lookup("FUNDS_API_BASE_URL"))
                .unwrap_or(defaults.funds_api_base_url),
            glossary_path: non_empty(lookup("GLOSSARY_PATH")).map(PathBuf::from),
            session_idle_timeout,
            max_sessions,
            port,
        })
    }

    pub fn completion_configured(&self) -> bool {
        self.groq_api_key.is_some()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_number<T: std::str::FromStr>(raw: &str, name: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| AssistantError::Config(format!("{} must be a number, got '{}'", name, raw)))
}

fn parse_positive<T>(raw: &str, name: &str) -> Result<T>
where
    T: std::str::FromStr + Default + PartialEq,
{
    let value: T = parse_number(raw, name)?;
    if value == T::default() {
        return Err(AssistantError::Config(format!("{} must be greater than zero", name)));
    }
    Ok(value)
}
