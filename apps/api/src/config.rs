use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "google/gemini-flash-1.5-8b";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_MAX_MESSAGES: usize = 30;
pub const DEFAULT_MAX_CONVERSATIONS: usize = 20;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Clone)]
pub struct Config {
    /// Candidate the assistant speaks for, unless a request names someone else.
    pub candidate_name: String,
    /// Local path or http(s) URL of the resume document.
    pub resume_source: String,
    /// Optional: a missing key is reported per request, not at startup.
    pub openrouter_api_key: Option<String>,
    pub openrouter_endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_messages: usize,
    pub max_conversations: usize,
    /// When set, every conversation is mirrored to a JSON record in this directory.
    pub conversation_dir: Option<PathBuf>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            candidate_name: require_env("CANDIDATE_NAME")?,
            resume_source: require_env("RESUME_SOURCE")?,
            openrouter_api_key: optional_env("OPENROUTER_API_KEY"),
            openrouter_endpoint: optional_env("OPENROUTER_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            model: optional_env("OPENROUTER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: parse_env("OPENROUTER_TEMPERATURE", DEFAULT_TEMPERATURE)?,
            max_messages: parse_env("MAX_MESSAGES", DEFAULT_MAX_MESSAGES)?,
            max_conversations: parse_env("MAX_CONVERSATIONS", DEFAULT_MAX_CONVERSATIONS)?,
            conversation_dir: optional_env("CONVERSATION_DIR").map(PathBuf::from),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("candidate_name", &self.candidate_name)
            .field("resume_source", &self.resume_source)
            .field(
                "openrouter_api_key",
                &self.openrouter_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("openrouter_endpoint", &self.openrouter_endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_messages", &self.max_messages)
            .field("max_conversations", &self.max_conversations)
            .field("conversation_dir", &self.conversation_dir)
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .finish()
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank values are treated the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Baseline configuration for tests: in-memory store, no credential.
    pub fn for_tests(endpoint: &str) -> Self {
        Config {
            candidate_name: "Ada Lovelace".to_string(),
            resume_source: "resume.pdf".to_string(),
            openrouter_api_key: None,
            openrouter_endpoint: endpoint.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_messages: DEFAULT_MAX_MESSAGES,
            max_conversations: DEFAULT_MAX_CONVERSATIONS,
            conversation_dir: None,
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}
