//! Application configuration.
//!
//! Settings come from environment variables (a `.env` file is honored by the
//! binary before this runs). Priority: explicit overrides > env vars >
//! built-in defaults.

use thiserror::Error;

use crate::core::realtime::gemini::{DEFAULT_MODEL, DEFAULT_VOICE};

const ENV_API_KEY: &str = "GEMINI_API_KEY";
const ENV_MODEL: &str = "VANCIX_MODEL";
const ENV_VOICE: &str = "VANCIX_VOICE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVariable(&'static str),

    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Gemini API key. Never logged.
    pub api_key: String,
    pub model: String,
    pub voice: String,
    /// Whether web-search grounding is enabled for the session.
    pub enable_search: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = read(ENV_API_KEY).ok_or(ConfigError::MissingVariable(ENV_API_KEY))?;
        let config = Self {
            api_key,
            model: read(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            voice: read(ENV_VOICE).unwrap_or_else(|| DEFAULT_VOICE.to_string()),
            enable_search: true,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: ENV_MODEL,
                reason: "model name is empty".to_string(),
            });
        }
        if self.voice.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: ENV_VOICE,
                reason: "voice name is empty".to_string(),
            });
        }
        Ok(())
    }
}

fn read(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
