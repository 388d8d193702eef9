//! Gemini Live connection configuration.

use crate::core::realtime::base::{TransportError, TransportResult};

/// BidiGenerateContent websocket endpoint.
pub const GEMINI_LIVE_WS_URL: &str =
    "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// Native-audio model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-native-audio-preview-09-2025";

/// Prebuilt voice used when none is configured.
pub const DEFAULT_VOICE: &str = "Fenrir";

/// Outbound message queue depth. Audio frames beyond this are dropped at
/// the session layer rather than buffered.
pub const SEND_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    api_key: String,
    model: String,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> TransportResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(TransportError::AuthenticationFailed(
                "API key is empty".to_string(),
            ));
        }
        Ok(Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Full path of the model as the setup message expects it.
    pub fn model_path(&self) -> String {
        format!("models/{}", self.model)
    }

    /// Endpoint with the API key attached as a query parameter.
    pub fn ws_url(&self) -> String {
        format!("{GEMINI_LIVE_WS_URL}?key={}", self.api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_rejected() {
        assert!(matches!(
            GeminiConfig::new("  "),
            Err(TransportError::AuthenticationFailed(_))
        ));
    }

    #[test]
    fn test_ws_url_carries_key() {
        let config = GeminiConfig::new("test-key").unwrap();
        assert!(config.ws_url().ends_with("?key=test-key"));
        assert!(config.ws_url().starts_with("wss://generativelanguage"));
    }

    #[test]
    fn test_model_path() {
        let config = GeminiConfig::new("k").unwrap().with_model("gemini-x");
        assert_eq!(config.model_path(), "models/gemini-x");
    }
}
