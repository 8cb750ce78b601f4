use crate::config::{Config, ModelConfig, SessionSettings};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the interactive session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session identifier, also used to tag capture traffic
    pub session_id: String,

    /// Quiet period after the last interim result that ends an utterance
    /// Default: 2 seconds
    pub silence_timeout: Duration,

    /// Hard cap on one recording, independent of silence
    /// Default: 30 seconds
    pub max_recording: Duration,

    /// System prompt sent with every model query
    pub system_prompt: String,

    /// Assistant message recorded when the model query fails
    pub failure_reply: String,
}

impl SessionConfig {
    pub fn from_config(config: &Config) -> Self {
        Self::from_parts(&config.session, &config.model)
    }

    fn from_parts(session: &SessionSettings, model: &ModelConfig) -> Self {
        Self {
            session_id: format!("session-{}", uuid::Uuid::new_v4()),
            silence_timeout: Duration::from_millis(session.silence_timeout_ms),
            max_recording: Duration::from_millis(session.max_recording_ms),
            system_prompt: model.system_prompt.clone(),
            failure_reply: model.failure_reply_text.clone(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_parts(&SessionSettings::default(), &ModelConfig::default())
    }
}
