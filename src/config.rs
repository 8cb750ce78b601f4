use anyhow::{Context, Result};
use serde::Deserialize;

/// Service configuration
///
/// Loaded from an optional TOML file and `VOICE_ASSISTANT__*` environment
/// variables (`VOICE_ASSISTANT__SERVICE__HTTP__PORT=8080`). Every field has a
/// default, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub session: SessionSettings,
    pub capture: CaptureConfig,
    pub model: ModelConfig,
    pub synthesis: SynthesisConfig,
    pub fallback: FallbackConfig,
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub environment: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "voice-assistant".to_string(),
            environment: "development".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

/// Recording limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Quiet period that ends an utterance
    pub silence_timeout_ms: u64,
    /// Hard cap on a single recording
    pub max_recording_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            silence_timeout_ms: 2000,
            max_recording_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub nats_url: String,
    /// Recognition locale, fixed for the lifetime of the process
    pub language: String,
    /// How long `stop` waits for trailing final text
    pub flush_timeout_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            nats_url: "nats://localhost:4222".to_string(),
            language: "en-US".to_string(),
            flush_timeout_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the bearer token
    pub api_key_env: String,
    pub system_prompt: String,
    /// Spoken when the service answers without content
    pub empty_reply_text: String,
    /// Shown (not spoken) when the call fails
    pub failure_reply_text: String,
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "deepseek/deepseek-r1-distill-llama-70b:free".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            system_prompt: "You are a friendly voice assistant answering frequently asked \
                            questions. Keep answers short enough to be spoken aloud."
                .to_string(),
            empty_reply_text: "Sorry, I had trouble answering that.".to_string(),
            failure_reply_text: "Sorry, something went wrong.".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub voice: String,
    pub language: String,
    pub timeout_secs: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://localhost:3002/api/tts".to_string(),
            voice: "en-US-Standard-A".to_string(),
            language: "en-US".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Local speech engine used when the remote synthesis call fails
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub enabled: bool,
    pub program: String,
    pub voice: String,
    pub args: Vec<String>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "espeak-ng".to_string(),
            voice: "en-us".to_string(),
            args: Vec::new(),
        }
    }
}

/// External player fed with encoded audio on stdin
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            program: "ffplay".to_string(),
            args: ["-nodisp", "-autoexit", "-loglevel", "quiet", "-i", "-"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("VOICE_ASSISTANT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }
}
