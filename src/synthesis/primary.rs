use crate::config::SynthesisConfig;
use crate::error::SynthesisPrimaryError;
use anyhow::Context;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::time::{Duration, Instant};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{info, warn};

/// Remote text-to-speech collaborator
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` into an encoded audio payload
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthesisPrimaryError>;
}

/// Basic facts about a synthesized payload
#[derive(Debug, Clone, PartialEq)]
pub struct AudioInfo {
    pub sample_rate: Option<u32>,
    pub channels: Option<usize>,
    pub duration_secs: Option<f64>,
}

/// Check that `bytes` is a container symphonia can open and describe it
pub fn probe_audio(bytes: &[u8]) -> Result<AudioInfo, SynthesisPrimaryError> {
    if bytes.is_empty() {
        return Err(SynthesisPrimaryError::InvalidAudio("empty payload".to_string()));
    }

    let source = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| SynthesisPrimaryError::InvalidAudio(e.to_string()))?;

    let track = probed
        .format
        .default_track()
        .ok_or_else(|| SynthesisPrimaryError::InvalidAudio("no audio track".to_string()))?;

    let params = &track.codec_params;
    let duration_secs = match (params.n_frames, params.sample_rate) {
        (Some(frames), Some(rate)) if rate > 0 => Some(frames as f64 / rate as f64),
        _ => None,
    };

    Ok(AudioInfo {
        sample_rate: params.sample_rate,
        channels: params.channels.map(|c| c.count()),
        duration_secs,
    })
}

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    voice: &'a str,
    language: &'a str,
}

/// `{"error": "...", "details": "..."}` returned by the TTS proxy on failure
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    details: Option<String>,
}

/// Google-style JSON response carrying base64 audio
#[derive(Debug, Deserialize)]
struct JsonAudio {
    #[serde(rename = "audioContent")]
    audio_content: String,
}

/// HTTP synthesis client
///
/// Posts `{text, voice, language}` and accepts either a raw audio body or a JSON
/// body with base64 `audioContent`.
#[derive(Debug, Clone)]
pub struct HttpSynthesizer {
    endpoint: String,
    voice: String,
    language: String,
    client: reqwest::Client,
}

impl HttpSynthesizer {
    pub fn new(config: &SynthesisConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build synthesis HTTP client")?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            voice: config.voice.clone(),
            language: config.language.clone(),
            client,
        })
    }

    fn describe_failure(body: &[u8]) -> String {
        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(ErrorBody {
                error: Some(error),
                details: Some(details),
            }) => format!("{}: {}", error, details),
            Ok(ErrorBody {
                error: Some(error), ..
            }) => error,
            _ => String::from_utf8_lossy(body).trim().to_string(),
        }
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthesisPrimaryError> {
        info!("Synthesizing speech with voice: {}", self.voice);
        let started = Instant::now();

        let request = SynthesisRequest {
            text,
            voice: &self.voice,
            language: &self.language,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| SynthesisPrimaryError::Transport(e.to_string()))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let body = response
            .bytes()
            .await
            .map_err(|e| SynthesisPrimaryError::Transport(e.to_string()))?;

        if !status.is_success() {
            warn!(
                "Synthesis failed after {}ms with status {}",
                started.elapsed().as_millis(),
                status
            );
            return Err(SynthesisPrimaryError::Status {
                status: status.as_u16(),
                details: Self::describe_failure(&body),
            });
        }

        let payload = if content_type.starts_with("application/json") {
            let json: JsonAudio = serde_json::from_slice(&body)
                .map_err(|e| SynthesisPrimaryError::InvalidAudio(e.to_string()))?;
            base64::engine::general_purpose::STANDARD
                .decode(json.audio_content.as_bytes())
                .map_err(|e| SynthesisPrimaryError::InvalidAudio(e.to_string()))?
        } else {
            body.to_vec()
        };

        let audio = probe_audio(&payload)?;

        info!(
            "Synthesis completed in {}ms ({} bytes, {:.1}s)",
            started.elapsed().as_millis(),
            payload.len(),
            audio.duration_secs.unwrap_or_default()
        );

        Ok(payload)
    }
}
