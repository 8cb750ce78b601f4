use super::local::LocalSpeech;
use super::primary::SpeechSynthesizer;
use crate::error::SynthesisError;
use crate::playback::ActiveAudio;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Which synthesis path produced the audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioPath {
    Primary,
    Fallback,
}

/// Synthesized speech, ready for the playback controller
pub enum SynthesizedAudio {
    /// Encoded payload from the remote service, not yet playing
    Encoded(Vec<u8>),
    /// Local engine already speaking
    Speaking(Box<dyn ActiveAudio>),
}

impl fmt::Debug for SynthesizedAudio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthesizedAudio::Encoded(bytes) => write!(f, "Encoded({} bytes)", bytes.len()),
            SynthesizedAudio::Speaking(_) => write!(f, "Speaking"),
        }
    }
}

#[derive(Debug)]
pub struct SynthesisResult {
    pub path: AudioPath,
    pub audio: SynthesizedAudio,
}

impl SynthesisResult {
    /// Encoded payload, if this came from the primary path
    pub fn payload(&self) -> Option<&[u8]> {
        match &self.audio {
            SynthesizedAudio::Encoded(bytes) => Some(bytes),
            SynthesizedAudio::Speaking(_) => None,
        }
    }
}

/// Remote synthesis with a single local fallback attempt
///
/// Exactly one attempt per path: the primary call is never repeated, and the
/// local engine is tried once only after the primary failed (or is absent).
#[derive(Clone, Default)]
pub struct SynthesisFallbackCoordinator {
    primary: Option<Arc<dyn SpeechSynthesizer>>,
    local: Option<Arc<dyn LocalSpeech>>,
}

impl SynthesisFallbackCoordinator {
    pub fn new(
        primary: Option<Arc<dyn SpeechSynthesizer>>,
        local: Option<Arc<dyn LocalSpeech>>,
    ) -> Self {
        Self { primary, local }
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    pub fn has_fallback(&self) -> bool {
        self.local.is_some()
    }

    pub async fn synthesize(&self, text: &str) -> Result<SynthesisResult, SynthesisError> {
        let primary_failure = match &self.primary {
            Some(primary) => match primary.synthesize(text).await {
                Ok(payload) => {
                    info!("Primary synthesis produced {} bytes", payload.len());
                    return Ok(SynthesisResult {
                        path: AudioPath::Primary,
                        audio: SynthesizedAudio::Encoded(payload),
                    });
                }
                Err(e) => {
                    warn!("Primary synthesis failed, falling back: {}", e);
                    e.to_string()
                }
            },
            None => "not configured".to_string(),
        };

        if self.primary.is_none() && self.local.is_none() {
            error!("No synthesis capability available");
            return Err(SynthesisError::NoCapability);
        }

        self.fallback(text, primary_failure).await
    }

    /// Single local attempt after the primary path failed
    ///
    /// Also used when a primary payload could not be played.
    pub async fn fallback(
        &self,
        text: &str,
        primary_failure: String,
    ) -> Result<SynthesisResult, SynthesisError> {
        let Some(local) = &self.local else {
            error!("Primary synthesis failed and no fallback is configured");
            return Err(SynthesisError::TotalFailure {
                primary: primary_failure,
                fallback: "not configured".to_string(),
            });
        };

        match local.speak(text).await {
            Ok(audio) => {
                info!("Speaking through local fallback ({})", local.name());
                Ok(SynthesisResult {
                    path: AudioPath::Fallback,
                    audio: SynthesizedAudio::Speaking(audio),
                })
            }
            Err(e) => {
                error!("Local fallback synthesis failed: {:#}", e);
                Err(SynthesisError::TotalFailure {
                    primary: primary_failure,
                    fallback: format!("{:#}", e),
                })
            }
        }
    }
}
