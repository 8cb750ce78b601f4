use crate::capture::Utterance;
use crate::chat::ChatMessage;
use crate::playback::TtsStatus;
use serde::{Deserialize, Serialize};

/// Session state machine
///
/// `idle → recording → recording-ending → processing-model →
/// processing-synthesis → speaking → idle`, with a transient `error` that
/// always falls back to `idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    RecordingEnding,
    ProcessingModel,
    ProcessingSynthesis,
    Speaking,
    Error,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Recording => "recording",
            SessionState::RecordingEnding => "recording-ending",
            SessionState::ProcessingModel => "processing-model",
            SessionState::ProcessingSynthesis => "processing-synthesis",
            SessionState::Speaking => "speaking",
            SessionState::Error => "error",
        }
    }
}

/// Snapshot published to the presentation layer after every event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStatus {
    pub session_id: String,

    pub state: SessionState,

    /// Capture is active
    pub recording: bool,

    /// Waiting for the model
    pub thinking: bool,

    pub tts_status: TtsStatus,

    /// Conversation so far, in order
    pub messages: Vec<ChatMessage>,

    /// Most recent utterance sent to the model
    pub last_utterance: Option<Utterance>,

    /// Last user-visible failure, cleared when a new recording starts
    pub last_error: Option<String>,

    /// Increments with every recording; stale results carry an older value
    pub generation: u64,
}
