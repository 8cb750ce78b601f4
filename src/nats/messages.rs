use serde::{Deserialize, Serialize};

/// What the speech service should do for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureAction {
    Start,
    Stop,
}

impl CaptureAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureAction::Start => "start",
            CaptureAction::Stop => "stop",
        }
    }
}

/// Capture control message published to the speech service
#[derive(Debug, Serialize, Deserialize)]
pub struct CaptureControlMessage {
    pub session_id: String,
    pub action: CaptureAction,
    pub language: String,
    pub timestamp: String, // RFC3339 timestamp
}

/// Transcript message received from the speech service
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub session_id: String,
    pub text: String,
    pub partial: bool,
    pub timestamp: String,
    #[serde(default)]
    pub confidence: Option<f32>,
    /// Last message the service will send after a stop
    #[serde(default)]
    pub end_of_stream: bool,
}
