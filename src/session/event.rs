use crate::capture::CaptureEvent;
use crate::error::{ModelQueryError, SynthesisError};
use crate::playback::PlaybackId;
use crate::synthesis::SynthesisResult;
use uuid::Uuid;

/// Requests from the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SessionCommand {
    StartRecording,
    StopRecording,
    ToggleRecording,
    Shutdown,
}

/// Everything the session loop reacts to, processed one at a time
///
/// Asynchronous completions carry the generation they were issued under so the
/// loop can drop results that belong to an interrupted turn.
pub(super) enum SessionEvent {
    Command(SessionCommand),
    Capture {
        generation: u64,
        event: CaptureEvent,
    },
    SilenceElapsed {
        generation: u64,
        arm_id: u64,
    },
    MaxDurationElapsed {
        generation: u64,
    },
    ModelReplied {
        generation: u64,
        message_id: Uuid,
        result: Result<String, ModelQueryError>,
    },
    Synthesized {
        generation: u64,
        text: String,
        result: Result<SynthesisResult, SynthesisError>,
    },
    PlaybackFinished {
        generation: u64,
        playback_id: PlaybackId,
        outcome: anyhow::Result<()>,
    },
}
