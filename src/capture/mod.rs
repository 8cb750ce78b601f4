//! Speech capture: the collaborator interface plus the two pieces of state the
//! session keeps while recording (silence endpointing and the transcript buffer).

mod endpointer;
mod service;
mod transcript;

pub use endpointer::SilenceEndpointer;
pub use service::{CaptureEvent, CaptureHandle, SpeechCapture};
pub use transcript::{CompletionReason, TranscriptAccumulator, Utterance};
