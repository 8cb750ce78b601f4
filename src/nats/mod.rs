pub mod capture;
pub mod client;
pub mod messages;

pub use capture::NatsSpeechCapture;
pub use client::NatsClient;
pub use messages::{CaptureAction, CaptureControlMessage, TranscriptMessage};
