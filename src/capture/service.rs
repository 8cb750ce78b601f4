use crate::error::CaptureError;
use tokio::sync::mpsc;

/// An event produced by the speech capture service while recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Current recognition hypothesis for the segment being spoken
    Interim(String),
    /// Finalized text for a completed segment
    Final(String),
    /// The recognizer failed mid-stream
    Error(String),
}

/// A running capture, owned exclusively by the session controller
#[async_trait::async_trait]
pub trait CaptureHandle: Send {
    /// Stop recognition, flush any remaining final text, and release the handle
    async fn stop(self: Box<Self>) -> Result<Vec<String>, CaptureError>;
}

/// Speech capture collaborator
///
/// Implementations:
/// - NATS: control messages out, transcripts in (`crate::nats::NatsSpeechCapture`)
/// - Tests: scripted fakes
#[async_trait::async_trait]
pub trait SpeechCapture: Send + Sync {
    /// Begin recognition. Interim, final and error events are delivered on `events`
    /// until the returned handle is stopped.
    async fn start(
        &self,
        events: mpsc::UnboundedSender<CaptureEvent>,
    ) -> Result<Box<dyn CaptureHandle>, CaptureError>;

    /// Recognition locale, for logging
    fn language(&self) -> &str;
}
