use super::event::{SessionCommand, SessionEvent};
use super::status::SessionStatus;
use crate::error::SessionClosed;
use tokio::sync::{mpsc, watch};

/// Cloneable control surface for a running session
#[derive(Clone)]
pub struct SessionHandle {
    events: mpsc::UnboundedSender<SessionEvent>,
    status: watch::Receiver<SessionStatus>,
}

impl SessionHandle {
    pub(super) fn new(
        events: mpsc::UnboundedSender<SessionEvent>,
        status: watch::Receiver<SessionStatus>,
    ) -> Self {
        Self { events, status }
    }

    /// Begin a new recording, interrupting playback and any in-flight reply
    pub fn start_recording(&self) -> Result<(), SessionClosed> {
        self.send(SessionCommand::StartRecording)
    }

    /// End the current recording as if the user pressed stop
    pub fn stop_recording(&self) -> Result<(), SessionClosed> {
        self.send(SessionCommand::StopRecording)
    }

    /// Stop when recording, start otherwise
    pub fn toggle_recording(&self) -> Result<(), SessionClosed> {
        self.send(SessionCommand::ToggleRecording)
    }

    pub fn shutdown(&self) -> Result<(), SessionClosed> {
        self.send(SessionCommand::Shutdown)
    }

    /// Latest published status
    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified on every status change
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }

    fn send(&self, command: SessionCommand) -> Result<(), SessionClosed> {
        self.events
            .send(SessionEvent::Command(command))
            .map_err(|_| SessionClosed)
    }
}
