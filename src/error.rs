//! Error types for the voice session
//!
//! Each variant family maps to one asynchronous boundary of the session. None of
//! them escape the session loop: the controller turns every failure into a state
//! transition plus a status signal.

use thiserror::Error;

/// The speech capture service could not be started or stopped
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("capture service unavailable: {0}")]
    Unavailable(String),

    #[error("capture subscription failed: {0}")]
    Subscribe(String),

    #[error("capture stream error: {0}")]
    Stream(String),
}

/// The language model call failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelQueryError {
    #[error("model request failed: {0}")]
    Transport(String),

    #[error("model service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model response could not be parsed: {0}")]
    Parse(String),
}

/// The primary (remote) synthesis path failed. Triggers the local fallback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisPrimaryError {
    #[error("synthesis request failed: {0}")]
    Transport(String),

    #[error("synthesis service returned {status}: {details}")]
    Status { status: u16, details: String },

    #[error("synthesis payload is not playable audio: {0}")]
    InvalidAudio(String),
}

/// Both synthesis paths are exhausted; no audio will play for this turn
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("synthesis failed (primary: {primary}; fallback: {fallback})")]
    TotalFailure { primary: String, fallback: String },

    #[error("no synthesis capability configured")]
    NoCapability,
}

/// The session loop is no longer running
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("session has shut down")]
pub struct SessionClosed;
