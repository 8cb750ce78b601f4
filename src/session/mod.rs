//! Interactive voice session
//!
//! This module provides the `SessionController` state machine that sequences:
//! - Speech capture with silence and hard-cap endpointing
//! - Chat history and the model query for each utterance
//! - Synthesis with local fallback, and playback
//! - Interruption of stale replies when a new recording starts

mod config;
mod controller;
mod event;
mod handle;
mod status;

pub use config::SessionConfig;
pub use controller::{SessionController, SessionServices};
pub use handle::SessionHandle;
pub use status::{SessionState, SessionStatus};
