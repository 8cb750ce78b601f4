//! HTTP API for the presentation layer
//!
//! This module provides a REST API for driving the session:
//! - POST /session/record/start - Start recording
//! - POST /session/record/stop - Stop recording
//! - POST /session/record/toggle - Start or stop, whichever applies
//! - GET /session/status - Current session status
//! - GET /session/messages - Conversation so far
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::{AppState, ServiceInfo};
