use super::state::AppState;
use crate::chat::ChatMessage;
use crate::error::SessionClosed;
use crate::session::SessionStatus;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::{error, info};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub session_id: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct SynthesisHealth {
    pub primary: bool,
    pub fallback: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub environment: String,
    pub synthesis: SynthesisHealth,
    pub timestamp: String,
}

// ============================================================================
// Handlers
// ============================================================================

fn accepted(
    state: &AppState,
    sent: Result<(), SessionClosed>,
    status: &str,
) -> axum::response::Response {
    match sent {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(CommandResponse {
                session_id: state.session.status().session_id,
                status: status.to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Session command rejected: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// POST /session/record/start
/// Start recording, interrupting any reply in progress
pub async fn start_recording(State(state): State<AppState>) -> impl IntoResponse {
    info!("Start recording requested");
    let sent = state.session.start_recording();
    accepted(&state, sent, "start-requested")
}

/// POST /session/record/stop
/// Stop the current recording
pub async fn stop_recording(State(state): State<AppState>) -> impl IntoResponse {
    info!("Stop recording requested");
    let sent = state.session.stop_recording();
    accepted(&state, sent, "stop-requested")
}

/// POST /session/record/toggle
/// Single-button control: stop if recording, start otherwise
pub async fn toggle_recording(State(state): State<AppState>) -> impl IntoResponse {
    let sent = state.session.toggle_recording();
    accepted(&state, sent, "toggle-requested")
}

/// GET /session/status
pub async fn get_status(State(state): State<AppState>) -> Json<SessionStatus> {
    Json(state.session.status())
}

/// GET /session/messages
/// Conversation so far, in order
pub async fn get_messages(State(state): State<AppState>) -> Json<Vec<ChatMessage>> {
    Json(state.session.status().messages)
}

/// GET /health
/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let status = if state.session.is_closed() {
        "stopped"
    } else {
        "ok"
    };

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: status.to_string(),
            service: state.info.name.clone(),
            environment: state.info.environment.clone(),
            synthesis: SynthesisHealth {
                primary: state.info.synthesis_primary,
                fallback: state.info.synthesis_fallback,
            },
            timestamp: chrono::Utc::now().to_rfc3339(),
        }),
    )
}
