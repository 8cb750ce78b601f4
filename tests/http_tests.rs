// Integration tests for the HTTP control API
//
// Requests are sent straight into the router; the session behind it runs on
// scripted collaborators.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use voice_assistant::{
    create_router, AppState, ServiceInfo, SessionController, SessionHandle, SessionState,
};

fn service_info() -> ServiceInfo {
    ServiceInfo {
        name: "voice-assistant".to_string(),
        environment: "test".to_string(),
        synthesis_primary: true,
        synthesis_fallback: false,
    }
}

fn spawn_session() -> (SessionHandle, tokio::task::JoinHandle<()>, Arc<FakeCapture>) {
    let sink = Arc::new(FakeSink::new(Duration::from_secs(1)));
    let capture = Arc::new(FakeCapture::new());
    let model = Arc::new(FakeModel::replying("Nine to five."));
    let primary = Arc::new(FakePrimary::working());

    let (session, task) = SessionController::spawn(
        test_config(),
        services(&capture, &model, Some(&primary), None, &sink),
    );
    (session, task, capture)
}

async fn send(session: &SessionHandle, method: &str, uri: &str) -> (StatusCode, Value) {
    let app = create_router(AppState::new(session.clone(), service_info()));
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health_reports_synthesis_paths() {
    let (session, _task, _capture) = spawn_session();

    let (status, body) = send(&session, "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "voice-assistant");
    assert_eq!(body["environment"], "test");
    assert_eq!(body["synthesis"]["primary"], true);
    assert_eq!(body["synthesis"]["fallback"], false);
}

#[tokio::test]
async fn test_start_and_stop_recording() {
    let (session, _task, capture) = spawn_session();

    let (status, body) = send(&session, "POST", "/session/record/start").await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["session_id"], "test-session");
    assert_eq!(body["status"], "start-requested");

    wait_until(&session, |s| s.recording).await;
    let (_, body) = send(&session, "GET", "/session/status").await;
    assert_eq!(body["state"], "recording");
    assert_eq!(body["recording"], true);
    assert_eq!(body["tts_status"], "idle");

    capture.interim("What are your hours?");
    tokio::time::sleep(Duration::from_millis(50)).await;
    let (status, _) = send(&session, "POST", "/session/record/stop").await;
    assert_eq!(status, StatusCode::ACCEPTED);

    wait_until(&session, |s| {
        s.messages.len() == 2 && s.messages.iter().all(|m| !m.pending)
    })
    .await;

    let (status, body) = send(&session, "GET", "/session/messages").await;
    assert_eq!(status, StatusCode::OK);
    let messages = body.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "What are your hours?");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"], "Nine to five.");
    assert_eq!(messages[1]["pending"], false);
}

#[tokio::test]
async fn test_toggle_starts_then_stops() {
    let (session, _task, capture) = spawn_session();

    let (status, body) = send(&session, "POST", "/session/record/toggle").await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "toggle-requested");
    wait_until(&session, |s| s.recording).await;

    send(&session, "POST", "/session/record/toggle").await;
    let status = wait_until(&session, |s| !s.recording && s.state == SessionState::Idle).await;

    assert_eq!(capture.starts(), 1);
    assert_eq!(capture.stops(), 1);
    assert!(status.messages.is_empty());
}

#[tokio::test]
async fn test_commands_after_shutdown_are_rejected() {
    let (session, task, _capture) = spawn_session();
    session.shutdown().unwrap();
    task.await.unwrap();

    let (status, body) = send(&session, "POST", "/session/record/start").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("shut down"));

    let (status, body) = send(&session, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "stopped");
}
