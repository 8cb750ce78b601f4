// Scripted collaborators for driving a session without NATS, HTTP or audio
// devices. Every fake records what it was asked to do.

#![allow(dead_code)]

use anyhow::Result;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use voice_assistant::chat::ModelRequest;
use voice_assistant::{
    ActiveAudio, AudioSink, CaptureError, CaptureEvent, CaptureHandle, LanguageModel, LocalSpeech,
    ModelQueryError, SessionConfig, SessionHandle, SessionServices, SessionStatus,
    SpeechCapture, SpeechSynthesizer, SynthesisFallbackCoordinator, SynthesisPrimaryError,
};

// ============================================================================
// Capture
// ============================================================================

#[derive(Default)]
struct CaptureLog {
    events: Option<mpsc::UnboundedSender<CaptureEvent>>,
    starts: usize,
    stops: usize,
    playing_at_start: Vec<bool>,
}

/// Capture whose events are pushed by the test
#[derive(Default)]
pub struct FakeCapture {
    log: Arc<Mutex<CaptureLog>>,
    /// Output device to inspect when capture starts
    playing: Option<Arc<AtomicBool>>,
    /// Final fragments returned by `stop`
    flush: Vec<String>,
    fail_start: bool,
}

impl FakeCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watching(playing: Arc<AtomicBool>) -> Self {
        Self {
            playing: Some(playing),
            ..Self::default()
        }
    }

    pub fn with_flush(flush: &[&str]) -> Self {
        Self {
            flush: flush.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            fail_start: true,
            ..Self::default()
        }
    }

    pub fn interim(&self, text: &str) {
        self.emit(CaptureEvent::Interim(text.to_string()));
    }

    pub fn final_text(&self, text: &str) {
        self.emit(CaptureEvent::Final(text.to_string()));
    }

    pub fn error(&self, message: &str) {
        self.emit(CaptureEvent::Error(message.to_string()));
    }

    pub fn starts(&self) -> usize {
        self.log.lock().unwrap().starts
    }

    pub fn stops(&self) -> usize {
        self.log.lock().unwrap().stops
    }

    pub fn playing_at_start(&self) -> Vec<bool> {
        self.log.lock().unwrap().playing_at_start.clone()
    }

    fn emit(&self, event: CaptureEvent) {
        if let Some(events) = &self.log.lock().unwrap().events {
            let _ = events.send(event);
        }
    }
}

#[async_trait::async_trait]
impl SpeechCapture for FakeCapture {
    async fn start(
        &self,
        events: mpsc::UnboundedSender<CaptureEvent>,
    ) -> Result<Box<dyn CaptureHandle>, CaptureError> {
        if self.fail_start {
            return Err(CaptureError::Unavailable("no speech service".to_string()));
        }

        let mut log = self.log.lock().unwrap();
        log.starts += 1;
        let playing = self
            .playing
            .as_ref()
            .map(|p| p.load(Ordering::SeqCst))
            .unwrap_or(false);
        log.playing_at_start.push(playing);
        log.events = Some(events);

        Ok(Box::new(FakeCaptureHandle {
            log: Arc::clone(&self.log),
            flush: self.flush.clone(),
        }))
    }

    fn language(&self) -> &str {
        "en-US"
    }
}

struct FakeCaptureHandle {
    log: Arc<Mutex<CaptureLog>>,
    flush: Vec<String>,
}

#[async_trait::async_trait]
impl CaptureHandle for FakeCaptureHandle {
    async fn stop(self: Box<Self>) -> Result<Vec<String>, CaptureError> {
        let mut log = self.log.lock().unwrap();
        log.stops += 1;
        log.events = None;
        Ok(self.flush.clone())
    }
}

// ============================================================================
// Model
// ============================================================================

pub struct FakeModel {
    reply: Result<String, ModelQueryError>,
    /// When set, every call waits for one permit
    gate: Option<Arc<Notify>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl FakeModel {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            gate: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: ModelQueryError) -> Self {
        Self {
            reply: Err(error),
            gate: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn gated(text: &str, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::replying(text)
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LanguageModel for FakeModel {
    async fn complete(&self, request: &ModelRequest) -> Result<String, ModelQueryError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.reply.clone()
    }
}

// ============================================================================
// Synthesis and playback
// ============================================================================

/// Audio that plays for a fixed time unless stopped
pub struct FakeAudio {
    length: Duration,
    playing: Arc<AtomicBool>,
}

impl FakeAudio {
    pub fn start(length: Duration, playing: Arc<AtomicBool>) -> Self {
        playing.store(true, Ordering::SeqCst);
        Self { length, playing }
    }
}

#[async_trait::async_trait]
impl ActiveAudio for FakeAudio {
    async fn wait(&mut self) -> Result<()> {
        tokio::time::sleep(self.length).await;
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakePrimary {
    fail: bool,
    gate: Option<Arc<Notify>>,
    calls: Mutex<Vec<String>>,
}

impl FakePrimary {
    pub fn working() -> Self {
        Self::default()
    }

    pub fn broken() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Fails only once `gate` is notified
    pub fn broken_after(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::broken()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for FakePrimary {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthesisPrimaryError> {
        self.calls.lock().unwrap().push(text.to_string());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail {
            Err(SynthesisPrimaryError::Status {
                status: 500,
                details: "TTS service error".to_string(),
            })
        } else {
            Ok(vec![0u8; 32])
        }
    }
}

pub struct FakeLocal {
    length: Duration,
    pub speaking: Arc<AtomicBool>,
    calls: Mutex<Vec<String>>,
}

impl FakeLocal {
    pub fn new(length: Duration) -> Self {
        Self {
            length,
            speaking: Arc::new(AtomicBool::new(false)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LocalSpeech for FakeLocal {
    async fn speak(&self, text: &str) -> Result<Box<dyn ActiveAudio>> {
        self.calls.lock().unwrap().push(text.to_string());
        Ok(Box::new(FakeAudio::start(self.length, Arc::clone(&self.speaking))))
    }

    fn name(&self) -> &str {
        "fake-speech"
    }
}

pub struct FakeSink {
    length: Duration,
    broken: bool,
    pub playing: Arc<AtomicBool>,
    plays: AtomicUsize,
}

impl FakeSink {
    pub fn new(length: Duration) -> Self {
        Self {
            length,
            broken: false,
            playing: Arc::new(AtomicBool::new(false)),
            plays: AtomicUsize::new(0),
        }
    }

    /// Player that cannot be launched
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::new(Duration::ZERO)
        }
    }

    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AudioSink for FakeSink {
    async fn play(&self, _audio: Vec<u8>) -> Result<Box<dyn ActiveAudio>> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        if self.broken {
            anyhow::bail!("ffplay not found");
        }
        Ok(Box::new(FakeAudio::start(self.length, Arc::clone(&self.playing))))
    }
}

// ============================================================================
// Session helpers
// ============================================================================

pub fn test_config() -> SessionConfig {
    SessionConfig {
        session_id: "test-session".to_string(),
        silence_timeout: Duration::from_secs(2),
        max_recording: Duration::from_secs(30),
        system_prompt: "You answer questions about the shop.".to_string(),
        failure_reply: "Sorry, something went wrong.".to_string(),
    }
}

pub fn services(
    capture: &Arc<FakeCapture>,
    model: &Arc<FakeModel>,
    primary: Option<&Arc<FakePrimary>>,
    local: Option<&Arc<FakeLocal>>,
    sink: &Arc<FakeSink>,
) -> SessionServices {
    SessionServices {
        capture: capture.clone(),
        model: model.clone(),
        synthesis: SynthesisFallbackCoordinator::new(
            primary.map(|p| p.clone() as Arc<dyn SpeechSynthesizer>),
            local.map(|l| l.clone() as Arc<dyn LocalSpeech>),
        ),
        sink: sink.clone(),
    }
}

/// Wait until the published status satisfies `predicate`
pub async fn wait_until<F>(handle: &SessionHandle, mut predicate: F) -> SessionStatus
where
    F: FnMut(&SessionStatus) -> bool,
{
    let mut status = handle.subscribe();
    let matched = tokio::time::timeout(Duration::from_secs(120), status.wait_for(|s| predicate(s)))
        .await
        .expect("timed out waiting for session status")
        .expect("session closed");
    let current = matched.clone();
    current
}
