use super::config::SessionConfig;
use super::event::{SessionCommand, SessionEvent};
use super::handle::SessionHandle;
use super::status::{SessionState, SessionStatus};
use crate::capture::{
    CaptureEvent, CaptureHandle, CompletionReason, SilenceEndpointer, SpeechCapture,
    TranscriptAccumulator, Utterance,
};
use crate::chat::{ChatHistoryStore, LanguageModel, ModelRequest};
use crate::error::{ModelQueryError, SynthesisError};
use crate::playback::{AudioPlaybackController, AudioSink, PlaybackId};
use crate::synthesis::{AudioPath, SynthesisFallbackCoordinator, SynthesisResult, SynthesizedAudio};
use crate::timer::ScheduledCallback;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Collaborators injected into the session
#[derive(Clone)]
pub struct SessionServices {
    pub capture: Arc<dyn SpeechCapture>,
    pub model: Arc<dyn LanguageModel>,
    pub synthesis: SynthesisFallbackCoordinator,
    pub sink: Arc<dyn AudioSink>,
}

/// The capture currently running, with its hard-cap timer
struct ActiveRecording {
    handle: Box<dyn CaptureHandle>,
    max_duration: ScheduledCallback,
    started_at: Instant,
}

/// The voice session state machine
///
/// A single task owns all session state and processes one event at a time:
/// user commands, capture events, timer expiries, and completions of the model,
/// synthesis and playback calls it spawned. Starting a recording bumps the
/// generation, which invalidates every completion issued before it.
pub struct SessionController {
    config: SessionConfig,
    capture: Arc<dyn SpeechCapture>,
    model: Arc<dyn LanguageModel>,
    synthesis: Arc<SynthesisFallbackCoordinator>,
    playback: AudioPlaybackController,

    history: ChatHistoryStore,
    transcript: TranscriptAccumulator,
    endpointer: SilenceEndpointer,

    state: SessionState,
    generation: u64,
    recording: Option<ActiveRecording>,
    thinking: bool,
    last_utterance: Option<Utterance>,
    last_error: Option<String>,

    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    status_tx: watch::Sender<SessionStatus>,
}

impl SessionController {
    /// Create a session and the handle that drives it
    pub fn new(config: SessionConfig, services: SessionServices) -> (Self, SessionHandle) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(SessionStatus {
            session_id: config.session_id.clone(),
            ..Default::default()
        });

        let handle = SessionHandle::new(events_tx.clone(), status_rx);

        let controller = Self {
            endpointer: SilenceEndpointer::new(config.silence_timeout),
            config,
            capture: services.capture,
            model: services.model,
            synthesis: Arc::new(services.synthesis),
            playback: AudioPlaybackController::new(services.sink),
            history: ChatHistoryStore::new(),
            transcript: TranscriptAccumulator::new(),
            state: SessionState::Idle,
            generation: 0,
            recording: None,
            thinking: false,
            last_utterance: None,
            last_error: None,
            events_tx,
            events_rx,
            status_tx,
        };

        (controller, handle)
    }

    /// Create a session and run it on its own task
    pub fn spawn(
        config: SessionConfig,
        services: SessionServices,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (controller, handle) = Self::new(config, services);
        (handle, tokio::spawn(controller.run()))
    }

    /// Process events until shutdown
    pub async fn run(mut self) {
        info!("Session {} ready", self.config.session_id);

        while let Some(event) = self.events_rx.recv().await {
            if !self.handle_event(event).await {
                break;
            }
            self.publish();
        }

        self.teardown().await;
        self.publish();
        info!("Session {} stopped", self.config.session_id);
    }

    async fn handle_event(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::Command(SessionCommand::StartRecording) => self.start_recording().await,
            SessionEvent::Command(SessionCommand::StopRecording) => {
                if self.recording.is_some() {
                    self.end_recording(CompletionReason::Manual).await;
                } else {
                    debug!("Stop requested while not recording");
                }
            }
            SessionEvent::Command(SessionCommand::ToggleRecording) => {
                if self.recording.is_some() {
                    self.end_recording(CompletionReason::Manual).await;
                } else {
                    self.start_recording().await;
                }
            }
            SessionEvent::Command(SessionCommand::Shutdown) => return false,

            SessionEvent::Capture { generation, event } => {
                if generation == self.generation {
                    self.on_capture(event).await;
                }
            }
            SessionEvent::SilenceElapsed { generation, arm_id } => {
                if generation == self.generation
                    && self.recording.is_some()
                    && self.endpointer.fire(arm_id)
                {
                    info!("Silence detected, ending utterance");
                    self.end_recording(CompletionReason::Silence).await;
                }
            }
            SessionEvent::MaxDurationElapsed { generation } => {
                if generation == self.generation && self.recording.is_some() {
                    warn!(
                        "Maximum recording duration ({:?}) reached",
                        self.config.max_recording
                    );
                    self.end_recording(CompletionReason::MaxDuration).await;
                }
            }
            SessionEvent::ModelReplied {
                generation,
                message_id,
                result,
            } => self.on_model_reply(generation, message_id, result),
            SessionEvent::Synthesized {
                generation,
                text,
                result,
            } => self.on_synthesized(generation, text, result).await,
            SessionEvent::PlaybackFinished {
                generation,
                playback_id,
                outcome,
            } => self.on_playback_finished(generation, playback_id, outcome),
        }

        true
    }

    async fn start_recording(&mut self) {
        if self.recording.is_some() {
            warn!("Recording already started");
            return;
        }

        self.generation += 1;
        let generation = self.generation;

        // Anything still in flight belongs to the previous turn now
        if let Some(pending) = self.history.pending_id() {
            info!("Abandoning unanswered reply {}", pending);
            self.history.abandon(pending);
        }
        self.thinking = false;
        self.last_error = None;

        if self.playback.stop().await {
            info!("Interrupted playback to start recording");
        }

        self.transcript.reset();
        self.endpointer.disarm();

        let (capture_tx, mut capture_rx) = mpsc::unbounded_channel();
        let handle = match self.capture.start(capture_tx).await {
            Ok(handle) => handle,
            Err(e) => {
                error!("Failed to start capture: {}", e);
                self.last_error = Some(e.to_string());
                self.state = SessionState::Idle;
                return;
            }
        };

        let events = self.events_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = capture_rx.recv().await {
                if events.send(SessionEvent::Capture { generation, event }).is_err() {
                    break;
                }
            }
        });

        let events = self.events_tx.clone();
        let max_duration = ScheduledCallback::schedule(self.config.max_recording, move || {
            let _ = events.send(SessionEvent::MaxDurationElapsed { generation });
        });

        self.recording = Some(ActiveRecording {
            handle,
            max_duration,
            started_at: Instant::now(),
        });
        self.state = SessionState::Recording;

        info!(
            "Recording started (generation {}, language {})",
            generation,
            self.capture.language()
        );
    }

    async fn on_capture(&mut self, event: CaptureEvent) {
        // Events can trail a stop that has already been processed
        if self.recording.is_none() {
            return;
        }

        match event {
            CaptureEvent::Interim(text) => {
                debug!("Interim: {}", text);
                self.transcript.push_interim(&text);

                let events = self.events_tx.clone();
                let generation = self.generation;
                self.endpointer.observe(&text, move |arm_id| {
                    let _ = events.send(SessionEvent::SilenceElapsed { generation, arm_id });
                });
            }
            CaptureEvent::Final(text) => {
                debug!("Final: {}", text);
                self.transcript.push_final(&text);
            }
            CaptureEvent::Error(message) => {
                error!("Capture failed during recording: {}", message);
                self.last_error = Some(message);
                self.abort_recording().await;
            }
        }
    }

    /// Leave `recording` normally. Cancels both timers before anything else so a
    /// recording is only ever stopped once.
    async fn end_recording(&mut self, reason: CompletionReason) {
        let Some(recording) = self.recording.take() else {
            return;
        };

        recording.max_duration.cancel();
        self.endpointer.disarm();
        self.state = SessionState::RecordingEnding;
        self.publish();

        match recording.handle.stop().await {
            Ok(flushed) => {
                for text in flushed {
                    self.transcript.push_final(&text);
                }
            }
            Err(e) => warn!("Capture did not stop cleanly: {}", e),
        }

        info!(
            "Recording ended ({:?}) after {:?}",
            reason,
            recording.started_at.elapsed()
        );

        match self.transcript.finalize(reason) {
            Some(utterance) => self.query_model(utterance),
            None => {
                info!("Nothing was recognized, returning to idle");
                self.state = SessionState::Idle;
            }
        }
    }

    /// Leave `recording` after a capture failure, discarding the transcript
    async fn abort_recording(&mut self) {
        let Some(recording) = self.recording.take() else {
            return;
        };

        recording.max_duration.cancel();
        self.endpointer.disarm();
        self.transcript.reset();

        if let Err(e) = recording.handle.stop().await {
            warn!("Capture did not stop cleanly: {}", e);
        }

        self.state = SessionState::Error;
        self.publish();
        self.state = SessionState::Idle;
    }

    fn query_model(&mut self, utterance: Utterance) {
        info!("User said: {}", utterance.text);

        self.history.append_user(utterance.text.clone());
        let message_id = self.history.append_pending_assistant();
        let request = ModelRequest {
            system_prompt: self.config.system_prompt.clone(),
            messages: self.history.context(),
        };

        self.last_utterance = Some(utterance);
        self.thinking = true;
        self.state = SessionState::ProcessingModel;

        let model = Arc::clone(&self.model);
        let events = self.events_tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let result = model.complete(&request).await;
            let _ = events.send(SessionEvent::ModelReplied {
                generation,
                message_id,
                result,
            });
        });
    }

    fn on_model_reply(
        &mut self,
        generation: u64,
        message_id: Uuid,
        result: Result<String, ModelQueryError>,
    ) {
        if generation != self.generation {
            info!("Discarding model reply from interrupted turn {}", generation);
            return;
        }

        self.thinking = false;

        match result {
            Ok(reply) => {
                if !self.history.resolve_assistant(message_id, reply.clone()) {
                    warn!("Reply {} no longer has a placeholder", message_id);
                    self.state = SessionState::Idle;
                    return;
                }
                info!("Assistant replied ({} chars)", reply.chars().count());
                self.synthesize(reply);
            }
            Err(e) => {
                error!("Model query failed: {}", e);
                self.history
                    .resolve_assistant(message_id, self.config.failure_reply.clone());
                self.state = SessionState::Idle;
            }
        }
    }

    fn synthesize(&mut self, text: String) {
        self.state = SessionState::ProcessingSynthesis;

        let synthesis = Arc::clone(&self.synthesis);
        let events = self.events_tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let result = synthesis.synthesize(&text).await;
            let _ = events.send(SessionEvent::Synthesized {
                generation,
                text,
                result,
            });
        });
    }

    /// Retry an unplayable primary payload through the local engine, once
    fn fall_back(&mut self, text: String, primary_failure: String) {
        let synthesis = Arc::clone(&self.synthesis);
        let events = self.events_tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let result = synthesis.fallback(&text, primary_failure).await;
            let _ = events.send(SessionEvent::Synthesized {
                generation,
                text,
                result,
            });
        });
    }

    async fn on_synthesized(
        &mut self,
        generation: u64,
        text: String,
        result: Result<SynthesisResult, SynthesisError>,
    ) {
        if generation != self.generation {
            info!("Discarding synthesis from interrupted turn {}", generation);
            // Local speech starts on its own; silence it
            if let Ok(SynthesisResult {
                audio: SynthesizedAudio::Speaking(mut audio),
                ..
            }) = result
            {
                if let Err(e) = audio.stop().await {
                    warn!("Failed to stop stale local speech: {:#}", e);
                }
            }
            return;
        }

        let result = match result {
            Ok(result) => result,
            Err(e) => {
                error!("No audio for this reply: {}", e);
                self.playback.mark_error();
                self.state = SessionState::Idle;
                return;
            }
        };

        let path = result.path;
        let events = self.events_tx.clone();
        let started = self
            .playback
            .play(result, move |playback_id, outcome| {
                let _ = events.send(SessionEvent::PlaybackFinished {
                    generation,
                    playback_id,
                    outcome,
                });
            })
            .await;

        match started {
            Ok(_) => self.state = SessionState::Speaking,
            Err(e) if path == AudioPath::Primary && self.synthesis.has_fallback() => {
                warn!("Failed to play synthesized audio, falling back: {:#}", e);
                self.fall_back(text, format!("{:#}", e));
            }
            Err(e) => {
                error!("Failed to start playback: {:#}", e);
                self.state = SessionState::Idle;
            }
        }
    }

    fn on_playback_finished(
        &mut self,
        generation: u64,
        playback_id: PlaybackId,
        outcome: anyhow::Result<()>,
    ) {
        if generation != self.generation {
            return;
        }

        if self.playback.finish(playback_id, &outcome) && self.state == SessionState::Speaking {
            info!("Playback finished");
            self.state = SessionState::Idle;
        }
    }

    async fn teardown(&mut self) {
        if let Some(recording) = self.recording.take() {
            recording.max_duration.cancel();
            if let Err(e) = recording.handle.stop().await {
                warn!("Capture did not stop cleanly: {}", e);
            }
        }
        self.endpointer.disarm();
        self.playback.stop().await;
        self.thinking = false;
        self.state = SessionState::Idle;
    }

    fn publish(&self) {
        self.status_tx.send_replace(SessionStatus {
            session_id: self.config.session_id.clone(),
            state: self.state,
            recording: self.recording.is_some(),
            thinking: self.thinking,
            tts_status: self.playback.status(),
            messages: self.history.messages().to_vec(),
            last_utterance: self.last_utterance.clone(),
            last_error: self.last_error.clone(),
            generation: self.generation,
        });
    }
}
