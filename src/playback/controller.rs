use super::sink::{ActiveAudio, AudioSink};
use crate::synthesis::{AudioPath, SynthesisResult, SynthesizedAudio};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Synthesis/playback status exposed to the presentation layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsStatus {
    #[default]
    Idle,
    /// Playing audio from the remote synthesis service
    Primary,
    /// Local speech engine is speaking
    Fallback,
    Error,
}

pub type PlaybackId = u64;

struct ActivePlayback {
    id: PlaybackId,
    path: AudioPath,
    cancel: oneshot::Sender<()>,
    watcher: JoinHandle<()>,
}

/// Owns the single active playback, whichever path produced it
///
/// Starting playback stops the previous one first. `stop` silences both the
/// player and local speech, so callers never need to know which is running.
pub struct AudioPlaybackController {
    sink: Arc<dyn AudioSink>,
    active: Option<ActivePlayback>,
    status: TtsStatus,
    next_id: PlaybackId,
}

impl AudioPlaybackController {
    pub fn new(sink: Arc<dyn AudioSink>) -> Self {
        Self {
            sink,
            active: None,
            status: TtsStatus::Idle,
            next_id: 0,
        }
    }

    pub fn status(&self) -> TtsStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_path(&self) -> Option<AudioPath> {
        self.active.as_ref().map(|a| a.path)
    }

    /// Start playing a synthesis result
    ///
    /// `on_complete` runs once if playback ends on its own (not when stopped).
    pub async fn play<F>(&mut self, result: SynthesisResult, on_complete: F) -> Result<PlaybackId>
    where
        F: FnOnce(PlaybackId, Result<()>) + Send + 'static,
    {
        self.stop().await;

        let mut audio: Box<dyn ActiveAudio> = match result.audio {
            SynthesizedAudio::Encoded(payload) => match self.sink.play(payload).await {
                Ok(audio) => audio,
                Err(e) => {
                    self.status = TtsStatus::Error;
                    return Err(e);
                }
            },
            SynthesizedAudio::Speaking(audio) => audio,
        };

        self.next_id += 1;
        let id = self.next_id;
        let (cancel, cancelled) = oneshot::channel();

        let watcher = tokio::spawn(async move {
            tokio::select! {
                finished = audio.wait() => on_complete(id, finished),
                _ = cancelled => {
                    if let Err(e) = audio.stop().await {
                        warn!("Failed to stop playback #{}: {:#}", id, e);
                    }
                }
            }
        });

        self.status = match result.path {
            AudioPath::Primary => TtsStatus::Primary,
            AudioPath::Fallback => TtsStatus::Fallback,
        };
        self.active = Some(ActivePlayback {
            id,
            path: result.path,
            cancel,
            watcher,
        });

        info!("Playback #{} started ({:?})", id, result.path);
        Ok(id)
    }

    /// Halt playback immediately. Idempotent. Returns whether anything was
    /// playing.
    pub async fn stop(&mut self) -> bool {
        self.status = TtsStatus::Idle;

        let Some(active) = self.active.take() else {
            return false;
        };

        // Fails only if playback already finished on its own
        let _ = active.cancel.send(());
        if let Err(e) = active.watcher.await {
            warn!("Playback watcher for #{} failed: {}", active.id, e);
        }

        info!("Playback #{} stopped", active.id);
        true
    }

    /// Record natural completion of playback `id`. Returns false when `id` is no
    /// longer the active playback.
    pub fn finish(&mut self, id: PlaybackId, outcome: &Result<()>) -> bool {
        match &self.active {
            Some(active) if active.id == id => {}
            _ => return false,
        }

        self.active = None;
        self.status = match outcome {
            Ok(()) => TtsStatus::Idle,
            Err(e) => {
                warn!("Playback #{} ended with error: {:#}", id, e);
                TtsStatus::Error
            }
        };
        true
    }

    /// Report that no audio could be produced for the current reply
    pub fn mark_error(&mut self) {
        self.status = TtsStatus::Error;
    }
}
