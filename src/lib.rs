pub mod capture;
pub mod chat;
pub mod config;
pub mod error;
pub mod http;
pub mod nats;
pub mod playback;
pub mod session;
pub mod synthesis;
pub mod timer;

pub use capture::{
    CaptureEvent, CaptureHandle, CompletionReason, SilenceEndpointer, SpeechCapture,
    TranscriptAccumulator, Utterance,
};
pub use chat::{ChatHistoryStore, ChatMessage, LanguageModel, ModelRequest, OpenRouterModel, Role};
pub use config::Config;
pub use error::{
    CaptureError, ModelQueryError, SessionClosed, SynthesisError, SynthesisPrimaryError,
};
pub use http::{create_router, AppState, ServiceInfo};
pub use nats::{CaptureControlMessage, NatsClient, NatsSpeechCapture, TranscriptMessage};
pub use playback::{ActiveAudio, AudioPlaybackController, AudioSink, CommandSink, TtsStatus};
pub use session::{
    SessionConfig, SessionController, SessionHandle, SessionServices, SessionState, SessionStatus,
};
pub use synthesis::{
    AudioPath, CommandSpeech, HttpSynthesizer, LocalSpeech, SpeechSynthesizer,
    SynthesisFallbackCoordinator, SynthesisResult, SynthesizedAudio,
};
