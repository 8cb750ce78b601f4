//! Speech synthesis: remote primary path, local fallback, and the coordinator
//! that chooses between them.

mod coordinator;
mod local;
mod primary;

pub use coordinator::{AudioPath, SynthesisFallbackCoordinator, SynthesisResult, SynthesizedAudio};
pub use local::{CommandSpeech, LocalSpeech};
pub use primary::{probe_audio, AudioInfo, HttpSynthesizer, SpeechSynthesizer};
