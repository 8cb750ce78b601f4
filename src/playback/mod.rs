//! Audio output: the sink abstraction and the controller that owns the single
//! active playback.

mod controller;
mod sink;

pub use controller::{AudioPlaybackController, PlaybackId, TtsStatus};
pub use sink::{ActiveAudio, AudioSink, CommandSink, ProcessAudio};
