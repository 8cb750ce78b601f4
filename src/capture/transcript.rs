use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a recording ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionReason {
    /// Quiet period elapsed after the last speech
    Silence,
    /// Hard recording cap reached
    MaxDuration,
    /// User pressed stop
    Manual,
}

/// A finalized block of recognized speech
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    pub reason: CompletionReason,
    pub completed_at: DateTime<Utc>,
}

/// Collects recognized fragments for one recording
///
/// Final fragments are kept in arrival order. The latest interim hypothesis is
/// held separately and replaced on every interim event; a final fragment
/// supersedes it.
#[derive(Debug, Default)]
pub struct TranscriptAccumulator {
    finals: Vec<String>,
    interim: Option<String>,
}

impl TranscriptAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.finals.clear();
        self.interim = None;
    }

    pub fn push_interim(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        self.interim = Some(text.to_string());
    }

    pub fn push_final(&mut self, text: &str) {
        self.interim = None;
        let text = text.trim();
        if !text.is_empty() {
            self.finals.push(text.to_string());
        }
    }

    /// Text recognized so far, including the pending hypothesis
    pub fn current_text(&self) -> String {
        self.finals
            .iter()
            .map(String::as_str)
            .chain(self.interim.as_deref())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Produce the utterance and clear the buffer. Returns `None` when nothing
    /// was recognized.
    pub fn finalize(&mut self, reason: CompletionReason) -> Option<Utterance> {
        let text = self.current_text();
        self.reset();

        if text.is_empty() {
            return None;
        }

        Some(Utterance {
            text,
            reason,
            completed_at: Utc::now(),
        })
    }
}
