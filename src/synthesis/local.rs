use crate::config::FallbackConfig;
use crate::playback::{ActiveAudio, ProcessAudio};
use anyhow::{Context, Result};
use std::process::Stdio;
use tokio::process::Command;
use tracing::info;

/// Host speech capability that speaks text directly through the audio device
#[async_trait::async_trait]
pub trait LocalSpeech: Send + Sync {
    /// Start speaking. The returned handle completes when speech ends.
    async fn speak(&self, text: &str) -> Result<Box<dyn ActiveAudio>>;

    fn name(&self) -> &str;
}

/// Command-line speech engine (espeak-ng by default)
#[derive(Debug, Clone)]
pub struct CommandSpeech {
    program: String,
    voice: String,
    args: Vec<String>,
}

impl CommandSpeech {
    pub fn new(config: &FallbackConfig) -> Self {
        Self {
            program: config.program.clone(),
            voice: config.voice.clone(),
            args: config.args.clone(),
        }
    }
}

#[async_trait::async_trait]
impl LocalSpeech for CommandSpeech {
    async fn speak(&self, text: &str) -> Result<Box<dyn ActiveAudio>> {
        let mut command = Command::new(&self.program);
        if !self.voice.is_empty() {
            command.arg("-v").arg(&self.voice);
        }

        let child = command
            .args(&self.args)
            .arg("--")
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start local speech engine {}", self.program))?;

        info!("Local speech started ({} chars)", text.chars().count());

        Ok(Box::new(ProcessAudio::new(self.program.clone(), child)))
    }

    fn name(&self) -> &str {
        &self.program
    }
}
