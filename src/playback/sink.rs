use crate::config::PlaybackConfig;
use anyhow::{Context, Result};
use std::process::{ExitStatus, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// Audio that is currently audible
///
/// `wait` resolves when playback ends on its own; `stop` silences it
/// immediately. Callers never hold both futures at once.
#[async_trait::async_trait]
pub trait ActiveAudio: Send {
    async fn wait(&mut self) -> Result<()>;

    async fn stop(&mut self) -> Result<()>;
}

/// Output device for encoded audio (MP3, WAV, OGG)
#[async_trait::async_trait]
pub trait AudioSink: Send + Sync {
    /// Start playing `audio` and return once it is audible
    async fn play(&self, audio: Vec<u8>) -> Result<Box<dyn ActiveAudio>>;
}

/// An external process producing sound (player or speech engine)
#[derive(Debug)]
pub struct ProcessAudio {
    label: String,
    child: Child,
}

impl ProcessAudio {
    pub fn new(label: impl Into<String>, child: Child) -> Self {
        Self {
            label: label.into(),
            child,
        }
    }

    fn check(&self, status: ExitStatus) -> Result<()> {
        if status.success() {
            Ok(())
        } else {
            anyhow::bail!("{} exited with {}", self.label, status)
        }
    }
}

#[async_trait::async_trait]
impl ActiveAudio for ProcessAudio {
    async fn wait(&mut self) -> Result<()> {
        let status = self
            .child
            .wait()
            .await
            .with_context(|| format!("Failed to wait for {}", self.label))?;
        self.check(status)
    }

    async fn stop(&mut self) -> Result<()> {
        // The process may already have exited; that is not an error
        if let Err(e) = self.child.kill().await {
            debug!("{} was not running when stopped: {}", self.label, e);
        }
        Ok(())
    }
}

/// Plays encoded audio by piping it into a command-line player
#[derive(Debug, Clone)]
pub struct CommandSink {
    program: String,
    args: Vec<String>,
}

impl CommandSink {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }
}

#[async_trait::async_trait]
impl AudioSink for CommandSink {
    async fn play(&self, audio: Vec<u8>) -> Result<Box<dyn ActiveAudio>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start audio player {}", self.program))?;

        let mut stdin = child
            .stdin
            .take()
            .context("Audio player has no stdin")?;

        let bytes = audio.len();
        tokio::spawn(async move {
            // The player may be killed before it has read everything
            if let Err(e) = stdin.write_all(&audio).await {
                debug!("Audio player stdin closed early: {}", e);
            }
        });

        info!("Playing {} bytes through {}", bytes, self.program);

        Ok(Box::new(ProcessAudio::new(self.program.clone(), child)))
    }
}
