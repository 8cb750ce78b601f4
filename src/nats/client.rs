use super::messages::{CaptureAction, CaptureControlMessage};
use anyhow::{Context, Result};
use async_nats::Client;
use tracing::info;

/// Subject prefix for capture control messages (`stt.control.start`, `stt.control.stop`)
pub const CONTROL_SUBJECT_PREFIX: &str = "stt.control";

/// Subject pattern for transcripts (`stt.text.partial`, `stt.text.final`)
pub const TRANSCRIPT_SUBJECT: &str = "stt.text.>";

pub struct NatsClient {
    client: Client,
    session_id: String,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str, session_id: String) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client, session_id })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Ask the speech service to start or stop recognition for this session
    pub async fn publish_control(&self, action: CaptureAction, language: &str) -> Result<()> {
        let subject = format!("{}.{}", CONTROL_SUBJECT_PREFIX, action.as_str());

        let message = CaptureControlMessage {
            session_id: self.session_id.clone(),
            action,
            language: language.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish capture control")?;

        self.client
            .flush()
            .await
            .context("Failed to flush capture control")?;

        info!("Published {} to {}", action.as_str(), subject);

        Ok(())
    }

    /// Subscribe to transcript messages
    pub async fn subscribe_transcripts(&self) -> Result<async_nats::Subscriber> {
        // Partial and final transcripts share one subscription; the payload
        // carries the session id
        info!("Subscribing to transcripts on {}", TRANSCRIPT_SUBJECT);

        let subscriber = self
            .client
            .subscribe(TRANSCRIPT_SUBJECT)
            .await
            .context("Failed to subscribe to transcripts")?;

        Ok(subscriber)
    }
}
