use super::client::NatsClient;
use super::messages::{CaptureAction, TranscriptMessage};
use crate::capture::{CaptureEvent, CaptureHandle, SpeechCapture};
use crate::config::CaptureConfig;
use crate::error::CaptureError;
use anyhow::Result;
use futures::stream::{Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Speech capture backed by a NATS speech service
///
/// The service is told to start and stop through control messages and
/// streams partial and final transcripts back.
pub struct NatsSpeechCapture {
    client: Arc<NatsClient>,
    language: String,
    flush_timeout: Duration,
}

impl NatsSpeechCapture {
    pub async fn connect(config: &CaptureConfig, session_id: String) -> Result<Self> {
        let client = NatsClient::connect(&config.nats_url, session_id).await?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn new(client: Arc<NatsClient>, config: &CaptureConfig) -> Self {
        Self {
            client,
            language: config.language.clone(),
            flush_timeout: Duration::from_millis(config.flush_timeout_ms),
        }
    }
}

#[async_trait::async_trait]
impl SpeechCapture for NatsSpeechCapture {
    async fn start(
        &self,
        events: mpsc::UnboundedSender<CaptureEvent>,
    ) -> Result<Box<dyn CaptureHandle>, CaptureError> {
        let subscriber = self
            .client
            .subscribe_transcripts()
            .await
            .map_err(|e| CaptureError::Subscribe(format!("{:#}", e)))?;

        self.client
            .publish_control(CaptureAction::Start, &self.language)
            .await
            .map_err(|e| CaptureError::Unavailable(format!("{:#}", e)))?;

        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(receive_transcripts(
            subscriber.map(|msg| msg.payload),
            self.client.session_id().to_string(),
            events,
            stop_rx,
            self.flush_timeout,
        ));

        info!("Capture started for {}", self.client.session_id());

        Ok(Box::new(NatsCaptureHandle {
            client: Arc::clone(&self.client),
            language: self.language.clone(),
            stop_tx,
            task,
        }))
    }

    fn language(&self) -> &str {
        &self.language
    }
}

struct NatsCaptureHandle {
    client: Arc<NatsClient>,
    language: String,
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<Vec<String>>,
}

#[async_trait::async_trait]
impl CaptureHandle for NatsCaptureHandle {
    async fn stop(self: Box<Self>) -> Result<Vec<String>, CaptureError> {
        let this = *self;

        // Switch the receiver to flushing before the service is told to stop,
        // so finals sent in reply are collected rather than forwarded.
        // Receiver already gone means the stream ended on its own.
        let _ = this.stop_tx.send(());

        if let Err(e) = this
            .client
            .publish_control(CaptureAction::Stop, &this.language)
            .await
        {
            warn!("Failed to publish capture stop: {:#}", e);
        }

        let flushed = this
            .task
            .await
            .map_err(|e| CaptureError::Stream(e.to_string()))?;

        info!("Capture stopped ({} flushed fragments)", flushed.len());
        Ok(flushed)
    }
}

fn decode(payload: &[u8], session_id: &str) -> Option<TranscriptMessage> {
    match serde_json::from_slice::<TranscriptMessage>(payload) {
        Ok(transcript) if transcript.session_id == session_id => Some(transcript),
        Ok(_) => None,
        Err(e) => {
            warn!("Failed to parse transcript message: {}", e);
            None
        }
    }
}

/// Forward transcripts until stopped, then collect trailing finals until the
/// service signals end of stream or the flush window closes
///
/// Dropping `transcripts` on return releases the subscription.
async fn receive_transcripts<S, P>(
    mut transcripts: S,
    session_id: String,
    events: mpsc::UnboundedSender<CaptureEvent>,
    mut stop: oneshot::Receiver<()>,
    flush_timeout: Duration,
) -> Vec<String>
where
    S: Stream<Item = P> + Unpin,
    P: AsRef<[u8]>,
{
    debug!("Transcript receiving task started");

    loop {
        tokio::select! {
            biased;

            _ = &mut stop => break,
            payload = transcripts.next() => {
                let Some(payload) = payload else {
                    let _ = events.send(CaptureEvent::Error(
                        "transcript stream closed".to_string(),
                    ));
                    return Vec::new();
                };
                let Some(transcript) = decode(payload.as_ref(), &session_id) else {
                    continue;
                };
                let event = if transcript.partial {
                    CaptureEvent::Interim(transcript.text)
                } else {
                    CaptureEvent::Final(transcript.text)
                };
                if events.send(event).is_err() {
                    break;
                }
            }
        }
    }

    let mut flushed = Vec::new();
    let deadline = tokio::time::sleep(flush_timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => {
                debug!("Flush window closed");
                break;
            }
            payload = transcripts.next() => {
                let Some(payload) = payload else { break };
                let Some(transcript) = decode(payload.as_ref(), &session_id) else {
                    continue;
                };
                if !transcript.partial && !transcript.text.trim().is_empty() {
                    flushed.push(transcript.text);
                }
                if transcript.end_of_stream {
                    break;
                }
            }
        }
    }

    debug!("Transcript receiving task stopped");
    flushed
}
