use super::history::ContextMessage;
use crate::config::ModelConfig;
use crate::error::ModelQueryError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// One model query: fixed system prompt plus the settled conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub system_prompt: String,
    pub messages: Vec<ContextMessage>,
}

/// Language model collaborator. At most one attempt per user turn.
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, request: &ModelRequest) -> Result<String, ModelQueryError>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completions client (OpenRouter by default)
#[derive(Debug, Clone)]
pub struct OpenRouterModel {
    base_url: String,
    model: String,
    api_key: Option<String>,
    empty_reply_text: String,
    client: reqwest::Client,
}

impl OpenRouterModel {
    /// Build from configuration, reading the key from `api_key_env`
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none() {
            warn!(
                "{} is not set; model requests will be sent without credentials",
                config.api_key_env
            );
        }
        Self::new(config, api_key)
    }

    pub fn new(config: &ModelConfig, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build model HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            empty_reply_text: config.empty_reply_text.clone(),
            client,
        })
    }
}

#[async_trait::async_trait]
impl LanguageModel for OpenRouterModel {
    async fn complete(&self, request: &ModelRequest) -> Result<String, ModelQueryError> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(WireMessage {
            role: "system",
            content: &request.system_prompt,
        });
        messages.extend(request.messages.iter().map(|m| WireMessage {
            role: m.role.as_str(),
            content: &m.content,
        }));

        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let started = Instant::now();

        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ModelQueryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelQueryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ModelQueryError::Parse(e.to_string()))?;

        let reply = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        info!(
            "Model replied in {}ms ({} context messages)",
            started.elapsed().as_millis(),
            request.messages.len()
        );

        Ok(reply.unwrap_or_else(|| {
            warn!("Model response had no content, using substitute reply");
            self.empty_reply_text.clone()
        }))
    }
}
