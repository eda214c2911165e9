//! Conversation orchestration
//!
//! Merges the caller-owned conversation history with the assembled context
//! document into one generation request against the language-model
//! collaborator. The collaborator is the only per-turn dependency whose
//! failure aborts the turn.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::{prompt, Error, Result};

/// Fixed reply used when the collaborator returns no usable text; the caller
/// is never left with nothing.
pub const APOLOGY_REPLY: &str =
    "I apologize, but I encountered an error generating a response.";

/// Who produced a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of the running conversation, caller-supplied and round-tripped
/// across requests; the gateway never persists or mutates it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    /// A user turn
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Language-model collaborator interface
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one completion; `Ok(None)` means the call succeeded but produced
    /// no usable text block
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upstream`] on timeout, quota, or a malformed
    /// response.
    async fn complete(&self, system: &str, turns: &[ChatTurn]) -> Result<Option<String>>;
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: &'a [ChatTurn],
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Anthropic Messages API client
pub struct AnthropicChat {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl AnthropicChat {
    /// Create a client from the language-model configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConfigured`] when the API key is absent; the
    /// language model is the one essential collaborator.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(Error::NotConfigured("language model (ANTHROPIC_API_KEY)"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl ChatModel for AnthropicChat {
    async fn complete(&self, system: &str, turns: &[ChatTurn]) -> Result<Option<String>> {
        let request = AnthropicRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system,
            messages: turns,
        };

        // One attempt, no retries: a user is waiting on the reply.
        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("language model request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "language model API error");
            return Err(Error::Upstream(format!(
                "language model returned {status}"
            )));
        }

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("malformed language model response: {e}")))?;

        Ok(parsed
            .content
            .into_iter()
            .find(|block| block.kind == "text" && !block.text.trim().is_empty())
            .map(|block| block.text))
    }
}

/// Runs the generation step of a turn
pub struct Orchestrator {
    model: Arc<dyn ChatModel>,
}

impl Orchestrator {
    /// Create an orchestrator around a language-model collaborator
    #[must_use]
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Produce the assistant reply for one turn
    ///
    /// Sends the full history for multi-turn grounding; an empty history is
    /// seeded with the current user message. A successful call that yields
    /// no text becomes the fixed apology string rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upstream`] if the collaborator call fails, the one
    /// failure that aborts a turn.
    pub async fn respond(
        &self,
        history: &[ChatTurn],
        message: &str,
        context: &str,
    ) -> Result<String> {
        let system = prompt::build_system_prompt(context);

        let seeded;
        let turns: &[ChatTurn] = if history.is_empty() {
            seeded = [ChatTurn::user(message)];
            &seeded
        } else {
            history
        };

        let reply = self.model.complete(&system, turns).await?;
        Ok(reply.unwrap_or_else(|| {
            tracing::warn!("language model returned no usable text block");
            APOLOGY_REPLY.to_string()
        }))
    }
}
