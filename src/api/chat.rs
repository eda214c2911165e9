//! Conversational endpoint

use std::sync::Arc;

use axum::{extract::State, Json};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiState};
use crate::identity::TenantKey;
use crate::orchestrator::ChatTurn;
use crate::voice::synthesize_reply;
use crate::Error;

/// One turn request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    /// Caller-owned running history; round-tripped across turns
    #[serde(default)]
    pub conversation_history: Vec<ChatTurn>,
    /// Public tenant handle; absent for anonymous demo turns
    pub tenant_ref: Option<String>,
    /// Whether this turn began as audio (enables reply synthesis)
    #[serde(default)]
    pub voice_originated: bool,
}

/// One turn response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub reply: String,
    /// Base64 MP3, present only for voice-originated turns whose synthesis
    /// succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    /// Diagnostic count of files represented in the context
    pub files_loaded: usize,
}

/// Run one conversation turn
pub async fn chat(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.message.trim().is_empty() {
        return Err(Error::Validation("no message provided".to_string()).into());
    }

    let tenant = request
        .tenant_ref
        .as_deref()
        .map(TenantKey::parse)
        .transpose()?;

    let document = state.aggregator.aggregate(tenant.as_ref()).await;
    let context = document.render();

    let reply = state
        .orchestrator
        .respond(&request.conversation_history, &request.message, &context)
        .await?;

    // Side channel: failure or a missing credential leaves audio absent
    // without touching the text reply.
    let audio = synthesize_reply(
        state.synthesizer.as_ref(),
        request.voice_originated,
        &reply,
    )
    .await
    .into_completed()
    .map(|bytes| BASE64.encode(bytes));

    Ok(Json(ChatResponse {
        reply,
        audio,
        files_loaded: document.file_count(),
    }))
}
