//! Voice API endpoints for speech-to-text and text-to-speech

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiState};
use crate::Error;

/// Transcription response
#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub transcript: String,
}

/// Transcribe an uploaded audio file
///
/// Expects a multipart part named `audio`. An empty transcript is surfaced
/// as a failure: there is no text to forward into a turn.
pub async fn transcribe(
    State(state): State<Arc<ApiState>>,
    mut multipart: Multipart,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let transcriber = state
        .transcriber
        .as_ref()
        .ok_or(Error::NotConfigured("transcription (DEEPGRAM_API_KEY)"))?;

    let mut audio: Option<(Vec<u8>, String)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("malformed multipart body: {e}")))?
    {
        if field.name() == Some("audio") {
            let mime = field
                .content_type()
                .unwrap_or("audio/wav")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| Error::Validation(format!("could not read audio part: {e}")))?;
            audio = Some((bytes.to_vec(), mime));
            break;
        }
    }

    let (bytes, mime) =
        audio.ok_or_else(|| Error::Validation("no audio file provided".to_string()))?;
    if bytes.is_empty() {
        return Err(Error::Validation("empty audio data".to_string()).into());
    }

    let transcript = transcriber.transcribe(&bytes, &mime).await?;
    if transcript.trim().is_empty() {
        return Err(Error::Stt("could not understand audio".to_string()).into());
    }

    Ok(Json(TranscribeResponse { transcript }))
}

/// Synthesis request
#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    #[serde(default)]
    pub text: String,
}

/// Synthesis response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeResponse {
    /// Base64 MP3 audio
    pub audio: String,
    pub content_type: &'static str,
}

/// Synthesize text to speech
pub async fn synthesize(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SynthesizeRequest>,
) -> Result<Json<SynthesizeResponse>, ApiError> {
    if request.text.trim().is_empty() {
        return Err(Error::Validation("no text provided".to_string()).into());
    }

    let synthesizer = state
        .synthesizer
        .as_ref()
        .ok_or(Error::NotConfigured("synthesis (ELEVENLABS_API_KEY)"))?;

    let audio = synthesizer.synthesize(&request.text).await?;

    Ok(Json(SynthesizeResponse {
        audio: BASE64.encode(audio),
        content_type: "audio/mpeg",
    }))
}
