//! Optional voice side channels
//!
//! Speech-to-text runs before a turn, text-to-speech after it. Each stage
//! reports a [`StageOutcome`] so callers (and tests) can tell a skipped
//! stage from a failed one, and neither stage can disturb the primary text
//! reply: synthesis failures are absorbed, and transcription failures stop
//! the turn before orchestration because there is no text to forward.

mod stt;
mod tts;

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;

pub use stt::DeepgramStt;
pub use tts::ElevenLabsTts;

/// Speech-to-text collaborator interface
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe audio bytes to text
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Stt`] if transcription fails.
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String>;
}

/// Text-to-speech collaborator interface
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize text to MP3 audio bytes
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Tts`] if synthesis fails.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// Result of one optional pipeline stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome<T> {
    /// The stage ran and produced its output
    Completed(T),
    /// The stage was not attempted (not a voice turn, or no credential)
    Skipped(&'static str),
    /// The stage ran and failed; callers treat this like a skip
    Failed(String),
}

impl<T> StageOutcome<T> {
    /// The completed value, if any
    #[must_use]
    pub fn into_completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Skipped(_) | Self::Failed(_) => None,
        }
    }
}

/// Post-stage of a turn: synthesize the reply for voice-originated turns
///
/// Attempted only when the turn began as audio and a synthesizer is
/// configured; a missing credential and a synthesis failure both leave the
/// reply audio-less without surfacing an error.
pub async fn synthesize_reply(
    synthesizer: Option<&Arc<dyn Synthesizer>>,
    voice_originated: bool,
    reply: &str,
) -> StageOutcome<Vec<u8>> {
    if !voice_originated {
        return StageOutcome::Skipped("turn did not originate as audio");
    }
    let Some(synthesizer) = synthesizer else {
        return StageOutcome::Skipped("no synthesis credential configured");
    };

    match synthesizer.synthesize(reply).await {
        Ok(audio) => {
            tracing::debug!(bytes = audio.len(), "reply synthesized");
            StageOutcome::Completed(audio)
        }
        Err(e) => {
            tracing::warn!(error = %e, "reply synthesis failed; returning text only");
            StageOutcome::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    struct FixedTts(Vec<u8>);

    #[async_trait]
    impl Synthesizer for FixedTts {
        async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenTts;

    #[async_trait]
    impl Synthesizer for BrokenTts {
        async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
            Err(Error::Tts("ElevenLabs TTS error 500".to_string()))
        }
    }

    #[tokio::test]
    async fn text_turns_skip_synthesis() {
        let tts: Arc<dyn Synthesizer> = Arc::new(FixedTts(vec![1, 2, 3]));
        let outcome = synthesize_reply(Some(&tts), false, "hello").await;
        assert!(matches!(outcome, StageOutcome::Skipped(_)));
    }

    #[tokio::test]
    async fn missing_credential_is_a_skip_not_an_error() {
        let outcome = synthesize_reply(None, true, "hello").await;
        assert!(matches!(outcome, StageOutcome::Skipped(_)));
    }

    #[tokio::test]
    async fn voice_turns_get_audio() {
        let tts: Arc<dyn Synthesizer> = Arc::new(FixedTts(vec![1, 2, 3]));
        let outcome = synthesize_reply(Some(&tts), true, "hello").await;
        assert_eq!(outcome.into_completed(), Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn synthesis_failure_is_absorbed() {
        let tts: Arc<dyn Synthesizer> = Arc::new(BrokenTts);
        let outcome = synthesize_reply(Some(&tts), true, "hello").await;
        assert!(matches!(outcome, StageOutcome::Failed(_)));
        assert!(outcome.into_completed().is_none());
    }
}
