//! Shared test utilities

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use tempfile::TempDir;

use quotewire::api::ApiState;
use quotewire::catalog::{ArtifactStore, LocalStore};
use quotewire::config::AggregationConfig;
use quotewire::orchestrator::{ChatModel, ChatTurn, Orchestrator};
use quotewire::voice::{Synthesizer, Transcriber};
use quotewire::{Aggregator, Error, HashResolver, Result};

/// Canned language model used instead of the Anthropic collaborator
pub struct CannedModel {
    pub reply: &'static str,
}

#[async_trait]
impl ChatModel for CannedModel {
    async fn complete(&self, _system: &str, _turns: &[ChatTurn]) -> Result<Option<String>> {
        Ok(Some(self.reply.to_string()))
    }
}

/// Language model whose upstream call always fails
pub struct FailingModel;

#[async_trait]
impl ChatModel for FailingModel {
    async fn complete(&self, _system: &str, _turns: &[ChatTurn]) -> Result<Option<String>> {
        Err(Error::Upstream("Anthropic API error 529".to_string()))
    }
}

/// Synthesizer that always produces the same three bytes
pub struct WorkingTts;

#[async_trait]
impl Synthesizer for WorkingTts {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
        Ok(vec![0x49, 0x44, 0x33])
    }
}

/// Synthesizer that always fails
pub struct BrokenTts;

#[async_trait]
impl Synthesizer for BrokenTts {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
        Err(Error::Tts("ElevenLabs TTS error 500".to_string()))
    }
}

/// Transcriber with a fixed transcript (empty string to simulate silence)
pub struct CannedStt {
    pub transcript: &'static str,
}

#[async_trait]
impl Transcriber for CannedStt {
    async fn transcribe(&self, _audio: &[u8], _mime: &str) -> Result<String> {
        Ok(self.transcript.to_string())
    }
}

/// Everything a test needs to drive the gateway router
pub struct TestHarness {
    /// Keeps the uploads directory alive for the test's duration
    pub _dir: TempDir,
    pub store: Arc<dyn ArtifactStore>,
    pub state: Arc<ApiState>,
}

/// Session token the harness registers for `acct_test`
pub const TEST_TOKEN: &str = "sess-valid-token";

/// Account id behind [`TEST_TOKEN`]
pub const TEST_ACCOUNT: &str = "acct_test";

/// Build a harness with a real filesystem store and canned collaborators
#[must_use]
pub fn harness(
    synthesizer: Option<Arc<dyn Synthesizer>>,
    transcriber: Option<Arc<dyn Transcriber>>,
) -> TestHarness {
    harness_with_model(
        Arc::new(CannedModel {
            reply: "Happy to help with a quote.",
        }),
        synthesizer,
        transcriber,
    )
}

/// Build a harness around an arbitrary language-model collaborator
#[must_use]
pub fn harness_with_model(
    model: Arc<dyn ChatModel>,
    synthesizer: Option<Arc<dyn Synthesizer>>,
    transcriber: Option<Arc<dyn Transcriber>>,
) -> TestHarness {
    let dir = tempfile::tempdir().expect("tempdir");
    let store: Arc<dyn ArtifactStore> = Arc::new(LocalStore::new(dir.path().to_path_buf()));

    let state = Arc::new(ApiState {
        resolver: Arc::new(HashResolver::new()),
        store: Some(Arc::clone(&store)),
        aggregator: Aggregator::new(
            Some(Arc::clone(&store)),
            true,
            AggregationConfig::default(),
        ),
        orchestrator: Orchestrator::new(model),
        transcriber,
        synthesizer,
        sessions: HashMap::from([(TEST_TOKEN.to_string(), TEST_ACCOUNT.to_string())]),
    });

    TestHarness {
        _dir: dir,
        store,
        state,
    }
}

/// Multipart boundary used by [`multipart_request`]
const BOUNDARY: &str = "quotewire-test-boundary";

/// Build a single-file multipart request body
#[must_use]
pub fn multipart_request(
    uri: &str,
    token: Option<&str>,
    part_name: &str,
    filename: &str,
    content: &[u8],
) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{part_name}\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body)).expect("request")
}

/// Build a JSON request
#[must_use]
pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

/// Read a response body as JSON
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}
