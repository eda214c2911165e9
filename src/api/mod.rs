//! HTTP API server for the quotewire gateway

mod artifacts;
mod auth;
mod chat;
mod health;
mod identity;
mod voice;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::catalog::{ArtifactStore, LocalStore};
use crate::config::{Config, IdentityStrategy};
use crate::context::Aggregator;
use crate::identity::{HashResolver, IdentityResolver, MappingResolver};
use crate::orchestrator::{AnthropicChat, Orchestrator};
use crate::voice::{DeepgramStt, ElevenLabsTts, Synthesizer, Transcriber};
use crate::{db, Error, Result};

pub use auth::AccountId;

/// Shared state for API handlers
pub struct ApiState {
    /// Account id -> tenant key resolution strategy
    pub resolver: Arc<dyn IdentityResolver>,
    /// Artifact storage backend; `None` when unconfigured (demo mode)
    pub store: Option<Arc<dyn ArtifactStore>>,
    /// Per-turn context assembly
    pub aggregator: Aggregator,
    /// Generation step of a turn
    pub orchestrator: Orchestrator,
    /// Speech-to-text collaborator, when credentialed
    pub transcriber: Option<Arc<dyn Transcriber>>,
    /// Text-to-speech collaborator, when credentialed
    pub synthesizer: Option<Arc<dyn Synthesizer>>,
    /// Session token -> account id, standing in for the external auth
    /// provider
    pub sessions: HashMap<String, String>,
}

impl ApiState {
    /// Build production collaborators from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the identity database cannot be opened or the
    /// essential language-model credential is absent.
    pub fn from_config(config: &Config) -> Result<Self> {
        let resolver: Arc<dyn IdentityResolver> = match config.identity_strategy {
            IdentityStrategy::Deterministic => Arc::new(HashResolver::new()),
            IdentityStrategy::Persisted => {
                let pool = db::init(config.db_path())?;
                Arc::new(MappingResolver::new(pool))
            }
        };

        let store: Arc<dyn ArtifactStore> = Arc::new(LocalStore::new(config.uploads_dir()));
        let aggregator = Aggregator::new(
            Some(Arc::clone(&store)),
            config.demo_fallback,
            config.aggregation.clone(),
        );

        let orchestrator = Orchestrator::new(Arc::new(AnthropicChat::new(&config.llm)?));

        let voice_timeout = std::time::Duration::from_secs(config.voice.timeout_secs);
        let transcriber: Option<Arc<dyn Transcriber>> = config
            .voice
            .deepgram_api_key
            .clone()
            .map(|key| {
                DeepgramStt::new(key, config.voice.stt_model.clone(), voice_timeout)
                    .map(|stt| Arc::new(stt) as Arc<dyn Transcriber>)
            })
            .transpose()?;
        let synthesizer: Option<Arc<dyn Synthesizer>> = config
            .voice
            .elevenlabs_api_key
            .clone()
            .map(|key| {
                ElevenLabsTts::new(
                    key,
                    config.voice.tts_voice.clone(),
                    config.voice.tts_model.clone(),
                    voice_timeout,
                )
                .map(|tts| Arc::new(tts) as Arc<dyn Synthesizer>)
            })
            .transpose()?;

        if synthesizer.is_none() {
            tracing::info!("no ElevenLabs credential; reply synthesis will be skipped");
        }

        let sessions = config
            .sessions
            .iter()
            .map(|s| (s.token.clone(), s.account_id.clone()))
            .collect();

        Ok(Self {
            resolver,
            store: Some(store),
            aggregator,
            orchestrator,
            transcriber,
            synthesizer,
            sessions,
        })
    }
}

/// Build the full gateway router
pub fn router(state: Arc<ApiState>) -> Router {
    let authenticated = Router::new()
        .route(
            "/artifacts",
            post(artifacts::upload)
                .get(artifacts::list)
                .delete(artifacts::remove),
        )
        .route("/identity", get(identity::identity))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_session,
        ))
        .with_state(Arc::clone(&state));

    Router::new()
        .route("/chat", post(chat::chat))
        .route("/transcribe", post(voice::transcribe))
        .route("/synthesize", post(voice::synthesize))
        .route("/health", get(health::health))
        .with_state(state)
        .merge(authenticated)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Serve the gateway until interrupted
///
/// # Errors
///
/// Returns error if state construction or binding fails.
pub async fn serve(config: Config) -> Result<()> {
    let port = config.port;
    let state = Arc::new(ApiState::from_config(&config)?);
    let app = router(state);

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "quotewire gateway listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Request-level error wrapper mapping the taxonomy to HTTP statuses
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(serde::Serialize)]
        struct ErrorResponse {
            error: String,
        }

        let status = match &self.0 {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
        }

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
