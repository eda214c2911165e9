//! Error types for the quotewire gateway

use thiserror::Error;

/// Result type alias for quotewire operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the quotewire gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid or missing request input, user-correctable
    #[error("validation error: {0}")]
    Validation(String),

    /// Caller session missing or not recognized
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A required collaborator credential or backend is absent
    #[error("not configured: {0}")]
    NotConfigured(&'static str),

    /// A collaborator call failed (language model, storage backend)
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Storage backend fault while listing or reading an artifact
    #[error("storage error: {0}")]
    Storage(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
