//! Configuration management for the quotewire gateway
//!
//! Configuration is layered: built-in defaults, then an optional TOML file
//! (`$QUOTEWIRE_CONFIG` or `<data_dir>/quotewire.toml`), then environment
//! variables. Collaborator credentials only ever come from the environment.

use std::path::PathBuf;

use serde::Deserialize;

use crate::{Error, Result};

/// Identity resolution strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentityStrategy {
    /// Pure-function hash derivation, no storage required
    #[default]
    Deterministic,
    /// Random allocation recorded in the identity mapping table
    Persisted,
}

impl IdentityStrategy {
    fn parse(s: &str) -> Result<Self> {
        match s {
            "deterministic" | "hash" => Ok(Self::Deterministic),
            "persisted" | "mapping" => Ok(Self::Persisted),
            other => Err(Error::Config(format!(
                "unknown identity strategy: {other} (expected \"deterministic\" or \"persisted\")"
            ))),
        }
    }
}

/// Language-model collaborator configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Anthropic API key (`ANTHROPIC_API_KEY`); required to serve chat
    pub api_key: Option<String>,

    /// Model identifier for chat completions
    pub model: String,

    /// Max tokens per completion
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Request timeout in seconds (no retries)
    pub timeout_secs: u64,
}

/// Voice side-channel configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Deepgram API key (`DEEPGRAM_API_KEY`); absence disables /transcribe
    pub deepgram_api_key: Option<String>,

    /// ElevenLabs API key (`ELEVENLABS_API_KEY`); absence silently skips
    /// reply synthesis
    pub elevenlabs_api_key: Option<String>,

    /// Deepgram model identifier
    pub stt_model: String,

    /// ElevenLabs voice identifier
    pub tts_voice: String,

    /// ElevenLabs model identifier
    pub tts_model: String,

    /// Request timeout in seconds for both side channels
    pub timeout_secs: u64,
}

/// Context aggregation limits
#[derive(Debug, Clone)]
pub struct AggregationConfig {
    /// Max per-artifact fetches in flight at once
    pub max_fetch_concurrency: usize,

    /// Max bytes inlined per artifact before truncation
    pub max_file_bytes: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_fetch_concurrency: 4,
            max_file_bytes: 256 * 1024,
        }
    }
}

/// A caller session token mapped to its external account identifier
///
/// Stands in for the external auth provider: tokens are issued out of band
/// and configured via `QUOTEWIRE_SESSION_TOKENS` as `token=account,...`.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionToken {
    pub token: String,
    pub account_id: String,
}

/// Quotewire gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Data directory (identity database, uploaded artifacts)
    pub data_dir: PathBuf,

    /// Port to listen on
    pub port: u16,

    /// Identity resolution strategy
    pub identity_strategy: IdentityStrategy,

    /// Substitute the bundled sample dataset when no artifact storage is
    /// configured or reachable
    pub demo_fallback: bool,

    /// Language-model collaborator
    pub llm: LlmConfig,

    /// Voice side channels
    pub voice: VoiceConfig,

    /// Context aggregation limits
    pub aggregation: AggregationConfig,

    /// Configured caller sessions
    pub sessions: Vec<SessionToken>,
}

/// Optional TOML overlay (`quotewire.toml`)
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    data_dir: Option<PathBuf>,
    port: Option<u16>,
    identity_strategy: Option<String>,
    demo_fallback: Option<bool>,
    llm_model: Option<String>,
    llm_max_tokens: Option<u32>,
    llm_temperature: Option<f32>,
    llm_timeout_secs: Option<u64>,
    stt_model: Option<String>,
    tts_voice: Option<String>,
    tts_model: Option<String>,
    voice_timeout_secs: Option<u64>,
    max_fetch_concurrency: Option<usize>,
    max_file_bytes: Option<usize>,
    #[serde(default)]
    sessions: Vec<SessionToken>,
}

impl FileConfig {
    fn load(explicit: Option<&PathBuf>, data_dir: &std::path::Path) -> Result<Self> {
        let path = match explicit {
            Some(p) => p.clone(),
            None => data_dir.join("quotewire.toml"),
        };
        if !path.exists() {
            if explicit.is_some() {
                return Err(Error::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)?;
        let parsed = toml::from_str(&raw)?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(parsed)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Parse `token=account,token=account` session pairs
fn parse_sessions(raw: &str) -> Result<Vec<SessionToken>> {
    raw.split(',')
        .filter(|pair| !pair.trim().is_empty())
        .map(|pair| {
            let (token, account_id) = pair.trim().split_once('=').ok_or_else(|| {
                Error::Config(format!("malformed session pair (want token=account): {pair}"))
            })?;
            if token.is_empty() || account_id.is_empty() {
                return Err(Error::Config(format!("empty session token or account: {pair}")));
            }
            Ok(SessionToken {
                token: token.to_string(),
                account_id: account_id.to_string(),
            })
        })
        .collect()
}

impl Config {
    /// Load configuration from defaults, optional TOML file, and environment
    ///
    /// # Errors
    ///
    /// Returns error if the data directory cannot be created, the config
    /// file is malformed, or an env value fails to parse.
    pub fn load(data_dir_override: Option<PathBuf>, port_override: Option<u16>) -> Result<Self> {
        let data_dir = data_dir_override
            .or_else(|| env_var("QUOTEWIRE_DATA_DIR").map(PathBuf::from))
            .or_else(|| {
                directories::ProjectDirs::from("dev", "quotewire", "quotewire")
                    .map(|dirs| dirs.data_dir().to_path_buf())
            })
            .ok_or_else(|| Error::Config("could not determine data directory".to_string()))?;
        std::fs::create_dir_all(&data_dir)?;

        let explicit_file = env_var("QUOTEWIRE_CONFIG").map(PathBuf::from);
        let file = FileConfig::load(explicit_file.as_ref(), &data_dir)?;

        let data_dir = file.data_dir.unwrap_or(data_dir);

        let port = port_override
            .or_else(|| {
                env_var("QUOTEWIRE_PORT").and_then(|v| v.parse().ok())
            })
            .or(file.port)
            .unwrap_or(8787);

        let identity_strategy = match env_var("QUOTEWIRE_IDENTITY_STRATEGY")
            .or(file.identity_strategy)
        {
            Some(raw) => IdentityStrategy::parse(&raw)?,
            None => IdentityStrategy::default(),
        };

        let demo_fallback = env_var("QUOTEWIRE_DEMO_FALLBACK")
            .map(|v| !matches!(v.as_str(), "0" | "false" | "off"))
            .or(file.demo_fallback)
            .unwrap_or(true);

        let llm = LlmConfig {
            api_key: env_var("ANTHROPIC_API_KEY"),
            model: env_var("QUOTEWIRE_LLM_MODEL")
                .or(file.llm_model)
                .unwrap_or_else(|| "claude-3-5-sonnet-20241022".to_string()),
            max_tokens: file.llm_max_tokens.unwrap_or(800),
            temperature: file.llm_temperature.unwrap_or(0.6),
            timeout_secs: file.llm_timeout_secs.unwrap_or(60),
        };

        let voice = VoiceConfig {
            deepgram_api_key: env_var("DEEPGRAM_API_KEY"),
            elevenlabs_api_key: env_var("ELEVENLABS_API_KEY"),
            stt_model: env_var("QUOTEWIRE_STT_MODEL")
                .or(file.stt_model)
                .unwrap_or_else(|| "nova-2".to_string()),
            tts_voice: env_var("QUOTEWIRE_TTS_VOICE")
                .or(file.tts_voice)
                .unwrap_or_else(|| "21m00Tcm4TlvDq8ikWAM".to_string()),
            tts_model: env_var("QUOTEWIRE_TTS_MODEL")
                .or(file.tts_model)
                .unwrap_or_else(|| "eleven_monolingual_v1".to_string()),
            timeout_secs: file.voice_timeout_secs.unwrap_or(30),
        };

        let defaults = AggregationConfig::default();
        let aggregation = AggregationConfig {
            max_fetch_concurrency: file
                .max_fetch_concurrency
                .unwrap_or(defaults.max_fetch_concurrency)
                .max(1),
            max_file_bytes: file.max_file_bytes.unwrap_or(defaults.max_file_bytes),
        };

        let mut sessions = file.sessions;
        if let Some(raw) = env_var("QUOTEWIRE_SESSION_TOKENS") {
            sessions.extend(parse_sessions(&raw)?);
        }

        Ok(Self {
            data_dir,
            port,
            identity_strategy,
            demo_fallback,
            llm,
            voice,
            aggregation,
            sessions,
        })
    }

    /// Path to the identity mapping database
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("quotewire.db")
    }

    /// Root directory for uploaded artifacts
    #[must_use]
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_strategy_parses_known_names() {
        assert_eq!(
            IdentityStrategy::parse("deterministic").unwrap(),
            IdentityStrategy::Deterministic
        );
        assert_eq!(
            IdentityStrategy::parse("persisted").unwrap(),
            IdentityStrategy::Persisted
        );
        assert!(IdentityStrategy::parse("mystery").is_err());
    }

    #[test]
    fn session_pairs_parse() {
        let sessions = parse_sessions("tok-1=acct_a, tok-2=acct_b").unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].token, "tok-1");
        assert_eq!(sessions[1].account_id, "acct_b");
    }

    #[test]
    fn malformed_session_pair_rejected() {
        assert!(parse_sessions("no-separator").is_err());
        assert!(parse_sessions("=acct").is_err());
    }

    #[test]
    fn file_config_rejects_unknown_fields() {
        let err = toml::from_str::<FileConfig>("mystery_field = 1");
        assert!(err.is_err());
    }
}
