//! Quotewire - document-grounded quoting assistant gateway
//!
//! This library provides the per-turn context-assembly and orchestration
//! pipeline:
//! - Identity resolution (account id -> stable tenant key)
//! - Artifact cataloging and context aggregation
//! - Conversation orchestration against the language-model collaborator
//! - Optional voice side channels (STT before a turn, TTS after it)
//!
//! # Architecture
//!
//! ```text
//! caller identity ──▶ Identity Resolver ──▶ tenant key
//!                                              │
//!                     Artifact Catalog ◀───────┘
//!                            │
//!                     Context Aggregator ──▶ context document
//!                            │
//!     message + history ──▶ Conversation Orchestrator ──▶ reply text
//!                            │
//!                     Voice Coordinator (voice turns only)
//!                            │
//!            {reply, optional audio, diagnostic counts}
//! ```
//!
//! Every turn is stateless; the only shared mutable resource is the
//! identity mapping table used by the persisted resolver strategy.

pub mod api;
pub mod catalog;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod identity;
pub mod orchestrator;
pub mod prompt;
pub mod voice;

pub use config::Config;
pub use context::{Aggregator, ContextDocument, ContextSource};
pub use db::{DbConn, DbPool};
pub use error::{Error, Result};
pub use identity::{HashResolver, IdentityResolver, MappingResolver, TenantKey};
pub use orchestrator::{ChatModel, ChatRole, ChatTurn, Orchestrator};
pub use voice::{StageOutcome, Synthesizer, Transcriber};
