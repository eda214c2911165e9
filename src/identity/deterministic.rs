//! Deterministic tenant key derivation

use sha2::{Digest, Sha256};

use super::{require_account_id, IdentityResolver, TenantKey};
use crate::Result;

/// Derives tenant keys as a fixed-length prefix of SHA-256(account id)
///
/// Pure function: no storage, idempotent, safe under concurrent calls.
/// Irreversible by construction: lookups only ever go account id -> key.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashResolver;

impl HashResolver {
    /// Create a new deterministic resolver
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl IdentityResolver for HashResolver {
    fn resolve(&self, account_id: &str) -> Result<TenantKey> {
        require_account_id(account_id)?;
        let digest = Sha256::digest(account_id.as_bytes());
        let hex = hex::encode(digest);
        Ok(TenantKey::from_hex(&hex[..16]))
    }
}
