//! Identity resolution: external account identifier -> stable tenant key
//!
//! Two interchangeable strategies behind [`IdentityResolver`]:
//! [`HashResolver`] derives the key as a pure function of the account id,
//! [`MappingResolver`] allocates a random key on first sight and records it
//! in the identity mapping table.

mod deterministic;
mod persisted;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub use deterministic::HashResolver;
pub use persisted::MappingResolver;

/// Namespace prefix shared by every tenant key, wire form `biz_<16 hex>`
pub const TENANT_PREFIX: &str = "biz_";

/// Opaque, stable identifier for a tenant
///
/// Also used as the per-tenant directory name in artifact storage, so the
/// character set is restricted to the prefix plus hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantKey(String);

impl TenantKey {
    pub(crate) fn from_hex(hex_tail: &str) -> Self {
        Self(format!("{TENANT_PREFIX}{hex_tail}"))
    }

    /// Parse an externally supplied tenant reference
    ///
    /// # Errors
    ///
    /// Returns a validation error unless the value is the `biz_` prefix
    /// followed by hex digits; this is what keeps a caller-supplied
    /// `tenantRef` from escaping its storage directory.
    pub fn parse(raw: &str) -> Result<Self> {
        let tail = raw
            .strip_prefix(TENANT_PREFIX)
            .ok_or_else(|| Error::Validation(format!("malformed tenant reference: {raw}")))?;
        if tail.is_empty() || !tail.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::Validation(format!("malformed tenant reference: {raw}")));
        }
        Ok(Self(raw.to_string()))
    }

    /// The key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves an externally-authenticated account identifier to a tenant key
///
/// Implementations must be idempotent: the same account id always resolves
/// to the same key for the lifetime of the account.
pub trait IdentityResolver: Send + Sync {
    /// Resolve an account id to its tenant key
    ///
    /// # Errors
    ///
    /// Returns error for an empty account id, or if the backing store of a
    /// persisted strategy fails. Never fails for a well-formed account id
    /// under the deterministic strategy.
    fn resolve(&self, account_id: &str) -> Result<TenantKey>;
}

pub(crate) fn require_account_id(account_id: &str) -> Result<()> {
    if account_id.trim().is_empty() {
        return Err(Error::Validation("empty account id".to_string()));
    }
    Ok(())
}
