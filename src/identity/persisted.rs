//! Persisted tenant key allocation

use super::{require_account_id, IdentityResolver, TenantKey};
use crate::db::DbPool;
use crate::{Error, Result};

/// Attempts before giving up on a free random key; with 64 bits of entropy
/// a second attempt is already extraordinary.
const MAX_ALLOC_ATTEMPTS: u32 = 4;

/// Allocates a fresh random tenant key on first sight of an account id and
/// records it in the `identity_map` table
///
/// The table carries uniqueness constraints on both columns, so the mapping
/// stays bijective and two concurrent first-time resolutions cannot lose
/// each other's writes: the insert is a single atomic statement and the
/// follow-up select returns whichever allocation won.
pub struct MappingResolver {
    db: DbPool,
}

impl MappingResolver {
    /// Create a new persisted resolver backed by the given pool
    #[must_use]
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    fn lookup(&self, account_id: &str) -> Result<Option<TenantKey>> {
        let conn = self
            .db
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;
        let result = conn.query_row(
            "SELECT tenant_key FROM identity_map WHERE account_id = ?1",
            rusqlite::params![account_id],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(key) => Ok(Some(TenantKey::parse(&key)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::Database(e.to_string())),
        }
    }

    fn try_allocate(&self, account_id: &str, candidate: &TenantKey) -> Result<bool> {
        let conn = self
            .db
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;
        let result = conn.execute(
            "INSERT INTO identity_map (account_id, tenant_key) VALUES (?1, ?2)
             ON CONFLICT(account_id) DO NOTHING",
            rusqlite::params![account_id, candidate.as_str()],
        );
        match result {
            Ok(_) => Ok(true),
            // Another row already holds this random key; caller redraws
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Ok(false)
            }
            Err(e) => Err(Error::Database(e.to_string())),
        }
    }
}

impl IdentityResolver for MappingResolver {
    fn resolve(&self, account_id: &str) -> Result<TenantKey> {
        require_account_id(account_id)?;

        if let Some(existing) = self.lookup(account_id)? {
            return Ok(existing);
        }

        for _ in 0..MAX_ALLOC_ATTEMPTS {
            let entropy: [u8; 8] = rand::random();
            let candidate = TenantKey::from_hex(&hex::encode(entropy));
            self.try_allocate(account_id, &candidate)?;
            // Read back rather than trusting our insert: a concurrent
            // resolution for the same account may have won the race.
            if let Some(key) = self.lookup(account_id)? {
                tracing::debug!(account_id, tenant_key = %key, "resolved tenant identity");
                return Ok(key);
            }
        }

        Err(Error::Database(format!(
            "could not allocate a tenant key for {account_id} after {MAX_ALLOC_ATTEMPTS} attempts"
        )))
    }
}
