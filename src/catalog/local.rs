//! Filesystem-backed artifact store

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{classify, validate_name, ArtifactDescriptor, ArtifactStore};
use crate::identity::TenantKey;
use crate::{Error, Result};

/// Stores each tenant's artifacts under `<root>/<tenant key>/`
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at the given uploads directory
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn tenant_dir(&self, tenant: &TenantKey) -> PathBuf {
        self.root.join(tenant.as_str())
    }

    fn artifact_path(&self, tenant: &TenantKey, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.tenant_dir(tenant).join(name))
    }
}

#[async_trait]
impl ArtifactStore for LocalStore {
    async fn list(&self, tenant: &TenantKey) -> Result<Vec<ArtifactDescriptor>> {
        let dir = self.tenant_dir(tenant);

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            // Tenant has never uploaded anything
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Storage(format!("listing {}: {e}", dir.display()))),
        };

        let mut artifacts = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::Storage(format!("listing {}: {e}", dir.display())))?
        {
            let meta = entry
                .metadata()
                .await
                .map_err(|e| Error::Storage(format!("stat {:?}: {e}", entry.file_name())))?;
            if !meta.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let modified = meta
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            artifacts.push(ArtifactDescriptor {
                kind: classify(&name),
                name,
                size: meta.len(),
                modified,
            });
        }

        // Deterministic listing order, independent of directory iteration
        artifacts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(artifacts)
    }

    async fn fetch(&self, tenant: &TenantKey, name: &str) -> Result<Vec<u8>> {
        let path = self.artifact_path(tenant, name)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| Error::Storage(format!("reading {name}: {e}")))
    }

    async fn put(
        &self,
        tenant: &TenantKey,
        name: &str,
        bytes: &[u8],
    ) -> Result<ArtifactDescriptor> {
        let path = self.artifact_path(tenant, name)?;
        let dir = self.tenant_dir(tenant);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::Storage(format!("creating {}: {e}", dir.display())))?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| Error::Storage(format!("writing {name}: {e}")))?;

        tracing::info!(tenant = %tenant, name, size = bytes.len(), "artifact stored");
        Ok(ArtifactDescriptor {
            name: name.to_string(),
            size: bytes.len() as u64,
            modified: Utc::now(),
            kind: classify(name),
        })
    }

    async fn delete(&self, tenant: &TenantKey, name: &str) -> Result<bool> {
        let path = self.artifact_path(tenant, name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(tenant = %tenant, name, "artifact deleted");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Storage(format!("deleting {name}: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::ArtifactKind;
    use super::*;
    use crate::identity::{HashResolver, IdentityResolver};

    fn store() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().to_path_buf());
        (dir, store)
    }

    fn tenant() -> TenantKey {
        HashResolver::new().resolve("user_test").unwrap()
    }

    #[tokio::test]
    async fn unknown_tenant_lists_empty() {
        let (_dir, store) = store();
        let listed = store.list(&tenant()).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn put_list_fetch_delete_roundtrip() {
        let (_dir, store) = store();
        let tenant = tenant();

        store.put(&tenant, "pricing.csv", b"item,price\n").await.unwrap();
        store.put(&tenant, "about.txt", b"hello").await.unwrap();

        let listed = store.list(&tenant).await.unwrap();
        assert_eq!(listed.len(), 2);
        // Name order, not insertion order
        assert_eq!(listed[0].name, "about.txt");
        assert_eq!(listed[1].name, "pricing.csv");
        assert_eq!(listed[1].kind, ArtifactKind::StructuredText);
        assert_eq!(listed[1].size, 11);

        let bytes = store.fetch(&tenant, "about.txt").await.unwrap();
        assert_eq!(bytes, b"hello");

        assert!(store.delete(&tenant, "about.txt").await.unwrap());
        assert!(!store.delete(&tenant, "about.txt").await.unwrap());
        assert_eq!(store.list(&tenant).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn tenants_are_isolated() {
        let (_dir, store) = store();
        let resolver = HashResolver::new();
        let left = resolver.resolve("user_left").unwrap();
        let right = resolver.resolve("user_right").unwrap();

        store.put(&left, "pricing.csv", b"left data").await.unwrap();

        assert!(store.list(&right).await.unwrap().is_empty());
        assert!(store.fetch(&right, "pricing.csv").await.is_err());
    }

    #[tokio::test]
    async fn fetch_of_missing_artifact_is_storage_error() {
        let (_dir, store) = store();
        let err = store.fetch(&tenant(), "absent.txt").await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
