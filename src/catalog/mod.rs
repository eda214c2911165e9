//! Artifact catalog: a tenant's uploaded files
//!
//! Storage backends implement [`ArtifactStore`]; the gateway ships with a
//! filesystem-backed [`LocalStore`]. Content handling per file type is
//! decided by a static extension table, not by inspecting bytes.

mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::identity::TenantKey;
use crate::{Error, Result};

pub use local::LocalStore;

/// Bundled sample dataset served when no artifact storage is configured
pub const SAMPLE_ARTIFACT_NAME: &str = "sample-pricing.csv";

/// Content of the bundled sample dataset
pub const SAMPLE_ARTIFACT: &str = include_str!("../../assets/sample-pricing.csv");

/// Content-handling class inferred from a filename extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ArtifactKind {
    /// Prose, source code, or markup; inlined verbatim
    PlainText,
    /// Tabular or tree-structured text; inlined verbatim
    StructuredText,
    /// PDF and office formats, described but never fetched; interpretation is
    /// deferred to the language-model collaborator
    OfficeDocument,
    /// Images, described only; byte transport is out of scope
    Image,
    /// Anything else, acknowledged with a generic placeholder
    Unknown,
}

/// Extension table driving [`classify`] and the upload allow-list
const KIND_TABLE: &[(&str, ArtifactKind)] = &[
    ("txt", ArtifactKind::PlainText),
    ("md", ArtifactKind::PlainText),
    ("py", ArtifactKind::PlainText),
    ("js", ArtifactKind::PlainText),
    ("ts", ArtifactKind::PlainText),
    ("html", ArtifactKind::PlainText),
    ("css", ArtifactKind::PlainText),
    ("csv", ArtifactKind::StructuredText),
    ("json", ArtifactKind::StructuredText),
    ("xml", ArtifactKind::StructuredText),
    ("pdf", ArtifactKind::OfficeDocument),
    ("doc", ArtifactKind::OfficeDocument),
    ("docx", ArtifactKind::OfficeDocument),
    ("xlsx", ArtifactKind::OfficeDocument),
    ("xls", ArtifactKind::OfficeDocument),
    ("png", ArtifactKind::Image),
    ("jpg", ArtifactKind::Image),
    ("jpeg", ArtifactKind::Image),
    ("gif", ArtifactKind::Image),
    ("webp", ArtifactKind::Image),
];

/// Classify a filename by its extension
#[must_use]
pub fn classify(name: &str) -> ArtifactKind {
    let Some((_, ext)) = name.rsplit_once('.') else {
        return ArtifactKind::Unknown;
    };
    let ext = ext.to_ascii_lowercase();
    KIND_TABLE
        .iter()
        .find(|(e, _)| *e == ext)
        .map_or(ArtifactKind::Unknown, |(_, kind)| *kind)
}

/// Whether a filename is accepted for upload
///
/// The allow-list is exactly the classified kinds: text/markup/source,
/// office documents, and common images. Unknown extensions are rejected.
#[must_use]
pub fn is_allowed_upload(name: &str) -> bool {
    classify(name) != ArtifactKind::Unknown
}

/// Reject artifact names that could escape the tenant's directory
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.starts_with('.')
    {
        return Err(Error::Validation(format!("invalid artifact name: {name}")));
    }
    Ok(())
}

/// A single stored artifact, immutable once created
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactDescriptor {
    /// Filename within the tenant's catalog
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Last-modified timestamp (upload time; artifacts are never rewritten)
    pub modified: DateTime<Utc>,
    /// Inferred content-handling kind
    pub kind: ArtifactKind,
}

/// Storage backend for tenant artifacts
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// List a tenant's artifacts in stable (name) order
    ///
    /// An unknown or empty tenant yields an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] only for a backend fault.
    async fn list(&self, tenant: &TenantKey) -> Result<Vec<ArtifactDescriptor>>;

    /// Fetch an artifact's raw bytes
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the artifact is missing or unreadable.
    async fn fetch(&self, tenant: &TenantKey, name: &str) -> Result<Vec<u8>>;

    /// Store an artifact, replacing any previous file of the same name
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a bad name, [`Error::Storage`] for
    /// a backend fault.
    async fn put(&self, tenant: &TenantKey, name: &str, bytes: &[u8])
        -> Result<ArtifactDescriptor>;

    /// Delete an artifact; `Ok(false)` if it did not exist
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] for a backend fault.
    async fn delete(&self, tenant: &TenantKey, name: &str) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_covers_each_kind() {
        assert_eq!(classify("notes.txt"), ArtifactKind::PlainText);
        assert_eq!(classify("README.md"), ArtifactKind::PlainText);
        assert_eq!(classify("pricing.CSV"), ArtifactKind::StructuredText);
        assert_eq!(classify("rates.json"), ArtifactKind::StructuredText);
        assert_eq!(classify("catalog.pdf"), ArtifactKind::OfficeDocument);
        assert_eq!(classify("sheet.xlsx"), ArtifactKind::OfficeDocument);
        assert_eq!(classify("logo.png"), ArtifactKind::Image);
        assert_eq!(classify("archive.zip"), ArtifactKind::Unknown);
        assert_eq!(classify("no-extension"), ArtifactKind::Unknown);
    }

    #[test]
    fn upload_allow_list_rejects_executables() {
        assert!(is_allowed_upload("pricing.csv"));
        assert!(is_allowed_upload("brochure.pdf"));
        assert!(is_allowed_upload("logo.webp"));
        assert!(!is_allowed_upload("malware.exe"));
        assert!(!is_allowed_upload("no-extension"));
    }

    #[test]
    fn artifact_names_cannot_traverse() {
        assert!(validate_name("pricing.csv").is_ok());
        assert!(validate_name("../secrets.txt").is_err());
        assert!(validate_name("a/b.txt").is_err());
        assert!(validate_name(".hidden").is_err());
        assert!(validate_name("").is_err());
    }
}
