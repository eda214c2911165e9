//! Per-turn context assembly
//!
//! Builds one bounded textual document out of a tenant's artifact catalog.
//! Aggregation never fails: a file that cannot be read becomes an inline
//! placeholder for that section only, and a missing or unreachable storage
//! backend degrades to the bundled sample dataset (or a fixed sentinel when
//! the demo fallback is disabled).

use std::sync::Arc;

use futures::StreamExt;

use crate::catalog::{
    ArtifactDescriptor, ArtifactKind, ArtifactStore, SAMPLE_ARTIFACT, SAMPLE_ARTIFACT_NAME,
};
use crate::config::AggregationConfig;
use crate::identity::TenantKey;

/// Sentinel shown when the tenant has a working catalog with no files
pub const NO_FILES_SENTINEL: &str = "No business files uploaded yet.";

/// Sentinel shown when storage is unavailable and the demo fallback is off
pub const NO_STORAGE_SENTINEL: &str = "Business file storage is not configured.";

/// Placeholder substituted for a single unreadable file
pub const UNREADABLE_PLACEHOLDER: &str = "[Error reading file]";

/// Rendered content of one catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    /// Literal decoded text
    Inline(String),
    /// Human-readable stand-in for content that is not inlined
    Placeholder(String),
    /// The fetch failed; this section renders as an error placeholder
    Unreadable,
}

/// One artifact's contribution to the context document
#[derive(Debug, Clone)]
pub struct ContextSection {
    pub name: String,
    pub body: SectionBody,
}

/// Where the document's content came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSource {
    /// Assembled from the tenant's catalog
    Catalog,
    /// Catalog reachable but empty
    EmptyCatalog,
    /// Bundled sample dataset substituted for a missing backend
    Sample,
    /// Backend missing and demo fallback disabled
    Unconfigured,
}

/// The assembled textual context for one turn, built fresh every time
#[derive(Debug, Clone)]
pub struct ContextDocument {
    source: ContextSource,
    sections: Vec<ContextSection>,
}

impl ContextDocument {
    fn sentinel(source: ContextSource) -> Self {
        Self {
            source,
            sections: Vec::new(),
        }
    }

    fn sample() -> Self {
        Self {
            source: ContextSource::Sample,
            sections: vec![ContextSection {
                name: SAMPLE_ARTIFACT_NAME.to_string(),
                body: SectionBody::Inline(SAMPLE_ARTIFACT.to_string()),
            }],
        }
    }

    /// Where the content came from
    #[must_use]
    pub const fn source(&self) -> ContextSource {
        self.source
    }

    /// The ordered sections, one per catalog entry
    #[must_use]
    pub fn sections(&self) -> &[ContextSection] {
        &self.sections
    }

    /// Number of files represented, reported back as a diagnostic count
    #[must_use]
    pub fn file_count(&self) -> usize {
        match self.source {
            ContextSource::Catalog | ContextSource::Sample => self.sections.len(),
            ContextSource::EmptyCatalog | ContextSource::Unconfigured => 0,
        }
    }

    /// Render the document for the language-model collaborator
    ///
    /// Never renders to an empty string: the empty-catalog and unconfigured
    /// cases yield fixed sentinels so downstream prompting is unambiguous.
    #[must_use]
    pub fn render(&self) -> String {
        match self.source {
            ContextSource::EmptyCatalog => NO_FILES_SENTINEL.to_string(),
            ContextSource::Unconfigured => NO_STORAGE_SENTINEL.to_string(),
            ContextSource::Sample => {
                let body = &self.sections[0];
                let SectionBody::Inline(content) = &body.body else {
                    unreachable!("sample section is always inline");
                };
                format!("SAMPLE BUSINESS PRICING DATA:\n\n{content}")
            }
            ContextSource::Catalog => {
                let mut out = format!("BUSINESS FILES ({} files):\n\n", self.sections.len());
                for section in &self.sections {
                    let content = match &section.body {
                        SectionBody::Inline(text) | SectionBody::Placeholder(text) => text,
                        SectionBody::Unreadable => UNREADABLE_PLACEHOLDER,
                    };
                    out.push_str(&format!("--- FILE: {} ---\n{content}\n\n", section.name));
                }
                out
            }
        }
    }
}

/// Assembles context documents from an artifact store
pub struct Aggregator {
    store: Option<Arc<dyn ArtifactStore>>,
    demo_fallback: bool,
    limits: AggregationConfig,
}

impl Aggregator {
    /// Create a new aggregator
    ///
    /// `store` is `None` when no storage backend is configured.
    #[must_use]
    pub fn new(
        store: Option<Arc<dyn ArtifactStore>>,
        demo_fallback: bool,
        limits: AggregationConfig,
    ) -> Self {
        Self {
            store,
            demo_fallback,
            limits,
        }
    }

    fn fallback(&self) -> ContextDocument {
        if self.demo_fallback {
            ContextDocument::sample()
        } else {
            ContextDocument::sentinel(ContextSource::Unconfigured)
        }
    }

    /// Build the context document for one turn
    ///
    /// `tenant` is `None` for anonymous demo turns. Per-file errors are
    /// absorbed into their sections; this operation itself cannot fail.
    pub async fn aggregate(&self, tenant: Option<&TenantKey>) -> ContextDocument {
        let (Some(store), Some(tenant)) = (&self.store, tenant) else {
            return self.fallback();
        };

        let artifacts = match store.list(tenant).await {
            Ok(artifacts) => artifacts,
            Err(e) => {
                tracing::warn!(tenant = %tenant, error = %e, "artifact listing failed");
                return self.fallback();
            }
        };

        if artifacts.is_empty() {
            return ContextDocument::sentinel(ContextSource::EmptyCatalog);
        }

        // Fetches run concurrently up to the limit; buffered() re-emits
        // results in listing order so the document is deterministic.
        let sections: Vec<ContextSection> = futures::stream::iter(artifacts)
            .map(|artifact| self.build_section(store, tenant, artifact))
            .buffered(self.limits.max_fetch_concurrency)
            .collect()
            .await;

        ContextDocument {
            source: ContextSource::Catalog,
            sections,
        }
    }

    async fn build_section(
        &self,
        store: &Arc<dyn ArtifactStore>,
        tenant: &TenantKey,
        artifact: ArtifactDescriptor,
    ) -> ContextSection {
        let body = match artifact.kind {
            ArtifactKind::PlainText | ArtifactKind::StructuredText => {
                match store.fetch(tenant, &artifact.name).await {
                    Ok(bytes) => SectionBody::Inline(self.decode(&bytes)),
                    Err(e) => {
                        tracing::warn!(
                            tenant = %tenant,
                            name = %artifact.name,
                            error = %e,
                            "artifact fetch failed"
                        );
                        SectionBody::Unreadable
                    }
                }
            }
            // Bytes are deliberately not fetched: the downstream model can
            // interpret these formats when forwarded out of band, and the
            // context only needs to acknowledge them.
            ArtifactKind::OfficeDocument => SectionBody::Placeholder(format!(
                "[{} FILE: {} - the assistant can interpret this file type directly]",
                extension_tag(&artifact.name),
                artifact.name
            )),
            ArtifactKind::Image => SectionBody::Placeholder(format!(
                "[IMAGE FILE: {} - the assistant can analyze this image when needed]",
                artifact.name
            )),
            ArtifactKind::Unknown => SectionBody::Placeholder(format!(
                "[FILE: {} - available for reference]",
                artifact.name
            )),
        };

        ContextSection {
            name: artifact.name,
            body,
        }
    }

    fn decode(&self, bytes: &[u8]) -> String {
        if bytes.len() <= self.limits.max_file_bytes {
            return String::from_utf8_lossy(bytes).into_owned();
        }
        let mut text = String::from_utf8_lossy(&bytes[..self.limits.max_file_bytes]).into_owned();
        text.push_str("\n[content truncated]");
        text
    }
}

fn extension_tag(name: &str) -> String {
    name.rsplit_once('.')
        .map_or_else(|| "FILE".to_string(), |(_, ext)| ext.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::catalog::classify;
    use crate::identity::{HashResolver, IdentityResolver};
    use crate::{Error, Result};

    /// In-memory store; names listed in `broken` fail on fetch
    struct MemStore {
        files: Vec<(String, Vec<u8>)>,
        broken: Vec<String>,
        fail_listing: bool,
    }

    impl MemStore {
        fn new(files: &[(&str, &str)]) -> Self {
            Self {
                files: files
                    .iter()
                    .map(|(n, c)| ((*n).to_string(), c.as_bytes().to_vec()))
                    .collect(),
                broken: Vec::new(),
                fail_listing: false,
            }
        }

        fn with_broken(mut self, name: &str) -> Self {
            self.broken.push(name.to_string());
            self
        }
    }

    #[async_trait]
    impl ArtifactStore for MemStore {
        async fn list(&self, _tenant: &TenantKey) -> Result<Vec<ArtifactDescriptor>> {
            if self.fail_listing {
                return Err(Error::Storage("backend unreachable".to_string()));
            }
            Ok(self
                .files
                .iter()
                .map(|(name, bytes)| ArtifactDescriptor {
                    name: name.clone(),
                    size: bytes.len() as u64,
                    modified: Utc::now(),
                    kind: classify(name),
                })
                .collect())
        }

        async fn fetch(&self, _tenant: &TenantKey, name: &str) -> Result<Vec<u8>> {
            if self.broken.iter().any(|b| b == name) {
                return Err(Error::Storage(format!("reading {name}: io fault")));
            }
            self.files
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, bytes)| bytes.clone())
                .ok_or_else(|| Error::Storage(format!("reading {name}: not found")))
        }

        async fn put(&self, _: &TenantKey, _: &str, _: &[u8]) -> Result<ArtifactDescriptor> {
            unimplemented!("not used by aggregation tests")
        }

        async fn delete(&self, _: &TenantKey, _: &str) -> Result<bool> {
            unimplemented!("not used by aggregation tests")
        }
    }

    fn tenant() -> TenantKey {
        HashResolver::new().resolve("user_test").unwrap()
    }

    fn aggregator(store: MemStore) -> Aggregator {
        Aggregator::new(Some(Arc::new(store)), true, AggregationConfig::default())
    }

    #[tokio::test]
    async fn empty_catalog_yields_fixed_sentinel() {
        let agg = aggregator(MemStore::new(&[]));
        let doc = agg.aggregate(Some(&tenant())).await;

        assert_eq!(doc.source(), ContextSource::EmptyCatalog);
        assert_eq!(doc.file_count(), 0);
        assert_eq!(doc.render(), NO_FILES_SENTINEL);
        assert!(!doc.render().is_empty());
    }

    #[tokio::test]
    async fn one_unreadable_artifact_does_not_poison_the_rest() {
        let store = MemStore::new(&[
            ("a.txt", "alpha"),
            ("b.txt", "bravo"),
            ("c.txt", "charlie"),
        ])
        .with_broken("b.txt");
        let doc = aggregator(store).aggregate(Some(&tenant())).await;

        assert_eq!(doc.sections().len(), 3);
        let unreadable: Vec<_> = doc
            .sections()
            .iter()
            .filter(|s| s.body == SectionBody::Unreadable)
            .collect();
        assert_eq!(unreadable.len(), 1);
        assert_eq!(unreadable[0].name, "b.txt");

        let rendered = doc.render();
        assert!(rendered.contains("alpha"));
        assert!(rendered.contains(UNREADABLE_PLACEHOLDER));
        assert!(rendered.contains("charlie"));
    }

    #[tokio::test]
    async fn sections_keep_listing_order() {
        let store = MemStore::new(&[
            ("01-first.txt", "one"),
            ("02-second.txt", "two"),
            ("03-third.txt", "three"),
            ("04-fourth.txt", "four"),
        ]);
        let doc = aggregator(store).aggregate(Some(&tenant())).await;

        let names: Vec<_> = doc.sections().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            ["01-first.txt", "02-second.txt", "03-third.txt", "04-fourth.txt"]
        );
    }

    #[tokio::test]
    async fn non_text_kinds_become_placeholders_without_fetching() {
        let store = MemStore::new(&[
            ("brochure.pdf", ""),
            ("logo.png", ""),
            ("archive.bin", ""),
            ("rates.csv", "svc,price"),
        ]);
        let doc = aggregator(store).aggregate(Some(&tenant())).await;
        let rendered = doc.render();

        assert!(rendered.starts_with("BUSINESS FILES (4 files):"));
        assert!(rendered.contains("[PDF FILE: brochure.pdf"));
        assert!(rendered.contains("[IMAGE FILE: logo.png"));
        assert!(rendered.contains("[FILE: archive.bin - available for reference]"));
        assert!(rendered.contains("svc,price"));
    }

    #[tokio::test]
    async fn missing_backend_falls_back_to_sample() {
        let agg = Aggregator::new(None, true, AggregationConfig::default());
        let doc = agg.aggregate(Some(&tenant())).await;

        assert_eq!(doc.source(), ContextSource::Sample);
        assert_eq!(doc.file_count(), 1);
        assert!(doc.render().starts_with("SAMPLE BUSINESS PRICING DATA:"));
    }

    #[tokio::test]
    async fn unreachable_backend_falls_back_to_sample() {
        let mut store = MemStore::new(&[("a.txt", "alpha")]);
        store.fail_listing = true;
        let doc = aggregator(store).aggregate(Some(&tenant())).await;

        assert_eq!(doc.source(), ContextSource::Sample);
    }

    #[tokio::test]
    async fn fallback_disabled_yields_storage_sentinel() {
        let agg = Aggregator::new(None, false, AggregationConfig::default());
        let doc = agg.aggregate(Some(&tenant())).await;

        assert_eq!(doc.source(), ContextSource::Unconfigured);
        assert_eq!(doc.render(), NO_STORAGE_SENTINEL);
    }

    #[tokio::test]
    async fn oversized_text_is_truncated() {
        let big = "x".repeat(1024);
        let store = MemStore::new(&[("big.txt", big.as_str())]);
        let agg = Aggregator::new(
            Some(Arc::new(store)),
            true,
            AggregationConfig {
                max_fetch_concurrency: 2,
                max_file_bytes: 100,
            },
        );
        let doc = agg.aggregate(Some(&tenant())).await;
        let rendered = doc.render();

        assert!(rendered.contains("[content truncated]"));
        assert!(rendered.len() < 512);
    }
}
