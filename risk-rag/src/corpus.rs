//! Corpus index manager.
//!
//! [`CorpusIndex`] owns the normalised corpus and its vector index as one
//! immutable [`CorpusSnapshot`]. A rebuild happens only when the source
//! fingerprint changes; it builds a complete new snapshot and then swaps the
//! `Arc`, so readers never see documents from one build paired with vectors
//! from another.
//!
//! # Example
//!
//! ```rust,ignore
//! use risk_rag::{CorpusIndex, JsonFileSource};
//!
//! let corpus = CorpusIndex::new(Arc::new(JsonFileSource::new("data.json")), embedder);
//! let snapshot = corpus.ensure_fresh().await?;
//! let hits = snapshot.search(&query_vector, 10)?;
//! ```

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::document::CanonicalDocument;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::{FlatL2Index, Neighbor};
use crate::normalize::normalize;
use crate::source::{RecordSource, fingerprint, parse_records};

/// One consistent build of the corpus: documents aligned 1:1 with the
/// vectors of `index`.
#[derive(Debug)]
pub struct CorpusSnapshot {
    fingerprint: String,
    documents: Vec<CanonicalDocument>,
    index: FlatL2Index,
}

impl CorpusSnapshot {
    /// Fingerprint of the source content this snapshot was built from.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Documents in build order.
    pub fn documents(&self) -> &[CanonicalDocument] {
        &self.documents
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the corpus is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Nearest corpus positions to `query`, closest first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.index.search(query, k)
    }

    /// Document at a corpus position.
    pub fn document_at(&self, position: usize) -> Option<&CanonicalDocument> {
        self.documents.get(position)
    }
}

/// Keeps a [`CorpusSnapshot`] in sync with a [`RecordSource`].
pub struct CorpusIndex {
    source: Arc<dyn RecordSource>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    current: RwLock<Option<Arc<CorpusSnapshot>>>,
    rebuild_lock: Mutex<()>,
}

impl CorpusIndex {
    /// Create an index manager with no snapshot; the first
    /// [`ensure_fresh`](Self::ensure_fresh) builds one.
    pub fn new(
        source: Arc<dyn RecordSource>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            source,
            embedding_provider,
            current: RwLock::new(None),
            rebuild_lock: Mutex::new(()),
        }
    }

    /// Return a reference to the record source.
    pub fn source(&self) -> &Arc<dyn RecordSource> {
        &self.source
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// The current snapshot, if one has been built.
    pub async fn snapshot(&self) -> Option<Arc<CorpusSnapshot>> {
        self.current.read().await.clone()
    }

    /// Make sure the snapshot reflects the current source content.
    ///
    /// Reads the source, compares its fingerprint with the current snapshot
    /// and rebuilds only on change. If the rebuild fails after the source was
    /// read (embedding or index errors), the previous snapshot stays in place
    /// and is returned.
    ///
    /// # Errors
    ///
    /// Returns storage and parse errors unconditionally, and build errors
    /// when there is no previous snapshot to fall back on.
    pub async fn ensure_fresh(&self) -> Result<Arc<CorpusSnapshot>> {
        let _guard = self.rebuild_lock.lock().await;

        let bytes = self.source.read().await?;
        let fingerprint = fingerprint(&bytes);

        let previous = self.snapshot().await;
        if let Some(snapshot) = &previous {
            if snapshot.fingerprint == fingerprint {
                debug!(source = %self.source.describe(), "corpus unchanged, using cache");
                return Ok(Arc::clone(snapshot));
            }
        }

        info!(source = %self.source.describe(), %fingerprint, "source changed, rebuilding corpus");
        let records = parse_records(&bytes)?;
        let documents: Vec<CanonicalDocument> = records.iter().map(normalize).collect();

        match self.build(fingerprint, documents).await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                *self.current.write().await = Some(Arc::clone(&snapshot));
                info!(document_count = snapshot.len(), "corpus rebuilt");
                Ok(snapshot)
            }
            Err(e) => match previous {
                Some(snapshot) => {
                    warn!(error = %e, "corpus rebuild failed, keeping previous snapshot");
                    Ok(snapshot)
                }
                None => Err(e),
            },
        }
    }

    /// Nearest corpus positions in the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if no snapshot has been built yet.
    pub async fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        let snapshot = self.snapshot().await.ok_or_else(|| {
            RagError::PipelineError("corpus has not been built yet".to_string())
        })?;
        snapshot.search(query, k)
    }

    /// Document at a position of the current snapshot.
    pub async fn document_at(&self, position: usize) -> Option<CanonicalDocument> {
        self.snapshot().await?.document_at(position).cloned()
    }

    async fn build(
        &self,
        fingerprint: String,
        documents: Vec<CanonicalDocument>,
    ) -> Result<CorpusSnapshot> {
        let dimensions = self.embedding_provider.dimensions();
        let vectors = if documents.is_empty() {
            Vec::new()
        } else {
            let texts: Vec<String> = documents.iter().map(CanonicalDocument::to_text).collect();
            let texts: Vec<&str> = texts.iter().map(String::as_str).collect();
            self.embedding_provider.embed_batch(&texts).await?
        };

        if vectors.len() != documents.len() {
            return Err(RagError::EmbeddingError {
                provider: self.embedding_provider.name().to_string(),
                message: format!(
                    "returned {} vectors for {} documents",
                    vectors.len(),
                    documents.len()
                ),
            });
        }

        let index = FlatL2Index::build(dimensions, vectors)?;
        Ok(CorpusSnapshot { fingerprint, documents, index })
    }
}
