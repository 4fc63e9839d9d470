//! Executes a [`RetrievalPlan`] against storage or the corpus index.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::corpus::CorpusIndex;
use crate::document::RetrievedItem;
use crate::error::{RagError, Result};
use crate::normalize::normalize;
use crate::query::RetrievalPlan;
use crate::record::{Field, resolve_field};

/// Retrieves context documents for a question.
pub struct Retriever {
    corpus: Arc<CorpusIndex>,
}

impl Retriever {
    /// Create a retriever over a corpus index.
    pub fn new(corpus: Arc<CorpusIndex>) -> Self {
        Self { corpus }
    }

    /// Return a reference to the corpus index.
    pub fn corpus(&self) -> &Arc<CorpusIndex> {
        &self.corpus
    }

    /// Run `plan` for the (already normalised) `question`.
    ///
    /// Identifier plans read storage directly so lookups never see a stale
    /// corpus; semantic plans go through the cached index.
    ///
    /// # Errors
    ///
    /// Returns storage errors from identifier lookups, and corpus, embedding
    /// or index errors from semantic search.
    pub async fn retrieve(&self, question: &str, plan: &RetrievalPlan) -> Result<Vec<RetrievedItem>> {
        match plan {
            RetrievalPlan::ByIdentifiers { ids } => self.by_identifiers(ids).await,
            RetrievalPlan::Semantic { top_k } => self.semantic(question, *top_k).await,
        }
    }

    /// Look each id up in freshly read storage, in the requested order.
    pub async fn by_identifiers(&self, ids: &[String]) -> Result<Vec<RetrievedItem>> {
        info!(?ids, "looking up identifiers");
        let records = self.corpus.source().load().await?;

        let items = ids
            .iter()
            .map(|id| {
                let wanted = id.trim().to_lowercase();
                records
                    .iter()
                    .find(|record| {
                        resolve_field(record, Field::Identifier)
                            .is_some_and(|found| found.trim().to_lowercase() == wanted)
                    })
                    .map(|record| RetrievedItem::Document {
                        document: normalize(record),
                        distance: None,
                    })
                    .unwrap_or_else(|| {
                        debug!(id = %id, "identifier not found");
                        RetrievedItem::NotFound { id: id.clone() }
                    })
            })
            .collect();

        Ok(items)
    }

    /// Embed the question and return the `top_k` nearest documents,
    /// closest first.
    pub async fn semantic(&self, question: &str, top_k: usize) -> Result<Vec<RetrievedItem>> {
        let snapshot = self.corpus.ensure_fresh().await?;
        if snapshot.is_empty() || top_k == 0 {
            debug!("empty corpus, skipping query embedding");
            return Ok(Vec::new());
        }

        let provider = self.corpus.embedding_provider();
        let query_vector = provider.embed(question).await.map_err(|e| {
            error!(error = %e, "embedding failed during query");
            RagError::PipelineError(format!("query embedding failed: {e}"))
        })?;

        let neighbors = snapshot.search(&query_vector, top_k)?;
        let items: Vec<RetrievedItem> = neighbors
            .into_iter()
            .filter_map(|neighbor| {
                snapshot.document_at(neighbor.position).map(|document| RetrievedItem::Document {
                    document: document.clone(),
                    distance: Some(neighbor.distance),
                })
            })
            .collect();

        info!(top_k, result_count = items.len(), "semantic search completed");
        Ok(items)
    }
}
