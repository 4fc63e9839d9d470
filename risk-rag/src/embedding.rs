//! Embedding provider trait: text in, fixed-length vector out.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that turns text into vectors for the corpus index.
///
/// Every vector a provider returns must have [`dimensions`](Self::dimensions)
/// components, and the same text must map to the same vector for a given
/// model version. The default [`embed_batch`](Self::embed_batch) calls
/// [`embed`](Self::embed) once per input; remote backends should override it
/// with a single request.
///
/// # Example
///
/// ```rust,ignore
/// use risk_rag::EmbeddingProvider;
///
/// let vectors = provider.embed_batch(&["ID: 1\nArea: IT", "ID: 2\nArea: HR"]).await?;
/// assert!(vectors.iter().all(|v| v.len() == provider.dimensions()));
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short provider name used in logs and errors.
    fn name(&self) -> &str;

    /// Embed a single text (used for questions).
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed many texts at once (used when the corpus is rebuilt).
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Length of every vector this provider produces.
    fn dimensions(&self) -> usize;
}
