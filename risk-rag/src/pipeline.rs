//! Question-answering pipeline.
//!
//! The [`RiskAssistant`] composes a [`RecordSource`], an
//! [`EmbeddingProvider`] and a [`GenerationBackend`] into the caller-facing
//! `answer_question` operation: normalise → classify → retrieve → filter →
//! synthesize.
//!
//! # Example
//!
//! ```rust,ignore
//! use risk_rag::{AssistantConfig, JsonFileSource, RiskAssistant};
//!
//! let assistant = RiskAssistant::builder()
//!     .config(AssistantConfig::from_env()?)
//!     .source(Arc::new(JsonFileSource::new("data.json")))
//!     .embedding_provider(Arc::new(my_embedder))
//!     .generation_backend(Arc::new(my_backend))
//!     .build()?;
//!
//! let answer = assistant.answer_question("how many points were closed in 2023?").await?;
//! println!("{}", answer.answer);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::AssistantConfig;
use crate::corpus::CorpusIndex;
use crate::document::RetrievedItem;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::GenerationBackend;
use crate::query::{RetrievalPlan, classify, extract_filters, normalize_question};
use crate::retriever::Retriever;
use crate::source::RecordSource;
use crate::synthesizer::AnswerSynthesizer;

/// The result of answering one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The answer text.
    pub answer: String,
    /// The context the answer was built from, in retrieval order.
    pub retrieved: Vec<RetrievedItem>,
    /// The question exactly as asked.
    pub question: String,
}

/// The question-answering orchestrator. Construct one via
/// [`RiskAssistant::builder()`].
pub struct RiskAssistant {
    config: AssistantConfig,
    corpus: Arc<CorpusIndex>,
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
}

impl RiskAssistant {
    /// Create a new [`RiskAssistantBuilder`].
    pub fn builder() -> RiskAssistantBuilder {
        RiskAssistantBuilder::default()
    }

    /// Return a reference to the configuration.
    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// Return a reference to the corpus index.
    pub fn corpus(&self) -> &Arc<CorpusIndex> {
        &self.corpus
    }

    /// Decide how `question` would be retrieved, after vocabulary
    /// normalisation.
    pub fn plan(&self, question: &str) -> RetrievalPlan {
        classify(&normalize_question(question), &self.config)
    }

    /// Answer a natural-language question.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] for a blank question, and
    /// propagates storage, embedding and generation errors.
    pub async fn answer_question(&self, question: &str) -> Result<Answer> {
        if question.trim().is_empty() {
            return Err(RagError::PipelineError("question must not be empty".to_string()));
        }

        let normalized = normalize_question(question);
        let plan = classify(&normalized, &self.config);
        info!(?plan, "answering question");

        let retrieved = self.retriever.retrieve(&normalized, &plan).await.map_err(|e| {
            error!(error = %e, "retrieval failed");
            e
        })?;

        let filters = extract_filters(&normalized);
        let answer = self.synthesizer.synthesize(&retrieved, &normalized, &filters).await?;
        info!(result_count = retrieved.len(), "question answered");

        Ok(Answer { answer, retrieved, question: question.to_string() })
    }
}

/// Builder for constructing a [`RiskAssistant`].
///
/// All fields except `config` are required; `config` defaults to
/// [`AssistantConfig::default()`].
#[derive(Default)]
pub struct RiskAssistantBuilder {
    config: Option<AssistantConfig>,
    source: Option<Arc<dyn RecordSource>>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    generation_backend: Option<Arc<dyn GenerationBackend>>,
}

impl RiskAssistantBuilder {
    /// Set the assistant configuration.
    pub fn config(mut self, config: AssistantConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the record source.
    pub fn source(mut self, source: Arc<dyn RecordSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the generation backend.
    pub fn generation_backend(mut self, backend: Arc<dyn GenerationBackend>) -> Self {
        self.generation_backend = Some(backend);
        self
    }

    /// Build the [`RiskAssistant`], validating that all required fields are
    /// set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing.
    pub fn build(self) -> Result<RiskAssistant> {
        let config = self.config.unwrap_or_default();
        let source =
            self.source.ok_or_else(|| RagError::ConfigError("source is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let generation_backend = self
            .generation_backend
            .ok_or_else(|| RagError::ConfigError("generation_backend is required".to_string()))?;

        let corpus = Arc::new(CorpusIndex::new(source, embedding_provider));
        Ok(RiskAssistant {
            config,
            retriever: Retriever::new(Arc::clone(&corpus)),
            corpus,
            synthesizer: AnswerSynthesizer::new(generation_backend),
        })
    }
}
