//! Ollama-backed embedding provider and generation backend.
//!
//! This module is only available when the `ollama` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::{ChatMessage, GenerationBackend};

/// The default Ollama endpoint.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// The default embedding model (`all-minilm`, 384 dimensions).
const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";

/// Dimensionality of `all-minilm`.
const DEFAULT_DIMENSIONS: usize = 384;

/// The default chat model.
const DEFAULT_CHAT_MODEL: &str = "mistral";

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Connection settings shared by the Ollama clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server.
    pub base_url: String,
    /// Model used for embeddings.
    pub embedding_model: String,
    /// Dimensionality of `embedding_model`.
    pub embedding_dimensions: usize,
    /// Model used for chat answers.
    pub chat_model: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dimensions: DEFAULT_DIMENSIONS,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl OllamaConfig {
    /// Defaults overridden by `OLLAMA_BASE_URL`, `RISK_RAG_EMBEDDING_MODEL`,
    /// `RISK_RAG_EMBEDDING_DIMENSIONS`, `RISK_RAG_CHAT_MODEL` and
    /// `RISK_RAG_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(model) = std::env::var("RISK_RAG_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }
        if let Ok(dims) = std::env::var("RISK_RAG_EMBEDDING_DIMENSIONS") {
            config.embedding_dimensions = dims.parse().map_err(|_| {
                RagError::ConfigError(format!("invalid RISK_RAG_EMBEDDING_DIMENSIONS: {dims}"))
            })?;
        }
        if let Ok(model) = std::env::var("RISK_RAG_CHAT_MODEL") {
            config.chat_model = model;
        }
        if let Ok(secs) = std::env::var("RISK_RAG_TIMEOUT_SECS") {
            config.timeout_secs = secs.parse().map_err(|_| {
                RagError::ConfigError(format!("invalid RISK_RAG_TIMEOUT_SECS: {secs}"))
            })?;
        }
        Ok(config)
    }

    fn client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| RagError::ConfigError(format!("failed to build HTTP client: {e}")))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}

// ── Ollama API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ChatResponseMessage>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

async fn error_detail(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error).unwrap_or(body);
    format!("API returned {status}: {detail}")
}

// ── EmbeddingProvider implementation ───────────────────────────────

/// An [`EmbeddingProvider`] backed by Ollama's `/api/embed` endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use risk_rag::ollama::{OllamaConfig, OllamaEmbeddingProvider};
///
/// let provider = OllamaEmbeddingProvider::new(OllamaConfig::from_env()?)?;
/// let vector = provider.embed("how many points ended in 2023").await?;
/// ```
pub struct OllamaEmbeddingProvider {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaEmbeddingProvider {
    /// Create a provider from connection settings.
    pub fn new(config: OllamaConfig) -> Result<Self> {
        if config.embedding_dimensions == 0 {
            return Err(RagError::ConfigError(
                "embedding_dimensions must be greater than zero".into(),
            ));
        }
        Ok(Self { client: config.client()?, config })
    }

    fn failure(message: String) -> RagError {
        RagError::EmbeddingError { provider: "Ollama".into(), message }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "Ollama", text_len = text.len(), "embedding single text");

        let vectors = self.embed_batch(&[text]).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| Self::failure("API returned empty response".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = "Ollama",
            batch_size = texts.len(),
            model = %self.config.embedding_model,
            "embedding batch"
        );

        let request_body =
            EmbedRequest { model: &self.config.embedding_model, input: texts.to_vec() };

        let response = self
            .client
            .post(self.config.endpoint("/api/embed"))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "Ollama", error = %e, "request failed");
                Self::failure(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let detail = error_detail(response).await;
            error!(provider = "Ollama", %detail, "API error");
            return Err(Self::failure(detail));
        }

        let embed_response: EmbedResponse = response.json().await.map_err(|e| {
            error!(provider = "Ollama", error = %e, "failed to parse response");
            Self::failure(format!("failed to parse response: {e}"))
        })?;

        Ok(embed_response.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.config.embedding_dimensions
    }
}

// ── GenerationBackend implementation ───────────────────────────────

/// A [`GenerationBackend`] backed by Ollama's non-streaming `/api/chat`
/// endpoint.
pub struct OllamaChatBackend {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaChatBackend {
    /// Create a backend from connection settings.
    pub fn new(config: OllamaConfig) -> Result<Self> {
        Ok(Self { client: config.client()?, config })
    }

    fn failure(message: String) -> RagError {
        RagError::GenerationError { backend: "Ollama".into(), message }
    }
}

#[async_trait]
impl GenerationBackend for OllamaChatBackend {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn generate(&self, system: &str, messages: &[ChatMessage]) -> Result<Option<String>> {
        let mut all = Vec::with_capacity(messages.len() + 1);
        all.push(ChatMessage::system(system));
        all.extend_from_slice(messages);

        debug!(backend = "Ollama", model = %self.config.chat_model, messages = all.len(), "chat request");

        let request_body = ChatRequest { model: &self.config.chat_model, messages: all, stream: false };

        let response = self
            .client
            .post(self.config.endpoint("/api/chat"))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(backend = "Ollama", error = %e, "request failed");
                Self::failure(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let detail = error_detail(response).await;
            error!(backend = "Ollama", %detail, "API error");
            return Err(Self::failure(detail));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            error!(backend = "Ollama", error = %e, "failed to parse response");
            Self::failure(format!("failed to parse response: {e}"))
        })?;

        Ok(chat_response.message.and_then(|m| m.content).filter(|c| !c.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let config =
            OllamaConfig { base_url: "http://ollama:11434/".into(), ..OllamaConfig::default() };
        assert_eq!(config.endpoint("/api/chat"), "http://ollama:11434/api/chat");
    }

    #[test]
    fn chat_response_without_content_is_none() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"done": true}"#).unwrap();
        assert!(parsed.message.and_then(|m| m.content).is_none());
    }

    #[test]
    fn embed_request_shape() {
        let body = EmbedRequest { model: "all-minilm", input: vec!["a", "b"] };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "model": "all-minilm", "input": ["a", "b"] }));
    }

    #[test]
    fn zero_dimensions_rejected() {
        let config = OllamaConfig { embedding_dimensions: 0, ..OllamaConfig::default() };
        assert!(OllamaEmbeddingProvider::new(config).is_err());
    }
}
