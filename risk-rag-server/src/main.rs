use std::sync::Arc;

use risk_rag::{
    AssistantConfig, JsonFileSource, RiskAssistant,
    ollama::{OllamaChatBackend, OllamaConfig, OllamaEmbeddingProvider},
};
use risk_rag_server::server::{AppState, ServerConfig, run_server};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = AssistantConfig::from_env()?;
    let ollama = OllamaConfig::from_env()?;
    info!(data = %config.data_path.display(), base_url = %ollama.base_url, "starting risk-rag");

    let assistant = RiskAssistant::builder()
        .source(Arc::new(JsonFileSource::new(&config.data_path)))
        .embedding_provider(Arc::new(OllamaEmbeddingProvider::new(ollama.clone())?))
        .generation_backend(Arc::new(OllamaChatBackend::new(ollama)?))
        .config(config)
        .build()?;

    // Warm the index; a failure here is retried on the first question.
    if let Err(e) = assistant.corpus().ensure_fresh().await {
        warn!(error = %e, "initial index build failed; retrying on first question");
    }

    run_server(ServerConfig::from_env()?, AppState::new(assistant)).await
}
