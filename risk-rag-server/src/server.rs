use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use risk_rag::{Answer, RiskAssistant};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::protocol::{AskRequest, ErrorResponse, HealthResponse};

const HOST_ENV: &str = "RISK_RAG_HOST";
const PORT_ENV: &str = "RISK_RAG_PORT";

#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<RiskAssistant>,
}

impl AppState {
    pub fn new(assistant: RiskAssistant) -> Self {
        Self { assistant: Arc::new(assistant) }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8082 }
    }
}

impl ServerConfig {
    /// Defaults overridden by `RISK_RAG_HOST` and `RISK_RAG_PORT`.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Ok(host) = std::env::var(HOST_ENV) {
            config.host = host;
        }
        if let Ok(port) = std::env::var(PORT_ENV) {
            config.port = port.parse().with_context(|| format!("invalid {PORT_ENV}: {port}"))?;
        }
        Ok(config)
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/ask", post(ask))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(config: ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for risk-rag server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("risk-rag listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok".to_string() })
}

async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<Answer>, (StatusCode, Json<ErrorResponse>)> {
    if request.question.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, Json(ErrorResponse::new("question cannot be empty"))));
    }

    match state.assistant.answer_question(&request.question).await {
        Ok(answer) => Ok(Json(answer)),
        Err(e) => {
            error!(error = %e, "failed to answer question");
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse::new(e.to_string()))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_binds_all_interfaces() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8082);
    }
}
