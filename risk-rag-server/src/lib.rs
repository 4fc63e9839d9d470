//! `risk-rag-server` exposes a [`RiskAssistant`](risk_rag::RiskAssistant)
//! over HTTP: one JSON endpoint for questions and a health probe.

pub mod protocol;
pub mod server;

pub use server::{AppState, ServerConfig, app_router, run_server};
