//! Health check and keep-alive endpoints

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Health check response: status, module name and version
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "vvv-bot".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /
///
/// Plain-text ping target for uptime monitors.
pub async fn keep_alive() -> &'static str {
    "🤖 Bot de Classement V.V.V - En ligne\n"
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
