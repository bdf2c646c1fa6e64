//! vvv-bot library - chat adapter for the V.V.V leaderboard
//!
//! Receives chat messages over HTTP, routes them to quiz confirmation,
//! standings bootstrap or prefixed commands, and answers with the reply
//! messages the chat transport should post.

use axum::Router;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use vvv_core::config::AdminRegistry;
use vvv_core::confirmation::ConfirmationSessions;
use vvv_core::LeaderboardStore;

pub mod api;
pub mod commands;
pub mod dispatch;

/// Application state shared across HTTP handlers
///
/// Handlers that need more than one of these lock them in field order:
/// sessions, then store, then admins.
#[derive(Clone)]
pub struct AppState {
    /// Pending quiz confirmations and standings requests
    pub sessions: Arc<Mutex<ConfirmationSessions>>,
    /// Players, moderation history, merge memory and backups
    pub store: Arc<Mutex<LeaderboardStore>>,
    /// Administrator list and command prefix
    pub admins: Arc<Mutex<AdminRegistry>>,
    /// Process start, reported by `ping` and `status`
    pub started_at: Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(store: LeaderboardStore, admins: AdminRegistry) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(ConfirmationSessions::new())),
            store: Arc::new(Mutex::new(store)),
            admins: Arc::new(Mutex::new(admins)),
            started_at: Instant::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/", get(api::keep_alive))
        .route("/api/message", post(api::post_message))
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
