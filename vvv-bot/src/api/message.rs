//! Message ingress endpoint
//!
//! The chat transport posts every incoming message here and sends back each
//! entry of `replies`, in order, to the same thread.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{dispatch, AppState};

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub sender_id: String,
    pub thread_id: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Messages to post, each within the chat length limit
    pub replies: Vec<String>,
}

/// POST /api/message
pub async fn post_message(
    State(state): State<AppState>,
    Json(request): Json<MessageRequest>,
) -> Json<MessageResponse> {
    debug!(
        "Message from {} in {} ({} chars)",
        request.sender_id,
        request.thread_id,
        request.text.chars().count()
    );
    let replies = dispatch::handle_message(&state, &request.sender_id, &request.thread_id, &request.text).await;
    Json(MessageResponse { replies })
}
