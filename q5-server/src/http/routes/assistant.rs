//! AI chat assistant endpoint

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::assistant::{validate_conversation, AssistantError, ChatMessage};
use crate::http::error::ApiError;
use crate::http::extractors::{AuthUser, JsonBody};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: ChatMessage,
}

/// POST /assistant/chat
async fn chat(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
    JsonBody(req): JsonBody<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let backend = state
        .assistant
        .as_ref()
        .ok_or(AssistantError::NotConfigured)?;

    validate_conversation(&req.messages)?;

    tracing::info!(member = %me, turns = req.messages.len(), "assistant chat");
    let reply = backend.complete(&req.messages).await?;

    Ok(Json(ChatResponse {
        reply: ChatMessage::assistant(reply),
    }))
}

/// Assistant routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/assistant/chat", post(chat))
}
