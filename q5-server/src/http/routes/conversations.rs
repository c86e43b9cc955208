//! Direct messaging endpoints and the realtime message stream

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{ConversationRepo, ConversationSummary, DirectMessage};
use crate::http::error::ApiError;
use crate::http::extractors::{AuthUser, JsonBody, QueryParams, ValidUuid};
use crate::models::{MessageBody, Paginated, Pagination, PaginationParams, ValidationError};
use crate::realtime::{member_stream, MessageEvent};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OpenConversationRequest {
    pub member_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub body: String,
}

/// Conversation response
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub id: Uuid,
    pub other_id: Uuid,
    pub created_at: String,
}

/// Inbox row
#[derive(Debug, Serialize)]
pub struct ConversationSummaryResponse {
    pub id: Uuid,
    pub other_id: Uuid,
    pub other_name: String,
    pub other_avatar_url: Option<String>,
    pub last_message: Option<String>,
    pub last_message_at: Option<String>,
    pub unread_count: i64,
    pub created_at: String,
}

impl From<ConversationSummary> for ConversationSummaryResponse {
    fn from(s: ConversationSummary) -> Self {
        Self {
            id: s.id,
            other_id: s.other_id,
            other_name: s.other_name,
            other_avatar_url: s.other_avatar_url,
            last_message: s.last_message,
            last_message_at: s.last_message_at.map(|t| t.to_rfc3339()),
            unread_count: s.unread_count,
            created_at: s.created_at.to_rfc3339(),
        }
    }
}

/// Message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub created_at: String,
    pub read_at: Option<String>,
}

impl From<DirectMessage> for MessageResponse {
    fn from(m: DirectMessage) -> Self {
        Self {
            id: m.id,
            conversation_id: m.conversation_id,
            sender_id: m.sender_id,
            body: m.body,
            created_at: m.created_at.to_rfc3339(),
            read_at: m.read_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub marked: u64,
}

/// GET /conversations - the caller's inbox
async fn list_conversations(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
) -> Result<Json<Vec<ConversationSummaryResponse>>, ApiError> {
    let rows = ConversationRepo::new(&state.pool).list_for(me).await?;
    Ok(Json(
        rows.into_iter()
            .map(ConversationSummaryResponse::from)
            .collect(),
    ))
}

/// POST /conversations - get or create for the pair
async fn open_conversation(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
    JsonBody(req): JsonBody<OpenConversationRequest>,
) -> Result<Json<ConversationResponse>, ApiError> {
    if req.member_id == me {
        return Err(ValidationError::SelfReference { field: "member_id" }.into());
    }

    let conversation = ConversationRepo::new(&state.pool)
        .get_or_create(me, req.member_id)
        .await?;

    Ok(Json(ConversationResponse {
        id: conversation.id,
        other_id: conversation.other_member(me),
        created_at: conversation.created_at.to_rfc3339(),
    }))
}

/// GET /conversations/{id}/messages - oldest first, members only
async fn list_messages(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
    ValidUuid(id): ValidUuid,
    QueryParams(params): QueryParams<PaginationParams>,
) -> Result<Json<Paginated<MessageResponse>>, ApiError> {
    let result = ConversationRepo::new(&state.pool)
        .messages(id, me, Pagination::from(params))
        .await?;
    Ok(Json(result.map(MessageResponse::from)))
}

/// POST /conversations/{id}/messages - store and publish
async fn send_message(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
    ValidUuid(id): ValidUuid,
    JsonBody(req): JsonBody<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let body = MessageBody::new(&req.body)?;
    let (conversation, message) = ConversationRepo::new(&state.pool)
        .send(id, me, body)
        .await?;

    state.hub.publish(MessageEvent::new(&conversation, &message));
    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}

/// POST /conversations/{id}/read
async fn mark_read(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let marked = ConversationRepo::new(&state.pool).mark_read(id, me).await?;
    Ok(Json(MarkReadResponse { marked }))
}

/// GET /messages/stream - SSE of new messages for the caller
async fn message_stream(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    tracing::debug!(member = %me, "message stream opened");

    let events = member_stream(state.hub.subscribe(), me).map(|message| {
        Event::default()
            .event("message")
            .id(message.id.to_string())
            .json_data(&message)
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Messaging routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/conversations",
            get(list_conversations).post(open_conversation),
        )
        .route(
            "/conversations/{id}/messages",
            get(list_messages).post(send_message),
        )
        .route("/conversations/{id}/read", post(mark_read))
}

/// Long-lived stream route, mounted outside the request timeout
pub fn stream_router() -> Router<Arc<AppState>> {
    Router::new().route("/messages/stream", get(message_stream))
}
