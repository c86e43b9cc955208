//! Entanglement (connection) endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{Entanglement, EntanglementRepo, EntanglementView};
use crate::http::error::ApiError;
use crate::http::extractors::{AuthUser, JsonBody, QueryParams, ValidUuid};
use crate::models::{EntanglementStatus, ValidationError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RequestEntanglement {
    pub addressee_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct EntanglementListParams {
    pub status: Option<String>,
}

/// Entanglement response
#[derive(Debug, Serialize)]
pub struct EntanglementResponse {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub addressee_id: Uuid,
    pub status: String,
    pub created_at: String,
    pub responded_at: Option<String>,
}

impl From<Entanglement> for EntanglementResponse {
    fn from(e: Entanglement) -> Self {
        Self {
            id: e.id,
            requester_id: e.requester_id,
            addressee_id: e.addressee_id,
            status: e.status,
            created_at: e.created_at.to_rfc3339(),
            responded_at: e.responded_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Entanglement from the caller's side
#[derive(Debug, Serialize)]
pub struct EntanglementViewResponse {
    pub id: Uuid,
    pub status: String,
    pub other_id: Uuid,
    pub other_name: String,
    pub other_avatar_url: Option<String>,
    pub outgoing: bool,
    pub created_at: String,
    pub responded_at: Option<String>,
}

impl From<EntanglementView> for EntanglementViewResponse {
    fn from(v: EntanglementView) -> Self {
        Self {
            id: v.id,
            status: v.status,
            other_id: v.other_id,
            other_name: v.other_name,
            other_avatar_url: v.other_avatar_url,
            outgoing: v.outgoing,
            created_at: v.created_at.to_rfc3339(),
            responded_at: v.responded_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// POST /entanglements - request a connection (idempotent)
async fn request_entanglement(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
    JsonBody(req): JsonBody<RequestEntanglement>,
) -> Result<Json<EntanglementResponse>, ApiError> {
    if req.addressee_id == me {
        return Err(ValidationError::SelfReference {
            field: "addressee_id",
        }
        .into());
    }

    let entanglement = EntanglementRepo::new(&state.pool)
        .request(me, req.addressee_id)
        .await?;

    Ok(Json(EntanglementResponse::from(entanglement)))
}

async fn respond(
    state: &AppState,
    id: Uuid,
    me: Uuid,
    accept: bool,
) -> Result<Json<EntanglementResponse>, ApiError> {
    let updated = EntanglementRepo::new(&state.pool)
        .respond(id, me, accept)
        .await?;
    Ok(Json(EntanglementResponse::from(updated)))
}

/// POST /entanglements/{id}/accept
async fn accept(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<EntanglementResponse>, ApiError> {
    respond(&state, id, me, true).await
}

/// POST /entanglements/{id}/decline
async fn decline(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<EntanglementResponse>, ApiError> {
    respond(&state, id, me, false).await
}

/// GET /entanglements - the caller's connections
async fn list_entanglements(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
    QueryParams(params): QueryParams<EntanglementListParams>,
) -> Result<Json<Vec<EntanglementViewResponse>>, ApiError> {
    let status = params
        .status
        .as_deref()
        .map(EntanglementStatus::parse)
        .transpose()?;

    let views = EntanglementRepo::new(&state.pool)
        .list_for(me, status)
        .await?;

    Ok(Json(
        views.into_iter().map(EntanglementViewResponse::from).collect(),
    ))
}

/// Entanglement routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/entanglements",
            get(list_entanglements).post(request_entanglement),
        )
        .route("/entanglements/{id}/accept", post(accept))
        .route("/entanglements/{id}/decline", post(decline))
}
