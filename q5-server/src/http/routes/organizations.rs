//! Organization directory endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::profiles::search_term;
use crate::db::{NewOrganization, Organization, OrganizationFilter, OrganizationRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{AuthUser, JsonBody, MaybeAuthUser, QueryParams};
use crate::models::{
    optional_text, optional_url, OrgSlug, OrganizationKind, OrganizationName, Paginated,
    Pagination, PaginationParams, ValidationError,
};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OrganizationListParams {
    pub q: Option<String>,
    pub kind: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Create organization request
#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub slug: String,
    pub name: String,
    pub kind: String,
    pub description: Option<String>,
    pub website: Option<String>,
}

impl CreateOrganizationRequest {
    fn validate(self) -> Result<NewOrganization, ValidationError> {
        Ok(NewOrganization {
            slug: OrgSlug::new(&self.slug)?,
            name: OrganizationName::new(&self.name)?,
            kind: OrganizationKind::parse(&self.kind)?,
            description: optional_text("description", self.description.as_deref(), 5000)?,
            website: optional_url("website", self.website.as_deref())?,
        })
    }
}

/// Organization response
#[derive(Debug, Serialize)]
pub struct OrganizationResponse {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub kind: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub owner_id: Uuid,
    pub follower_count: i64,
    pub followed_by_me: bool,
    pub created_at: String,
}

impl From<Organization> for OrganizationResponse {
    fn from(o: Organization) -> Self {
        Self {
            id: o.id,
            slug: o.slug,
            name: o.name,
            kind: o.kind,
            description: o.description,
            website: o.website,
            owner_id: o.owner_id,
            follower_count: o.follower_count,
            followed_by_me: o.followed_by_me,
            created_at: o.created_at.to_rfc3339(),
        }
    }
}

/// Follow toggle response
#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub following: bool,
    pub follower_count: i64,
}

/// GET /organizations
async fn list_organizations(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    QueryParams(params): QueryParams<OrganizationListParams>,
) -> Result<Json<Paginated<OrganizationResponse>>, ApiError> {
    let page = Pagination::from(PaginationParams {
        page: params.page,
        per_page: params.per_page,
    });
    let filter = OrganizationFilter {
        search: search_term(params.q),
        kind: params
            .kind
            .as_deref()
            .map(OrganizationKind::parse)
            .transpose()?,
    };

    let result = OrganizationRepo::new(&state.pool)
        .list(&filter, viewer, page)
        .await?;

    Ok(Json(result.map(OrganizationResponse::from)))
}

/// GET /organizations/{slug}
async fn get_organization(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(slug): Path<String>,
) -> Result<Json<OrganizationResponse>, ApiError> {
    let org = OrganizationRepo::new(&state.pool).get(&slug, viewer).await?;
    Ok(Json(OrganizationResponse::from(org)))
}

/// POST /organizations - caller becomes owner
async fn create_organization(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
    JsonBody(req): JsonBody<CreateOrganizationRequest>,
) -> Result<(StatusCode, Json<OrganizationResponse>), ApiError> {
    let org = req.validate()?;
    let created = OrganizationRepo::new(&state.pool).create(me, org).await?;
    Ok((StatusCode::CREATED, Json(OrganizationResponse::from(created))))
}

/// POST /organizations/{slug}/follow - toggle
async fn toggle_follow(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
    Path(slug): Path<String>,
) -> Result<Json<FollowResponse>, ApiError> {
    let outcome = OrganizationRepo::new(&state.pool)
        .toggle_follow(&slug, me)
        .await?;

    Ok(Json(FollowResponse {
        following: outcome.active,
        follower_count: outcome.count,
    }))
}

/// Organization routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/organizations",
            get(list_organizations).post(create_organization),
        )
        .route("/organizations/{slug}", get(get_organization))
        .route("/organizations/{slug}/follow", post(toggle_follow))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(slug: &str, kind: &str) -> CreateOrganizationRequest {
        CreateOrganizationRequest {
            slug: slug.into(),
            name: "Qubit Labs".into(),
            kind: kind.into(),
            description: None,
            website: Some("https://qubit.example".into()),
        }
    }

    #[test]
    fn create_request_validation() {
        let org = request("qubit-labs", "research_group").validate().unwrap();
        assert_eq!(org.slug.as_str(), "qubit-labs");
        assert_eq!(org.kind, OrganizationKind::ResearchGroup);

        assert!(matches!(
            request("Qubit Labs", "company").validate().unwrap_err(),
            ValidationError::InvalidFormat { field: "slug", .. }
        ));
        assert!(matches!(
            request("qubit-labs", "university").validate().unwrap_err(),
            ValidationError::InvalidVariant { field: "kind", .. }
        ));
    }
}
