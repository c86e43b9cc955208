//! Combined community directory

use std::sync::Arc;

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::organizations::OrganizationResponse;
use super::profiles::{search_term, ProfileResponse};
use crate::db::{OrganizationFilter, OrganizationRepo, ProfileRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{MaybeAuthUser, QueryParams};
use crate::models::{Paginated, Pagination, PaginationParams};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CommunityParams {
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Members and organizations matching one query, paged independently
#[derive(Debug, Serialize)]
pub struct CommunityResponse {
    pub members: Paginated<ProfileResponse>,
    pub organizations: Paginated<OrganizationResponse>,
}

/// GET /community
async fn search_community(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    QueryParams(params): QueryParams<CommunityParams>,
) -> Result<Json<CommunityResponse>, ApiError> {
    let page = Pagination::from(PaginationParams {
        page: params.page,
        per_page: params.per_page,
    });
    let search = search_term(params.q);
    let filter = OrganizationFilter {
        search: search.clone(),
        kind: None,
    };

    let profiles = ProfileRepo::new(&state.pool);
    let organizations = OrganizationRepo::new(&state.pool);
    let (members, orgs) = tokio::try_join!(
        profiles.list(search.as_deref(), page),
        organizations.list(&filter, viewer, page),
    )?;

    Ok(Json(CommunityResponse {
        members: members.map(ProfileResponse::from),
        organizations: orgs.map(OrganizationResponse::from),
    }))
}

/// Community routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/community", get(search_community))
}
