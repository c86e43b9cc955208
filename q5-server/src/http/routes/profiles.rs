//! Profile and badge survey endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use q5_core::{compute_q5_badge, BadgeInput, Q5Badge};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{Profile, ProfileRepo, ProfileUpdate};
use crate::http::error::ApiError;
use crate::http::extractors::{AuthUser, JsonBody, QueryParams, ValidUuid};
use crate::models::{
    optional_text, optional_url, FullName, Paginated, Pagination, PaginationParams,
    ValidationError,
};
use crate::state::AppState;

/// Directory query
#[derive(Debug, Default, Deserialize)]
pub struct ProfileListParams {
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Upsert request for the caller's profile
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: String,
    pub headline: Option<String>,
    pub role: Option<String>,
    pub affiliation: Option<String>,
    pub education_level: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl UpdateProfileRequest {
    fn validate(self) -> Result<ProfileUpdate, ValidationError> {
        Ok(ProfileUpdate {
            full_name: FullName::new(&self.full_name)?,
            headline: optional_text("headline", self.headline.as_deref(), 200)?,
            role: optional_text("role", self.role.as_deref(), 120)?,
            affiliation: optional_text("affiliation", self.affiliation.as_deref(), 200)?,
            education_level: optional_text(
                "education_level",
                self.education_level.as_deref(),
                120,
            )?,
            bio: optional_text("bio", self.bio.as_deref(), 2000)?,
            avatar_url: optional_url("avatar_url", self.avatar_url.as_deref())?,
        })
    }
}

/// Badge survey answers
#[derive(Debug, Deserialize)]
pub struct BadgeSurvey {
    pub involvement: u8,
    pub contribution: u8,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub education: String,
    pub impact: u8,
}

impl BadgeSurvey {
    fn compute(self) -> Result<Q5Badge, ValidationError> {
        let input = BadgeInput::new(
            self.involvement,
            self.contribution,
            self.role,
            self.education,
            self.impact,
        )?;
        Ok(compute_q5_badge(&input))
    }
}

/// Stored badge
#[derive(Debug, Serialize)]
pub struct BadgeView {
    pub level: i16,
    pub label: String,
    pub review_status: String,
    pub rationale: Option<String>,
    pub updated_at: Option<String>,
}

/// Profile response
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub full_name: String,
    pub headline: Option<String>,
    pub role: Option<String>,
    pub affiliation: Option<String>,
    pub education_level: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub badge: Option<BadgeView>,
    pub entanglement_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Profile> for ProfileResponse {
    fn from(p: Profile) -> Self {
        let badge = match (p.badge_level, p.badge_label, p.badge_review_status) {
            (Some(level), Some(label), Some(review_status)) => Some(BadgeView {
                level,
                label,
                review_status,
                rationale: p.badge_rationale,
                updated_at: p.badge_updated_at.map(|t| t.to_rfc3339()),
            }),
            _ => None,
        };

        Self {
            id: p.id,
            full_name: p.full_name,
            headline: p.headline,
            role: p.role,
            affiliation: p.affiliation,
            education_level: p.education_level,
            bio: p.bio,
            avatar_url: p.avatar_url,
            badge,
            entanglement_count: p.entanglement_count,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

/// Non-blank search text
pub(crate) fn search_term(q: Option<String>) -> Option<String> {
    q.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

/// GET /profiles - member directory
async fn list_profiles(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<ProfileListParams>,
) -> Result<Json<Paginated<ProfileResponse>>, ApiError> {
    let page = Pagination::from(PaginationParams {
        page: params.page,
        per_page: params.per_page,
    });
    let search = search_term(params.q);

    let result = ProfileRepo::new(&state.pool)
        .list(search.as_deref(), page)
        .await?;

    Ok(Json(result.map(ProfileResponse::from)))
}

/// GET /profiles/{id}
async fn get_profile(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = ProfileRepo::new(&state.pool).get(id).await?;
    Ok(Json(ProfileResponse::from(profile)))
}

/// GET /profiles/me
async fn get_me(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = ProfileRepo::new(&state.pool).get(me).await?;
    Ok(Json(ProfileResponse::from(profile)))
}

/// PUT /profiles/me - create or update the caller's profile
async fn update_me(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
    JsonBody(req): JsonBody<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let update = req.validate()?;
    let profile = ProfileRepo::new(&state.pool).upsert(me, update).await?;
    Ok(Json(ProfileResponse::from(profile)))
}

/// POST /profiles/me/badge - score the survey and store the badge
async fn submit_badge(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
    JsonBody(survey): JsonBody<BadgeSurvey>,
) -> Result<Json<Q5Badge>, ApiError> {
    let badge = survey.compute()?;
    ProfileRepo::new(&state.pool).set_badge(me, &badge).await?;
    Ok(Json(badge))
}

/// POST /badge/preview - score without storing
async fn preview_badge(
    JsonBody(survey): JsonBody<BadgeSurvey>,
) -> Result<Json<Q5Badge>, ApiError> {
    Ok(Json(survey.compute()?))
}

/// Profile routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profiles", get(list_profiles))
        .route("/profiles/me", get(get_me).put(update_me))
        .route("/profiles/me/badge", post(submit_badge))
        .route("/profiles/{id}", get(get_profile))
        .route("/badge/preview", post(preview_badge))
}
