//! Job and product marketplace endpoints (browse only)

use std::sync::Arc;

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::profiles::search_term;
use crate::db::{Job, JobFilter, MarketplaceRepo, Product, ProductFilter};
use crate::http::error::ApiError;
use crate::http::extractors::{QueryParams, ValidUuid};
use crate::models::{Paginated, Pagination, PaginationParams};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct JobListParams {
    pub q: Option<String>,
    pub organization: Option<String>,
    pub employment_type: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub organization: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: Uuid,
    pub organization_slug: String,
    pub organization_name: String,
    pub title: String,
    pub location: Option<String>,
    pub employment_type: String,
    pub description: String,
    pub apply_url: Option<String>,
    pub created_at: String,
}

impl From<Job> for JobResponse {
    fn from(j: Job) -> Self {
        Self {
            id: j.id,
            organization_slug: j.organization_slug,
            organization_name: j.organization_name,
            title: j.title,
            location: j.location,
            employment_type: j.employment_type,
            description: j.description,
            apply_url: j.apply_url,
            created_at: j.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub organization_slug: String,
    pub organization_name: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub price_cents: Option<i64>,
    pub image_url: Option<String>,
    pub datasheet_url: Option<String>,
    pub created_at: String,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            organization_slug: p.organization_slug,
            organization_name: p.organization_name,
            name: p.name,
            category: p.category,
            description: p.description,
            price_cents: p.price_cents,
            image_url: p.image_url,
            datasheet_url: p.datasheet_url,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

/// GET /jobs
async fn list_jobs(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<JobListParams>,
) -> Result<Json<Paginated<JobResponse>>, ApiError> {
    let page = Pagination::from(PaginationParams {
        page: params.page,
        per_page: params.per_page,
    });
    let filter = JobFilter {
        search: search_term(params.q),
        organization: search_term(params.organization),
        employment_type: search_term(params.employment_type),
    };

    let result = MarketplaceRepo::new(&state.pool)
        .list_jobs(&filter, page)
        .await?;
    Ok(Json(result.map(JobResponse::from)))
}

/// GET /jobs/{id}
async fn get_job(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<JobResponse>, ApiError> {
    let job = MarketplaceRepo::new(&state.pool).get_job(id).await?;
    Ok(Json(JobResponse::from(job)))
}

/// GET /products
async fn list_products(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<ProductListParams>,
) -> Result<Json<Paginated<ProductResponse>>, ApiError> {
    let page = Pagination::from(PaginationParams {
        page: params.page,
        per_page: params.per_page,
    });
    let filter = ProductFilter {
        search: search_term(params.q),
        category: search_term(params.category),
        organization: search_term(params.organization),
    };

    let result = MarketplaceRepo::new(&state.pool)
        .list_products(&filter, page)
        .await?;
    Ok(Json(result.map(ProductResponse::from)))
}

/// GET /products/{id}
async fn get_product(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = MarketplaceRepo::new(&state.pool).get_product(id).await?;
    Ok(Json(ProductResponse::from(product)))
}

/// Marketplace routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs", get(list_jobs))
        .route("/jobs/{id}", get(get_job))
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
}
