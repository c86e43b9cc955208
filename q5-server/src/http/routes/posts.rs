//! Feed endpoints: posts, likes and comments

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{Comment, CommentRepo, FeedFilter, PostRepo, PostWithStats};
use crate::http::error::ApiError;
use crate::http::extractors::{
    AuthUser, JsonBody, MaybeAuthUser, QueryParams, ValidUuid,
};
use crate::models::{
    normalize_tag_filter, optional_url, CommentBody, Paginated, Pagination, PaginationParams,
    PostBody,
};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct FeedParams {
    pub tag: Option<String>,
    pub author: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub body: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
}

/// Post response
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_avatar_url: Option<String>,
    pub body: String,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    pub like_count: i64,
    pub comment_count: i64,
    pub liked_by_me: bool,
    pub created_at: String,
}

impl From<PostWithStats> for PostResponse {
    fn from(p: PostWithStats) -> Self {
        Self {
            id: p.id,
            author_id: p.author_id,
            author_name: p.author_name,
            author_avatar_url: p.author_avatar_url,
            body: p.body,
            image_url: p.image_url,
            tags: p.tags,
            like_count: p.like_count,
            comment_count: p.comment_count,
            liked_by_me: p.liked_by_me,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

/// Comment response
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub body: String,
    pub created_at: String,
}

impl From<Comment> for CommentResponse {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            post_id: c.post_id,
            author_id: c.author_id,
            author_name: c.author_name,
            body: c.body,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

/// Like toggle response
#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub like_count: i64,
}

/// GET /posts - newest-first feed
async fn list_posts(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    QueryParams(params): QueryParams<FeedParams>,
) -> Result<Json<Paginated<PostResponse>>, ApiError> {
    let page = Pagination::from(PaginationParams {
        page: params.page,
        per_page: params.per_page,
    });
    let filter = FeedFilter {
        tag: params.tag.as_deref().and_then(normalize_tag_filter),
        author: params.author,
    };

    let result = PostRepo::new(&state.pool).list(&filter, viewer, page).await?;
    Ok(Json(result.map(PostResponse::from)))
}

/// POST /posts
async fn create_post(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
    JsonBody(req): JsonBody<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    let body = PostBody::new(&req.body)?;
    let image_url = optional_url("image_url", req.image_url.as_deref())?;

    let post = PostRepo::new(&state.pool).create(me, body, image_url).await?;
    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

/// GET /posts/{id}
async fn get_post(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<PostResponse>, ApiError> {
    let post = PostRepo::new(&state.pool).get(id, viewer).await?;
    Ok(Json(PostResponse::from(post)))
}

/// DELETE /posts/{id} - author only
async fn delete_post(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    PostRepo::new(&state.pool).delete(id, me).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /posts/{id}/like - toggle
async fn toggle_like(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<LikeResponse>, ApiError> {
    let outcome = PostRepo::new(&state.pool).toggle_like(id, me).await?;
    Ok(Json(LikeResponse {
        liked: outcome.active,
        like_count: outcome.count,
    }))
}

/// GET /posts/{id}/comments - oldest first
async fn list_comments(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    QueryParams(params): QueryParams<PaginationParams>,
) -> Result<Json<Paginated<CommentResponse>>, ApiError> {
    let result = CommentRepo::new(&state.pool)
        .list_for_post(id, Pagination::from(params))
        .await?;
    Ok(Json(result.map(CommentResponse::from)))
}

/// POST /posts/{id}/comments
async fn create_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
    ValidUuid(id): ValidUuid,
    JsonBody(req): JsonBody<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    let body = CommentBody::new(&req.body)?;
    let comment = CommentRepo::new(&state.pool).create(id, me, body).await?;
    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}

/// DELETE /comments/{id} - author only
async fn delete_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    CommentRepo::new(&state.pool).delete(id, me).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Feed routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/{id}", get(get_post).delete(delete_post))
        .route("/posts/{id}/like", post(toggle_like))
        .route(
            "/posts/{id}/comments",
            get(list_comments).post(create_comment),
        )
        .route("/comments/{id}", delete(delete_comment))
}
