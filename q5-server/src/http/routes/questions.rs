//! Q&A endpoints: questions, answers and votes

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::profiles::search_term;
use crate::db::{
    AnswerRepo, AnswerWithVotes, NewQuestion, QuestionFilter, QuestionRepo, QuestionSummary,
    Thread, ToggleOutcome,
};
use crate::http::error::ApiError;
use crate::http::extractors::{
    AuthUser, JsonBody, MaybeAuthUser, QueryParams, ValidUuid,
};
use crate::models::{
    normalize_tag_filter, AnswerBody, Paginated, Pagination, PaginationParams, QuestionBody,
    QuestionSort, QuestionTitle, TagList, ValidationError,
};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct QuestionListParams {
    pub tag: Option<String>,
    pub q: Option<String>,
    #[serde(default)]
    pub sort: QuestionSort,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateQuestionRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreateQuestionRequest {
    fn validate(self) -> Result<NewQuestion, ValidationError> {
        Ok(NewQuestion {
            title: QuestionTitle::new(&self.title)?,
            body: QuestionBody::new(&self.body)?,
            tags: TagList::new(self.tags.as_slice())?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAnswerRequest {
    pub body: String,
}

/// Question response
#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub vote_count: i64,
    pub answer_count: i64,
    pub voted_by_me: bool,
    pub created_at: String,
}

impl From<QuestionSummary> for QuestionResponse {
    fn from(q: QuestionSummary) -> Self {
        Self {
            id: q.id,
            author_id: q.author_id,
            author_name: q.author_name,
            title: q.title,
            body: q.body,
            tags: q.tags,
            vote_count: q.vote_count,
            answer_count: q.answer_count,
            voted_by_me: q.voted_by_me,
            created_at: q.created_at.to_rfc3339(),
        }
    }
}

/// Answer response
#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub id: Uuid,
    pub question_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub body: String,
    pub vote_count: i64,
    pub voted_by_me: bool,
    pub created_at: String,
}

impl From<AnswerWithVotes> for AnswerResponse {
    fn from(a: AnswerWithVotes) -> Self {
        Self {
            id: a.id,
            question_id: a.question_id,
            author_id: a.author_id,
            author_name: a.author_name,
            body: a.body,
            vote_count: a.vote_count,
            voted_by_me: a.voted_by_me,
            created_at: a.created_at.to_rfc3339(),
        }
    }
}

/// Question with ranked answers
#[derive(Debug, Serialize)]
pub struct ThreadResponse {
    pub question: QuestionResponse,
    pub answers: Vec<AnswerResponse>,
}

impl From<Thread> for ThreadResponse {
    fn from(t: Thread) -> Self {
        Self {
            question: QuestionResponse::from(t.question),
            answers: t.answers.into_iter().map(AnswerResponse::from).collect(),
        }
    }
}

/// Vote toggle response
#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub voted: bool,
    pub vote_count: i64,
}

impl From<ToggleOutcome> for VoteResponse {
    fn from(o: ToggleOutcome) -> Self {
        Self {
            voted: o.active,
            vote_count: o.count,
        }
    }
}

/// GET /questions
async fn list_questions(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    QueryParams(params): QueryParams<QuestionListParams>,
) -> Result<Json<Paginated<QuestionResponse>>, ApiError> {
    let page = Pagination::from(PaginationParams {
        page: params.page,
        per_page: params.per_page,
    });
    let filter = QuestionFilter {
        tag: params.tag.as_deref().and_then(normalize_tag_filter),
        search: search_term(params.q),
        sort: params.sort,
    };

    let result = QuestionRepo::new(&state.pool)
        .list(&filter, viewer, page)
        .await?;
    Ok(Json(result.map(QuestionResponse::from)))
}

/// POST /questions
async fn create_question(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
    JsonBody(req): JsonBody<CreateQuestionRequest>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    let question = req.validate()?;
    let created = QuestionRepo::new(&state.pool).create(me, question).await?;
    Ok((StatusCode::CREATED, Json(QuestionResponse::from(created))))
}

/// GET /questions/{id} - the thread
async fn get_thread(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<ThreadResponse>, ApiError> {
    let thread = QuestionRepo::new(&state.pool).get_thread(id, viewer).await?;
    Ok(Json(ThreadResponse::from(thread)))
}

/// POST /questions/{id}/answers
async fn create_answer(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
    ValidUuid(id): ValidUuid,
    JsonBody(req): JsonBody<CreateAnswerRequest>,
) -> Result<(StatusCode, Json<AnswerResponse>), ApiError> {
    let body = AnswerBody::new(&req.body)?;
    let answer = AnswerRepo::new(&state.pool).create(id, me, body).await?;
    Ok((StatusCode::CREATED, Json(AnswerResponse::from(answer))))
}

/// POST /questions/{id}/vote - toggle
async fn vote_question(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<VoteResponse>, ApiError> {
    let outcome = QuestionRepo::new(&state.pool).toggle_vote(id, me).await?;
    Ok(Json(VoteResponse::from(outcome)))
}

/// POST /answers/{id}/vote - toggle
async fn vote_answer(
    State(state): State<Arc<AppState>>,
    AuthUser(me): AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<VoteResponse>, ApiError> {
    let outcome = AnswerRepo::new(&state.pool).toggle_vote(id, me).await?;
    Ok(Json(VoteResponse::from(outcome)))
}

/// Q&A routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/questions", get(list_questions).post(create_question))
        .route("/questions/{id}", get(get_thread))
        .route("/questions/{id}/answers", post(create_answer))
        .route("/questions/{id}/vote", post(vote_question))
        .route("/answers/{id}/vote", post(vote_answer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_request_normalizes_tags() {
        let req = CreateQuestionRequest {
            title: "Decoherence in transmons".into(),
            body: "What dominates T1?".into(),
            tags: vec!["Transmon".into(), "#transmon".into(), "t1".into()],
        };
        let q = req.validate().unwrap();
        assert_eq!(q.tags.as_slice().len(), 2);
    }

    #[test]
    fn question_request_limits_tags() {
        let req = CreateQuestionRequest {
            title: "Too many".into(),
            body: "tags".into(),
            tags: (0..6).map(|i| format!("tag{i}")).collect(),
        };
        assert!(matches!(
            req.validate().unwrap_err(),
            ValidationError::TooMany { field: "tags", max: 5 }
        ));
    }

    #[test]
    fn sort_defaults_to_newest() {
        let params: QuestionListParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.sort, QuestionSort::Newest);
    }
}
