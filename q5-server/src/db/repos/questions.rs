//! Q&A question repository
//!
//! - list: vote and answer counts, tag/text filters, three orderings
//! - get_thread: question plus answers ranked by votes, then age

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::answers::AnswerWithVotes;
use super::query::{contains_pattern, window_total};
use super::toggle::{self, ToggleOutcome, ToggleTable};
use crate::db::DbError;
use crate::models::{Paginated, Pagination, QuestionBody, QuestionSort, QuestionTitle, TagList};

/// Question with author and counts
#[derive(Debug, Clone, FromRow)]
pub struct QuestionSummary {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub vote_count: i64,
    pub answer_count: i64,
    pub voted_by_me: bool,
}

/// A question and its ranked answers
#[derive(Debug, Clone)]
pub struct Thread {
    pub question: QuestionSummary,
    pub answers: Vec<AnswerWithVotes>,
}

/// Validated question fields
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub title: QuestionTitle,
    pub body: QuestionBody,
    pub tags: TagList,
}

/// Question list filters
#[derive(Debug, Clone, Default)]
pub struct QuestionFilter {
    pub tag: Option<String>,
    /// Case-insensitive match on title or body
    pub search: Option<String>,
    pub sort: QuestionSort,
}

/// `$1` is always the viewer (nullable).
const QUESTION_COLUMNS: &str = r#"
    q.id, q.author_id, a.full_name AS author_name, q.title, q.body, q.tags, q.created_at,
    (SELECT COUNT(*) FROM question_votes v WHERE v.question_id = q.id) AS vote_count,
    (SELECT COUNT(*) FROM answers x WHERE x.question_id = q.id) AS answer_count,
    EXISTS(SELECT 1 FROM question_votes v
        WHERE v.question_id = q.id AND v.profile_id = $1) AS voted_by_me
"#;

/// Question repository
pub struct QuestionRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> QuestionRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Ask a question.
    pub async fn create(&self, author: Uuid, question: NewQuestion) -> Result<QuestionSummary, DbError> {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO questions (author_id, title, body, tags)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(author)
        .bind(question.title.as_str())
        .bind(question.body.as_str())
        .bind(question.tags.as_slice())
        .fetch_one(self.pool)
        .await?;

        tracing::info!(question_id = %id, author_id = %author, "question asked");
        self.get(id, Some(author)).await
    }

    /// Get a question without its answers.
    pub async fn get(&self, id: Uuid, viewer: Option<Uuid>) -> Result<QuestionSummary, DbError> {
        sqlx::query_as::<_, QuestionSummary>(&format!(
            r#"
            SELECT {QUESTION_COLUMNS}
            FROM questions q
            JOIN profiles a ON a.id = q.author_id
            WHERE q.id = $2
            "#
        ))
        .bind(viewer)
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("question", id))
    }

    /// Paginated question list.
    pub async fn list(
        &self,
        filter: &QuestionFilter,
        viewer: Option<Uuid>,
        page: Pagination,
    ) -> Result<Paginated<QuestionSummary>, DbError> {
        let search = filter.search.as_deref().map(contains_pattern);
        // Counts are computed in a subquery so ORDER BY can use vote_count.
        let rows = sqlx::query(&format!(
            r#"
            SELECT q.*, COUNT(*) OVER() AS total FROM (
                SELECT {QUESTION_COLUMNS}
                FROM questions q
                JOIN profiles a ON a.id = q.author_id
                WHERE ($2::text IS NULL OR $2 = ANY(q.tags))
                  AND ($3::text IS NULL
                       OR q.title ILIKE $3
                       OR q.body ILIKE $3)
            ) q
            WHERE (NOT $4 OR q.answer_count = 0)
            ORDER BY {order}, q.id
            LIMIT $5 OFFSET $6
            "#,
            order = filter.sort.order_clause(),
        ))
        .bind(viewer)
        .bind(filter.tag.as_deref())
        .bind(search.as_deref())
        .bind(filter.sort.unanswered_only())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let recount = sqlx::query_as::<_, (i64,)>(
            r#"
            SELECT COUNT(*)
            FROM questions q
            WHERE ($1::text IS NULL OR $1 = ANY(q.tags))
              AND ($2::text IS NULL
                   OR q.title ILIKE $2
                   OR q.body ILIKE $2)
              AND (NOT $3 OR NOT EXISTS(SELECT 1 FROM answers an WHERE an.question_id = q.id))
            "#,
        )
        .bind(filter.tag.as_deref())
        .bind(search.as_deref())
        .bind(filter.sort.unanswered_only())
        .fetch_one(self.pool);
        let total = window_total(&rows, page, recount).await?;
        let items = rows
            .iter()
            .map(QuestionSummary::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(page.wrap(items, total))
    }

    /// The question with all of its answers.
    pub async fn get_thread(&self, id: Uuid, viewer: Option<Uuid>) -> Result<Thread, DbError> {
        let question = self.get(id, viewer).await?;

        let answers = sqlx::query_as::<_, AnswerWithVotes>(
            r#"
            SELECT * FROM (
                SELECT
                    x.id, x.question_id, x.author_id, a.full_name AS author_name,
                    x.body, x.created_at,
                    (SELECT COUNT(*) FROM answer_votes v WHERE v.answer_id = x.id) AS vote_count,
                    EXISTS(SELECT 1 FROM answer_votes v
                        WHERE v.answer_id = x.id AND v.profile_id = $1) AS voted_by_me
                FROM answers x
                JOIN profiles a ON a.id = x.author_id
                WHERE x.question_id = $2
            ) ranked
            ORDER BY vote_count DESC, created_at ASC, id
            "#,
        )
        .bind(viewer)
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(Thread { question, answers })
    }

    /// Vote or unvote.
    pub async fn toggle_vote(&self, id: Uuid, profile: Uuid) -> Result<ToggleOutcome, DbError> {
        toggle::toggle(self.pool, ToggleTable::QuestionVotes, id, profile).await
    }
}
