//! Q&A answer repository

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::toggle::{self, ToggleOutcome, ToggleTable};
use crate::db::DbError;
use crate::models::AnswerBody;

/// Answer with vote stats
#[derive(Debug, Clone, FromRow)]
pub struct AnswerWithVotes {
    pub id: Uuid,
    pub question_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub vote_count: i64,
    pub voted_by_me: bool,
}

/// Answer repository
pub struct AnswerRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> AnswerRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Answer a question. A missing question surfaces as not-found.
    pub async fn create(
        &self,
        question_id: Uuid,
        author: Uuid,
        body: AnswerBody,
    ) -> Result<AnswerWithVotes, DbError> {
        let answer = sqlx::query_as::<_, AnswerWithVotes>(
            r#"
            WITH inserted AS (
                INSERT INTO answers (question_id, author_id, body)
                VALUES ($1, $2, $3)
                RETURNING id, question_id, author_id, body, created_at
            )
            SELECT i.id, i.question_id, i.author_id, a.full_name AS author_name,
                   i.body, i.created_at, 0::bigint AS vote_count, false AS voted_by_me
            FROM inserted i
            JOIN profiles a ON a.id = i.author_id
            "#,
        )
        .bind(question_id)
        .bind(author)
        .bind(body.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::from(e).or_missing("question", question_id))?;

        tracing::info!(answer_id = %answer.id, question_id = %question_id, "answer posted");
        Ok(answer)
    }

    /// Vote or unvote.
    pub async fn toggle_vote(&self, id: Uuid, profile: Uuid) -> Result<ToggleOutcome, DbError> {
        toggle::toggle(self.pool, ToggleTable::AnswerVotes, id, profile).await
    }
}
