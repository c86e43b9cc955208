//! On/off membership rows: likes, votes and follows
//!
//! One row per (item, profile), guarded by the table's primary key.
//! Toggling inserts with ON CONFLICT DO NOTHING and deletes when the
//! row was already there, so concurrent clicks resolve in the database.

use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::db::DbError;

/// Tables holding a (item, profile) membership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleTable {
    PostLikes,
    QuestionVotes,
    AnswerVotes,
    OrganizationFollows,
}

impl ToggleTable {
    /// (table, item column, parent resource name). Static SQL identifiers.
    fn parts(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            Self::PostLikes => ("post_likes", "post_id", "post"),
            Self::QuestionVotes => ("question_votes", "question_id", "question"),
            Self::AnswerVotes => ("answer_votes", "answer_id", "answer"),
            Self::OrganizationFollows => ("organization_follows", "organization_id", "organization"),
        }
    }

    pub fn resource(&self) -> &'static str {
        self.parts().2
    }
}

/// State after a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    /// Whether the caller's row now exists
    pub active: bool,
    /// Rows for the item after the toggle
    pub count: i64,
}

/// Flip the caller's membership row inside an open transaction.
pub async fn toggle_in(
    conn: &mut PgConnection,
    table: ToggleTable,
    item_id: Uuid,
    profile_id: Uuid,
) -> Result<ToggleOutcome, DbError> {
    let (name, column, resource) = table.parts();

    let inserted = sqlx::query(&format!(
        "INSERT INTO {name} ({column}, profile_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
    ))
    .bind(item_id)
    .bind(profile_id)
    .execute(&mut *conn)
    .await
    .map_err(|e| DbError::from(e).or_missing(resource, item_id))?
    .rows_affected();

    let active = if inserted == 1 {
        true
    } else {
        sqlx::query(&format!(
            "DELETE FROM {name} WHERE {column} = $1 AND profile_id = $2"
        ))
        .bind(item_id)
        .bind(profile_id)
        .execute(&mut *conn)
        .await?;
        false
    };

    let (count,): (i64,) =
        sqlx::query_as(&format!("SELECT COUNT(*) FROM {name} WHERE {column} = $1"))
            .bind(item_id)
            .fetch_one(&mut *conn)
            .await?;

    Ok(ToggleOutcome { active, count })
}

/// Flip the caller's membership row in its own transaction.
pub async fn toggle(
    pool: &PgPool,
    table: ToggleTable,
    item_id: Uuid,
    profile_id: Uuid,
) -> Result<ToggleOutcome, DbError> {
    let mut tx = pool.begin().await?;
    let outcome = toggle_in(&mut tx, table, item_id, profile_id).await?;
    tx.commit().await?;

    tracing::debug!(
        table = table.parts().0,
        item_id = %item_id,
        profile_id = %profile_id,
        active = outcome.active,
        "toggled"
    );
    Ok(outcome)
}
