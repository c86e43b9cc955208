//! Entanglement (connection) repository
//!
//! One row per unordered member pair (unique index on LEAST/GREATEST).
//! Requests are idempotent; only the addressee answers a pending request.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::db::DbError;
use crate::models::EntanglementStatus;

/// Entanglement record from database
#[derive(Debug, Clone, FromRow)]
pub struct Entanglement {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub addressee_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

/// Entanglement seen from one member, with the other member's name
#[derive(Debug, Clone, FromRow)]
pub struct EntanglementView {
    pub id: Uuid,
    pub status: String,
    pub other_id: Uuid,
    pub other_name: String,
    pub other_avatar_url: Option<String>,
    /// True when the viewer sent the request
    pub outgoing: bool,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

/// Entanglement repository
pub struct EntanglementRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> EntanglementRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Request a connection, returning the existing row for the pair if any.
    pub async fn request(&self, requester: Uuid, addressee: Uuid) -> Result<Entanglement, DbError> {
        let inserted: Option<Entanglement> = sqlx::query_as(
            r#"
            INSERT INTO entanglements (requester_id, addressee_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            RETURNING id, requester_id, addressee_id, status, created_at, responded_at
            "#,
        )
        .bind(requester)
        .bind(addressee)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| DbError::from(e).or_missing("profile", addressee))?;

        if let Some(row) = inserted {
            tracing::info!(requester = %requester, addressee = %addressee, "entanglement requested");
            return Ok(row);
        }

        sqlx::query_as(
            r#"
            SELECT id, requester_id, addressee_id, status, created_at, responded_at
            FROM entanglements
            WHERE LEAST(requester_id, addressee_id) = LEAST($1::uuid, $2::uuid)
              AND GREATEST(requester_id, addressee_id) = GREATEST($1::uuid, $2::uuid)
            "#,
        )
        .bind(requester)
        .bind(addressee)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("entanglement", format!("{requester}/{addressee}")))
    }

    /// Accept or decline. Row is locked while the transition is checked.
    pub async fn respond(
        &self,
        id: Uuid,
        responder: Uuid,
        accept: bool,
    ) -> Result<Entanglement, DbError> {
        let mut tx = self.pool.begin().await?;

        let current: Entanglement = sqlx::query_as(
            r#"
            SELECT id, requester_id, addressee_id, status, created_at, responded_at
            FROM entanglements
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("entanglement", id))?;

        if current.addressee_id != responder {
            return Err(DbError::forbidden("only the addressee can respond"));
        }

        let status = EntanglementStatus::parse(&current.status).map_err(|_| DbError::Conflict {
            reason: format!("entanglement has unknown status '{}'", current.status),
        })?;
        let next = status.respond(accept).ok_or_else(|| DbError::Conflict {
            reason: format!("entanglement already {}", status.as_str()),
        })?;

        let updated: Entanglement = sqlx::query_as(
            r#"
            UPDATE entanglements
            SET status = $2, responded_at = NOW()
            WHERE id = $1
            RETURNING id, requester_id, addressee_id, status, created_at, responded_at
            "#,
        )
        .bind(id)
        .bind(next.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(entanglement_id = %id, status = next.as_str(), "entanglement answered");
        Ok(updated)
    }

    /// The member's entanglements, newest first.
    pub async fn list_for(
        &self,
        profile: Uuid,
        status: Option<EntanglementStatus>,
    ) -> Result<Vec<EntanglementView>, DbError> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                e.id,
                e.status,
                o.id AS other_id,
                o.full_name AS other_name,
                o.avatar_url AS other_avatar_url,
                (e.requester_id = $1) AS outgoing,
                e.created_at,
                e.responded_at
            FROM entanglements e
            JOIN profiles o
              ON o.id = CASE WHEN e.requester_id = $1 THEN e.addressee_id ELSE e.requester_id END
            WHERE (e.requester_id = $1 OR e.addressee_id = $1)
              AND ($2::text IS NULL OR e.status = $2)
            ORDER BY e.created_at DESC
            "#,
        )
        .bind(profile)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}
