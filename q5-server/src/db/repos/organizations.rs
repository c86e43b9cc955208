//! Organization repository
//!
//! - create: slug uniqueness enforced by the UNIQUE constraint (409)
//! - list/get: follower counts in the same statement

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::query::{contains_pattern, window_total};
use super::toggle::{self, ToggleOutcome, ToggleTable};
use crate::db::DbError;
use crate::models::{OrgSlug, OrganizationKind, OrganizationName, Paginated, Pagination};

/// Organization with follower count
#[derive(Debug, Clone, FromRow)]
pub struct Organization {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub kind: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub follower_count: i64,
    pub followed_by_me: bool,
}

/// Validated organization fields
#[derive(Debug, Clone)]
pub struct NewOrganization {
    pub slug: OrgSlug,
    pub name: OrganizationName,
    pub kind: OrganizationKind,
    pub description: Option<String>,
    pub website: Option<String>,
}

/// Directory filters
#[derive(Debug, Clone, Default)]
pub struct OrganizationFilter {
    pub search: Option<String>,
    pub kind: Option<OrganizationKind>,
}

const ORG_COLUMNS: &str = r#"
    o.id, o.slug, o.name, o.kind, o.description, o.website, o.owner_id, o.created_at,
    (SELECT COUNT(*) FROM organization_follows f WHERE f.organization_id = o.id) AS follower_count,
    EXISTS(SELECT 1 FROM organization_follows f
        WHERE f.organization_id = o.id AND f.profile_id = $1) AS followed_by_me
"#;

/// Organization repository
pub struct OrganizationRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> OrganizationRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an organization owned by the caller.
    pub async fn create(&self, owner: Uuid, org: NewOrganization) -> Result<Organization, DbError> {
        let slug = org.slug.as_str().to_owned();

        sqlx::query(
            r#"
            INSERT INTO organizations (slug, name, kind, description, website, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(org.slug.as_str())
        .bind(org.name.as_str())
        .bind(org.kind.as_str())
        .bind(org.description)
        .bind(org.website)
        .bind(owner)
        .execute(self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::Conflict { .. } => DbError::Conflict {
                reason: format!("organization slug '{slug}' is taken"),
            },
            other => other,
        })?;

        tracing::info!(slug = %slug, owner_id = %owner, "organization created");
        self.get(&slug, Some(owner)).await
    }

    /// Get by slug. `viewer` fills `followed_by_me`.
    pub async fn get(&self, slug: &str, viewer: Option<Uuid>) -> Result<Organization, DbError> {
        sqlx::query_as::<_, Organization>(&format!(
            "SELECT {ORG_COLUMNS} FROM organizations o WHERE o.slug = $2"
        ))
        .bind(viewer)
        .bind(slug)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("organization", slug))
    }

    /// Paginated directory, alphabetical.
    pub async fn list(
        &self,
        filter: &OrganizationFilter,
        viewer: Option<Uuid>,
        page: Pagination,
    ) -> Result<Paginated<Organization>, DbError> {
        let search = filter.search.as_deref().map(contains_pattern);
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORG_COLUMNS}, COUNT(*) OVER() AS total
            FROM organizations o
            WHERE ($2::text IS NULL
                   OR o.name ILIKE $2
                   OR o.description ILIKE $2)
              AND ($3::text IS NULL OR o.kind = $3)
            ORDER BY o.name ASC, o.id
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(viewer)
        .bind(search.as_deref())
        .bind(filter.kind.map(|k| k.as_str()))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let recount = sqlx::query_as::<_, (i64,)>(
            r#"
            SELECT COUNT(*) FROM organizations o
            WHERE ($1::text IS NULL
                   OR o.name ILIKE $1
                   OR o.description ILIKE $1)
              AND ($2::text IS NULL OR o.kind = $2)
            "#,
        )
        .bind(search.as_deref())
        .bind(filter.kind.map(|k| k.as_str()))
        .fetch_one(self.pool);
        let total = window_total(&rows, page, recount).await?;
        let items = rows
            .iter()
            .map(Organization::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(page.wrap(items, total))
    }

    /// Follow or unfollow by slug.
    pub async fn toggle_follow(&self, slug: &str, profile: Uuid) -> Result<ToggleOutcome, DbError> {
        let mut tx = self.pool.begin().await?;

        let (org_id,): (Uuid,) = sqlx::query_as("SELECT id FROM organizations WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("organization", slug))?;

        let outcome = toggle::toggle_in(&mut tx, ToggleTable::OrganizationFollows, org_id, profile).await?;
        tx.commit().await?;

        Ok(outcome)
    }
}
