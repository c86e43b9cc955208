//! Profile repository
//!
//! Member profiles are keyed by the identity provider's user id, so
//! "create" is an upsert on the caller's own id.

use chrono::{DateTime, Utc};
use q5_core::Q5Badge;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::query::{contains_pattern, window_total};
use crate::db::DbError;
use crate::models::{FullName, Paginated, Pagination};

/// Profile record with connection count
#[derive(Debug, Clone, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: String,
    pub headline: Option<String>,
    pub role: Option<String>,
    pub affiliation: Option<String>,
    pub education_level: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub badge_level: Option<i16>,
    pub badge_label: Option<String>,
    pub badge_review_status: Option<String>,
    pub badge_rationale: Option<String>,
    pub badge_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub entanglement_count: i64,
}

/// Editable profile fields, already validated
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub full_name: FullName,
    pub headline: Option<String>,
    pub role: Option<String>,
    pub affiliation: Option<String>,
    pub education_level: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

const PROFILE_COLUMNS: &str = r#"
    p.id, p.full_name, p.headline, p.role, p.affiliation, p.education_level,
    p.bio, p.avatar_url, p.badge_level, p.badge_label, p.badge_review_status,
    p.badge_rationale, p.badge_updated_at, p.created_at, p.updated_at,
    (SELECT COUNT(*) FROM entanglements e
        WHERE e.status = 'accepted'
        AND (e.requester_id = p.id OR e.addressee_id = p.id)) AS entanglement_count
"#;

/// Profile repository
pub struct ProfileRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create or replace the caller's editable fields. Badge columns untouched.
    pub async fn upsert(&self, id: Uuid, update: ProfileUpdate) -> Result<Profile, DbError> {
        sqlx::query(
            r#"
            INSERT INTO profiles
                (id, full_name, headline, role, affiliation, education_level, bio, avatar_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                full_name = EXCLUDED.full_name,
                headline = EXCLUDED.headline,
                role = EXCLUDED.role,
                affiliation = EXCLUDED.affiliation,
                education_level = EXCLUDED.education_level,
                bio = EXCLUDED.bio,
                avatar_url = EXCLUDED.avatar_url,
                updated_at = NOW()
            "#,
        )
        .bind(id)
        .bind(update.full_name.as_str())
        .bind(update.headline)
        .bind(update.role)
        .bind(update.affiliation)
        .bind(update.education_level)
        .bind(update.bio)
        .bind(update.avatar_url)
        .execute(self.pool)
        .await?;

        tracing::info!(profile_id = %id, "profile saved");
        self.get(id).await
    }

    /// Get a single profile.
    pub async fn get(&self, id: Uuid) -> Result<Profile, DbError> {
        sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("profile", id))
    }

    /// Member directory: optional case-insensitive match on name,
    /// affiliation or role, alphabetical.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: Pagination,
    ) -> Result<Paginated<Profile>, DbError> {
        let pattern = search.map(contains_pattern);
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PROFILE_COLUMNS}, COUNT(*) OVER() AS total
            FROM profiles p
            WHERE $1::text IS NULL
               OR p.full_name ILIKE $1
               OR p.affiliation ILIKE $1
               OR p.role ILIKE $1
            ORDER BY p.full_name ASC, p.id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(pattern.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let recount = sqlx::query_as::<_, (i64,)>(
            r#"
            SELECT COUNT(*) FROM profiles p
            WHERE $1::text IS NULL
               OR p.full_name ILIKE $1
               OR p.affiliation ILIKE $1
               OR p.role ILIKE $1
            "#,
        )
        .bind(pattern.as_deref())
        .fetch_one(self.pool);
        let total = window_total(&rows, page, recount).await?;
        let items = rows
            .iter()
            .map(Profile::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(page.wrap(items, total))
    }

    /// Store a computed badge on the caller's profile.
    pub async fn set_badge(&self, id: Uuid, badge: &Q5Badge) -> Result<Profile, DbError> {
        let updated = sqlx::query(
            r#"
            UPDATE profiles SET
                badge_level = $2,
                badge_label = $3,
                badge_review_status = $4,
                badge_rationale = $5,
                badge_updated_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(i16::from(badge.level))
        .bind(badge.label)
        .bind(badge.review_status.as_str())
        .bind(&badge.rationale)
        .execute(self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(DbError::ProfileRequired);
        }

        tracing::info!(
            profile_id = %id,
            level = badge.level,
            review_status = badge.review_status.as_str(),
            "badge stored"
        );
        self.get(id).await
    }
}

#[cfg(test)]
mod tests {
    // Integration tests - run with DATABASE_URL set
    // cargo test -p q5-server -- --ignored

    use super::*;

    #[tokio::test]
    #[ignore = "requires database"]
    async fn upsert_then_badge() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool");
        crate::db::migrations::run(&pool).await.expect("migrations");

        let repo = ProfileRepo::new(&pool);
        let id = Uuid::new_v4();
        let profile = repo
            .upsert(
                id,
                ProfileUpdate {
                    full_name: FullName::new("Ada Qubit").unwrap(),
                    headline: None,
                    role: Some("Researcher".into()),
                    affiliation: None,
                    education_level: Some("PhD".into()),
                    bio: None,
                    avatar_url: None,
                },
            )
            .await
            .expect("upsert");
        assert_eq!(profile.badge_level, None);

        let input = q5_core::BadgeInput::new(4, 4, "Researcher", "PhD", 4).unwrap();
        let badge = q5_core::compute_q5_badge(&input);
        let profile = repo.set_badge(id, &badge).await.expect("badge");
        assert_eq!(profile.badge_level, Some(5));
        assert_eq!(profile.badge_review_status.as_deref(), Some("pending"));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn badge_without_profile_is_rejected() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool");
        crate::db::migrations::run(&pool).await.expect("migrations");

        let input = q5_core::BadgeInput::new(1, 1, "", "", 1).unwrap();
        let err = ProfileRepo::new(&pool)
            .set_badge(Uuid::new_v4(), &q5_core::compute_q5_badge(&input))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ProfileRequired));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn search_treats_wildcards_literally() {
        let pool = crate::db::testing::pool().await;
        let token = Uuid::new_v4().simple().to_string();
        let literal = crate::db::testing::profile(&pool, &format!("Hundred%{token}")).await;
        crate::db::testing::profile(&pool, &format!("Hundredx{token}")).await;

        let page = ProfileRepo::new(&pool)
            .list(Some(&format!("%{token}")), Pagination::default())
            .await
            .expect("list");
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, literal);
    }
}
