//! Job and product listings (read-only)
//!
//! Listings belong to an organization; both queries join its slug and
//! name so cards can link back to the directory.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::query::{contains_pattern, window_total};
use crate::db::DbError;
use crate::models::{Paginated, Pagination};

/// Job listing with organization
#[derive(Debug, Clone, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub organization_slug: String,
    pub organization_name: String,
    pub title: String,
    pub location: Option<String>,
    pub employment_type: String,
    pub description: String,
    pub apply_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Product listing with organization
#[derive(Debug, Clone, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub organization_slug: String,
    pub organization_name: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub price_cents: Option<i64>,
    pub image_url: Option<String>,
    pub datasheet_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub search: Option<String>,
    /// Organization slug
    pub organization: Option<String>,
    pub employment_type: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    /// Organization slug
    pub organization: Option<String>,
}

const JOB_COLUMNS: &str = r#"
    j.id, o.slug AS organization_slug, o.name AS organization_name, j.title, j.location,
    j.employment_type, j.description, j.apply_url, j.created_at
"#;

const PRODUCT_COLUMNS: &str = r#"
    p.id, o.slug AS organization_slug, o.name AS organization_name, p.name, p.category,
    p.description, p.price_cents, p.image_url, p.datasheet_url, p.created_at
"#;

/// Marketplace repository
pub struct MarketplaceRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> MarketplaceRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Newest jobs first.
    pub async fn list_jobs(
        &self,
        filter: &JobFilter,
        page: Pagination,
    ) -> Result<Paginated<Job>, DbError> {
        let search = filter.search.as_deref().map(contains_pattern);
        let rows = sqlx::query(&format!(
            r#"
            SELECT {JOB_COLUMNS}, COUNT(*) OVER() AS total
            FROM jobs j
            JOIN organizations o ON o.id = j.organization_id
            WHERE ($1::text IS NULL
                   OR j.title ILIKE $1
                   OR j.description ILIKE $1
                   OR j.location ILIKE $1)
              AND ($2::text IS NULL OR o.slug = $2)
              AND ($3::text IS NULL OR j.employment_type = $3)
            ORDER BY j.created_at DESC, j.id
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(search.as_deref())
        .bind(filter.organization.as_deref())
        .bind(filter.employment_type.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let recount = sqlx::query_as::<_, (i64,)>(
            r#"
            SELECT COUNT(*)
            FROM jobs j
            JOIN organizations o ON o.id = j.organization_id
            WHERE ($1::text IS NULL
                   OR j.title ILIKE $1
                   OR j.description ILIKE $1
                   OR j.location ILIKE $1)
              AND ($2::text IS NULL OR o.slug = $2)
              AND ($3::text IS NULL OR j.employment_type = $3)
            "#,
        )
        .bind(search.as_deref())
        .bind(filter.organization.as_deref())
        .bind(filter.employment_type.as_deref())
        .fetch_one(self.pool);
        let total = window_total(&rows, page, recount).await?;
        let items = rows.iter().map(Job::from_row).collect::<Result<Vec<_>, _>>()?;

        Ok(page.wrap(items, total))
    }

    pub async fn get_job(&self, id: Uuid) -> Result<Job, DbError> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM jobs j
            JOIN organizations o ON o.id = j.organization_id
            WHERE j.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("job", id))
    }

    /// Products, alphabetical within the newest listings.
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        page: Pagination,
    ) -> Result<Paginated<Product>, DbError> {
        let search = filter.search.as_deref().map(contains_pattern);
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}, COUNT(*) OVER() AS total
            FROM products p
            JOIN organizations o ON o.id = p.organization_id
            WHERE ($1::text IS NULL
                   OR p.name ILIKE $1
                   OR p.description ILIKE $1)
              AND ($2::text IS NULL OR p.category = $2)
              AND ($3::text IS NULL OR o.slug = $3)
            ORDER BY p.created_at DESC, p.name, p.id
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(search.as_deref())
        .bind(filter.category.as_deref())
        .bind(filter.organization.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let recount = sqlx::query_as::<_, (i64,)>(
            r#"
            SELECT COUNT(*)
            FROM products p
            JOIN organizations o ON o.id = p.organization_id
            WHERE ($1::text IS NULL
                   OR p.name ILIKE $1
                   OR p.description ILIKE $1)
              AND ($2::text IS NULL OR p.category = $2)
              AND ($3::text IS NULL OR o.slug = $3)
            "#,
        )
        .bind(search.as_deref())
        .bind(filter.category.as_deref())
        .bind(filter.organization.as_deref())
        .fetch_one(self.pool);
        let total = window_total(&rows, page, recount).await?;
        let items = rows
            .iter()
            .map(Product::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(page.wrap(items, total))
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product, DbError> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            JOIN organizations o ON o.id = p.organization_id
            WHERE p.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("product", id))
    }
}

#[cfg(test)]
mod tests {
    // Integration tests - run with DATABASE_URL set
    // cargo test -p q5-server -- --ignored

    use super::*;
    use crate::db::testing;

    #[tokio::test]
    #[ignore = "requires database"]
    async fn missing_listing_is_not_found() {
        let pool = testing::pool().await;
        let repo = MarketplaceRepo::new(&pool);

        let err = repo.get_job(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "job", .. }));
        let err = repo.get_product(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "product", .. }));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn jobs_filter_by_organization() {
        let pool = testing::pool().await;
        let owner = testing::profile(&pool, "Recruiter").await;
        let slug = format!("hiring-{}", &Uuid::new_v4().simple().to_string()[..8]);

        let (org_id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO organizations (slug, name, kind, owner_id) VALUES ($1, 'Hiring Co', 'company', $2) RETURNING id",
        )
        .bind(&slug)
        .bind(owner)
        .fetch_one(&pool)
        .await
        .expect("org");
        sqlx::query("INSERT INTO jobs (organization_id, title) VALUES ($1, 'Cryo engineer')")
            .bind(org_id)
            .execute(&pool)
            .await
            .expect("job");

        let page = MarketplaceRepo::new(&pool)
            .list_jobs(
                &JobFilter {
                    organization: Some(slug.clone()),
                    ..Default::default()
                },
                Pagination::default(),
            )
            .await
            .expect("list");
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].organization_slug, slug);
    }
}
