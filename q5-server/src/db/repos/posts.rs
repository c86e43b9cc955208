//! Feed post repository
//!
//! Posts carry denormalised author fields and aggregate counts so the
//! feed renders from a single query.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::query::window_total;
use super::toggle::{self, ToggleOutcome, ToggleTable};
use crate::db::DbError;
use crate::models::{Paginated, Pagination, PostBody};

/// Post with author and engagement stats
#[derive(Debug, Clone, FromRow)]
pub struct PostWithStats {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_avatar_url: Option<String>,
    pub body: String,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub like_count: i64,
    pub comment_count: i64,
    pub liked_by_me: bool,
}

/// Feed filters
#[derive(Debug, Clone, Default)]
pub struct FeedFilter {
    /// Normalised hashtag, without '#'
    pub tag: Option<String>,
    pub author: Option<Uuid>,
}

/// `$1` is always the viewer (nullable).
const POST_COLUMNS: &str = r#"
    p.id, p.author_id, a.full_name AS author_name, a.avatar_url AS author_avatar_url,
    p.body, p.image_url, p.tags, p.created_at,
    (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id) AS like_count,
    (SELECT COUNT(*) FROM post_comments c WHERE c.post_id = p.id) AS comment_count,
    EXISTS(SELECT 1 FROM post_likes l WHERE l.post_id = p.id AND l.profile_id = $1) AS liked_by_me
"#;

/// Post repository
pub struct PostRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> PostRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Publish a post. Hashtags in the body become the post's tags.
    pub async fn create(
        &self,
        author: Uuid,
        body: PostBody,
        image_url: Option<String>,
    ) -> Result<PostWithStats, DbError> {
        let tags = body.hashtags();

        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO posts (author_id, body, image_url, tags)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(author)
        .bind(body.as_str())
        .bind(image_url)
        .bind(&tags)
        .fetch_one(self.pool)
        .await?;

        tracing::info!(post_id = %id, author_id = %author, tags = tags.len(), "post created");
        self.get(id, Some(author)).await
    }

    /// Get a single post.
    pub async fn get(&self, id: Uuid, viewer: Option<Uuid>) -> Result<PostWithStats, DbError> {
        sqlx::query_as::<_, PostWithStats>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            JOIN profiles a ON a.id = p.author_id
            WHERE p.id = $2
            "#
        ))
        .bind(viewer)
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("post", id))
    }

    /// Newest-first feed.
    pub async fn list(
        &self,
        filter: &FeedFilter,
        viewer: Option<Uuid>,
        page: Pagination,
    ) -> Result<Paginated<PostWithStats>, DbError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {POST_COLUMNS}, COUNT(*) OVER() AS total
            FROM posts p
            JOIN profiles a ON a.id = p.author_id
            WHERE ($2::text IS NULL OR $2 = ANY(p.tags))
              AND ($3::uuid IS NULL OR p.author_id = $3)
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(viewer)
        .bind(filter.tag.as_deref())
        .bind(filter.author)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let recount = sqlx::query_as::<_, (i64,)>(
            r#"
            SELECT COUNT(*) FROM posts p
            WHERE ($1::text IS NULL OR $1 = ANY(p.tags))
              AND ($2::uuid IS NULL OR p.author_id = $2)
            "#,
        )
        .bind(filter.tag.as_deref())
        .bind(filter.author)
        .fetch_one(self.pool);
        let total = window_total(&rows, page, recount).await?;
        let items = rows
            .iter()
            .map(PostWithStats::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(page.wrap(items, total))
    }

    /// Delete a post. Only its author may.
    pub async fn delete(&self, id: Uuid, caller: Uuid) -> Result<(), DbError> {
        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1 AND author_id = $2")
            .bind(id)
            .bind(caller)
            .execute(self.pool)
            .await?
            .rows_affected();

        if deleted == 1 {
            tracing::info!(post_id = %id, "post deleted");
            return Ok(());
        }

        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        match exists {
            Some(_) => Err(DbError::forbidden("only the author can delete a post")),
            None => Err(DbError::not_found("post", id)),
        }
    }

    /// Like or unlike.
    pub async fn toggle_like(&self, id: Uuid, profile: Uuid) -> Result<ToggleOutcome, DbError> {
        toggle::toggle(self.pool, ToggleTable::PostLikes, id, profile).await
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
    async fn hashtags_become_tags() {
        let pool = testing::pool().await;
        let author = testing::profile(&pool, "Author").await;

        let repo = PostRepo::new(&pool);
        let post = repo
            .create(author, PostBody::new("Cooling #Cryo rig at #mK").unwrap(), None)
            .await
            .expect("create");
        assert_eq!(post.tags, vec!["cryo".to_owned(), "mk".to_owned()]);

        let feed = repo
            .list(
                &FeedFilter {
                    tag: Some("cryo".into()),
                    author: Some(author),
                },
                None,
                Pagination::default(),
            )
            .await
            .expect("list");
        assert!(feed.items.iter().any(|p| p.id == post.id));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn like_twice_restores_count() {
        let pool = testing::pool().await;
        let author = testing::profile(&pool, "Author").await;
        let fan = testing::profile(&pool, "Fan").await;

        let repo = PostRepo::new(&pool);
        let post = repo
            .create(author, PostBody::new("hello").unwrap(), None)
            .await
            .expect("create");

        let on = repo.toggle_like(post.id, fan).await.expect("like");
        assert_eq!((on.active, on.count), (true, 1));
        assert!(repo.get(post.id, Some(fan)).await.unwrap().liked_by_me);

        let off = repo.toggle_like(post.id, fan).await.expect("unlike");
        assert_eq!((off.active, off.count), (false, 0));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn delete_requires_author() {
        let pool = testing::pool().await;
        let author = testing::profile(&pool, "Author").await;
        let other = testing::profile(&pool, "Other").await;

        let repo = PostRepo::new(&pool);
        let post = repo
            .create(author, PostBody::new("mine").unwrap(), None)
            .await
            .expect("create");

        let err = repo.delete(post.id, other).await.unwrap_err();
        assert!(matches!(err, DbError::Forbidden { .. }));

        repo.delete(post.id, author).await.expect("delete");
        let err = repo.delete(post.id, author).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "post", .. }));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn page_past_the_end_keeps_total() {
        let pool = testing::pool().await;
        let author = testing::profile(&pool, "Prolific").await;

        let repo = PostRepo::new(&pool);
        for i in 0..3 {
            repo.create(author, PostBody::new(&format!("post {i}")).unwrap(), None)
                .await
                .expect("create");
        }

        let filter = FeedFilter {
            tag: None,
            author: Some(author),
        };
        let page = repo
            .list(&filter, None, Pagination::new(3, 2))
            .await
            .expect("list");
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
    }
}
