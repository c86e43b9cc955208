//! Post comment repository

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::query::window_total;
use crate::db::DbError;
use crate::models::{CommentBody, Paginated, Pagination};

/// Comment with author name
#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Comment repository
pub struct CommentRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> CommentRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Oldest-first comments on a post. Missing post is a 404, not an empty page.
    pub async fn list_for_post(
        &self,
        post_id: Uuid,
        page: Pagination,
    ) -> Result<Paginated<Comment>, DbError> {
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(self.pool)
            .await?;
        if exists.is_none() {
            return Err(DbError::not_found("post", post_id));
        }

        let rows = sqlx::query(
            r#"
            SELECT c.id, c.post_id, c.author_id, a.full_name AS author_name,
                   c.body, c.created_at, COUNT(*) OVER() AS total
            FROM post_comments c
            JOIN profiles a ON a.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created_at ASC, c.id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(post_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let recount =
            sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM post_comments WHERE post_id = $1")
                .bind(post_id)
                .fetch_one(self.pool);
        let total = window_total(&rows, page, recount).await?;
        let items = rows
            .iter()
            .map(Comment::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(page.wrap(items, total))
    }

    /// Add a comment.
    pub async fn create(
        &self,
        post_id: Uuid,
        author: Uuid,
        body: CommentBody,
    ) -> Result<Comment, DbError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO post_comments (post_id, author_id, body)
                VALUES ($1, $2, $3)
                RETURNING id, post_id, author_id, body, created_at
            )
            SELECT i.id, i.post_id, i.author_id, a.full_name AS author_name,
                   i.body, i.created_at
            FROM inserted i
            JOIN profiles a ON a.id = i.author_id
            "#,
        )
        .bind(post_id)
        .bind(author)
        .bind(body.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::from(e).or_missing("post", post_id))?;

        tracing::info!(comment_id = %comment.id, post_id = %post_id, "comment added");
        Ok(comment)
    }

    /// Delete a comment. Only its author may.
    pub async fn delete(&self, id: Uuid, caller: Uuid) -> Result<(), DbError> {
        let author: Option<(Uuid,)> =
            sqlx::query_as("SELECT author_id FROM post_comments WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        match author {
            None => Err(DbError::not_found("comment", id)),
            Some((author_id,)) if author_id != caller => {
                Err(DbError::forbidden("only the author can delete a comment"))
            }
            Some(_) => {
                sqlx::query("DELETE FROM post_comments WHERE id = $1")
                    .bind(id)
                    .execute(self.pool)
                    .await?;
                tracing::info!(comment_id = %id, "comment deleted");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing;
    use crate::db::PostRepo;
    use crate::models::PostBody;

    #[tokio::test]
    #[ignore = "requires database"]
    async fn comment_on_missing_post_is_not_found() {
        let pool = testing::pool().await;
        let author = testing::profile(&pool, "Commenter").await;

        let err = CommentRepo::new(&pool)
            .create(Uuid::new_v4(), author, CommentBody::new("hi").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "post", .. }));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn comments_are_oldest_first() {
        let pool = testing::pool().await;
        let author = testing::profile(&pool, "Author").await;
        let post = PostRepo::new(&pool)
            .create(author, PostBody::new("thread").unwrap(), None)
            .await
            .expect("post");

        let repo = CommentRepo::new(&pool);
        let first = repo
            .create(post.id, author, CommentBody::new("first").unwrap())
            .await
            .expect("first");
        let second = repo
            .create(post.id, author, CommentBody::new("second").unwrap())
            .await
            .expect("second");

        let page = repo
            .list_for_post(post.id, Pagination::default())
            .await
            .expect("list");
        let ids: Vec<_> = page.items.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert_eq!(page.total, 2);
    }
}
