//! Direct message repository
//!
//! A conversation row holds one unordered member pair, stored as
//! `member_a < member_b` so the UNIQUE constraint covers both orders.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::query::window_total;
use crate::db::DbError;
use crate::models::{MessageBody, Paginated, Pagination};

/// Conversation record
#[derive(Debug, Clone, FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub member_a: Uuid,
    pub member_b: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn has_member(&self, profile: Uuid) -> bool {
        self.member_a == profile || self.member_b == profile
    }

    /// The member that is not `profile`.
    pub fn other_member(&self, profile: Uuid) -> Uuid {
        if self.member_a == profile {
            self.member_b
        } else {
            self.member_a
        }
    }
}

/// Inbox row: the other member, last message preview and unread count
#[derive(Debug, Clone, FromRow)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub other_id: Uuid,
    pub other_name: String,
    pub other_avatar_url: Option<String>,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Direct message record
#[derive(Debug, Clone, FromRow)]
pub struct DirectMessage {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// Sort a member pair into storage order.
pub fn ordered_pair(x: Uuid, y: Uuid) -> (Uuid, Uuid) {
    if x <= y {
        (x, y)
    } else {
        (y, x)
    }
}

/// Conversation repository
pub struct ConversationRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ConversationRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get or create the conversation between two members.
    pub async fn get_or_create(&self, caller: Uuid, other: Uuid) -> Result<Conversation, DbError> {
        let (a, b) = ordered_pair(caller, other);

        // DO UPDATE (a no-op) so RETURNING yields the existing row too.
        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
            INSERT INTO conversations (member_a, member_b)
            VALUES ($1, $2)
            ON CONFLICT (member_a, member_b) DO UPDATE SET member_a = EXCLUDED.member_a
            RETURNING id, member_a, member_b, created_at
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_one(self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            // Either FK may fire; report the addressed member.
            DbError::ProfileRequired | DbError::MissingReference { .. } => {
                DbError::not_found("profile", other)
            }
            err => err,
        })?;

        tracing::debug!(conversation_id = %conversation.id, "conversation opened");
        Ok(conversation)
    }

    /// Load a conversation the caller belongs to.
    pub async fn ensure_member(&self, id: Uuid, caller: Uuid) -> Result<Conversation, DbError> {
        let conversation = sqlx::query_as::<_, Conversation>(
            "SELECT id, member_a, member_b, created_at FROM conversations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("conversation", id))?;

        if !conversation.has_member(caller) {
            return Err(DbError::forbidden("not a member of this conversation"));
        }
        Ok(conversation)
    }

    /// The member's inbox, most recently active first.
    pub async fn list_for(&self, profile: Uuid) -> Result<Vec<ConversationSummary>, DbError> {
        let rows = sqlx::query_as::<_, ConversationSummary>(
            r#"
            SELECT
                c.id,
                o.id AS other_id,
                o.full_name AS other_name,
                o.avatar_url AS other_avatar_url,
                last.body AS last_message,
                last.created_at AS last_message_at,
                (SELECT COUNT(*) FROM direct_messages u
                    WHERE u.conversation_id = c.id
                      AND u.sender_id <> $1
                      AND u.read_at IS NULL) AS unread_count,
                c.created_at
            FROM conversations c
            JOIN profiles o
              ON o.id = CASE WHEN c.member_a = $1 THEN c.member_b ELSE c.member_a END
            LEFT JOIN LATERAL (
                SELECT m.body, m.created_at
                FROM direct_messages m
                WHERE m.conversation_id = c.id
                ORDER BY m.created_at DESC
                LIMIT 1
            ) last ON TRUE
            WHERE c.member_a = $1 OR c.member_b = $1
            ORDER BY COALESCE(last.created_at, c.created_at) DESC
            "#,
        )
        .bind(profile)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Oldest-first messages. Caller must be a member.
    pub async fn messages(
        &self,
        id: Uuid,
        caller: Uuid,
        page: Pagination,
    ) -> Result<Paginated<DirectMessage>, DbError> {
        self.ensure_member(id, caller).await?;

        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, sender_id, body, created_at, read_at,
                   COUNT(*) OVER() AS total
            FROM direct_messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let recount = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM direct_messages WHERE conversation_id = $1",
        )
        .bind(id)
        .fetch_one(self.pool);
        let total = window_total(&rows, page, recount).await?;
        let items = rows
            .iter()
            .map(DirectMessage::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(page.wrap(items, total))
    }

    /// Store a message. Returns the conversation too, for fan-out.
    pub async fn send(
        &self,
        id: Uuid,
        sender: Uuid,
        body: MessageBody,
    ) -> Result<(Conversation, DirectMessage), DbError> {
        let conversation = self.ensure_member(id, sender).await?;

        let message = sqlx::query_as::<_, DirectMessage>(
            r#"
            INSERT INTO direct_messages (conversation_id, sender_id, body)
            VALUES ($1, $2, $3)
            RETURNING id, conversation_id, sender_id, body, created_at, read_at
            "#,
        )
        .bind(id)
        .bind(sender)
        .bind(body.as_str())
        .fetch_one(self.pool)
        .await?;

        tracing::info!(conversation_id = %id, message_id = %message.id, "message sent");
        Ok((conversation, message))
    }

    /// Mark the other member's messages read. Returns how many changed.
    pub async fn mark_read(&self, id: Uuid, caller: Uuid) -> Result<u64, DbError> {
        self.ensure_member(id, caller).await?;

        let updated = sqlx::query(
            r#"
            UPDATE direct_messages
            SET read_at = NOW()
            WHERE conversation_id = $1 AND sender_id <> $2 AND read_at IS NULL
            "#,
        )
        .bind(id)
        .bind(caller)
        .execute(self.pool)
        .await?
        .rows_affected();

        Ok(updated)
    }
}
