//! Schema creation
//!
//! Idempotent: every statement is `IF NOT EXISTS`, so running on each
//! start is safe.

use sqlx::PgPool;

use super::DbError;

/// Ordered schema statements, named for logging.
const STATEMENTS: &[(&str, &str)] = &[
    (
        "profiles",
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id UUID PRIMARY KEY,
            full_name TEXT NOT NULL,
            headline TEXT,
            role TEXT,
            affiliation TEXT,
            education_level TEXT,
            bio TEXT,
            avatar_url TEXT,
            badge_level SMALLINT CHECK (badge_level BETWEEN 0 AND 5),
            badge_label TEXT,
            badge_review_status TEXT CHECK (badge_review_status IN ('auto', 'pending')),
            badge_rationale TEXT,
            badge_updated_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "organizations",
        r#"
        CREATE TABLE IF NOT EXISTS organizations (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            slug TEXT NOT NULL UNIQUE CHECK (slug ~ '^[a-z0-9][a-z0-9-]{0,63}$'),
            name TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('company', 'research_group')),
            description TEXT,
            website TEXT,
            owner_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "organization_follows",
        r#"
        CREATE TABLE IF NOT EXISTS organization_follows (
            organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
            profile_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (organization_id, profile_id)
        )
        "#,
    ),
    (
        "entanglements",
        r#"
        CREATE TABLE IF NOT EXISTS entanglements (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            requester_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            addressee_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'accepted', 'declined')),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            responded_at TIMESTAMPTZ,
            CHECK (requester_id <> addressee_id)
        )
        "#,
    ),
    (
        "entanglements_pair_idx",
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS entanglements_pair_idx
            ON entanglements (LEAST(requester_id, addressee_id), GREATEST(requester_id, addressee_id))
        "#,
    ),
    (
        "posts",
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            author_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            body TEXT NOT NULL,
            image_url TEXT,
            tags TEXT[] NOT NULL DEFAULT '{}',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "posts_created_idx",
        "CREATE INDEX IF NOT EXISTS posts_created_idx ON posts (created_at DESC)",
    ),
    (
        "posts_tags_idx",
        "CREATE INDEX IF NOT EXISTS posts_tags_idx ON posts USING GIN (tags)",
    ),
    (
        "post_likes",
        r#"
        CREATE TABLE IF NOT EXISTS post_likes (
            post_id UUID NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            profile_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (post_id, profile_id)
        )
        "#,
    ),
    (
        "post_comments",
        r#"
        CREATE TABLE IF NOT EXISTS post_comments (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            post_id UUID NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            author_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            body TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "questions",
        r#"
        CREATE TABLE IF NOT EXISTS questions (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            author_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            tags TEXT[] NOT NULL DEFAULT '{}',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "answers",
        r#"
        CREATE TABLE IF NOT EXISTS answers (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            question_id UUID NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
            author_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            body TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "question_votes",
        r#"
        CREATE TABLE IF NOT EXISTS question_votes (
            question_id UUID NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
            profile_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (question_id, profile_id)
        )
        "#,
    ),
    (
        "answer_votes",
        r#"
        CREATE TABLE IF NOT EXISTS answer_votes (
            answer_id UUID NOT NULL REFERENCES answers(id) ON DELETE CASCADE,
            profile_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (answer_id, profile_id)
        )
        "#,
    ),
    (
        "conversations",
        r#"
        CREATE TABLE IF NOT EXISTS conversations (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            member_a UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            member_b UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CHECK (member_a < member_b),
            UNIQUE (member_a, member_b)
        )
        "#,
    ),
    (
        "direct_messages",
        r#"
        CREATE TABLE IF NOT EXISTS direct_messages (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            conversation_id UUID NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
            sender_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            body TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            read_at TIMESTAMPTZ
        )
        "#,
    ),
    (
        "direct_messages_conversation_idx",
        r#"
        CREATE INDEX IF NOT EXISTS direct_messages_conversation_idx
            ON direct_messages (conversation_id, created_at)
        "#,
    ),
    (
        "jobs",
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            location TEXT,
            employment_type TEXT NOT NULL DEFAULT 'full_time',
            description TEXT NOT NULL DEFAULT '',
            apply_url TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "products",
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            price_cents BIGINT CHECK (price_cents >= 0),
            image_url TEXT,
            datasheet_url TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
];

/// Create all tables and indexes.
pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!(statements = STATEMENTS.len(), "Running schema migrations");

    let mut tx = pool.begin().await?;
    for (name, sql) in STATEMENTS {
        tracing::debug!(object = name, "ensuring schema object");
        sqlx::query(sql).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    tracing::info!("Schema migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_statement_is_idempotent() {
        for (name, sql) in STATEMENTS {
            assert!(
                sql.contains("IF NOT EXISTS"),
                "{name} must be safe to re-run"
            );
        }
    }

    #[test]
    fn referenced_tables_created_first() {
        let position = |table: &str| {
            STATEMENTS
                .iter()
                .position(|(name, _)| *name == table)
                .unwrap_or_else(|| panic!("missing {table}"))
        };

        assert!(position("profiles") < position("organizations"));
        assert!(position("questions") < position("answers"));
        assert!(position("answers") < position("answer_votes"));
        assert!(position("conversations") < position("direct_messages"));
        assert!(position("organizations") < position("products"));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn migrations_rerun_cleanly() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool");

        run(&pool).await.expect("first run");
        run(&pool).await.expect("second run");
    }
}
