//! Database layer - connection pool, schema and repositories
//!
//! # Design Principles
//!
//! - Connection pool, no Arc<Mutex<Connection>>
//! - Counts come from JOINs/subqueries in the same statement, no N+1
//! - Rely on DB constraints, handle conflicts - no check-then-insert
//! - Transactions for multi-step operations

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repos;

pub use error::DbError;
pub use pool::{create_pool, create_pool_with_options, ping};
pub use repos::*;

#[cfg(test)]
pub(crate) mod testing {
    //! Helpers for `#[ignore = "requires database"]` tests.

    use sqlx::PgPool;
    use uuid::Uuid;

    use super::repos::{ProfileRepo, ProfileUpdate};
    use crate::models::FullName;

    /// Connect to `DATABASE_URL` and ensure the schema exists.
    pub async fn pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = super::create_pool(&url).await.expect("pool creation failed");
        super::migrations::run(&pool).await.expect("migrations failed");
        pool
    }

    /// Insert a throwaway member profile.
    pub async fn profile(pool: &PgPool, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        ProfileRepo::new(pool)
            .upsert(
                id,
                ProfileUpdate {
                    full_name: FullName::new(name).unwrap(),
                    headline: None,
                    role: None,
                    affiliation: Some("Test Lab".into()),
                    education_level: None,
                    bio: None,
                    avatar_url: None,
                },
            )
            .await
            .expect("profile upsert failed");
        id
    }
}
