//! Database error type

/// Repository error
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    /// Unique constraint violated
    #[error("conflict: {reason}")]
    Conflict { reason: String },

    /// Caller is not allowed to touch the row
    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    /// Foreign key violated: the referenced row does not exist
    #[error("missing reference: {constraint}")]
    MissingReference { constraint: String },

    /// The acting member has no profile row yet
    #[error("profile required")]
    ProfileRequired,
}

/// Foreign key columns that always point at the acting member.
const ACTOR_COLUMNS: &[&str] = &["profile_id", "author_id", "sender_id", "owner_id", "requester_id"];

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            let constraint = db_err.constraint().unwrap_or("unknown").to_owned();
            if db_err.is_unique_violation() {
                return Self::Conflict {
                    reason: format!("already exists ({constraint})"),
                };
            }
            if db_err.is_foreign_key_violation() {
                return Self::foreign_key(constraint);
            }
        }
        Self::Sqlx(err)
    }
}

impl DbError {
    /// Classify a foreign key violation by its constraint name
    /// (Postgres default: `<table>_<column>_fkey`).
    fn foreign_key(constraint: String) -> Self {
        if ACTOR_COLUMNS.iter().any(|c| constraint.contains(c)) {
            Self::ProfileRequired
        } else {
            Self::MissingReference { constraint }
        }
    }

    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    /// Turn a foreign key violation into a not-found for the parent row.
    pub fn or_missing(self, resource: &'static str, id: impl ToString) -> Self {
        match self {
            Self::MissingReference { .. } => Self::not_found(resource, id),
            other => other,
        }
    }
}
