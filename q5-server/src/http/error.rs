//! API error type with IntoResponse
//!
//! Errors are converted to `{"error": code, "message": text}` JSON with the
//! matching status code. Server-side failures are logged and answered with
//! a generic message.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::assistant::AssistantError;
use crate::db::DbError;
use crate::models::ValidationError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Body or query string could not be decoded (400)
    BadRequest { reason: String },

    /// Missing or malformed caller identity (401)
    Unauthorized { reason: &'static str },

    /// Caller may not touch the resource (403)
    Forbidden { reason: String },

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Unique constraint or state conflict (409)
    Conflict { reason: String },

    /// Caller has no profile yet (409)
    ProfileRequired,

    /// Assistant upstream failed (502, logged)
    Upstream(AssistantError),

    /// Assistant disabled (503)
    AssistantUnavailable,

    /// Database error (500, logged)
    Database(DbError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } | Self::ProfileRequired => StatusCode::CONFLICT,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::AssistantUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Validation(e) => json!({
                "error": "validation_error",
                "message": e.to_string()
            }),
            Self::BadRequest { reason } => json!({
                "error": "validation_error",
                "message": reason
            }),
            Self::Unauthorized { reason } => json!({
                "error": "unauthorized",
                "message": reason
            }),
            Self::Forbidden { reason } => json!({
                "error": "forbidden",
                "message": reason
            }),
            Self::NotFound { resource, id } => json!({
                "error": "not_found",
                "message": format!("{} '{}' not found", resource, id)
            }),
            Self::Conflict { reason } => json!({
                "error": "conflict",
                "message": reason
            }),
            Self::ProfileRequired => json!({
                "error": "profile_required",
                "message": "create your profile first"
            }),
            Self::Upstream(e) => {
                tracing::error!("Assistant error: {}", e);
                json!({
                    "error": "upstream_error",
                    "message": "the assistant is temporarily unavailable"
                })
            }
            Self::AssistantUnavailable => json!({
                "error": "assistant_unavailable",
                "message": "the assistant is not configured"
            }),
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                json!({
                    "error": "internal_error",
                    "message": "an internal error occurred"
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest {
            reason: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest {
            reason: rejection.body_text(),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::Conflict { reason } => Self::Conflict { reason },
            DbError::Forbidden { reason } => Self::Forbidden { reason },
            DbError::ProfileRequired => Self::ProfileRequired,
            _ => Self::Database(e),
        }
    }
}

impl From<AssistantError> for ApiError {
    fn from(e: AssistantError) -> Self {
        match e {
            AssistantError::NotConfigured => Self::AssistantUnavailable,
            other => Self::Upstream(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn validation_error_is_400_with_code() {
        let err = ApiError::Validation(ValidationError::Empty { field: "body" });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], "body cannot be empty");
    }

    #[test]
    fn db_errors_map_to_statuses() {
        let cases = [
            (DbError::not_found("post", "x"), StatusCode::NOT_FOUND),
            (DbError::forbidden("nope"), StatusCode::FORBIDDEN),
            (
                DbError::Conflict {
                    reason: "taken".into(),
                },
                StatusCode::CONFLICT,
            ),
            (DbError::ProfileRequired, StatusCode::CONFLICT),
            (
                DbError::MissingReference {
                    constraint: "x_fkey".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                DbError::Sqlx(sqlx::Error::PoolTimedOut),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (db, status) in cases {
            assert_eq!(ApiError::from(db).status(), status);
        }
    }

    #[test]
    fn assistant_errors() {
        assert_eq!(
            ApiError::from(AssistantError::NotConfigured).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(AssistantError::Upstream { status: 500 }).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn database_errors_hide_details() {
        let err = ApiError::from(DbError::MissingReference {
            constraint: "secret_table_fkey".into(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(!String::from_utf8_lossy(&bytes).contains("secret"));
    }
}
