//! Health and status endpoints
//!
//! GET /health - liveness, no dependencies
//! GET /status - readiness: database, stream subscribers, assistant

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

use crate::db;
use crate::state::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: bool,
    pub stream_subscribers: usize,
    pub assistant_enabled: bool,
    pub current_time: String,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /status - 503 when the database is unreachable
async fn status(State(state): State<Arc<AppState>>) -> (StatusCode, Json<StatusResponse>) {
    let database = db::ping(&state.pool).await;
    if !database {
        tracing::warn!("status check: database unreachable");
    }

    let code = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(StatusResponse {
            status: if database { "ok" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            database,
            stream_subscribers: state.hub.subscriber_count(),
            assistant_enabled: state.assistant.is_some(),
            current_time: chrono::Utc::now().to_rfc3339(),
        }),
    )
}

/// Health routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_returns_ok() {
        let Json(body) = health().await;
        assert_eq!(body.status, "ok");
    }
}
