//! HTTP server layer
//!
//! Axum server with:
//! - CORS (configured origins by default)
//! - Request tracing and timeouts
//! - Graceful shutdown
//! - JSON error responses

pub mod error;
pub mod extractors;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use extractors::{
    AuthUser, JsonBody, MaybeAuthUser, QueryParams, ValidUuid, USER_ID_HEADER,
};
pub use server::{build_router, run_server, ServerConfig, ServerError};
