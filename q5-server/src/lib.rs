//! q5-server: HTTP API for the Quantum5ocial community
//!
//! Profiles and badges, the feed, Q&A, direct messaging with a realtime
//! stream, the community directory, browse-only marketplaces and the AI
//! assistant, served by axum over a Postgres pool.

pub mod assistant;
pub mod db;
pub mod http;
pub mod models;
pub mod realtime;
pub mod state;

pub use assistant::{ChatBackend, OpenAiChatClient};
pub use http::{build_router, run_server, ApiError, ServerConfig, ServerError};
pub use realtime::MessageHub;
pub use state::AppState;
