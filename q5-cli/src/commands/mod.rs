//! Command implementations for the q5 CLI

pub mod badge;
pub mod migrate;
pub mod serve;

pub use badge::run_badge;
pub use migrate::run_migrate;
pub use serve::run_serve;
