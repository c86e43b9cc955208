//! q5-core: domain logic shared by the Quantum5ocial server and CLI
//!
//! No I/O beyond reading the config file. The badge rubric is a pure function.

pub mod badge;
pub mod config;
pub mod error;

pub use badge::{compute_q5_badge, BadgeInput, Q5Badge, ReviewStatus};
pub use config::Q5Config;
pub use error::{Q5Error, Result};
