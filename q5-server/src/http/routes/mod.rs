//! Route handlers organized by resource

pub mod assistant;
pub mod community;
pub mod conversations;
pub mod entanglements;
pub mod health;
pub mod marketplace;
pub mod organizations;
pub mod posts;
pub mod profiles;
pub mod questions;
