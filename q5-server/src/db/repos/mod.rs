//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Counts come from subqueries in the list statement (no N+1)
//! - Page totals survive pages past the end (`query::window_total`)
//! - Handles conflicts via ON CONFLICT (no check-then-insert)
//! - Uses transactions for multi-step operations

pub mod answers;
pub mod comments;
pub mod conversations;
pub mod entanglements;
pub mod marketplace;
pub mod organizations;
pub mod posts;
pub mod profiles;
mod query;
pub mod questions;
pub mod toggle;

pub use answers::{AnswerRepo, AnswerWithVotes};
pub use comments::{Comment, CommentRepo};
pub use conversations::{
    ordered_pair, Conversation, ConversationRepo, ConversationSummary, DirectMessage,
};
pub use entanglements::{Entanglement, EntanglementRepo, EntanglementView};
pub use marketplace::{Job, JobFilter, MarketplaceRepo, Product, ProductFilter};
pub use organizations::{NewOrganization, Organization, OrganizationFilter, OrganizationRepo};
pub use posts::{FeedFilter, PostRepo, PostWithStats};
pub use profiles::{Profile, ProfileRepo, ProfileUpdate};
pub use questions::{NewQuestion, QuestionFilter, QuestionRepo, QuestionSummary, Thread};
pub use toggle::{ToggleOutcome, ToggleTable};
