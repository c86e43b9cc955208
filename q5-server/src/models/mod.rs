//! Request models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod content;
pub mod hashtag;
pub mod kinds;
pub mod pagination;
pub mod slug;
pub mod validation;

pub use content::{
    AnswerBody, CommentBody, FullName, MessageBody, OrganizationName, PostBody, QuestionBody,
    QuestionTitle,
};
pub use hashtag::extract_hashtags;
pub use kinds::{EntanglementStatus, OrganizationKind, QuestionSort};
pub use pagination::{Paginated, Pagination, PaginationParams};
pub use slug::{normalize_tag_filter, OrgSlug, TagList};
pub use validation::{optional_text, optional_url, required_text, ValidationError};
