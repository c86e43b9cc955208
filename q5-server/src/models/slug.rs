//! Slugs: organization handles and question tags

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// Maximum length for organization slugs
const MAX_SLUG_LEN: usize = 64;

/// Maximum tags on a question
pub const MAX_QUESTION_TAGS: usize = 5;

/// Matches DB constraint: ^[a-z0-9][a-z0-9-]{0,63}$
static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]{0,63}$").expect("invalid slug regex"));

static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]{0,31}$").expect("invalid tag regex"));

/// Validated organization slug
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrgSlug(String);

impl OrgSlug {
    /// Create a new organization slug.
    ///
    /// # Rules
    /// - Max 64 characters
    /// - Lowercase alphanumeric and hyphens
    /// - Must start with alphanumeric
    ///
    /// # Example
    /// ```
    /// use q5_server::models::OrgSlug;
    ///
    /// assert!(OrgSlug::new("qubit-labs").is_ok());
    /// assert!(OrgSlug::new("Qubit Labs").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "slug" });
        }

        if s.len() > MAX_SLUG_LEN {
            return Err(ValidationError::TooLong {
                field: "slug",
                max: MAX_SLUG_LEN,
            });
        }

        if !SLUG_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "slug",
                reason: "must be lowercase alphanumeric with hyphens, starting with alphanumeric",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated, normalized question tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagList(Vec<String>);

impl TagList {
    /// Normalize (trim, lowercase, strip a leading `#`), dedupe and validate.
    pub fn new<S: AsRef<str>>(raw: &[S]) -> Result<Self, ValidationError> {
        let mut tags = BTreeSet::new();

        for tag in raw {
            let normalized = tag.as_ref().trim().trim_start_matches('#').to_lowercase();
            if normalized.is_empty() {
                continue;
            }
            if !TAG_RE.is_match(&normalized) {
                return Err(ValidationError::InvalidFormat {
                    field: "tags",
                    reason: "tags must be lowercase alphanumeric with hyphens, at most 32 characters",
                });
            }
            tags.insert(normalized);
        }

        if tags.len() > MAX_QUESTION_TAGS {
            return Err(ValidationError::TooMany {
                field: "tags",
                max: MAX_QUESTION_TAGS,
            });
        }

        Ok(Self(tags.into_iter().collect()))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Normalize a single tag used as a query filter.
pub fn normalize_tag_filter(tag: &str) -> Option<String> {
    let normalized = tag.trim().trim_start_matches('#').to_lowercase();
    (!normalized.is_empty()).then_some(normalized)
}
