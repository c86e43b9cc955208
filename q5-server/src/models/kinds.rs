//! Enumerated column values and their string forms

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Connection state between two members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntanglementStatus {
    Pending,
    Accepted,
    Declined,
}

impl EntanglementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            other => Err(ValidationError::InvalidVariant {
                field: "status",
                value: other.to_owned(),
            }),
        }
    }

    /// Addressee's answer to a request. Only pending requests can be answered.
    pub fn respond(self, accept: bool) -> Option<Self> {
        match (self, accept) {
            (Self::Pending, true) => Some(Self::Accepted),
            (Self::Pending, false) => Some(Self::Declined),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationKind {
    Company,
    ResearchGroup,
}

impl OrganizationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::ResearchGroup => "research_group",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "company" => Ok(Self::Company),
            "research_group" => Ok(Self::ResearchGroup),
            other => Err(ValidationError::InvalidVariant {
                field: "kind",
                value: other.to_owned(),
            }),
        }
    }
}

/// Question list ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionSort {
    #[default]
    Newest,
    Votes,
    Unanswered,
}

impl QuestionSort {
    /// ORDER BY / filter fragment. Static SQL, never user text.
    pub(crate) fn order_clause(&self) -> &'static str {
        match self {
            Self::Newest | Self::Unanswered => "q.created_at DESC",
            Self::Votes => "vote_count DESC, q.created_at DESC",
        }
    }

    pub(crate) fn unanswered_only(&self) -> bool {
        matches!(self, Self::Unanswered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_be_answered() {
        assert_eq!(
            EntanglementStatus::Pending.respond(true),
            Some(EntanglementStatus::Accepted)
        );
        assert_eq!(
            EntanglementStatus::Pending.respond(false),
            Some(EntanglementStatus::Declined)
        );
    }

    #[test]
    fn settled_requests_are_final() {
        assert_eq!(EntanglementStatus::Accepted.respond(false), None);
        assert_eq!(EntanglementStatus::Declined.respond(true), None);
    }

    #[test]
    fn status_strings() {
        for s in ["pending", "accepted", "declined"] {
            assert_eq!(EntanglementStatus::parse(s).unwrap().as_str(), s);
        }
        assert!(matches!(
            EntanglementStatus::parse("blocked").unwrap_err(),
            ValidationError::InvalidVariant { field: "status", .. }
        ));
    }

    #[test]
    fn organization_kinds() {
        assert_eq!(
            OrganizationKind::parse("research_group").unwrap(),
            OrganizationKind::ResearchGroup
        );
        assert!(OrganizationKind::parse("university").is_err());
    }

    #[test]
    fn question_sort_from_query() {
        let sort: QuestionSort = serde_json::from_str("\"votes\"").unwrap();
        assert_eq!(sort, QuestionSort::Votes);
        assert!(QuestionSort::Unanswered.unanswered_only());
        assert_eq!(QuestionSort::default(), QuestionSort::Newest);
    }
}
