//! Q5 badge scoring rubric
//!
//! Maps five self-reported survey signals to a reputation level
//! (Observer → Authority). Pure and deterministic: no I/O, no clock.
//!
//! ```text
//! score = contribution×18 + impact×10 + education bonus (PhD/Postdoc 6, Master 3)
//! level = thresholds 15/35/55/75/95, capped at min(4, involvement)
//!         unless involvement, impact and contribution are all 4 → level 5
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Q5Error, Result};

/// Upper bound of every 0..=4 survey signal.
pub const MAX_SIGNAL: u8 = 4;

/// Highest badge level. Only reachable through the top-tier condition.
pub const TOP_LEVEL: u8 = 5;

const CONTRIBUTION_WEIGHT: u32 = 18;
const IMPACT_WEIGHT: u32 = 10;
const DOCTORATE_BONUS: u32 = 6;
const MASTER_BONUS: u32 = 3;

/// Score needed for levels 1 through 5.
const LEVEL_THRESHOLDS: [u32; 5] = [15, 35, 55, 75, 95];

const LEVEL_LABELS: [&str; 6] = [
    "Observer",
    "Explorer",
    "Contributor",
    "Practitioner",
    "Expert",
    "Authority",
];

/// Whether a computed badge is granted directly or queued for a moderator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Auto,
    Pending,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Pending => "pending",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(Self::Auto),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }
}

/// Validated survey answers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BadgeInput {
    involvement: u8,
    contribution: u8,
    role: String,
    education: String,
    impact: u8,
}

impl BadgeInput {
    /// Build survey input, rejecting signals above [`MAX_SIGNAL`].
    ///
    /// # Example
    /// ```
    /// use q5_core::badge::BadgeInput;
    ///
    /// assert!(BadgeInput::new(2, 3, "Researcher", "Master", 1).is_ok());
    /// assert!(BadgeInput::new(5, 3, "Researcher", "Master", 1).is_err());
    /// ```
    pub fn new(
        involvement: u8,
        contribution: u8,
        role: impl Into<String>,
        education: impl Into<String>,
        impact: u8,
    ) -> Result<Self> {
        check_signal("involvement", involvement)?;
        check_signal("contribution", contribution)?;
        check_signal("impact", impact)?;

        Ok(Self {
            involvement,
            contribution,
            role: role.into().trim().to_owned(),
            education: education.into().trim().to_owned(),
            impact,
        })
    }

    pub fn involvement(&self) -> u8 {
        self.involvement
    }

    pub fn contribution(&self) -> u8 {
        self.contribution
    }

    pub fn impact(&self) -> u8 {
        self.impact
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn education(&self) -> &str {
        &self.education
    }

    /// The stricter condition that alone unlocks level 5.
    pub fn meets_top_tier(&self) -> bool {
        self.involvement >= MAX_SIGNAL && self.impact >= MAX_SIGNAL && self.contribution >= MAX_SIGNAL
    }
}

fn check_signal(signal: &'static str, value: u8) -> Result<()> {
    if value > MAX_SIGNAL {
        return Err(Q5Error::SignalOutOfRange {
            signal,
            value,
            max: MAX_SIGNAL,
        });
    }
    Ok(())
}

/// Computed badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Q5Badge {
    pub level: u8,
    pub label: &'static str,
    pub review_status: ReviewStatus,
    pub score: u32,
    pub rationale: String,
}

/// Bonus points for the education level.
///
/// Matching is case-insensitive: "PhD", "Ph.D." and "Postdoc" score the
/// doctorate bonus, anything mentioning "master" the master bonus.
pub fn education_bonus(education: &str) -> u32 {
    let normalized = education.to_lowercase().replace('.', "");
    if normalized.contains("phd") || normalized.contains("postdoc") {
        DOCTORATE_BONUS
    } else if normalized.contains("master") {
        MASTER_BONUS
    } else {
        0
    }
}

/// Weighted score before thresholds.
pub fn weighted_score(input: &BadgeInput) -> u32 {
    u32::from(input.contribution) * CONTRIBUTION_WEIGHT
        + u32::from(input.impact) * IMPACT_WEIGHT
        + education_bonus(&input.education)
}

/// Level implied by the score alone, before any cap.
pub fn level_for_score(score: u32) -> u8 {
    LEVEL_THRESHOLDS.iter().filter(|&&t| score >= t).count() as u8
}

/// Display label for a level. Levels above 5 clamp to the top label.
pub fn label_for_level(level: u8) -> &'static str {
    LEVEL_LABELS[usize::from(level.min(TOP_LEVEL))]
}

/// Score the survey and derive level, label and review status.
///
/// # Example
/// ```
/// use q5_core::badge::{compute_q5_badge, BadgeInput, ReviewStatus};
///
/// let input = BadgeInput::new(4, 4, "Group leader", "PhD", 4).unwrap();
/// let badge = compute_q5_badge(&input);
/// assert_eq!(badge.level, 5);
/// assert_eq!(badge.review_status, ReviewStatus::Pending);
/// ```
pub fn compute_q5_badge(input: &BadgeInput) -> Q5Badge {
    let score = weighted_score(input);
    let scored_level = level_for_score(score);

    let mut notes = vec![format!(
        "score {score} = contribution {}×{CONTRIBUTION_WEIGHT} + impact {}×{IMPACT_WEIGHT} + education bonus {}",
        input.contribution,
        input.impact,
        education_bonus(&input.education)
    )];

    let level = if input.meets_top_tier() {
        notes.push("top-tier criteria met".to_owned());
        TOP_LEVEL
    } else {
        let ceiling = (TOP_LEVEL - 1).min(input.involvement);
        if scored_level > ceiling {
            notes.push(format!(
                "score maps to level {scored_level}, capped at {ceiling} by involvement {}",
                input.involvement
            ));
            ceiling
        } else {
            scored_level
        }
    };

    let review_status = if level == TOP_LEVEL {
        notes.push("requires manual review".to_owned());
        ReviewStatus::Pending
    } else {
        ReviewStatus::Auto
    };

    if !input.role.is_empty() {
        notes.push(format!("role: {}", input.role));
    }

    Q5Badge {
        level,
        label: label_for_level(level),
        review_status,
        score,
        rationale: notes.join("; "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn badge(involvement: u8, contribution: u8, education: &str, impact: u8) -> Q5Badge {
        let input = BadgeInput::new(involvement, contribution, "Researcher", education, impact)
            .expect("valid input");
        compute_q5_badge(&input)
    }

    #[test]
    fn all_zero_is_observer() {
        let b = badge(0, 0, "", 0);
        assert_eq!(b.score, 0);
        assert_eq!(b.level, 0);
        assert_eq!(b.label, "Observer");
        assert_eq!(b.review_status, ReviewStatus::Auto);
    }

    #[test]
    fn top_tier_reaches_authority() {
        let b = badge(4, 4, "PhD", 4);
        assert_eq!(b.score, 4 * 18 + 4 * 10 + 6);
        assert_eq!(b.level, 5);
        assert_eq!(b.label, "Authority");
        assert_eq!(b.review_status, ReviewStatus::Pending);
        assert!(b.rationale.contains("manual review"));
    }

    #[test]
    fn high_score_without_top_tier_caps_at_four() {
        // 4×18 + 3×10 + 6 = 108, above the level 5 threshold
        let b = badge(4, 4, "Postdoc", 3);
        assert_eq!(b.score, 108);
        assert_eq!(b.level, 4);
        assert_eq!(b.label, "Expert");
        assert_eq!(b.review_status, ReviewStatus::Auto);
    }

    #[test]
    fn level_capped_by_involvement() {
        // 3×18 + 2×10 + 3 = 77 → level 4, but involvement 1
        let b = badge(1, 3, "Master", 2);
        assert_eq!(b.score, 77);
        assert_eq!(b.level, 1);
        assert!(b.rationale.contains("capped at 1"));
    }

    #[test]
    fn thresholds_are_inclusive() {
        assert_eq!(level_for_score(14), 0);
        assert_eq!(level_for_score(15), 1);
        assert_eq!(level_for_score(34), 1);
        assert_eq!(level_for_score(35), 2);
        assert_eq!(level_for_score(55), 3);
        assert_eq!(level_for_score(75), 4);
        assert_eq!(level_for_score(94), 4);
        assert_eq!(level_for_score(95), 5);
    }

    #[test]
    fn education_bonus_matching() {
        assert_eq!(education_bonus("PhD"), 6);
        assert_eq!(education_bonus("Ph.D. in Physics"), 6);
        assert_eq!(education_bonus("postdoc"), 6);
        assert_eq!(education_bonus("Master's"), 3);
        assert_eq!(education_bonus("MASTER"), 3);
        assert_eq!(education_bonus("Bachelor"), 0);
        assert_eq!(education_bonus(""), 0);
    }

    #[test]
    fn rejects_out_of_range_signals() {
        let err = BadgeInput::new(0, 5, "", "", 0).unwrap_err();
        assert!(matches!(
            err,
            Q5Error::SignalOutOfRange {
                signal: "contribution",
                value: 5,
                ..
            }
        ));
        assert!(BadgeInput::new(0, 0, "", "", 9).is_err());
        assert!(BadgeInput::new(7, 0, "", "", 0).is_err());
    }

    #[test]
    fn review_status_round_trips_through_str() {
        for status in [ReviewStatus::Auto, ReviewStatus::Pending] {
            assert_eq!(ReviewStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ReviewStatus::parse("approved"), None);
    }

    #[test]
    fn labels_cover_every_level() {
        assert_eq!(label_for_level(1), "Explorer");
        assert_eq!(label_for_level(2), "Contributor");
        assert_eq!(label_for_level(3), "Practitioner");
        assert_eq!(label_for_level(200), "Authority");
    }
}
