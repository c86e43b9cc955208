use proptest::prelude::*;
use q5_core::badge::{compute_q5_badge, BadgeInput, ReviewStatus, MAX_SIGNAL, TOP_LEVEL};

fn arb_education() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("PhD".to_owned()),
        Just("Postdoc".to_owned()),
        Just("Master".to_owned()),
        Just("Bachelor".to_owned()),
        Just(String::new()),
        "[a-zA-Z .']{0,24}",
    ]
}

fn arb_input() -> impl Strategy<Value = BadgeInput> {
    (
        0..=MAX_SIGNAL,
        0..=MAX_SIGNAL,
        "[a-zA-Z ]{0,16}",
        arb_education(),
        0..=MAX_SIGNAL,
    )
        .prop_map(|(involvement, contribution, role, education, impact)| {
            BadgeInput::new(involvement, contribution, role, education, impact).unwrap()
        })
}

proptest! {
    /// Property: equal inputs produce equal outputs
    #[test]
    fn prop_deterministic(input in arb_input()) {
        prop_assert_eq!(compute_q5_badge(&input), compute_q5_badge(&input.clone()));
    }

    /// Property: raising contribution never lowers the level
    #[test]
    fn prop_monotonic_in_contribution(input in arb_input()) {
        prop_assume!(input.contribution() < MAX_SIGNAL);
        let raised = BadgeInput::new(
            input.involvement(),
            input.contribution() + 1,
            input.role(),
            input.education(),
            input.impact(),
        ).unwrap();

        prop_assert!(compute_q5_badge(&raised).level >= compute_q5_badge(&input).level);
    }

    /// Property: raising impact never lowers the level
    #[test]
    fn prop_monotonic_in_impact(input in arb_input()) {
        prop_assume!(input.impact() < MAX_SIGNAL);
        let raised = BadgeInput::new(
            input.involvement(),
            input.contribution(),
            input.role(),
            input.education(),
            input.impact() + 1,
        ).unwrap();

        prop_assert!(compute_q5_badge(&raised).level >= compute_q5_badge(&input).level);
    }

    /// Property: level 5 iff involvement = 4, impact ≥ 4 and contribution ≥ 4
    #[test]
    fn prop_top_level_only_for_top_tier(input in arb_input()) {
        let badge = compute_q5_badge(&input);
        let top_tier = input.involvement() == 4 && input.impact() >= 4 && input.contribution() >= 4;
        prop_assert_eq!(badge.level == TOP_LEVEL, top_tier);
    }

    /// Property: pending review iff level 5
    #[test]
    fn prop_pending_only_at_top_level(input in arb_input()) {
        let badge = compute_q5_badge(&input);
        let expected = if badge.level == TOP_LEVEL { ReviewStatus::Pending } else { ReviewStatus::Auto };
        prop_assert_eq!(badge.review_status, expected);
    }

    /// Property: below the top tier the level never exceeds involvement
    #[test]
    fn prop_capped_by_involvement(input in arb_input()) {
        let badge = compute_q5_badge(&input);
        if badge.level < TOP_LEVEL {
            prop_assert!(badge.level <= input.involvement());
        }
    }

    /// Property: out-of-range signals are always rejected
    #[test]
    fn prop_rejects_out_of_range(value in (MAX_SIGNAL + 1)..=u8::MAX) {
        prop_assert!(BadgeInput::new(value, 0, "", "", 0).is_err());
        prop_assert!(BadgeInput::new(0, value, "", "", 0).is_err());
        prop_assert!(BadgeInput::new(0, 0, "", "", value).is_err());
    }
}

#[test]
fn phd_top_tier_example() {
    let input = BadgeInput::new(4, 4, "Principal investigator", "PhD", 4).unwrap();
    let badge = compute_q5_badge(&input);

    assert_eq!(badge.level, 5);
    assert_eq!(badge.label, "Authority");
    assert_eq!(badge.review_status, ReviewStatus::Pending);
    assert_eq!(badge.review_status.as_str(), "pending");
}
