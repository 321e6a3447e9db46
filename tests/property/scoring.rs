//! Property-based tests for quality scoring and the retry policy

use cruciverb::pipeline::RetryPolicy;
use cruciverb::quality::{QualityScorer, FILL_WEIGHT, GRID_WEIGHT, SOLVABILITY_WEIGHT};
use cruciverb::validation::{Issue, IssueKind, ValidationResult};
use proptest::prelude::*;
use std::time::Duration;

fn arb_result() -> impl Strategy<Value = ValidationResult> {
    prop::collection::vec((any::<bool>(), 0.0f64..4.0), 0..6).prop_map(|issues| {
        ValidationResult::from_issues(
            issues
                .into_iter()
                .map(|(blocking, penalty)| {
                    if blocking {
                        Issue::blocking(IssueKind::ShortWord, "short", penalty)
                    } else {
                        Issue::advisory(IssueKind::BlackBlock, "block", penalty)
                    }
                })
                .collect(),
        )
    })
}

proptest! {
    #[test]
    fn score_is_the_weighted_sum(
        grid in arb_result(),
        fill in arb_result(),
        solvability in arb_result(),
    ) {
        let report = QualityScorer::new().score(&grid, &fill, &solvability);
        let expected = GRID_WEIGHT * grid.subscore
            + FILL_WEIGHT * fill.subscore
            + SOLVABILITY_WEIGHT * solvability.subscore;

        prop_assert!((0.0..=10.0).contains(&report.score));
        prop_assert!((report.score - expected).abs() < 0.01);
        prop_assert_eq!(
            report.has_blocking(),
            !(grid.passed && fill.passed && solvability.passed)
        );
    }

    #[test]
    fn blocking_reports_are_never_accepted(
        grid in arb_result(),
        fill in arb_result(),
        solvability in arb_result(),
        threshold in 0.0f64..=10.0,
    ) {
        let report = QualityScorer::new().score(&grid, &fill, &solvability);
        if report.has_blocking() {
            prop_assert!(!report.accepts(threshold));
        }
        if report.accepts(threshold) {
            prop_assert!(report.score >= threshold);
        }
    }

    #[test]
    fn randomness_rises_and_stays_in_range(
        start in 0.0f64..=1.0,
        step in 0.0f64..=0.5,
        attempts in 1u32..8,
    ) {
        let policy = RetryPolicy { randomness_step: step, ..RetryPolicy::default() };
        let mut randomness = start;
        for attempt in 1..=attempts {
            let next = policy.next_randomness(randomness, attempt);
            prop_assert!((0.0..=1.0).contains(&next));
            prop_assert!(next >= randomness);
            randomness = next;
        }
    }

    #[test]
    fn backoff_is_capped(attempt in 0u32..200, base_ms in 1u64..1000, max_ms in 1u64..60_000) {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(base_ms),
            max_delay: Duration::from_millis(max_ms),
            ..RetryPolicy::default()
        };
        let delay = policy.backoff_delay(attempt);
        prop_assert!(delay <= Duration::from_millis(max_ms));
        if attempt == 0 {
            prop_assert_eq!(delay, Duration::ZERO);
        }
    }
}
