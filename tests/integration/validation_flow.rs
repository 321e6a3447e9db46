//! Grid, fill and solvability validation feeding the quality scorer

use super::support::{five_by_five, square_answers, two_region_grid};
use cruciverb::config::ConstructionConfig;
use cruciverb::grid::{Coord, Grid};
use cruciverb::puzzle::{Puzzle, PuzzleMetadata};
use cruciverb::quality::QualityScorer;
use cruciverb::validation::{
    FillValidator, GridValidator, IssueKind, Lexicon, Severity, SolvabilityChecker,
};
use std::sync::Arc;

fn blocking_kinds(issues: &[cruciverb::validation::Issue]) -> Vec<IssueKind> {
    issues
        .iter()
        .filter(|issue| issue.severity == Severity::Blocking)
        .map(|issue| issue.kind)
        .collect()
}

#[test]
fn split_grid_fails_only_on_connectivity() {
    let grid = two_region_grid();
    assert_eq!(grid.black_count(), 45);
    assert!((grid.black_ratio() - 0.2).abs() < 1e-12);

    let result = GridValidator::default().validate(&grid);
    assert!(!result.passed);
    assert_eq!(blocking_kinds(&result.issues), vec![IssueKind::Disconnected]);
    // the corner stacks form 2x2 black blocks; those only cost points
    assert!(result
        .issues
        .iter()
        .filter(|issue| issue.kind == IssueKind::BlackBlock)
        .all(|issue| issue.severity == Severity::Advisory));
}

#[test]
fn opening_the_middle_row_reconnects_the_grid() {
    let mut grid = two_region_grid();
    grid.set_white(Coord::new(7, 7)).unwrap();

    let result = GridValidator::default().validate(&grid);
    assert!(!result.has_issue(IssueKind::Disconnected));
    // a lone white cell in a black row is only crossed by its Down word
    assert!(result.has_issue(IssueKind::UncheckedCell));
    assert!(!result.has_issue(IssueKind::ShortWord));
}

#[test]
fn asymmetry_is_blocking_only_when_required() {
    let grid = Grid::from_pattern(&["#....", ".....", ".....", ".....", "....."]).unwrap();

    let strict = GridValidator::default().validate(&grid);
    assert_eq!(blocking_kinds(&strict.issues), vec![IssueKind::Asymmetric]);

    let relaxed = GridValidator::from_config(&ConstructionConfig {
        require_symmetry: false,
        ..ConstructionConfig::default()
    })
    .validate(&grid);
    assert!(relaxed.passed, "{:?}", relaxed.issues);
}

#[test]
fn clean_five_by_five_scores_full_marks() {
    let grid = five_by_five();
    let result = GridValidator::default().validate(&grid);
    assert!(result.passed, "{:?}", result.issues);
    assert!(result.issues.is_empty());
    assert_eq!(result.subscore, 10.0);
}

#[test]
fn theme_words_bypass_the_lexicon() {
    let grid = five_by_five();
    let answers = grid.answers(3).unwrap();
    assert_eq!(answers.len(), 10);

    let lexicon = Arc::new(Lexicon::from_words([
        "CAB", "ARENA", "PERIL", "ENOTE", "SEA", "CAPE", "AREN", "NITE", "ALEA",
    ]));
    let validator = FillValidator::default().with_lexicon(lexicon);

    let result = validator.validate(&grid, &answers, &[]);
    assert_eq!(blocking_kinds(&result.issues), vec![IssueKind::UnknownWord]);
    assert!(result
        .issues
        .iter()
        .any(|issue| issue.kind == IssueKind::UnknownWord && issue.message.contains("BEROS")));

    let result = validator.validate(&grid, &answers, &["beros".to_string()]);
    assert!(result.passed, "{:?}", result.issues);
}

#[test]
fn full_puzzle_is_scored_from_all_three_validators() {
    let grid = Grid::from_pattern(&["SPA", "TIN", "YET"]).unwrap();
    let answers: Vec<_> = square_answers()
        .into_iter()
        .map(|answer| answer.with_clue("Clue"))
        .collect();
    let config = ConstructionConfig {
        grid_rows: 3,
        grid_cols: 3,
        ..ConstructionConfig::default()
    };
    let puzzle = Puzzle::new(grid.clone(), answers.clone(), PuzzleMetadata::default());

    let grid_result = GridValidator::from_config(&config).validate(&grid);
    let fill_result = FillValidator::from_config(&config, None).validate(&grid, &answers, &[]);
    let solvability = SolvabilityChecker::new().check(&puzzle);
    assert!(grid_result.passed && fill_result.passed && solvability.passed);

    let report = QualityScorer::new().score(&grid_result, &fill_result, &solvability);
    assert!(report.score > 9.5 && report.score <= 10.0, "{}", report.score);
    assert!(report.accepts(config.quality_threshold));
    assert!(!report.accepts(10.0));
}

#[test]
fn missing_clues_block_solvability() {
    let grid = Grid::from_pattern(&["SPA", "TIN", "YET"]).unwrap();
    let mut answers = square_answers();
    for answer in answers.iter_mut().skip(1) {
        answer.clue = Some("Clue".to_string());
    }
    let puzzle = Puzzle::new(grid, answers, PuzzleMetadata::default());

    let result = SolvabilityChecker::new().check(&puzzle);
    assert!(!result.passed);
    assert_eq!(blocking_kinds(&result.issues), vec![IssueKind::MissingClue]);
}
