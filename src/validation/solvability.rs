//! Solvability: clue coverage, answer/grid agreement and theme coherence.

use super::{Issue, IssueKind, ValidationResult};
use crate::grid::{normalize_answer, Answer, Coord};
use crate::puzzle::Puzzle;
use std::collections::HashSet;

pub const MISSING_CLUE_PENALTY: f64 = 1.0;
pub const ANSWER_MISMATCH_PENALTY: f64 = 1.0;
pub const THEME_COVERAGE_PENALTY: f64 = 2.0;
pub const FEW_THEME_ANSWERS_PENALTY: f64 = 0.5;

/// A themed puzzle should carry at least this many theme answers
pub const MIN_THEME_ANSWERS: usize = 2;

#[derive(Debug, Clone, Default)]
pub struct SolvabilityChecker;

impl SolvabilityChecker {
    pub fn new() -> Self {
        Self
    }

    pub fn check(&self, puzzle: &Puzzle) -> ValidationResult {
        let mut issues = Vec::new();

        for answer in &puzzle.answers {
            if !answer.has_clue() {
                issues.push(
                    Issue::blocking(
                        IssueKind::MissingClue,
                        format!("Missing clue for {}", answer.label()),
                        MISSING_CLUE_PENALTY,
                    )
                    .with_cells([answer.start]),
                );
            }
            if let Some(issue) = check_answer_letters(puzzle, answer) {
                issues.push(issue);
            }
        }

        issues.extend(check_theme(puzzle));
        ValidationResult::from_issues(issues)
    }
}

/// The answer text must spell exactly the grid letters along its span
fn check_answer_letters(puzzle: &Puzzle, answer: &Answer) -> Option<Issue> {
    let letters = answer.letters();
    let cells: Vec<Coord> = answer.cells().collect();
    let in_grid: Vec<Option<char>> = cells.iter().map(|coord| puzzle.grid.letter(*coord)).collect();

    let matches = !letters.is_empty()
        && letters
            .iter()
            .zip(&in_grid)
            .all(|(letter, cell)| Some(*letter) == *cell);
    if matches {
        return None;
    }

    let spelled: String = in_grid.iter().map(|cell| cell.unwrap_or('.')).collect();
    Some(
        Issue::blocking(
            IssueKind::AnswerMismatch,
            format!(
                "{} answer {:?} does not match grid letters {:?}",
                answer.label(),
                answer.text,
                spelled
            ),
            ANSWER_MISMATCH_PENALTY,
        )
        .with_cells(cells.into_iter().filter(|coord| puzzle.grid.in_bounds(*coord))),
    )
}

fn check_theme(puzzle: &Puzzle) -> Vec<Issue> {
    let whitelist: Vec<String> = puzzle
        .metadata
        .theme_words
        .iter()
        .map(|word| normalize_answer(word))
        .filter(|word| !word.is_empty())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let themed = !whitelist.is_empty() || !puzzle.metadata.theme.trim().is_empty();
    if !themed {
        return Vec::new();
    }

    let present: HashSet<String> = puzzle.answers.iter().map(Answer::normalized).collect();
    let mut issues = Vec::new();

    if !whitelist.is_empty() {
        let found = whitelist.iter().filter(|word| present.contains(*word)).count();
        let fraction = found as f64 / whitelist.len() as f64;
        if fraction < 1.0 {
            let mut missing: Vec<&str> = whitelist
                .iter()
                .filter(|word| !present.contains(*word))
                .map(String::as_str)
                .collect();
            missing.sort_unstable();
            issues.push(Issue::advisory(
                IssueKind::ThemeCoverage,
                format!(
                    "{} of {} theme words appear in the grid; missing {}",
                    found,
                    whitelist.len(),
                    missing.join(", ")
                ),
                THEME_COVERAGE_PENALTY * (1.0 - fraction),
            ));
        }
    }

    let theme_answers = puzzle
        .answers
        .iter()
        .filter(|answer| answer.is_theme || whitelist.contains(&answer.normalized()))
        .count();
    if theme_answers < MIN_THEME_ANSWERS {
        issues.push(Issue::advisory(
            IssueKind::FewThemeAnswers,
            format!("Theme has fewer than {} theme answers", MIN_THEME_ANSWERS),
            FEW_THEME_ANSWERS_PENALTY,
        ));
    }
    issues
}
