//! Validation engine
//!
//! Grid, fill and solvability validators share one result shape: a pass/fail
//! flag, the issues found and a 0-10 sub-score. The quality scorer combines
//! those results without knowing which validator produced them.

pub mod fill;
pub mod grid;
pub mod lexicon;
pub mod solvability;

pub use fill::{letter_pattern_score, FillValidator};
pub use grid::GridValidator;
pub use lexicon::Lexicon;
pub use solvability::SolvabilityChecker;

use crate::grid::Coord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound of every sub-score
pub const MAX_SUBSCORE: f64 = 10.0;

/// Whether an issue fails validation or only lowers the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Blocking,
    Advisory,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Blocking => write!(f, "blocking"),
            Severity::Advisory => write!(f, "advisory"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    // grid structure
    EmptyGrid,
    Asymmetric,
    Disconnected,
    BlackRatio,
    ShortWord,
    UncheckedCell,
    BlackBlock,
    // fill
    AnswerGeometry,
    MissingAnswer,
    CrossingMismatch,
    DuplicateWord,
    UnknownWord,
    PoorLetterPattern,
    // solvability
    MissingClue,
    AnswerMismatch,
    ThemeCoverage,
    FewThemeAnswers,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::EmptyGrid => "empty_grid",
            IssueKind::Asymmetric => "asymmetric",
            IssueKind::Disconnected => "disconnected",
            IssueKind::BlackRatio => "black_ratio",
            IssueKind::ShortWord => "short_word",
            IssueKind::UncheckedCell => "unchecked_cell",
            IssueKind::BlackBlock => "black_block",
            IssueKind::AnswerGeometry => "answer_geometry",
            IssueKind::MissingAnswer => "missing_answer",
            IssueKind::CrossingMismatch => "crossing_mismatch",
            IssueKind::DuplicateWord => "duplicate_word",
            IssueKind::UnknownWord => "unknown_word",
            IssueKind::PoorLetterPattern => "poor_letter_pattern",
            IssueKind::MissingClue => "missing_clue",
            IssueKind::AnswerMismatch => "answer_mismatch",
            IssueKind::ThemeCoverage => "theme_coverage",
            IssueKind::FewThemeAnswers => "few_theme_answers",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validator finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cells: Vec<Coord>,
    pub penalty: f64,
}

impl Issue {
    pub fn blocking(kind: IssueKind, message: impl Into<String>, penalty: f64) -> Self {
        Self {
            kind,
            severity: Severity::Blocking,
            message: message.into(),
            cells: Vec::new(),
            penalty,
        }
    }

    pub fn advisory(kind: IssueKind, message: impl Into<String>, penalty: f64) -> Self {
        Self {
            kind,
            severity: Severity::Advisory,
            message: message.into(),
            cells: Vec::new(),
            penalty,
        }
    }

    pub fn with_cells(mut self, cells: impl IntoIterator<Item = Coord>) -> Self {
        self.cells = cells.into_iter().collect();
        self
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Blocking
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.kind, self.message)
    }
}

/// Outcome of one validator run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub issues: Vec<Issue>,
    pub subscore: f64,
}

impl ValidationResult {
    /// Sub-score is 10 minus every issue penalty, clamped to [0, 10]
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        Self::with_base(MAX_SUBSCORE, issues)
    }

    /// Sub-score starts from `base` instead of 10
    pub fn with_base(base: f64, issues: Vec<Issue>) -> Self {
        let penalty: f64 = issues.iter().map(|issue| issue.penalty).sum();
        let passed = !issues.iter().any(Issue::is_blocking);
        Self {
            passed,
            subscore: (base - penalty).clamp(0.0, MAX_SUBSCORE),
            issues,
        }
    }

    pub fn blocking_issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|issue| issue.is_blocking())
    }

    pub fn advisory_issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|issue| !issue.is_blocking())
    }

    pub fn has_issue(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|issue| issue.kind == kind)
    }
}

/// Adds per-occurrence penalties until `cap` is reached, then zero
pub(crate) struct CappedPenalty {
    each: f64,
    remaining: f64,
}

impl CappedPenalty {
    pub(crate) fn new(each: f64, cap: f64) -> Self {
        Self {
            each,
            remaining: cap,
        }
    }

    pub(crate) fn next(&mut self) -> f64 {
        let penalty = self.each.min(self.remaining).max(0.0);
        self.remaining -= penalty;
        penalty
    }
}
