//! Grid structure validation. Letters are ignored; only the black/white layout matters.

use super::{CappedPenalty, Issue, IssueKind, ValidationResult};
use crate::config::ConstructionConfig;
use crate::grid::{Coord, Direction, Grid};
use std::collections::{HashMap, VecDeque};

pub const SYMMETRY_PENALTY: f64 = 2.0;
pub const CONNECTIVITY_PENALTY: f64 = 3.0;
pub const BLACK_RATIO_PENALTY: f64 = 1.5;
pub const SHORT_WORD_PENALTY: f64 = 1.0;
pub const SHORT_WORD_PENALTY_CAP: f64 = 3.0;
pub const UNCHECKED_PENALTY: f64 = 0.5;
pub const UNCHECKED_PENALTY_CAP: f64 = 2.0;
pub const BLACK_BLOCK_PENALTY: f64 = 0.3;
pub const EMPTY_GRID_PENALTY: f64 = 10.0;

const RATIO_EPSILON: f64 = 1e-9;

/// Structural legality checks for a grid layout
#[derive(Debug, Clone)]
pub struct GridValidator {
    pub min_word_length: usize,
    pub max_black_ratio: f64,
    pub max_black_block: usize,
    pub require_symmetry: bool,
}

impl Default for GridValidator {
    fn default() -> Self {
        Self::from_config(&ConstructionConfig::default())
    }
}

impl GridValidator {
    pub fn from_config(config: &ConstructionConfig) -> Self {
        Self {
            min_word_length: config.min_word_length,
            max_black_ratio: config.max_black_ratio,
            max_black_block: config.max_black_block,
            require_symmetry: config.require_symmetry,
        }
    }

    pub fn validate(&self, grid: &Grid) -> ValidationResult {
        if grid.white_count() == 0 {
            return ValidationResult::from_issues(vec![Issue::blocking(
                IssueKind::EmptyGrid,
                "Grid has no white cells",
                EMPTY_GRID_PENALTY,
            )]);
        }

        let mut issues = Vec::new();
        if self.require_symmetry {
            issues.extend(self.check_symmetry(grid));
        }
        issues.extend(self.check_connectivity(grid));
        issues.extend(self.check_black_ratio(grid));
        issues.extend(self.check_word_lengths(grid));
        issues.extend(self.check_unchecked(grid));
        issues.extend(self.check_black_blocks(grid));

        ValidationResult::from_issues(issues)
    }

    /// (r,c) black iff (N-1-r, M-1-c) black
    fn check_symmetry(&self, grid: &Grid) -> Option<Issue> {
        let (rows, cols) = grid.dimensions();
        let offending: Vec<Coord> = grid
            .coords()
            .filter(|coord| {
                let mirror = Coord::new(rows - 1 - coord.row, cols - 1 - coord.col);
                grid.is_black(*coord) != grid.is_black(mirror)
            })
            .collect();

        if offending.is_empty() {
            return None;
        }
        Some(
            Issue::blocking(
                IssueKind::Asymmetric,
                format!(
                    "Grid lacks 180-degree rotational symmetry at {} cells",
                    offending.len()
                ),
                SYMMETRY_PENALTY,
            )
            .with_cells(offending),
        )
    }

    fn check_connectivity(&self, grid: &Grid) -> Option<Issue> {
        let unreached = unreachable_cells(grid);
        if unreached.is_empty() {
            return None;
        }
        Some(
            Issue::blocking(
                IssueKind::Disconnected,
                format!(
                    "White squares are not all connected: {} cells unreachable",
                    unreached.len()
                ),
                CONNECTIVITY_PENALTY,
            )
            .with_cells(unreached),
        )
    }

    fn check_black_ratio(&self, grid: &Grid) -> Option<Issue> {
        let ratio = grid.black_ratio();
        if ratio <= self.max_black_ratio + RATIO_EPSILON {
            return None;
        }
        Some(Issue::blocking(
            IssueKind::BlackRatio,
            format!(
                "Too many black squares: {:.1}% (max: {:.1}%)",
                ratio * 100.0,
                self.max_black_ratio * 100.0
            ),
            BLACK_RATIO_PENALTY,
        ))
    }

    /// Runs of length 1 are not words; anything from 2 up must reach the minimum
    fn check_word_lengths(&self, grid: &Grid) -> Vec<Issue> {
        let mut penalty = CappedPenalty::new(SHORT_WORD_PENALTY, SHORT_WORD_PENALTY_CAP);
        grid.all_runs()
            .into_iter()
            .filter(|run| run.length >= 2 && run.length < self.min_word_length)
            .map(|run| {
                Issue::blocking(
                    IssueKind::ShortWord,
                    format!(
                        "{} word at {} has {} letters (min: {})",
                        run.direction, run.start, run.length, self.min_word_length
                    ),
                    penalty.next(),
                )
                .with_cells(run.cells().collect::<Vec<_>>())
            })
            .collect()
    }

    fn check_unchecked(&self, grid: &Grid) -> Vec<Issue> {
        let across = run_lengths(grid, Direction::Across);
        let down = run_lengths(grid, Direction::Down);
        let mut penalty = CappedPenalty::new(UNCHECKED_PENALTY, UNCHECKED_PENALTY_CAP);

        grid.white_cells()
            .filter(|coord| {
                across.get(coord).copied().unwrap_or(0) < 2
                    || down.get(coord).copied().unwrap_or(0) < 2
            })
            .map(|coord| {
                Issue::blocking(
                    IssueKind::UncheckedCell,
                    format!("Cell {} is not crossed by both an Across and a Down word", coord),
                    penalty.next(),
                )
                .with_cells([coord])
            })
            .collect()
    }

    fn check_black_blocks(&self, grid: &Grid) -> Vec<Issue> {
        let k = self.max_black_block;
        let (rows, cols) = grid.dimensions();
        if k == 0 || k > rows || k > cols {
            return Vec::new();
        }

        let mut issues = Vec::new();
        for row in 0..=rows - k {
            for col in 0..=cols - k {
                let block: Vec<Coord> = (0..k)
                    .flat_map(|dr| (0..k).map(move |dc| Coord::new(row + dr, col + dc)))
                    .collect();
                if block.iter().all(|coord| grid.is_black(*coord)) {
                    issues.push(
                        Issue::advisory(
                            IssueKind::BlackBlock,
                            format!("{}x{} block of black squares at {}", k, k, Coord::new(row, col)),
                            BLACK_BLOCK_PENALTY,
                        )
                        .with_cells(block),
                    );
                }
            }
        }
        issues
    }
}

fn run_lengths(grid: &Grid, direction: Direction) -> HashMap<Coord, usize> {
    let mut lengths = HashMap::new();
    for run in grid.runs(direction) {
        for coord in run.cells() {
            lengths.insert(coord, run.length);
        }
    }
    lengths
}

/// White cells not reached by a flood fill from the first white cell in reading order
pub fn unreachable_cells(grid: &Grid) -> Vec<Coord> {
    let Some(origin) = grid.white_cells().next() else {
        return Vec::new();
    };

    let (rows, cols) = grid.dimensions();
    let mut seen = vec![false; rows * cols];
    let mut queue = VecDeque::from([origin]);
    seen[origin.row * cols + origin.col] = true;

    while let Some(coord) = queue.pop_front() {
        let mut neighbours = Vec::with_capacity(4);
        if coord.row > 0 {
            neighbours.push(Coord::new(coord.row - 1, coord.col));
        }
        if coord.col > 0 {
            neighbours.push(Coord::new(coord.row, coord.col - 1));
        }
        neighbours.push(Coord::new(coord.row + 1, coord.col));
        neighbours.push(Coord::new(coord.row, coord.col + 1));

        for next in neighbours {
            if grid.is_white(next) && !seen[next.row * cols + next.col] {
                seen[next.row * cols + next.col] = true;
                queue.push_back(next);
            }
        }
    }

    grid.white_cells()
        .filter(|coord| !seen[coord.row * cols + coord.col])
        .collect()
}
