//! Grid Model
//!
//! An N×M matrix of black and white cells. White cells may carry a letter and a
//! clue number. The model only stores and derives geometry; legality is decided
//! by the validators in [`crate::validation`].

mod answer;
mod slots;

pub use answer::{normalize_answer, Answer};
pub use slots::{Run, Slot};

use crate::error::GridError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Row/column position, zero-based from the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<(usize, usize)> for Coord {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl From<Coord> for (usize, usize) {
    fn from(coord: Coord) -> Self {
        (coord.row, coord.col)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Word direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Across,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Across, Direction::Down];

    /// Coordinate `offset` cells from `start` along this direction
    pub fn step(self, start: Coord, offset: usize) -> Coord {
        match self {
            Direction::Across => Coord::new(start.row, start.col.saturating_add(offset)),
            Direction::Down => Coord::new(start.row.saturating_add(offset), start.col),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Across => "across",
            Direction::Down => "down",
        }
    }

    /// Parse the loose spellings generation services return ("Across", "A", "down")
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "across" | "a" | "ac" => Some(Direction::Across),
            "down" | "d" | "dn" => Some(Direction::Down),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Across => write!(f, "Across"),
            Direction::Down => write!(f, "Down"),
        }
    }
}

/// A single grid square
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Black,
    White {
        letter: Option<char>,
        number: Option<u32>,
    },
}

impl Cell {
    pub const EMPTY: Cell = Cell::White {
        letter: None,
        number: None,
    };

    pub fn is_black(&self) -> bool {
        matches!(self, Cell::Black)
    }

    pub fn is_white(&self) -> bool {
        !self.is_black()
    }

    pub fn letter(&self) -> Option<char> {
        match self {
            Cell::White { letter, .. } => *letter,
            Cell::Black => None,
        }
    }

    pub fn number(&self) -> Option<u32> {
        match self {
            Cell::White { number, .. } => *number,
            Cell::Black => None,
        }
    }
}

/// Crossword grid
///
/// Serialized as row patterns (`#` black, `.` empty, letters filled) plus an
/// optional number matrix where 0 marks an unnumbered cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridRepr", into = "GridRepr")]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

#[derive(Serialize, Deserialize)]
struct GridRepr {
    pattern: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    numbers: Vec<Vec<u32>>,
}

impl TryFrom<GridRepr> for Grid {
    type Error = GridError;

    fn try_from(repr: GridRepr) -> Result<Self, Self::Error> {
        let mut grid = Grid::from_pattern(&repr.pattern)?;
        for (row, numbers) in repr.numbers.iter().enumerate() {
            for (col, number) in numbers.iter().enumerate() {
                if *number == 0 {
                    continue;
                }
                let index = grid.index(Coord::new(row, col))?;
                if let Cell::White { number: slot, .. } = &mut grid.cells[index] {
                    *slot = Some(*number);
                }
            }
        }
        Ok(grid)
    }
}

impl From<Grid> for GridRepr {
    fn from(grid: Grid) -> Self {
        let numbered = grid.cells.iter().any(|cell| cell.number().is_some());
        let numbers = if numbered {
            (0..grid.rows)
                .map(|row| {
                    (0..grid.cols)
                        .map(|col| grid.cells[row * grid.cols + col].number().unwrap_or(0))
                        .collect()
                })
                .collect()
        } else {
            Vec::new()
        };
        GridRepr {
            pattern: grid.pattern(),
            numbers,
        }
    }
}

impl Grid {
    /// Create an all-white, empty grid
    pub fn new(rows: usize, cols: usize) -> Result<Self, GridError> {
        if rows == 0 || cols == 0 {
            return Err(GridError::InvalidDimensions { rows, cols });
        }
        Ok(Self {
            rows,
            cols,
            cells: vec![Cell::EMPTY; rows * cols],
        })
    }

    /// Parse row patterns: `#` black, `.` empty white, any letter a filled white cell
    pub fn from_pattern<S: AsRef<str>>(pattern: &[S]) -> Result<Self, GridError> {
        let rows = pattern.len();
        let cols = pattern
            .first()
            .map(|row| row.as_ref().chars().count())
            .unwrap_or(0);
        let mut grid = Grid::new(rows, cols)?;

        for (row, line) in pattern.iter().enumerate() {
            let line = line.as_ref();
            let actual = line.chars().count();
            if actual != cols {
                return Err(GridError::RaggedRow {
                    row,
                    expected: cols,
                    actual,
                });
            }
            for (col, ch) in line.chars().enumerate() {
                let cell = match ch {
                    '#' => Cell::Black,
                    '.' => Cell::EMPTY,
                    other => match cell_letter(other) {
                        Some(letter) => Cell::White {
                            letter: Some(letter),
                            number: None,
                        },
                        None => {
                            return Err(GridError::InvalidCell {
                                row,
                                col,
                                value: other.to_string(),
                            })
                        }
                    },
                };
                grid.cells[row * cols + col] = cell;
            }
        }
        Ok(grid)
    }

    /// Build from a 0/1 layout matrix, 1 being a white cell
    pub fn from_layout(layout: &[Vec<u8>]) -> Result<Self, GridError> {
        let rows = layout.len();
        let cols = layout.first().map(Vec::len).unwrap_or(0);
        let mut grid = Grid::new(rows, cols)?;

        for (row, values) in layout.iter().enumerate() {
            if values.len() != cols {
                return Err(GridError::RaggedRow {
                    row,
                    expected: cols,
                    actual: values.len(),
                });
            }
            for (col, value) in values.iter().enumerate() {
                grid.cells[row * cols + col] = match value {
                    0 => Cell::Black,
                    1 => Cell::EMPTY,
                    other => {
                        return Err(GridError::InvalidCell {
                            row,
                            col,
                            value: other.to_string(),
                        })
                    }
                };
            }
        }
        Ok(grid)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn in_bounds(&self, coord: Coord) -> bool {
        coord.row < self.rows && coord.col < self.cols
    }

    fn index(&self, coord: Coord) -> Result<usize, GridError> {
        if self.in_bounds(coord) {
            Ok(coord.row * self.cols + coord.col)
        } else {
            Err(GridError::OutOfBounds {
                row: coord.row,
                col: coord.col,
            })
        }
    }

    pub fn cell(&self, coord: Coord) -> Option<&Cell> {
        self.index(coord).ok().map(|index| &self.cells[index])
    }

    /// Out-of-bounds positions read as black, matching the grid border
    pub fn is_black(&self, coord: Coord) -> bool {
        self.cell(coord).map(Cell::is_black).unwrap_or(true)
    }

    pub fn is_white(&self, coord: Coord) -> bool {
        !self.is_black(coord)
    }

    pub fn letter(&self, coord: Coord) -> Option<char> {
        self.cell(coord).and_then(Cell::letter)
    }

    pub fn number(&self, coord: Coord) -> Option<u32> {
        self.cell(coord).and_then(Cell::number)
    }

    pub fn set_black(&mut self, coord: Coord) -> Result<(), GridError> {
        let index = self.index(coord)?;
        self.cells[index] = Cell::Black;
        Ok(())
    }

    pub fn set_white(&mut self, coord: Coord) -> Result<(), GridError> {
        let index = self.index(coord)?;
        if self.cells[index].is_black() {
            self.cells[index] = Cell::EMPTY;
        }
        Ok(())
    }

    /// Write a letter into a white cell, failing on a different existing letter
    pub fn set_letter(&mut self, coord: Coord, letter: char) -> Result<(), GridError> {
        let index = self.index(coord)?;
        let incoming = cell_letter(letter).ok_or_else(|| GridError::InvalidCell {
            row: coord.row,
            col: coord.col,
            value: letter.to_string(),
        })?;
        match &mut self.cells[index] {
            Cell::Black => Err(GridError::BlackCell {
                row: coord.row,
                col: coord.col,
            }),
            Cell::White { letter: Some(existing), .. } if *existing != incoming => {
                Err(GridError::LetterConflict {
                    row: coord.row,
                    col: coord.col,
                    existing: *existing,
                    incoming,
                })
            }
            Cell::White { letter: slot, .. } => {
                *slot = Some(incoming);
                Ok(())
            }
        }
    }

    /// Coordinates in reading order
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Coord::new(row, col)))
    }

    pub fn white_cells(&self) -> impl Iterator<Item = Coord> + '_ {
        self.coords().filter(move |coord| self.is_white(*coord))
    }

    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn black_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_black()).count()
    }

    pub fn white_count(&self) -> usize {
        self.total_cells() - self.black_count()
    }

    pub fn black_ratio(&self) -> f64 {
        self.black_count() as f64 / self.total_cells() as f64
    }

    /// True when every white cell holds a letter
    pub fn is_filled(&self) -> bool {
        self.cells
            .iter()
            .all(|cell| cell.is_black() || cell.letter().is_some())
    }

    /// Same black/white layout with letters and numbers removed
    pub fn layout(&self) -> Grid {
        Grid {
            rows: self.rows,
            cols: self.cols,
            cells: self
                .cells
                .iter()
                .map(|cell| if cell.is_black() { Cell::Black } else { Cell::EMPTY })
                .collect(),
        }
    }

    /// 0/1 layout matrix, 1 being white
    pub fn layout_matrix(&self) -> Vec<Vec<u8>> {
        (0..self.rows)
            .map(|row| {
                (0..self.cols)
                    .map(|col| u8::from(self.cells[row * self.cols + col].is_white()))
                    .collect()
            })
            .collect()
    }

    /// Row patterns in the notation accepted by [`Grid::from_pattern`]
    pub fn pattern(&self) -> Vec<String> {
        (0..self.rows)
            .map(|row| {
                (0..self.cols)
                    .map(|col| match self.cells[row * self.cols + col] {
                        Cell::Black => '#',
                        Cell::White { letter: Some(c), .. } => c,
                        Cell::White { letter: None, .. } => '.',
                    })
                    .collect()
            })
            .collect()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.pattern() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// A character's answer form when it normalizes to exactly one letter
fn cell_letter(c: char) -> Option<char> {
    let normalized = normalize_answer(&c.to_string());
    let mut letters = normalized.chars();
    match (letters.next(), letters.next()) {
        (Some(letter), None) => Some(letter),
        _ => None,
    }
}
