//! Answers placed in grid slots.

use super::{Coord, Direction, Grid, Slot};
use crate::error::GridError;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// A word occupying a slot, with an optional clue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(default)]
    pub number: u32,
    pub direction: Direction,
    pub start: Coord,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clue: Option<String>,
    #[serde(default)]
    pub is_theme: bool,
}

impl Answer {
    pub fn new(direction: Direction, start: Coord, text: impl Into<String>) -> Self {
        Self {
            number: 0,
            direction,
            start,
            text: text.into(),
            clue: None,
            is_theme: false,
        }
    }

    pub fn with_clue(mut self, clue: impl Into<String>) -> Self {
        self.clue = Some(clue.into());
        self
    }

    pub fn theme(mut self) -> Self {
        self.is_theme = true;
        self
    }

    /// Uppercase letters of the answer with accents and punctuation removed
    pub fn normalized(&self) -> String {
        normalize_answer(&self.text)
    }

    pub fn letters(&self) -> Vec<char> {
        self.normalized().chars().collect()
    }

    /// Number of letters the answer places in the grid
    pub fn len(&self) -> usize {
        self.normalized().chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cells(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.len()).map(move |offset| self.direction.step(self.start, offset))
    }

    pub fn has_clue(&self) -> bool {
        self.clue
            .as_deref()
            .map(|clue| !clue.trim().is_empty())
            .unwrap_or(false)
    }

    /// "12 Across" style label
    pub fn label(&self) -> String {
        format!("{} {}", self.number, self.direction)
    }
}

/// Uppercase, NFKD-decompose and keep only alphabetic characters
pub fn normalize_answer(text: &str) -> String {
    text.nfkd()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_uppercase)
        .collect()
}

impl Grid {
    /// Place an answer's letters starting at `start`, first writer wins on agreement
    pub fn place_answer(
        &mut self,
        start: Coord,
        direction: Direction,
        text: &str,
    ) -> Result<(), GridError> {
        let letters: Vec<char> = normalize_answer(text).chars().collect();
        if letters.is_empty() {
            return Err(GridError::EmptyAnswer {
                text: text.to_string(),
            });
        }

        // Check the whole span before writing so a failed placement leaves the grid untouched
        for (offset, letter) in letters.iter().enumerate() {
            let coord = direction.step(start, offset);
            match self.cell(coord) {
                None => {
                    return Err(GridError::OutOfBounds {
                        row: coord.row,
                        col: coord.col,
                    })
                }
                Some(cell) if cell.is_black() => {
                    return Err(GridError::BlackCell {
                        row: coord.row,
                        col: coord.col,
                    })
                }
                Some(cell) => {
                    if let Some(existing) = cell.letter() {
                        if existing != *letter {
                            return Err(GridError::LetterConflict {
                                row: coord.row,
                                col: coord.col,
                                existing,
                                incoming: *letter,
                            });
                        }
                    }
                }
            }
        }

        for (offset, letter) in letters.into_iter().enumerate() {
            self.set_letter(direction.step(start, offset), letter)?;
        }
        Ok(())
    }

    /// Read the letters along a slot, failing on the first empty cell
    pub fn slot_text(&self, slot: &Slot) -> Result<String, GridError> {
        slot.cells()
            .map(|coord| {
                self.letter(coord).ok_or(GridError::Unfilled {
                    row: coord.row,
                    col: coord.col,
                })
            })
            .collect()
    }

    /// Derive the full numbered answer set from a letter grid
    pub fn answers(&self, min_len: usize) -> Result<Vec<Answer>, GridError> {
        self.slots(min_len)
            .iter()
            .map(|slot| {
                let text = self.slot_text(slot)?;
                Ok(Answer {
                    number: slot.number,
                    direction: slot.direction,
                    start: slot.start,
                    text,
                    clue: None,
                    is_theme: false,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_accents_and_punctuation() {
        assert_eq!(normalize_answer("Café au-lait!"), "CAFEAULAIT");
        assert_eq!(normalize_answer("star"), "STAR");
        assert_eq!(normalize_answer("  "), "");
    }

    #[test]
    fn place_answer_writes_letters() {
        let mut grid = Grid::new(3, 3).unwrap();
        grid.place_answer(Coord::new(0, 0), Direction::Across, "spa")
            .unwrap();
        grid.place_answer(Coord::new(0, 0), Direction::Down, "STY")
            .unwrap();
        assert_eq!(grid.letter(Coord::new(0, 2)), Some('A'));
        assert_eq!(grid.letter(Coord::new(2, 0)), Some('Y'));
    }

    #[test]
    fn place_answer_is_atomic_on_error() {
        let mut grid = Grid::from_pattern(&["..#", "...", "..."]).unwrap();
        let err = grid
            .place_answer(Coord::new(0, 0), Direction::Across, "CAT")
            .unwrap_err();
        assert!(matches!(err, GridError::BlackCell { row: 0, col: 2 }));
        assert_eq!(grid.letter(Coord::new(0, 0)), None);

        let err = grid
            .place_answer(Coord::new(1, 1), Direction::Across, "CAT")
            .unwrap_err();
        assert!(matches!(err, GridError::OutOfBounds { row: 1, col: 3 }));

        grid.place_answer(Coord::new(1, 0), Direction::Across, "CAT")
            .unwrap();
        let err = grid
            .place_answer(Coord::new(0, 1), Direction::Down, "OXO")
            .unwrap_err();
        assert!(matches!(
            err,
            GridError::LetterConflict { existing: 'A', incoming: 'X', .. }
        ));
    }

    #[test]
    fn answers_derive_from_filled_grid() {
        let grid = Grid::from_pattern(&["SPA", "TIN", "YET"]).unwrap();
        let answers = grid.answers(3).unwrap();
        let texts: Vec<&str> = answers.iter().map(|a| a.text.as_str()).collect();
        assert_eq!(texts, vec!["SPA", "TIN", "YET", "STY", "PIE", "ANT"]);
        assert_eq!(answers[3].label(), "1 Down");
    }

    #[test]
    fn answers_fail_on_unfilled_cell() {
        let grid = Grid::from_pattern(&["SPA", "T.N", "YET"]).unwrap();
        assert!(matches!(
            grid.answers(3),
            Err(GridError::Unfilled { row: 1, col: 1 })
        ));
    }
}
