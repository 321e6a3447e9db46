//! Puzzle and request metadata types.

use crate::grid::{Answer, Grid};
use crate::quality::QualityReport;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target difficulty, by day of the week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Monday,
    Tuesday,
    #[default]
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Monday => "monday",
            Difficulty::Tuesday => "tuesday",
            Difficulty::Wednesday => "wednesday",
            Difficulty::Thursday => "thursday",
            Difficulty::Friday => "friday",
            Difficulty::Saturday => "saturday",
            Difficulty::Sunday => "sunday",
        }
    }

    /// Short description used when prompting for clues
    pub fn clue_style(&self) -> &'static str {
        match self {
            Difficulty::Monday => "straightforward definitions",
            Difficulty::Tuesday => "mostly direct definitions with light wordplay",
            Difficulty::Wednesday => "a mix of definitions and moderate wordplay",
            Difficulty::Thursday => "tricky wordplay and misdirection",
            Difficulty::Friday | Difficulty::Saturday => "hard, misleading clues",
            Difficulty::Sunday => "moderate clues with playful themed wordplay",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monday" | "mon" => Ok(Difficulty::Monday),
            "tuesday" | "tue" => Ok(Difficulty::Tuesday),
            "wednesday" | "wed" => Ok(Difficulty::Wednesday),
            "thursday" | "thu" => Ok(Difficulty::Thursday),
            "friday" | "fri" => Ok(Difficulty::Friday),
            "saturday" | "sat" => Ok(Difficulty::Saturday),
            "sunday" | "sun" => Ok(Difficulty::Sunday),
            other => Err(format!("Unknown difficulty: {}", other)),
        }
    }
}

/// Requested grid dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub rows: usize,
    pub cols: usize,
}

impl GridSize {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub const fn square(n: usize) -> Self {
        Self { rows: n, cols: n }
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self::square(15)
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

impl FromStr for GridSize {
    type Err = String;

    /// Accepts "15x15", "15X15" or a single "15"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| format!("Invalid grid size: {}", s))
        };
        match s.split_once(['x', 'X']) {
            Some((rows, cols)) => Ok(Self::new(parse(rows)?, parse(cols)?)),
            None => Ok(Self::square(parse(s)?)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PuzzleMetadata {
    pub theme: String,
    pub difficulty: Difficulty,
    pub size: GridSize,
    #[serde(default)]
    pub theme_words: Vec<String>,
}

/// A filled, clued grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Puzzle {
    pub grid: Grid,
    pub answers: Vec<Answer>,
    pub metadata: PuzzleMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityReport>,
}

impl Puzzle {
    pub fn new(grid: Grid, answers: Vec<Answer>, metadata: PuzzleMetadata) -> Self {
        Self {
            grid,
            answers,
            metadata,
            quality: None,
        }
    }

    pub fn theme_answers(&self) -> impl Iterator<Item = &Answer> {
        self.answers.iter().filter(|answer| answer.is_theme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_defaults_to_wednesday() {
        assert_eq!(Difficulty::default(), Difficulty::Wednesday);
        assert_eq!("Sat".parse::<Difficulty>().unwrap(), Difficulty::Saturday);
        assert!("someday".parse::<Difficulty>().is_err());
    }

    #[test]
    fn grid_size_parses() {
        assert_eq!("15x15".parse::<GridSize>().unwrap(), GridSize::square(15));
        assert_eq!("5X7".parse::<GridSize>().unwrap(), GridSize::new(5, 7));
        assert_eq!("21".parse::<GridSize>().unwrap(), GridSize::square(21));
        assert!("axb".parse::<GridSize>().is_err());
        assert_eq!(GridSize::new(5, 7).to_string(), "5x7");
    }
}
