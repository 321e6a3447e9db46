//! Runs, slots and clue numbering.

use super::{Cell, Coord, Direction, Grid};
use serde::{Deserialize, Serialize};

/// A maximal run of white cells in one direction, any length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Run {
    pub direction: Direction,
    pub start: Coord,
    pub length: usize,
}

impl Run {
    pub fn cells(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.length).map(move |offset| self.direction.step(self.start, offset))
    }

    pub fn contains(&self, coord: Coord) -> bool {
        match self.direction {
            Direction::Across => {
                coord.row == self.start.row
                    && coord.col >= self.start.col
                    && coord.col < self.start.col + self.length
            }
            Direction::Down => {
                coord.col == self.start.col
                    && coord.row >= self.start.row
                    && coord.row < self.start.row + self.length
            }
        }
    }
}

/// Geometry of an answer-bearing run: a maximal run of at least the minimum length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub number: u32,
    pub direction: Direction,
    pub start: Coord,
    pub length: usize,
}

impl Slot {
    pub fn cells(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.length).map(move |offset| self.direction.step(self.start, offset))
    }

    pub fn run(&self) -> Run {
        Run {
            direction: self.direction,
            start: self.start,
            length: self.length,
        }
    }
}

impl Grid {
    /// All maximal white runs in one direction, including length-1 runs
    pub fn runs(&self, direction: Direction) -> Vec<Run> {
        let (outer, inner) = match direction {
            Direction::Across => (self.rows, self.cols),
            Direction::Down => (self.cols, self.rows),
        };
        let at = |line: usize, pos: usize| match direction {
            Direction::Across => Coord::new(line, pos),
            Direction::Down => Coord::new(pos, line),
        };

        let mut runs = Vec::new();
        for line in 0..outer {
            let mut pos = 0;
            while pos < inner {
                if self.is_black(at(line, pos)) {
                    pos += 1;
                    continue;
                }
                let start = pos;
                while pos < inner && self.is_white(at(line, pos)) {
                    pos += 1;
                }
                runs.push(Run {
                    direction,
                    start: at(line, start),
                    length: pos - start,
                });
            }
        }
        runs
    }

    /// Across runs followed by Down runs
    pub fn all_runs(&self) -> Vec<Run> {
        let mut runs = self.runs(Direction::Across);
        runs.extend(self.runs(Direction::Down));
        runs
    }

    /// The run through `coord` in `direction`, if the cell is white
    pub fn run_through(&self, coord: Coord, direction: Direction) -> Option<Run> {
        if self.is_black(coord) {
            return None;
        }
        self.runs(direction)
            .into_iter()
            .find(|run| run.contains(coord))
    }

    /// Clue numbers in reading order. A white cell is numbered iff it starts an
    /// Across or Down run of at least `min_len` cells.
    pub fn numbering(&self, min_len: usize) -> Vec<(Coord, u32)> {
        let starts: std::collections::HashSet<Coord> = self
            .all_runs()
            .into_iter()
            .filter(|run| run.length >= min_len)
            .map(|run| run.start)
            .collect();

        let mut next = 1;
        let mut numbers = Vec::new();
        for coord in self.coords() {
            if starts.contains(&coord) {
                numbers.push((coord, next));
                next += 1;
            }
        }
        numbers
    }

    /// Write numbering into the cells, clearing any stale numbers first
    pub fn assign_numbers(&mut self, min_len: usize) {
        for cell in &mut self.cells {
            if let Cell::White { number, .. } = cell {
                *number = None;
            }
        }
        for (coord, value) in self.numbering(min_len) {
            let index = coord.row * self.cols + coord.col;
            if let Cell::White { number, .. } = &mut self.cells[index] {
                *number = Some(value);
            }
        }
    }

    /// Answer-bearing slots (runs of at least `min_len`), Across then Down, by number
    pub fn slots(&self, min_len: usize) -> Vec<Slot> {
        let numbers: std::collections::HashMap<Coord, u32> =
            self.numbering(min_len).into_iter().collect();

        let mut slots: Vec<Slot> = self
            .all_runs()
            .into_iter()
            .filter(|run| run.length >= min_len)
            .filter_map(|run| {
                numbers.get(&run.start).map(|number| Slot {
                    number: *number,
                    direction: run.direction,
                    start: run.start,
                    length: run.length,
                })
            })
            .collect();
        slots.sort_by_key(|slot| (slot.direction, slot.number));
        slots
    }
}
