//! Shared fixtures and a scripted generation collaborator

use async_trait::async_trait;
use cruciverb::config::ConstructionConfig;
use cruciverb::error::GenerationError;
use cruciverb::generation::{
    Artifact, ClueEntry, CluesArtifact, FillArtifact, GenerationCollaborator, GenerationRequest,
    GenerationStage, GridArtifact,
};
use cruciverb::grid::{Answer, Coord, Direction, Grid};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

pub type Reply = Result<Artifact, GenerationError>;

/// Replies per stage in order; the last reply for a stage repeats once the
/// queue drains
#[derive(Default)]
pub struct ScriptedCollaborator {
    replies: Mutex<HashMap<GenerationStage, VecDeque<Reply>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedCollaborator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grid, fill and clues for the 3x3 fixture
    pub fn happy_path() -> Self {
        Self::new()
            .reply(GenerationStage::Grid, open_grid_reply())
            .reply(GenerationStage::Fill, fill_reply())
            .reply(GenerationStage::Clues, clues_reply())
    }

    pub fn reply(self, stage: GenerationStage, reply: Reply) -> Self {
        self.replies.lock().entry(stage).or_default().push_back(reply);
        self
    }

    pub fn calls(&self, stage: GenerationStage) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|request| request.stage == stage)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl GenerationCollaborator for ScriptedCollaborator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Artifact, GenerationError> {
        self.requests.lock().push(request.clone());
        let mut replies = self.replies.lock();
        let queue = replies.entry(request.stage).or_default();
        match queue.len() {
            0 => Err(GenerationError::Rejected(format!(
                "no scripted reply for {}",
                request.stage
            ))),
            1 => queue[0].clone(),
            _ => queue.pop_front().unwrap(),
        }
    }
}

/// Fast retries on the 3x3 fixture
pub fn small_config() -> ConstructionConfig {
    ConstructionConfig {
        grid_rows: 3,
        grid_cols: 3,
        retry_delay_ms: 1,
        max_retry_delay_ms: 4,
        ..ConstructionConfig::default()
    }
}

pub fn answer(direction: Direction, row: usize, col: usize, text: &str) -> Answer {
    Answer::new(direction, Coord::new(row, col), text)
}

pub fn open_grid_reply() -> Reply {
    Ok(Artifact::Grid(GridArtifact {
        grid: Grid::from_pattern(&["...", "...", "..."]).unwrap(),
        theme_answers: vec![
            answer(Direction::Across, 0, 0, "SPA"),
            answer(Direction::Down, 0, 1, "PIE"),
        ],
    }))
}

pub fn lopsided_grid_reply() -> Reply {
    Ok(Artifact::Grid(GridArtifact {
        grid: Grid::from_pattern(&["#..", "...", "..."]).unwrap(),
        theme_answers: Vec::new(),
    }))
}

/// Every answer of the SPA/TIN/YET square
pub fn square_answers() -> Vec<Answer> {
    vec![
        answer(Direction::Across, 0, 0, "SPA"),
        answer(Direction::Across, 1, 0, "TIN"),
        answer(Direction::Across, 2, 0, "YET"),
        answer(Direction::Down, 0, 0, "STY"),
        answer(Direction::Down, 0, 1, "PIE"),
        answer(Direction::Down, 0, 2, "ANT"),
    ]
}

pub fn fill_reply() -> Reply {
    Ok(Artifact::Fill(FillArtifact {
        answers: square_answers(),
    }))
}

pub fn clues_reply() -> Reply {
    let entries = [
        (1, Direction::Across, "Place for a soak"),
        (4, Direction::Across, "Can material"),
        (5, Direction::Across, "Still"),
        (1, Direction::Down, "Pig pen"),
        (2, Direction::Down, "Dessert with a crust"),
        (3, Direction::Down, "Picnic pest"),
    ];
    Ok(Artifact::Clues(CluesArtifact {
        clues: entries
            .iter()
            .map(|(number, direction, clue)| ClueEntry {
                number: *number,
                direction: *direction,
                clue: clue.to_string(),
            })
            .collect(),
    }))
}

/// 15x15, exactly 20% black, symmetric, split in two by a black middle row
pub fn two_region_grid() -> Grid {
    let mut grid = Grid::new(15, 15).unwrap();
    for col in 0..15 {
        grid.set_black(Coord::new(7, col)).unwrap();
    }
    for row in 0..=6 {
        grid.set_black(Coord::new(row, 0)).unwrap();
        grid.set_black(Coord::new(row, 1)).unwrap();
        grid.set_black(Coord::new(14 - row, 14)).unwrap();
        grid.set_black(Coord::new(14 - row, 13)).unwrap();
    }
    grid.set_black(Coord::new(8, 0)).unwrap();
    grid.set_black(Coord::new(6, 14)).unwrap();
    grid
}

/// Symmetric 5x5 with four corner blacks
pub fn five_by_five() -> Grid {
    Grid::from_pattern(&["CAB##", "ARENA", "PERIL", "ENOTE", "##SEA"]).unwrap()
}
