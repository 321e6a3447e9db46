//! Parsing LLM responses into artifacts.

use super::{
    Artifact, ClueEntry, CluesArtifact, FillArtifact, GenerationRequest, GenerationStage,
    GridArtifact,
};
use crate::error::GenerationError;
use crate::grid::{Answer, Coord, Direction, Grid};
use crate::puzzle::GridSize;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Strip code fences and keep the outermost `{...}`
pub fn extract_json(text: &str) -> Result<&str, GenerationError> {
    let start = text.find('{');
    let end = text.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(&text[start..=end]),
        _ => Err(GenerationError::Malformed(format!(
            "No JSON object in response: {}",
            preview(text)
        ))),
    }
}

fn preview(text: &str) -> String {
    let trimmed = text.trim();
    let mut out: String = trimmed.chars().take(120).collect();
    if trimmed.chars().count() > 120 {
        out.push_str("...");
    }
    out
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T, GenerationError> {
    let json = extract_json(text)?;
    serde_json::from_str(json)
        .map_err(|e| GenerationError::Malformed(format!("Invalid response JSON: {}", e)))
}

#[derive(Debug, Deserialize)]
struct AnswerDto {
    answer: String,
    direction: String,
    #[serde(alias = "start_pos", alias = "position")]
    start: [usize; 2],
}

impl AnswerDto {
    fn into_answer(self) -> Result<Answer, GenerationError> {
        let direction = Direction::parse(&self.direction).ok_or_else(|| {
            GenerationError::Malformed(format!("Unknown direction: {}", self.direction))
        })?;
        Ok(Answer::new(
            direction,
            Coord::new(self.start[0], self.start[1]),
            self.answer,
        ))
    }
}

#[derive(Debug, Deserialize)]
struct GridResponse {
    grid_layout: Vec<Vec<u8>>,
    #[serde(default)]
    theme_answers: Vec<AnswerDto>,
}

#[derive(Debug, Deserialize)]
struct FillResponse {
    filled_answers: Vec<AnswerDto>,
}

#[derive(Debug, Deserialize)]
struct ClueDto {
    number: u32,
    direction: String,
    clue: String,
}

#[derive(Debug, Deserialize)]
struct CluesResponse {
    clues: Vec<ClueDto>,
}

pub fn parse_grid(text: &str, size: GridSize) -> Result<GridArtifact, GenerationError> {
    let response: GridResponse = decode(text)?;
    let grid = Grid::from_layout(&response.grid_layout)
        .map_err(|e| GenerationError::Malformed(format!("Invalid grid layout: {}", e)))?;
    if grid.dimensions() != (size.rows, size.cols) {
        return Err(GenerationError::Malformed(format!(
            "Grid is {}x{}, expected {}",
            grid.rows(),
            grid.cols(),
            size
        )));
    }
    let theme_answers = response
        .theme_answers
        .into_iter()
        .map(|dto| dto.into_answer().map(Answer::theme))
        .collect::<Result<_, _>>()?;
    Ok(GridArtifact {
        grid,
        theme_answers,
    })
}

pub fn parse_fill(text: &str) -> Result<FillArtifact, GenerationError> {
    let response: FillResponse = decode(text)?;
    let answers = response
        .filled_answers
        .into_iter()
        .map(AnswerDto::into_answer)
        .collect::<Result<_, _>>()?;
    Ok(FillArtifact { answers })
}

pub fn parse_clues(text: &str) -> Result<CluesArtifact, GenerationError> {
    let response: CluesResponse = decode(text)?;
    let clues = response
        .clues
        .into_iter()
        .map(|dto| {
            let direction = Direction::parse(&dto.direction).ok_or_else(|| {
                GenerationError::Malformed(format!("Unknown direction: {}", dto.direction))
            })?;
            Ok(ClueEntry {
                number: dto.number,
                direction,
                clue: dto.clue,
            })
        })
        .collect::<Result<_, GenerationError>>()?;
    Ok(CluesArtifact { clues })
}

/// Parse a response into the artifact shape the request's stage expects
pub fn parse_artifact(request: &GenerationRequest, text: &str) -> Result<Artifact, GenerationError> {
    match request.stage {
        GenerationStage::Grid => parse_grid(text, request.size).map(Artifact::Grid),
        GenerationStage::Fill => parse_fill(text).map(Artifact::Fill),
        GenerationStage::Clues => parse_clues(text).map(Artifact::Clues),
    }
}
