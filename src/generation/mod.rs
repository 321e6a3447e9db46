//! Generation contract
//!
//! What the pipeline asks of a generation collaborator and what it gets back.
//! The collaborator is opaque: it may be an LLM, a solver or a test script.

pub mod llm;
pub mod parse;
pub mod prompt;

pub use llm::LlmCollaborator;

use crate::error::GenerationError;
use crate::grid::{Answer, Direction, Grid};
use crate::puzzle::{Difficulty, GridSize};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three artifact-producing stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStage {
    Grid,
    Fill,
    Clues,
}

impl GenerationStage {
    pub const ALL: [GenerationStage; 3] = [
        GenerationStage::Grid,
        GenerationStage::Fill,
        GenerationStage::Clues,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStage::Grid => "grid",
            GenerationStage::Fill => "fill",
            GenerationStage::Clues => "clues",
        }
    }
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prior artifacts and rules a stage must respect
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Constraints {
    pub min_word_length: usize,
    pub max_black_ratio: f64,
    pub require_symmetry: bool,
    /// Words the theme is built on; exempt from dictionary checks
    #[serde(default)]
    pub theme_words: Vec<String>,
    /// Accepted layout (fill and clue stages)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Grid>,
    /// Theme answers placed by the grid stage
    #[serde(default)]
    pub theme_answers: Vec<Answer>,
    /// Numbered answers to clue (clue stage)
    #[serde(default)]
    pub answers: Vec<Answer>,
    /// Blocking issues from the previous attempt of this stage
    #[serde(default)]
    pub feedback: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub stage: GenerationStage,
    pub theme: String,
    pub difficulty: Difficulty,
    pub size: GridSize,
    pub constraints: Constraints,
    /// Sampling randomness in [0, 1]
    pub randomness: f64,
}

/// Grid stage output: a layout plus the theme answers placed in it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridArtifact {
    pub grid: Grid,
    #[serde(default)]
    pub theme_answers: Vec<Answer>,
}

/// Fill stage output: answers for the remaining slots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillArtifact {
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClueEntry {
    pub number: u32,
    pub direction: Direction,
    pub clue: String,
}

/// Clue stage output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CluesArtifact {
    pub clues: Vec<ClueEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Artifact {
    Grid(GridArtifact),
    Fill(FillArtifact),
    Clues(CluesArtifact),
}

impl Artifact {
    pub fn stage(&self) -> GenerationStage {
        match self {
            Artifact::Grid(_) => GenerationStage::Grid,
            Artifact::Fill(_) => GenerationStage::Fill,
            Artifact::Clues(_) => GenerationStage::Clues,
        }
    }
}

/// Produces candidate artifacts on request
#[async_trait]
pub trait GenerationCollaborator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Artifact, GenerationError>;
}
