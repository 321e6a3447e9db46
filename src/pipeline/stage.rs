//! Pipeline stages in their fixed order.

use crate::generation::GenerationStage;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    GridGeneration,
    GridValidation,
    FillGeneration,
    FillValidation,
    ClueGeneration,
    FinalValidation,
    Done,
    Failed,
}

impl Stage {
    /// Happy path, first to last
    pub const ORDER: [Stage; 7] = [
        Stage::GridGeneration,
        Stage::GridValidation,
        Stage::FillGeneration,
        Stage::FillValidation,
        Stage::ClueGeneration,
        Stage::FinalValidation,
        Stage::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::GridGeneration => "GRID_GENERATION",
            Stage::GridValidation => "GRID_VALIDATION",
            Stage::FillGeneration => "FILL_GENERATION",
            Stage::FillValidation => "FILL_VALIDATION",
            Stage::ClueGeneration => "CLUE_GENERATION",
            Stage::FinalValidation => "FINAL_VALIDATION",
            Stage::Done => "DONE",
            Stage::Failed => "FAILED",
        }
    }

    /// The stage that follows on success; `None` once terminal
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::GridGeneration => Some(Stage::GridValidation),
            Stage::GridValidation => Some(Stage::FillGeneration),
            Stage::FillGeneration => Some(Stage::FillValidation),
            Stage::FillValidation => Some(Stage::ClueGeneration),
            Stage::ClueGeneration => Some(Stage::FinalValidation),
            Stage::FinalValidation => Some(Stage::Done),
            Stage::Done | Stage::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }

    pub fn is_generation(self) -> bool {
        matches!(
            self,
            Stage::GridGeneration | Stage::FillGeneration | Stage::ClueGeneration
        )
    }

    /// Generation stage whose retry budget this stage draws on.
    /// Final validation failures are charged to the clue stage.
    pub fn owner(self) -> Option<GenerationStage> {
        match self {
            Stage::GridGeneration | Stage::GridValidation => Some(GenerationStage::Grid),
            Stage::FillGeneration | Stage::FillValidation => Some(GenerationStage::Fill),
            Stage::ClueGeneration | Stage::FinalValidation => Some(GenerationStage::Clues),
            Stage::Done | Stage::Failed => None,
        }
    }

    /// Pipeline stage that asks the collaborator for `stage`'s artifact
    pub fn generating(stage: GenerationStage) -> Stage {
        match stage {
            GenerationStage::Grid => Stage::GridGeneration,
            GenerationStage::Fill => Stage::FillGeneration,
            GenerationStage::Clues => Stage::ClueGeneration,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_walks_the_fixed_order() {
        let mut walked = vec![Stage::GridGeneration];
        let mut current = Stage::GridGeneration;
        while let Some(next) = current.next() {
            walked.push(next);
            current = next;
        }
        assert_eq!(walked, Stage::ORDER.to_vec());
        assert_eq!(Stage::Failed.next(), None);
    }

    #[test]
    fn validation_stages_charge_their_generator() {
        assert_eq!(Stage::GridValidation.owner(), Some(GenerationStage::Grid));
        assert_eq!(Stage::FillValidation.owner(), Some(GenerationStage::Fill));
        assert_eq!(Stage::FinalValidation.owner(), Some(GenerationStage::Clues));
        assert_eq!(
            Stage::generating(GenerationStage::Clues),
            Stage::ClueGeneration
        );
    }

    #[test]
    fn stages_serialize_in_screaming_case() {
        let value = serde_json::to_value(Stage::FinalValidation).unwrap();
        assert_eq!(value, "FINAL_VALIDATION");
        assert_eq!(Stage::FinalValidation.to_string(), "FINAL_VALIDATION");
    }
}
