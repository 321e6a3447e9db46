//! The LLM collaborator driving a job against a canned model provider

use super::support::small_config;
use async_trait::async_trait;
use cruciverb::error::ApiError;
use cruciverb::generation::{GenerationStage, LlmCollaborator};
use cruciverb::pipeline::{CancelFlag, ConstructionJob, FailureCause, JobStatus, PipelineDriver};
use cruciverb::provider::{
    ChatMessage, CompletionOptions, CompletionResponse, ModelProviderClient, TokenUsage,
};
use cruciverb::puzzle::{GridSize, PuzzleMetadata};
use cruciverb::store::JobStore;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

const GRID: &str = r#"Here is the grid:
```json
{"grid_layout": [[1,1,1],[1,1,1],[1,1,1]],
 "theme_answers": [
   {"answer": "SPA", "direction": "across", "start": [0, 0]},
   {"answer": "PIE", "direction": "down", "start": [0, 1]}
 ]}
```"#;

const FILL: &str = r#"```json
{"filled_answers": [
  {"answer": "TIN", "direction": "across", "start": [1, 0]},
  {"answer": "YET", "direction": "across", "start": [2, 0]},
  {"answer": "STY", "direction": "down", "start": [0, 0]},
  {"answer": "ANT", "direction": "down", "start": [0, 2]}
]}
```"#;

const CLUES: &str = r#"{"clues": [
  {"number": 1, "direction": "across", "clue": "Place for a soak"},
  {"number": 4, "direction": "across", "clue": "Can material"},
  {"number": 5, "direction": "across", "clue": "Still"},
  {"number": 1, "direction": "down", "clue": "Pig pen"},
  {"number": 2, "direction": "down", "clue": "Dessert with a crust"},
  {"number": 3, "direction": "down", "clue": "Picnic pest"}
]}"#;

/// Answers completions from a fixed list and remembers the temperatures asked for
struct CannedProvider {
    replies: Mutex<VecDeque<Result<String, ApiError>>>,
    temperatures: Mutex<Vec<Option<f32>>>,
}

impl CannedProvider {
    fn new(replies: Vec<Result<String, ApiError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            temperatures: Mutex::new(Vec::new()),
        }
    }

    fn temperatures(&self) -> Vec<Option<f32>> {
        self.temperatures.lock().clone()
    }
}

#[async_trait]
impl ModelProviderClient for CannedProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, ApiError> {
        assert!(!messages.is_empty());
        self.temperatures.lock().push(options.temperature);
        let content = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::ProviderError("script exhausted".to_string())))?;
        Ok(CompletionResponse {
            content,
            model: "canned".to_string(),
            usage: TokenUsage::default(),
            finish_reason: Some("stop".to_string()),
        })
    }

    fn provider_name(&self) -> &str {
        "canned"
    }

    fn model_name(&self) -> &str {
        "canned"
    }
}

async fn run_job(provider: Arc<CannedProvider>) -> Arc<ConstructionJob> {
    let collaborator = LlmCollaborator::new(provider, CompletionOptions::default());
    let driver =
        PipelineDriver::new(Arc::new(collaborator)).with_timeout(Duration::from_secs(5));
    let store = JobStore::new(Duration::from_secs(60));
    let metadata = PuzzleMetadata {
        theme: "Rest".to_string(),
        size: GridSize::square(3),
        ..PuzzleMetadata::default()
    };
    let writer = store.create(ConstructionJob::new(metadata, small_config()));
    driver.run(writer, &CancelFlag::new()).await
}

#[tokio::test]
async fn fenced_json_replies_build_a_puzzle() {
    let provider = Arc::new(CannedProvider::new(vec![
        Ok(GRID.to_string()),
        Ok(FILL.to_string()),
        Ok(CLUES.to_string()),
    ]));
    let job = run_job(provider.clone()).await;

    assert_eq!(job.status, JobStatus::Done, "{:?}", job.failure());
    let puzzle = job.puzzle().unwrap();
    assert_eq!(puzzle.answers.len(), 6);
    let across_one = puzzle
        .answers
        .iter()
        .find(|answer| answer.text == "SPA")
        .unwrap();
    assert!(across_one.is_theme);
    assert_eq!(across_one.number, 1);
    assert_eq!(across_one.clue.as_deref(), Some("Place for a soak"));

    // randomness is passed through as the sampling temperature
    let temperatures = provider.temperatures();
    assert_eq!(temperatures.len(), 3);
    assert!(temperatures
        .iter()
        .all(|t| (t.unwrap() - 0.7).abs() < 1e-6));
}

#[tokio::test]
async fn prose_reply_counts_as_a_failed_attempt() {
    let provider = Arc::new(CannedProvider::new(vec![
        Ok("Sorry, I can't draw grids.".to_string()),
        Ok(GRID.to_string()),
        Ok(FILL.to_string()),
        Ok(CLUES.to_string()),
    ]));
    let job = run_job(provider.clone()).await;

    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(job.attempts_for(GenerationStage::Grid).total, 2);
    assert_eq!(job.history.len(), 1);
    assert_eq!(job.history[0].failure.cause(), FailureCause::GenerationFailure);

    let temperatures = provider.temperatures();
    assert!(temperatures[1].unwrap() > temperatures[0].unwrap());
}

#[tokio::test]
async fn provider_outage_exhausts_the_grid_stage() {
    let provider = Arc::new(CannedProvider::new(Vec::new()));
    let job = run_job(provider.clone()).await;

    assert_eq!(job.status, JobStatus::Failed);
    let reason = job.failure().unwrap();
    assert_eq!(reason.cause, Some(FailureCause::GenerationFailure));
    assert!(reason.message.contains("script exhausted"));
    assert_eq!(provider.temperatures().len(), 3);
}
