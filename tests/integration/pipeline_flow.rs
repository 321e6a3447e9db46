//! End-to-end construction through the service worker pool

use super::support::{
    clues_reply, fill_reply, lopsided_grid_reply, open_grid_reply, small_config,
    ScriptedCollaborator,
};
use cruciverb::error::GenerationError;
use cruciverb::generation::GenerationStage;
use cruciverb::pipeline::{
    FailureCause, FailureKind, JobResult, JobStatus, PipelineDriver, Stage,
};
use cruciverb::puzzle::GridSize;
use cruciverb::quality::QualityScorer;
use cruciverb::service::{ConstructionRequest, ConstructionService};
use cruciverb::store::JobStore;
use cruciverb::validation::{FillValidator, GridValidator, SolvabilityChecker};
use std::sync::Arc;
use std::time::Duration;

const WAIT: Option<Duration> = Some(Duration::from_secs(10));

fn service(collaborator: Arc<ScriptedCollaborator>, workers: usize) -> ConstructionService {
    ConstructionService::new(
        PipelineDriver::new(collaborator),
        Arc::new(JobStore::new(Duration::from_secs(3600))),
        small_config(),
        workers,
    )
}

fn request() -> ConstructionRequest {
    ConstructionRequest::new("Rest").with_size(GridSize::square(3))
}

#[tokio::test]
async fn construction_runs_every_stage_to_a_scored_puzzle() {
    let collaborator = Arc::new(ScriptedCollaborator::happy_path());
    let service = service(collaborator.clone(), 1);
    service.start().unwrap();

    let job_id = service.submit(request()).await.unwrap();
    let record = service.wait(&job_id, WAIT).await.unwrap();
    service.stop().await.unwrap();

    assert_eq!(record.status, JobStatus::Done);
    assert_eq!(record.stage, Stage::Done);
    let Some(JobResult::Puzzle(puzzle)) = record.result else {
        panic!("expected a puzzle, got {:?}", record.result);
    };
    assert_eq!(puzzle.answers.len(), 6);
    assert!(puzzle.answers.iter().all(|answer| answer.has_clue()));
    assert_eq!(puzzle.theme_answers().count(), 2);
    assert!(puzzle.grid.is_filled());

    let quality = puzzle.quality.expect("accepted puzzles carry their report");
    assert!(quality.score >= 7.0);

    for stage in GenerationStage::ALL {
        assert_eq!(collaborator.calls(stage), 1);
        assert_eq!(record.attempts_per_stage[&stage].total, 1);
    }
    assert_eq!(service.stats().done, 1);
}

#[tokio::test]
async fn accepted_puzzle_rescores_to_its_attached_report() {
    let collaborator = Arc::new(ScriptedCollaborator::happy_path());
    let service = service(collaborator, 1);
    service.start().unwrap();

    let job_id = service.submit(request()).await.unwrap();
    service.wait(&job_id, WAIT).await.unwrap();
    let job = service.snapshot(&job_id).unwrap();
    service.stop().await.unwrap();

    assert_eq!(job.status, JobStatus::Done);
    let puzzle = job.puzzle().expect("done jobs carry a puzzle");
    let attached = puzzle.quality.as_ref().expect("accepted puzzles carry their report");

    let grid = GridValidator::from_config(&job.config).validate(&puzzle.grid);
    let fill = FillValidator::from_config(&job.config, None).validate(
        &puzzle.grid,
        &puzzle.answers,
        &puzzle.metadata.theme_words,
    );
    let solvability = SolvabilityChecker::new().check(puzzle);
    assert!(grid.passed);
    assert!(fill.passed);
    assert!(solvability.passed);

    let rescored = QualityScorer::new().score(&grid, &fill, &solvability);
    assert_eq!(rescored.score, attached.score);
    assert_eq!(rescored.components, attached.components);
    assert_eq!(&rescored, attached);
    assert!(rescored.accepts(job.config.quality_threshold));
    assert!(rescored.accepts(small_config().quality_threshold));
}

#[tokio::test]
async fn rejected_layout_is_regenerated_with_feedback() {
    let collaborator = Arc::new(
        ScriptedCollaborator::new()
            .reply(GenerationStage::Grid, lopsided_grid_reply())
            .reply(GenerationStage::Grid, open_grid_reply())
            .reply(GenerationStage::Fill, fill_reply())
            .reply(GenerationStage::Clues, clues_reply()),
    );
    let service = service(collaborator.clone(), 1);
    service.start().unwrap();

    let job_id = service.submit(request()).await.unwrap();
    let record = service.wait(&job_id, WAIT).await.unwrap();
    let job = service.snapshot(&job_id).unwrap();
    service.stop().await.unwrap();

    assert_eq!(record.status, JobStatus::Done);
    assert_eq!(record.attempts_per_stage[&GenerationStage::Grid].total, 2);
    assert_eq!(job.history.len(), 1);
    assert_eq!(job.history[0].stage, Stage::GridValidation);
    assert_eq!(job.history[0].failure.cause(), FailureCause::ValidationFailure);

    let grid_requests: Vec<_> = collaborator
        .requests()
        .into_iter()
        .filter(|request| request.stage == GenerationStage::Grid)
        .collect();
    assert_eq!(grid_requests.len(), 2);
    assert!(grid_requests[0].constraints.feedback.is_empty());
    assert!(!grid_requests[1].constraints.feedback.is_empty());
    assert!(grid_requests[1].randomness > grid_requests[0].randomness);
}

#[tokio::test]
async fn persistent_fill_failure_exhausts_retries() {
    let collaborator = Arc::new(
        ScriptedCollaborator::new()
            .reply(GenerationStage::Grid, open_grid_reply())
            .reply(
                GenerationStage::Fill,
                Err(GenerationError::Rejected("no fill found".to_string())),
            ),
    );
    let service = service(collaborator.clone(), 1);
    service.start().unwrap();

    let job_id = service.submit(request()).await.unwrap();
    let record = service.wait(&job_id, WAIT).await.unwrap();
    service.stop().await.unwrap();

    assert_eq!(record.status, JobStatus::Failed);
    let Some(JobResult::FailureReason(reason)) = record.result else {
        panic!("expected a failure reason, got {:?}", record.result);
    };
    assert_eq!(reason.kind, FailureKind::ExhaustedRetries);
    assert_eq!(reason.cause, Some(FailureCause::GenerationFailure));
    assert_eq!(reason.stage.owner(), Some(GenerationStage::Fill));
    assert_eq!(collaborator.calls(GenerationStage::Fill), 3);
    assert_eq!(collaborator.calls(GenerationStage::Clues), 0);
    assert_eq!(service.stats().failed, 1);
}

#[tokio::test]
async fn invalid_parameters_fail_without_generation() {
    let collaborator = Arc::new(ScriptedCollaborator::happy_path());
    let service = service(collaborator.clone(), 1);
    service.start().unwrap();

    let job_id = service
        .submit(ConstructionRequest::new("Rest").with_size(GridSize::new(0, 3)))
        .await
        .unwrap();
    let record = service.wait(&job_id, WAIT).await.unwrap();
    service.stop().await.unwrap();

    assert_eq!(record.status, JobStatus::Failed);
    assert!(matches!(
        record.result,
        Some(JobResult::FailureReason(ref reason)) if reason.kind == FailureKind::ConfigurationError
    ));
    assert_eq!(collaborator.total_calls(), 0);
}

#[tokio::test]
async fn concurrent_jobs_all_complete() {
    let collaborator = Arc::new(ScriptedCollaborator::happy_path());
    let service = service(collaborator.clone(), 3);
    service.start().unwrap();

    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(service.submit(request()).await.unwrap());
    }
    let records = service.wait_all(&ids, WAIT).await;
    service.stop().await.unwrap();

    assert_eq!(records.len(), 5);
    for (id, record) in ids.iter().zip(&records) {
        let record = record.as_ref().unwrap();
        assert_eq!(&record.job_id, id);
        assert_eq!(record.status, JobStatus::Done);
    }
    assert_eq!(collaborator.total_calls(), 15);
    let stats = service.stats();
    assert_eq!(stats.done, 5);
    assert_eq!(stats.pending + stats.running, 0);
}
