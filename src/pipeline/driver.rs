//! Drives one job through the stage state machine.

use crate::config::ConstructionConfig;
use crate::error::GenerationError;
use crate::generation::{
    Artifact, ClueEntry, Constraints, GenerationCollaborator, GenerationRequest, GenerationStage,
    GridArtifact,
};
use crate::grid::{Answer, Coord, Direction, Grid};
use crate::pipeline::{
    AttemptFailure, AttemptRecord, ConstructionJob, FailureReason, FilledGrid, JobOutcome,
    JobStatus, RetryPolicy, Stage,
};
use crate::puzzle::{GridSize, Puzzle};
use crate::quality::QualityScorer;
use crate::store::JobWriter;
use crate::validation::fill::GEOMETRY_PENALTY;
use crate::validation::{
    FillValidator, GridValidator, Issue, IssueKind, Lexicon, SolvabilityChecker,
};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Shared cancellation flag, checked between stages and between attempts
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

enum Step {
    Advance,
    Complete(Puzzle),
    Retry(AttemptFailure),
    Cancelled,
}

/// Artifact that passed the shape checks, ready to store on the job
enum Candidate {
    Grid(GridArtifact),
    Fill(FilledGrid),
    Clued(Puzzle),
}

struct Validators {
    grid: GridValidator,
    fill: FillValidator,
    solvability: SolvabilityChecker,
    scorer: QualityScorer,
    threshold: f64,
}

impl Validators {
    fn new(config: &ConstructionConfig, lexicon: Option<Arc<Lexicon>>) -> Self {
        Self {
            grid: GridValidator::from_config(config),
            fill: FillValidator::from_config(config, lexicon),
            solvability: SolvabilityChecker::new(),
            scorer: QualityScorer::new(),
            threshold: config.quality_threshold,
        }
    }
}

pub struct PipelineDriver {
    collaborator: Arc<dyn GenerationCollaborator>,
    lexicon: Option<Arc<Lexicon>>,
    generation_timeout: Duration,
}

impl PipelineDriver {
    pub fn new(collaborator: Arc<dyn GenerationCollaborator>) -> Self {
        Self {
            collaborator,
            lexicon: None,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    pub fn with_lexicon(mut self, lexicon: Option<Arc<Lexicon>>) -> Self {
        self.lexicon = lexicon;
        self
    }

    pub fn with_timeout(mut self, generation_timeout: Duration) -> Self {
        self.generation_timeout = generation_timeout;
        self
    }

    /// Run the job to DONE or FAILED, consuming its writer
    pub async fn run(&self, mut writer: JobWriter, cancel: &CancelFlag) -> Arc<ConstructionJob> {
        let config = writer.job().config.clone();
        let problems = config.problems();
        if !problems.is_empty() {
            warn!(job_id = %writer.id(), problems = ?problems, "Rejecting job configuration");
            return writer.finish(JobOutcome::Failed(FailureReason::configuration(
                problems.join("; "),
            )));
        }

        let policy = RetryPolicy::from_config(&config);
        let validators = Validators::new(&config, self.lexicon.clone());
        writer.update(|job| job.status = JobStatus::Running);
        info!(
            job_id = %writer.id(),
            theme = %writer.job().metadata.theme,
            rows = config.grid_rows,
            cols = config.grid_cols,
            "Starting construction"
        );

        loop {
            let stage = writer.job().stage;
            if cancel.is_cancelled() {
                info!(job_id = %writer.id(), stage = %stage, "Job cancelled");
                return writer.finish(JobOutcome::Failed(FailureReason::cancelled(stage)));
            }

            let step = match stage {
                Stage::GridGeneration | Stage::FillGeneration | Stage::ClueGeneration => {
                    self.generate(&mut writer, &policy, cancel).await
                }
                Stage::GridValidation => check_grid(writer.job(), &validators),
                Stage::FillValidation => check_fill(writer.job(), &validators),
                Stage::FinalValidation => check_final(writer.job(), &validators),
                Stage::Done | Stage::Failed => unreachable!("a writer never holds a terminal job"),
            };

            match step {
                Step::Advance => advance(&mut writer, stage),
                Step::Complete(puzzle) => {
                    info!(
                        job_id = %writer.id(),
                        score = puzzle.quality.as_ref().map(|q| q.score).unwrap_or_default(),
                        attempts = writer.job().total_attempts(),
                        "Puzzle accepted"
                    );
                    return writer.finish(JobOutcome::Done(puzzle));
                }
                Step::Retry(failure) => {
                    if let Some(reason) = record_failure(&mut writer, &policy, stage, failure) {
                        warn!(job_id = %writer.id(), reason = %reason, "Job failed");
                        return writer.finish(JobOutcome::Failed(reason));
                    }
                }
                Step::Cancelled => {
                    info!(job_id = %writer.id(), stage = %stage, "Job cancelled during backoff");
                    return writer.finish(JobOutcome::Failed(FailureReason::cancelled(stage)));
                }
            }
        }
    }

    async fn generate(
        &self,
        writer: &mut JobWriter,
        policy: &RetryPolicy,
        cancel: &CancelFlag,
    ) -> Step {
        let stage = writer.job().stage;
        let Some(owner) = stage.owner() else {
            unreachable!("generation stages always have an owner")
        };

        let failures = writer.job().attempts_for(owner).current;
        if failures > 0 {
            let delay = policy.backoff_delay(failures);
            debug!(job_id = %writer.id(), stage = %stage, delay_ms = delay.as_millis() as u64, "Backing off before retry");
            sleep(delay).await;
            if cancel.is_cancelled() {
                return Step::Cancelled;
            }
        }

        let request = build_request(writer.job(), owner);
        writer.update(|job| job.attempts_mut(owner).total += 1);
        info!(
            job_id = %writer.id(),
            stage = %stage,
            attempt = failures + 1,
            randomness = request.randomness,
            "Requesting artifact"
        );

        let result = match timeout(self.generation_timeout, self.collaborator.generate(&request)).await
        {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(format!(
                "no {} artifact within {}s",
                owner,
                self.generation_timeout.as_secs_f64()
            ))),
        };

        match result.and_then(|artifact| accept(writer.job(), owner, artifact)) {
            Ok(candidate) => {
                writer.update(|job| match candidate {
                    Candidate::Grid(grid) => job.artifacts.grid = Some(grid),
                    Candidate::Fill(fill) => job.artifacts.fill = Some(fill),
                    Candidate::Clued(puzzle) => job.artifacts.puzzle = Some(puzzle),
                });
                Step::Advance
            }
            Err(error) => Step::Retry(AttemptFailure::GenerationFailure { error }),
        }
    }
}

fn job_size(config: &ConstructionConfig) -> GridSize {
    GridSize::new(config.grid_rows, config.grid_cols)
}

fn build_request(job: &ConstructionJob, owner: GenerationStage) -> GenerationRequest {
    let config = &job.config;
    let mut constraints = Constraints {
        min_word_length: config.min_word_length,
        max_black_ratio: config.max_black_ratio,
        require_symmetry: config.require_symmetry,
        theme_words: job.metadata.theme_words.clone(),
        ..Constraints::default()
    };

    if owner != GenerationStage::Grid {
        if let Some(grid) = &job.artifacts.grid {
            constraints.layout = Some(grid.grid.clone());
            constraints.theme_answers = grid.theme_answers.clone();
        }
    }
    if owner == GenerationStage::Clues {
        if let Some(fill) = &job.artifacts.fill {
            constraints.answers = fill.answers.clone();
        }
    }
    // The newest history entry belongs to this stage whenever it is retrying
    if job.attempts_for(owner).current > 0 {
        constraints.feedback = job
            .history
            .last()
            .map(|record| record.failure.feedback())
            .unwrap_or_default();
    }

    GenerationRequest {
        stage: owner,
        theme: job.metadata.theme.clone(),
        difficulty: job.metadata.difficulty,
        size: job_size(config),
        constraints,
        randomness: job.randomness,
    }
}

/// Shape checks plus assembly of the stage's candidate
fn accept(
    job: &ConstructionJob,
    owner: GenerationStage,
    artifact: Artifact,
) -> Result<Candidate, GenerationError> {
    match (owner, artifact) {
        (GenerationStage::Grid, Artifact::Grid(artifact)) => {
            let size = job_size(&job.config);
            if artifact.grid.dimensions() != (size.rows, size.cols) {
                let (rows, cols) = artifact.grid.dimensions();
                return Err(GenerationError::Malformed(format!(
                    "expected a {} grid, got {}x{}",
                    size, rows, cols
                )));
            }
            ensure_within(&artifact.theme_answers, size)?;
            Ok(Candidate::Grid(GridArtifact {
                grid: artifact.grid.layout(),
                theme_answers: artifact
                    .theme_answers
                    .into_iter()
                    .map(Answer::theme)
                    .collect(),
            }))
        }
        (GenerationStage::Fill, Artifact::Fill(artifact)) => {
            let grid = job.artifacts.grid.as_ref().ok_or_else(|| {
                GenerationError::Malformed("fill produced before any grid was accepted".to_string())
            })?;
            ensure_within(&artifact.answers, job_size(&job.config))?;
            Ok(Candidate::Fill(assemble_fill(
                grid,
                artifact.answers,
                job.config.min_word_length,
            )))
        }
        (GenerationStage::Clues, Artifact::Clues(artifact)) => {
            let fill = job.artifacts.fill.as_ref().ok_or_else(|| {
                GenerationError::Malformed("clues produced before any fill was accepted".to_string())
            })?;
            Ok(Candidate::Clued(attach_clues(
                fill,
                artifact.clues,
                job,
            )))
        }
        (owner, artifact) => Err(GenerationError::Malformed(format!(
            "expected a {} artifact, got {}",
            owner,
            artifact.stage()
        ))),
    }
}

/// Reject answers whose span leaves the requested grid
fn ensure_within(answers: &[Answer], size: GridSize) -> Result<(), GenerationError> {
    let inside = |coord: Coord| coord.row < size.rows && coord.col < size.cols;
    for answer in answers {
        let end = answer
            .direction
            .step(answer.start, answer.len().saturating_sub(1));
        if !inside(answer.start) || !inside(end) {
            return Err(GenerationError::Malformed(format!(
                "answer {} at {} {} runs outside the {} grid",
                answer.normalized(),
                answer.start,
                answer.direction,
                size
            )));
        }
    }
    Ok(())
}

/// Merge theme and fill answers and write their letters into the layout.
/// Theme answers keep their slots and the first letter written to a cell stays.
fn assemble_fill(grid: &GridArtifact, fill: Vec<Answer>, min_len: usize) -> FilledGrid {
    let claimed: HashSet<(Direction, Coord)> = grid
        .theme_answers
        .iter()
        .map(|answer| (answer.direction, answer.start))
        .collect();

    let mut answers: Vec<Answer> = grid.theme_answers.clone();
    answers.extend(
        fill.into_iter()
            .filter(|answer| !claimed.contains(&(answer.direction, answer.start))),
    );

    let mut filled = grid.grid.layout();
    for answer in &answers {
        for (coord, letter) in answer.cells().zip(answer.letters()) {
            if filled.letter(coord).is_some() {
                continue;
            }
            if let Err(err) = filled.set_letter(coord, letter) {
                debug!(answer = %answer.label(), error = %err, "Skipping letter outside the layout");
            }
        }
    }

    filled.assign_numbers(min_len);
    let numbers: HashMap<Coord, u32> = filled.numbering(min_len).into_iter().collect();
    for answer in &mut answers {
        answer.number = numbers.get(&answer.start).copied().unwrap_or(0);
        answer.clue = None;
    }

    FilledGrid {
        grid: filled,
        answers,
    }
}

fn attach_clues(fill: &FilledGrid, clues: Vec<ClueEntry>, job: &ConstructionJob) -> Puzzle {
    let mut by_slot: HashMap<(u32, Direction), String> = clues
        .into_iter()
        .map(|entry| ((entry.number, entry.direction), entry.clue))
        .collect();

    let answers = fill
        .answers
        .iter()
        .cloned()
        .map(|mut answer| {
            answer.clue = by_slot.remove(&(answer.number, answer.direction));
            answer
        })
        .collect();

    if !by_slot.is_empty() {
        debug!(job_id = %job.id, unmatched = by_slot.len(), "Ignoring clues for unknown slots");
    }

    Puzzle::new(fill.grid.clone(), answers, job.metadata.clone())
}

fn missing_artifact(what: &str) -> Step {
    Step::Retry(AttemptFailure::GenerationFailure {
        error: GenerationError::Malformed(format!("no {} to validate", what)),
    })
}

fn blocking_only(issues: &[Issue]) -> Vec<Issue> {
    issues.iter().filter(|issue| issue.is_blocking()).cloned().collect()
}

fn check_grid(job: &ConstructionJob, validators: &Validators) -> Step {
    let Some(artifact) = &job.artifacts.grid else {
        return missing_artifact("grid");
    };

    let result = validators.grid.validate(&artifact.grid);
    let mut blocking = blocking_only(&result.issues);
    blocking.extend(theme_placement_issues(
        &artifact.grid,
        &artifact.theme_answers,
        validators.fill.min_word_length,
    ));

    if blocking.is_empty() {
        Step::Advance
    } else {
        Step::Retry(AttemptFailure::ValidationFailure { issues: blocking })
    }
}

/// Theme answers must sit exactly on a slot and agree where they cross
fn theme_placement_issues(layout: &Grid, theme: &[Answer], min_len: usize) -> Vec<Issue> {
    let slots: HashMap<(Direction, Coord), usize> = layout
        .slots(min_len)
        .into_iter()
        .map(|slot| ((slot.direction, slot.start), slot.length))
        .collect();
    let mut scratch = layout.layout();

    theme
        .iter()
        .filter_map(|answer| {
            let problem = match slots.get(&(answer.direction, answer.start)) {
                None => Some(format!(
                    "Theme answer {} at {} {} does not start a slot",
                    answer.normalized(),
                    answer.start,
                    answer.direction
                )),
                Some(length) if *length != answer.len() => Some(format!(
                    "Theme answer {} has {} letters but its slot has {}",
                    answer.normalized(),
                    answer.len(),
                    length
                )),
                Some(_) => scratch
                    .place_answer(answer.start, answer.direction, &answer.text)
                    .err()
                    .map(|err| format!("Theme answer {} cannot be placed: {}", answer.normalized(), err)),
            };
            problem.map(|message| {
                Issue::blocking(IssueKind::AnswerGeometry, message, GEOMETRY_PENALTY)
                    .with_cells(answer.cells().filter(|coord| layout.in_bounds(*coord)))
            })
        })
        .collect()
}

fn check_fill(job: &ConstructionJob, validators: &Validators) -> Step {
    let Some(fill) = &job.artifacts.fill else {
        return missing_artifact("fill");
    };

    let result = validators
        .fill
        .validate(&fill.grid, &fill.answers, &job.metadata.theme_words);
    if result.passed {
        Step::Advance
    } else {
        Step::Retry(AttemptFailure::ValidationFailure {
            issues: blocking_only(&result.issues),
        })
    }
}

fn check_final(job: &ConstructionJob, validators: &Validators) -> Step {
    let Some(puzzle) = &job.artifacts.puzzle else {
        return missing_artifact("clued puzzle");
    };

    let solvability = validators.solvability.check(puzzle);
    if !solvability.passed {
        return Step::Retry(AttemptFailure::ValidationFailure {
            issues: blocking_only(&solvability.issues),
        });
    }

    let grid = validators.grid.validate(&puzzle.grid);
    let fill = validators
        .fill
        .validate(&puzzle.grid, &puzzle.answers, &puzzle.metadata.theme_words);
    let report = validators.scorer.score(&grid, &fill, &solvability);
    debug!(job_id = %job.id, score = report.score, threshold = validators.threshold, "Scored puzzle");

    if report.accepts(validators.threshold) {
        let mut accepted = puzzle.clone();
        accepted.quality = Some(report);
        Step::Complete(accepted)
    } else {
        Step::Retry(AttemptFailure::QualityFailure {
            score: report.score,
            threshold: validators.threshold,
            issues: report.issues,
        })
    }
}

fn advance(writer: &mut JobWriter, stage: Stage) {
    let Some(next) = stage.next() else {
        return;
    };
    writer.update(|job| {
        if !stage.is_generation() {
            if let Some(owner) = stage.owner() {
                job.attempts_mut(owner).current = 0;
            }
            job.randomness = job.config.randomness;
        }
        job.stage = next;
    });
    info!(job_id = %writer.id(), from = %stage, stage = %next, "Stage advanced");
}

/// Charge a failed attempt to the owning generation stage. Returns the
/// terminal reason once the budget is spent.
fn record_failure(
    writer: &mut JobWriter,
    policy: &RetryPolicy,
    stage: Stage,
    failure: AttemptFailure,
) -> Option<FailureReason> {
    let owner = stage.owner()?;
    let attempt = writer.job().attempts_for(owner).current + 1;
    let randomness = writer.job().randomness;
    let exhausted = policy.is_exhausted(attempt);
    warn!(
        job_id = %writer.id(),
        stage = %stage,
        attempt,
        randomness,
        error = %failure,
        "Attempt failed"
    );

    writer.update(|job| {
        job.attempts_mut(owner).current = attempt;
        job.history.push(AttemptRecord {
            stage,
            attempt,
            randomness,
            failure: failure.clone(),
            at: Utc::now(),
        });
        if !exhausted {
            job.randomness = policy.next_randomness(randomness, attempt);
            job.stage = Stage::generating(owner);
        }
    });

    if !exhausted {
        return None;
    }

    let issues = writer
        .job()
        .history
        .iter()
        .filter(|record| record.stage.owner() == Some(owner))
        .flat_map(|record| record.failure.issues().iter().cloned())
        .collect();
    Some(FailureReason::exhausted(stage, attempt, &failure, issues))
}
