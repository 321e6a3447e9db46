//! Construction jobs and their serialized record form.

use crate::config::ConstructionConfig;
use crate::generation::{GenerationStage, GridArtifact};
use crate::grid::{Answer, Grid};
use crate::pipeline::{AttemptFailure, FailureReason, Stage};
use crate::puzzle::{Puzzle, PuzzleMetadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static JOB_COUNTER: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// `job-{millis}-{pid}-{seq}`, unique within a process
    pub fn generate() -> Self {
        let seq = JOB_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!(
            "job-{}-{}-{}",
            Utc::now().timestamp_millis(),
            std::process::id(),
            seq
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attempts for one generation stage: `current` resets when the stage passes,
/// `total` never does
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageAttempts {
    pub current: u32,
    pub total: u32,
}

/// Fill stage output merged with the theme answers and written into the layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilledGrid {
    pub grid: Grid,
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artifacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridArtifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<FilledGrid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub puzzle: Option<Puzzle>,
}

/// One failed attempt in a job's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub stage: Stage,
    pub attempt: u32,
    pub randomness: f64,
    pub failure: AttemptFailure,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    Done(Puzzle),
    Failed(FailureReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructionJob {
    pub id: JobId,
    pub metadata: PuzzleMetadata,
    pub config: ConstructionConfig,
    pub stage: Stage,
    pub status: JobStatus,
    pub attempts: BTreeMap<GenerationStage, StageAttempts>,
    pub artifacts: Artifacts,
    pub randomness: f64,
    pub history: Vec<AttemptRecord>,
    pub outcome: Option<JobOutcome>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConstructionJob {
    pub fn new(metadata: PuzzleMetadata, config: ConstructionConfig) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::generate(),
            metadata,
            randomness: config.randomness,
            config,
            stage: Stage::GridGeneration,
            status: JobStatus::Pending,
            attempts: GenerationStage::ALL
                .iter()
                .map(|stage| (*stage, StageAttempts::default()))
                .collect(),
            artifacts: Artifacts::default(),
            history: Vec::new(),
            outcome: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn attempts_for(&self, stage: GenerationStage) -> StageAttempts {
        self.attempts.get(&stage).copied().unwrap_or_default()
    }

    pub fn attempts_mut(&mut self, stage: GenerationStage) -> &mut StageAttempts {
        self.attempts.entry(stage).or_default()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn puzzle(&self) -> Option<&Puzzle> {
        match &self.outcome {
            Some(JobOutcome::Done(puzzle)) => Some(puzzle),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match &self.outcome {
            Some(JobOutcome::Failed(reason)) => Some(reason),
            _ => None,
        }
    }

    /// Total collaborator calls across every stage
    pub fn total_attempts(&self) -> u32 {
        self.attempts.values().map(|attempts| attempts.total).sum()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn record(&self) -> JobRecord {
        JobRecord::from(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobResult {
    Puzzle(Puzzle),
    FailureReason(FailureReason),
}

/// Serialized job status, as returned to callers and written to the archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub stage: Stage,
    pub attempts_per_stage: BTreeMap<GenerationStage, StageAttempts>,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ConstructionJob> for JobRecord {
    fn from(job: &ConstructionJob) -> Self {
        let result = job.outcome.as_ref().map(|outcome| match outcome {
            JobOutcome::Done(puzzle) => JobResult::Puzzle(puzzle.clone()),
            JobOutcome::Failed(reason) => JobResult::FailureReason(reason.clone()),
        });
        Self {
            job_id: job.id.clone(),
            stage: job.stage,
            attempts_per_stage: job.attempts.clone(),
            status: job.status,
            result,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}
