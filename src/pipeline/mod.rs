//! Construction Pipeline
//!
//! Moves a job through grid, fill and clue generation, validating each
//! artifact before advancing. Failed attempts are retried with rising
//! randomness and backoff until the stage's budget runs out.

pub mod driver;
pub mod failure;
pub mod job;
pub mod policy;
pub mod stage;

pub use driver::{CancelFlag, PipelineDriver};
pub use failure::{AttemptFailure, FailureCause, FailureKind, FailureReason};
pub use job::{
    AttemptRecord, Artifacts, ConstructionJob, FilledGrid, JobId, JobOutcome, JobRecord,
    JobResult, JobStatus, StageAttempts,
};
pub use policy::RetryPolicy;
pub use stage::Stage;
