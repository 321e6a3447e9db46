//! Job Store
//!
//! In-memory registry of construction jobs. Each job has exactly one
//! [`JobWriter`], held by the pipeline driving it; everyone else reads
//! immutable snapshots. Terminal jobs stay for the retention window and are
//! handed to the archive, when one is configured, before they are dropped.

pub mod archive;

pub use archive::{JobArchive, SledJobArchive};

use crate::error::StorageError;
use crate::pipeline::{ConstructionJob, JobId, JobOutcome, JobRecord, JobStatus, Stage};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

struct JobSlot {
    snapshot: RwLock<Arc<ConstructionJob>>,
}

impl JobSlot {
    fn load(&self) -> Arc<ConstructionJob> {
        self.snapshot.read().clone()
    }
}

pub struct JobStore {
    jobs: RwLock<HashMap<JobId, Arc<JobSlot>>>,
    retention: Duration,
    archive: Option<Arc<dyn JobArchive>>,
}

impl JobStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            retention,
            archive: None,
        }
    }

    pub fn with_archive(mut self, archive: Arc<dyn JobArchive>) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    pub fn archive(&self) -> Option<&Arc<dyn JobArchive>> {
        self.archive.as_ref()
    }

    /// Write a terminal job's record to the archive now, keeping it in memory.
    /// Returns false when there is no archive or the job is still running.
    pub fn archive_job(&self, job_id: &JobId) -> Result<bool, StorageError> {
        let (Some(archive), Some(job)) = (&self.archive, self.snapshot(job_id)) else {
            return Ok(false);
        };
        if !job.is_terminal() {
            return Ok(false);
        }
        archive.put(&job.record())?;
        Ok(true)
    }

    /// Register a job and hand back its only writer
    pub fn create(&self, job: ConstructionJob) -> JobWriter {
        let slot = Arc::new(JobSlot {
            snapshot: RwLock::new(Arc::new(job.clone())),
        });
        self.jobs.write().insert(job.id.clone(), slot.clone());
        debug!(job_id = %job.id, "Registered job");
        JobWriter { job, slot }
    }

    /// Latest published state of an in-memory job
    pub fn snapshot(&self, job_id: &JobId) -> Option<Arc<ConstructionJob>> {
        let slot = self.jobs.read().get(job_id).cloned()?;
        Some(slot.load())
    }

    /// Job record from memory, falling back to the archive
    pub fn record(&self, job_id: &JobId) -> Result<Option<JobRecord>, StorageError> {
        if let Some(job) = self.snapshot(job_id) {
            return Ok(Some(job.record()));
        }
        match &self.archive {
            Some(archive) => archive.get(job_id),
            None => Ok(None),
        }
    }

    pub fn list(&self) -> Vec<Arc<ConstructionJob>> {
        let slots: Vec<Arc<JobSlot>> = self.jobs.read().values().cloned().collect();
        let mut jobs: Vec<Arc<ConstructionJob>> = slots.iter().map(|slot| slot.load()).collect();
        jobs.sort_by_key(|job| job.created_at);
        jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }

    /// Drop terminal jobs whose retention window has passed as of `now`,
    /// archiving each first. Returns how many were dropped.
    pub fn prune_expired(&self, now: DateTime<Utc>) -> Result<usize, StorageError> {
        let expired: Vec<Arc<ConstructionJob>> = self
            .list()
            .into_iter()
            .filter(|job| job.is_terminal())
            .filter(|job| {
                now.signed_duration_since(job.updated_at)
                    .to_std()
                    .map(|age| age >= self.retention)
                    .unwrap_or(false)
            })
            .collect();

        let mut removed = 0usize;
        for job in expired {
            if let Some(archive) = &self.archive {
                if let Err(err) = archive.put(&job.record()) {
                    warn!(job_id = %job.id, error = %err, "Failed to archive job; keeping it in memory");
                    continue;
                }
            }
            if self.jobs.write().remove(&job.id).is_some() {
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(removed, "Pruned expired jobs");
        }
        Ok(removed)
    }
}

/// Sole mutator of one job. Not `Clone`; finishing consumes it, so a terminal
/// job can never be written again.
pub struct JobWriter {
    job: ConstructionJob,
    slot: Arc<JobSlot>,
}

impl JobWriter {
    pub fn id(&self) -> &JobId {
        &self.job.id
    }

    /// Working copy, including changes not yet published
    pub fn job(&self) -> &ConstructionJob {
        &self.job
    }

    /// Apply `change` to the working copy and publish a new snapshot
    pub fn update<F>(&mut self, change: F)
    where
        F: FnOnce(&mut ConstructionJob),
    {
        change(&mut self.job);
        self.job.touch();
        self.publish();
    }

    /// Record the terminal outcome and publish the final snapshot
    pub fn finish(mut self, outcome: JobOutcome) -> Arc<ConstructionJob> {
        let (stage, status) = match &outcome {
            JobOutcome::Done(_) => (Stage::Done, JobStatus::Done),
            JobOutcome::Failed(_) => (Stage::Failed, JobStatus::Failed),
        };
        self.job.stage = stage;
        self.job.status = status;
        self.job.outcome = Some(outcome);
        self.job.touch();
        self.publish()
    }

    fn publish(&self) -> Arc<ConstructionJob> {
        let snapshot = Arc::new(self.job.clone());
        *self.slot.snapshot.write() = snapshot.clone();
        snapshot
    }
}
