//! Sled archive of terminal job records.

use std::path::Path;

use chrono::{DateTime, Utc};
use sled::{Db, Tree};

use crate::error::StorageError;
use crate::pipeline::{JobId, JobRecord};

const TREE_JOBS: &str = "jobs";

/// Durable home for job records once they leave memory
pub trait JobArchive: Send + Sync {
    fn put(&self, record: &JobRecord) -> Result<(), StorageError>;
    fn get(&self, job_id: &JobId) -> Result<Option<JobRecord>, StorageError>;
    fn list(&self) -> Result<Vec<JobRecord>, StorageError>;

    /// Drop records last updated before `cutoff`
    fn prune(&self, cutoff: DateTime<Utc>) -> Result<usize, StorageError>;
}

#[derive(Clone)]
pub struct SledJobArchive {
    db: Db,
    jobs: Tree,
}

impl SledJobArchive {
    /// Open or create the archive at `path` (a directory sled manages)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path.as_ref()).map_err(|e| {
            StorageError::Archive(format!(
                "Failed to open archive at {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_db(db)
    }

    pub fn from_db(db: Db) -> Result<Self, StorageError> {
        let jobs = db.open_tree(TREE_JOBS).map_err(to_storage_io)?;
        Ok(Self { db, jobs })
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush().map_err(to_storage_io)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl JobArchive for SledJobArchive {
    fn put(&self, record: &JobRecord) -> Result<(), StorageError> {
        let value = serde_json::to_vec(record).map_err(to_storage_data)?;
        self.jobs
            .insert(record.job_id.as_str().as_bytes(), value)
            .map_err(to_storage_io)?;
        Ok(())
    }

    fn get(&self, job_id: &JobId) -> Result<Option<JobRecord>, StorageError> {
        let Some(raw) = self
            .jobs
            .get(job_id.as_str().as_bytes())
            .map_err(to_storage_io)?
        else {
            return Ok(None);
        };
        let parsed = serde_json::from_slice(&raw).map_err(to_storage_data)?;
        Ok(Some(parsed))
    }

    fn list(&self) -> Result<Vec<JobRecord>, StorageError> {
        let mut out = Vec::new();
        for result in self.jobs.iter() {
            let (_, value) = result.map_err(to_storage_io)?;
            let record: JobRecord = serde_json::from_slice(&value).map_err(to_storage_data)?;
            out.push(record);
        }
        out.sort_by_key(|record| std::cmp::Reverse(record.updated_at));
        Ok(out)
    }

    fn prune(&self, cutoff: DateTime<Utc>) -> Result<usize, StorageError> {
        let mut removed = 0usize;
        for record in self.list()? {
            if record.updated_at < cutoff {
                self.jobs
                    .remove(record.job_id.as_str().as_bytes())
                    .map_err(to_storage_io)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn to_storage_io(err: sled::Error) -> StorageError {
    StorageError::Archive(err.to_string())
}

fn to_storage_data(err: serde_json::Error) -> StorageError {
    StorageError::Encoding(err.to_string())
}
