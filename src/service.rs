//! Construction Service
//!
//! A pool of tokio workers fed by a FIFO queue. Each worker pops a job, drives
//! it through the pipeline to a terminal outcome and moves on to the next.
//! Callers submit requests and observe jobs through store snapshots.

use crate::config::{ConstructionConfig, CruciverbConfig};
use crate::error::ApiError;
use crate::generation::GenerationCollaborator;
use crate::pipeline::{
    CancelFlag, ConstructionJob, FailureReason, JobId, JobOutcome, JobRecord, JobStatus,
    PipelineDriver,
};
use crate::puzzle::{Difficulty, GridSize, PuzzleMetadata};
use crate::store::{JobStore, JobWriter, SledJobArchive};
use crate::validation::Lexicon;
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Notify};
use tokio::time::sleep;
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What to build. Unset fields fall back to the service's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstructionRequest {
    pub theme: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub size: Option<GridSize>,
    #[serde(default)]
    pub theme_words: Vec<String>,
    /// Replaces the service's construction defaults for this job only
    #[serde(default)]
    pub config: Option<ConstructionConfig>,
}

impl ConstructionRequest {
    pub fn new(theme: impl Into<String>) -> Self {
        Self {
            theme: theme.into(),
            ..Self::default()
        }
    }

    pub fn with_size(mut self, size: GridSize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_theme_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.theme_words = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_config(mut self, config: ConstructionConfig) -> Self {
        self.config = Some(config);
        self
    }
}

/// Service statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceStats {
    /// Jobs waiting for a worker
    pub pending: usize,
    /// Jobs a worker is driving
    pub running: usize,
    pub done: usize,
    pub failed: usize,
}

struct QueuedJob {
    writer: JobWriter,
    cancel: CancelFlag,
}

pub struct ConstructionService {
    /// Jobs waiting for a worker, oldest first
    queue: Arc<Mutex<VecDeque<QueuedJob>>>,
    /// Wakes idle workers when a job is queued
    notify: Arc<Notify>,
    workers: Arc<RwLock<Vec<tokio::task::JoinHandle<()>>>>,
    running: Arc<RwLock<bool>>,
    stats: Arc<RwLock<ServiceStats>>,
    cancels: Arc<RwLock<HashMap<JobId, CancelFlag>>>,
    store: Arc<JobStore>,
    driver: Arc<PipelineDriver>,
    defaults: ConstructionConfig,
    worker_count: usize,
}

impl ConstructionService {
    pub fn new(
        driver: PipelineDriver,
        store: Arc<JobStore>,
        defaults: ConstructionConfig,
        worker_count: usize,
    ) -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            notify: Arc::new(Notify::new()),
            workers: Arc::new(RwLock::new(Vec::new())),
            running: Arc::new(RwLock::new(false)),
            stats: Arc::new(RwLock::new(ServiceStats::default())),
            cancels: Arc::new(RwLock::new(HashMap::new())),
            store,
            driver: Arc::new(driver),
            defaults,
            worker_count: worker_count.max(1),
        }
    }

    /// Wire lexicon, archive, store and driver from loaded configuration
    pub fn from_config(
        config: &CruciverbConfig,
        collaborator: Arc<dyn GenerationCollaborator>,
    ) -> Result<Self, ApiError> {
        let lexicon = match &config.lexicon.path {
            Some(path) => {
                let lexicon = Lexicon::load(path)?;
                info!(path = %path.display(), words = lexicon.len(), "Loaded lexicon");
                Some(Arc::new(lexicon))
            }
            None => None,
        };

        let mut store = JobStore::new(Duration::from_secs(config.pipeline.retention_secs));
        if let Some(path) = &config.pipeline.archive_path {
            store = store.with_archive(Arc::new(SledJobArchive::open(path)?));
        }

        let driver = PipelineDriver::new(collaborator)
            .with_lexicon(lexicon)
            .with_timeout(Duration::from_secs(config.pipeline.generation_timeout_secs));

        Ok(Self::new(
            driver,
            Arc::new(store),
            config.construction.clone(),
            config.pipeline.workers,
        ))
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    pub fn is_running(&self) -> bool {
        *self.running.read()
    }

    /// Start background workers
    pub fn start(&self) -> Result<(), ApiError> {
        let mut running = self.running.write();
        if *running {
            return Ok(());
        }
        *running = true;
        drop(running);

        let mut workers = self.workers.write();
        for worker_id in 0..self.worker_count {
            let queue = Arc::clone(&self.queue);
            let notify = Arc::clone(&self.notify);
            let running = Arc::clone(&self.running);
            let stats = Arc::clone(&self.stats);
            let cancels = Arc::clone(&self.cancels);
            let store = Arc::clone(&self.store);
            let driver = Arc::clone(&self.driver);

            let handle = tokio::spawn(async move {
                Self::worker_loop(worker_id, queue, notify, running, stats, cancels, store, driver)
                    .await;
            });
            workers.push(handle);
        }

        info!(worker_count = workers.len(), "Started construction workers");
        Ok(())
    }

    /// Stop background workers. Jobs in flight run to completion; queued jobs stay queued.
    pub async fn stop(&self) -> Result<(), ApiError> {
        let mut running = self.running.write();
        if !*running {
            return Ok(());
        }
        *running = false;
        drop(running);

        self.notify.notify_waiters();
        let workers = std::mem::take(&mut *self.workers.write());
        for handle in workers {
            if let Err(err) = handle.await {
                warn!(error = %err, "Construction worker ended abnormally");
            }
        }

        info!("Stopped construction workers");
        Ok(())
    }

    /// Register a job and queue it. Invalid parameters fail the job on the spot.
    pub async fn submit(&self, request: ConstructionRequest) -> Result<JobId, ApiError> {
        if !self.is_running() {
            return Err(ApiError::ServiceStopped);
        }

        let mut config = request.config.unwrap_or_else(|| self.defaults.clone());
        if let Some(size) = request.size {
            config.grid_rows = size.rows;
            config.grid_cols = size.cols;
        }
        let metadata = PuzzleMetadata {
            theme: request.theme,
            difficulty: request.difficulty,
            size: GridSize::new(config.grid_rows, config.grid_cols),
            theme_words: request.theme_words,
        };
        let problems = config.problems();

        let writer = self.store.create(ConstructionJob::new(metadata, config));
        let job_id = writer.id().clone();

        if !problems.is_empty() {
            warn!(job_id = %job_id, problems = ?problems, "Rejected construction request");
            writer.finish(JobOutcome::Failed(FailureReason::configuration(
                problems.join("; "),
            )));
            self.stats.write().failed += 1;
            return Ok(job_id);
        }

        let cancel = CancelFlag::new();
        self.cancels.write().insert(job_id.clone(), cancel.clone());
        self.queue.lock().await.push_back(QueuedJob { writer, cancel });
        self.stats.write().pending += 1;
        self.notify.notify_one();

        debug!(job_id = %job_id, "Queued construction job");
        Ok(job_id)
    }

    pub fn status(&self, job_id: &JobId) -> Result<JobRecord, ApiError> {
        self.store
            .record(job_id)?
            .ok_or_else(|| ApiError::JobNotFound(job_id.to_string()))
    }

    pub fn snapshot(&self, job_id: &JobId) -> Option<Arc<ConstructionJob>> {
        self.store.snapshot(job_id)
    }

    /// Ask a job to stop at its next stage boundary. Returns false when the
    /// job had already finished.
    pub fn cancel(&self, job_id: &JobId) -> Result<bool, ApiError> {
        let terminal = match self.store.snapshot(job_id) {
            Some(job) => job.is_terminal(),
            None => self.status(job_id)?.status.is_terminal(),
        };
        if terminal {
            return Ok(false);
        }
        match self.cancels.read().get(job_id) {
            Some(flag) => {
                flag.cancel();
                info!(job_id = %job_id, "Cancellation requested");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Poll until the job is terminal or `timeout` elapses
    pub async fn wait(
        &self,
        job_id: &JobId,
        timeout: Option<Duration>,
    ) -> Result<JobRecord, ApiError> {
        let started = Instant::now();
        loop {
            match self.store.snapshot(job_id) {
                Some(job) if job.is_terminal() => return Ok(job.record()),
                Some(_) => {}
                None => return self.status(job_id),
            }

            if let Some(limit) = timeout {
                if started.elapsed() >= limit {
                    return Err(ApiError::WaitTimeout(job_id.to_string()));
                }
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Wait on several jobs at once; results follow the order of `job_ids`
    pub async fn wait_all(
        &self,
        job_ids: &[JobId],
        timeout: Option<Duration>,
    ) -> Vec<Result<JobRecord, ApiError>> {
        futures::future::join_all(job_ids.iter().map(|job_id| self.wait(job_id, timeout))).await
    }

    pub fn stats(&self) -> ServiceStats {
        self.stats.read().clone()
    }

    pub fn prune_expired(&self) -> Result<usize, ApiError> {
        Ok(self.store.prune_expired(Utc::now())?)
    }

    #[allow(clippy::too_many_arguments)]
    async fn worker_loop(
        worker_id: usize,
        queue: Arc<Mutex<VecDeque<QueuedJob>>>,
        notify: Arc<Notify>,
        running: Arc<RwLock<bool>>,
        stats: Arc<RwLock<ServiceStats>>,
        cancels: Arc<RwLock<HashMap<JobId, CancelFlag>>>,
        store: Arc<JobStore>,
        driver: Arc<PipelineDriver>,
    ) {
        debug!(worker_id, "Construction worker started");

        while *running.read() {
            let next = queue.lock().await.pop_front();
            let Some(QueuedJob { writer, cancel }) = next else {
                tokio::select! {
                    _ = notify.notified() => {},
                    _ = sleep(POLL_INTERVAL) => {},
                }
                continue;
            };

            {
                let mut stats = stats.write();
                stats.pending = stats.pending.saturating_sub(1);
                stats.running += 1;
            }

            let job_id = writer.id().clone();
            debug!(worker_id, job_id = %job_id, "Worker picked up job");
            let finished = driver.run(writer, &cancel).await;
            cancels.write().remove(&job_id);

            {
                let mut stats = stats.write();
                stats.running = stats.running.saturating_sub(1);
                match finished.status {
                    JobStatus::Done => stats.done += 1,
                    _ => stats.failed += 1,
                }
            }

            if let Err(err) = store.prune_expired(Utc::now()) {
                warn!(worker_id, error = %err, "Failed to prune expired jobs");
            }
        }

        debug!(worker_id, "Construction worker stopped");
    }
}
