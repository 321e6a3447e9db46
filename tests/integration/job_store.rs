//! Job store snapshots, retention and the sled archive

use chrono::Utc;
use cruciverb::config::ConstructionConfig;
use cruciverb::error::GenerationError;
use cruciverb::generation::GenerationStage;
use cruciverb::pipeline::{
    AttemptFailure, AttemptRecord, ConstructionJob, FailureReason, JobOutcome, JobStatus, Stage,
};
use cruciverb::puzzle::PuzzleMetadata;
use cruciverb::store::{JobArchive, JobStore, SledJobArchive};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn job() -> ConstructionJob {
    ConstructionJob::new(PuzzleMetadata::default(), ConstructionConfig::default())
}

#[test]
fn readers_never_observe_a_torn_job() {
    let store = Arc::new(JobStore::new(Duration::from_secs(3600)));
    let mut writer = store.create(job());
    let job_id = writer.id().clone();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let job_id = job_id.clone();
            thread::spawn(move || {
                let mut seen = 0usize;
                loop {
                    let snapshot = store.snapshot(&job_id).unwrap();
                    let attempts = snapshot.attempts_for(GenerationStage::Grid);
                    // counters and history are published together
                    assert_eq!(attempts.total as usize, snapshot.history.len());
                    assert!(snapshot.history.len() >= seen);
                    seen = snapshot.history.len();
                    if snapshot.is_terminal() {
                        return seen;
                    }
                    thread::yield_now();
                }
            })
        })
        .collect();

    for attempt in 1..=200u32 {
        writer.update(|job| {
            job.attempts_mut(GenerationStage::Grid).total = attempt;
            job.history.push(AttemptRecord {
                stage: Stage::GridGeneration,
                attempt,
                randomness: 0.7,
                failure: AttemptFailure::GenerationFailure {
                    error: GenerationError::Rejected("busy".to_string()),
                },
                at: Utc::now(),
            });
        });
    }
    writer.finish(JobOutcome::Failed(FailureReason::cancelled(
        Stage::GridGeneration,
    )));

    for reader in readers {
        assert_eq!(reader.join().unwrap(), 200);
    }
}

#[test]
fn expired_jobs_move_to_the_archive() {
    let dir = TempDir::new().unwrap();
    let archive = Arc::new(SledJobArchive::open(dir.path().join("jobs")).unwrap());
    let store = JobStore::new(Duration::ZERO).with_archive(archive.clone());

    let finished = store.create(job());
    let finished_id = finished.id().clone();
    finished.finish(JobOutcome::Failed(FailureReason::cancelled(
        Stage::FillGeneration,
    )));
    let running = store.create(job());
    let running_id = running.id().clone();

    let removed = store.prune_expired(Utc::now()).unwrap();
    assert_eq!(removed, 1);
    assert!(store.snapshot(&finished_id).is_none());
    assert!(store.snapshot(&running_id).is_some());

    let record = store.record(&finished_id).unwrap().unwrap();
    assert_eq!(record.status, JobStatus::Failed);
    assert_eq!(record.stage, Stage::Failed);
    assert_eq!(archive.len(), 1);
    drop(running);
}

#[test]
fn archive_outlives_the_store() {
    let dir = TempDir::new().unwrap();
    let archive = Arc::new(SledJobArchive::open(dir.path().join("jobs")).unwrap());

    let job_id = {
        let store = JobStore::new(Duration::from_secs(3600)).with_archive(archive.clone());
        let writer = store.create(job());
        let job_id = writer.id().clone();
        assert!(!store.archive_job(&job_id).unwrap());
        writer.finish(JobOutcome::Failed(FailureReason::configuration(
            "max_retries must be at least 1",
        )));
        assert!(store.archive_job(&job_id).unwrap());
        job_id
    };
    archive.flush().unwrap();

    let record = archive.get(&job_id).unwrap().unwrap();
    assert_eq!(record.job_id, job_id);
    assert_eq!(record.status, JobStatus::Failed);
    assert_eq!(archive.list().unwrap().len(), 1);
    assert_eq!(
        archive
            .prune(Utc::now() + chrono::Duration::seconds(1))
            .unwrap(),
        1
    );
    assert!(archive.is_empty());
}
