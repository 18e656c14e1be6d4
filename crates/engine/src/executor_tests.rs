// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::store::JobStore;
use async_trait::async_trait;
use gantry_adapters::{FakeAttempt, FakeWorkerAdapter, WorkerError};
use gantry_core::{FakeClock, Job, JobConfig, JobStatus};

struct Harness<W> {
    executor: Executor<W, FakeClock>,
    store: JobStore,
    bus: Arc<EventBus>,
}

fn harness<W: WorkerAdapter>(worker: W, max_retries: u32) -> Harness<W> {
    let bus = EventBus::new();
    Harness {
        executor: Executor::new(
            worker,
            FakeClock::new(),
            Arc::clone(&bus),
            max_retries,
            Duration::ZERO,
        ),
        store: JobStore::default(),
        bus,
    }
}

impl<W: WorkerAdapter> Harness<W> {
    fn start(&self, id: &str) -> Arc<JobRecord> {
        let job = Job::new(
            JobId::new(id),
            JobConfig::new("task", "sisyphus"),
            self.executor.clock().now(),
        );
        let record = self.store.insert(job);
        self.executor.launch(JobId::new(id), Arc::clone(&record));
        record
    }
}

/// Poll until the job satisfies `done` or five seconds pass
async fn wait_for(record: &JobRecord, done: impl Fn(&Job) -> bool) -> Job {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let job = record.snapshot();
        if done(&job) {
            return job;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out; last state: {:?}",
            job
        );
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

fn settled(job: &Job) -> bool {
    matches!(
        job.status,
        JobStatus::Completed | JobStatus::Failed | JobStatus::NeedsInput
    )
}

#[tokio::test]
async fn spawn_error_counts_as_a_failure() {
    let worker = FakeWorkerAdapter::new();
    worker
        .push(FakeAttempt::spawn_error("no such file"))
        .push(FakeAttempt::succeeds());
    let h = harness(worker.clone(), 3);

    let job = wait_for(&h.start("job-1"), settled).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.retry_count, 1);
    assert_eq!(worker.spawn_count(), 2);
}

#[tokio::test]
async fn error_finish_kills_the_worker_and_counts_once() {
    let worker = FakeWorkerAdapter::new();
    worker.push(
        FakeAttempt::hangs()
            .line(r#"{"type":"step_finish","part":{"reason":"error","error":"bad"}}"#)
            .line(r#"{"type":"step_finish","part":{"reason":"error","error":"worse"}}"#),
    );
    let h = harness(worker.clone(), 1);

    let job = wait_for(&h.start("job-1"), settled).await;

    assert_eq!(job.status, JobStatus::NeedsInput);
    assert_eq!(job.retry_count, 1);
    assert_eq!(job.error.as_deref(), Some("bad"));
    assert_eq!(worker.kill_count(), 1);
}

#[tokio::test]
async fn non_zero_exit_after_stop_is_ignored() {
    let worker = FakeWorkerAdapter::new();
    worker.push(
        FakeAttempt::exits(1)
            .stderr("late noise")
            .line(r#"{"type":"step_finish","part":{"reason":"stop"}}"#),
    );
    let h = harness(worker.clone(), 3);

    let job = wait_for(&h.start("job-1"), settled).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.retry_count, 0);
    assert_eq!(worker.spawn_count(), 1);
}

#[tokio::test]
async fn events_after_stop_are_not_applied() {
    let worker = FakeWorkerAdapter::new();
    worker.push(
        FakeAttempt::exits(0)
            .line(r#"{"type":"text","part":{"text":"a"}}"#)
            .line(r#"{"type":"step_finish","part":{"reason":"stop"}}"#)
            .line(r#"{"type":"text","part":{"text":"b"}}"#),
    );
    let h = harness(worker, 3);
    let record = h.start("job-1");
    let mut sub = h.bus.subscribe(&JobId::new("job-1"));

    let job = wait_for(&record, settled).await;
    // Let the attempt finish draining
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(job.logs, vec!["a"]);
    let mut seen = Vec::new();
    while let Some(event) = sub.try_recv() {
        seen.push(event);
    }
    assert!(matches!(
        seen.last(),
        Some(JobEvent::Status {
            status: JobStatus::Completed,
            ..
        })
    ));
}

#[tokio::test]
async fn worker_handle_is_cleared_after_each_attempt() {
    let worker = FakeWorkerAdapter::new();
    worker.push(FakeAttempt::exits(1)).push(FakeAttempt::succeeds());
    let h = harness(worker, 3);
    let record = h.start("job-1");

    wait_for(&record, settled).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(record.lock().worker.is_none());
}

#[tokio::test]
async fn stopped_job_does_not_start() {
    let h = harness(FakeWorkerAdapter::new(), 3);
    let job = Job::new(
        JobId::new("job-1"),
        JobConfig::new("task", "sisyphus"),
        h.executor.clock().now(),
    );
    let record = h.store.insert(job);
    record.lock().stopping = true;

    assert!(h.executor.begin_attempt(&JobId::new("job-1"), &record).is_none());
    assert_eq!(record.snapshot().status, JobStatus::Pending);
}

/// Worker whose spawn panics, standing in for a bug inside an attempt
#[derive(Clone)]
struct PanickingWorker;

#[async_trait]
impl WorkerAdapter for PanickingWorker {
    async fn spawn(&self, _config: WorkerSpawnConfig) -> Result<WorkerRun, WorkerError> {
        panic!("adapter bug");
    }
}

#[tokio::test]
async fn panic_inside_attempt_goes_through_retry_policy() {
    let h = harness(PanickingWorker, 2);

    let job = wait_for(&h.start("job-1"), settled).await;

    assert_eq!(job.status, JobStatus::NeedsInput);
    assert_eq!(job.retry_count, 2);
    let error = job.error.unwrap_or_default();
    assert!(error.starts_with("Execution error:"), "got: {}", error);
}
