// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gantry_core::CANCELLED_BY_USER;

/// Create a job whose worker starts a step and then hangs
async fn running(ctx: &TestContext) -> JobId {
    ctx.worker.push(FakeAttempt::hangs().line(STEP_START));
    let job_id = ctx.create("long task");
    ctx.wait_for(&job_id, |job| job.progress == 10).await;
    job_id
}

#[tokio::test]
async fn cancel_kills_the_worker_and_fails_the_job() {
    let ctx = setup();
    let job_id = running(&ctx).await;

    ctx.runtime.cancel(job_id.as_str()).await.unwrap();

    let job = ctx.runtime.get(job_id.as_str()).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some(CANCELLED_BY_USER));
    assert!(job.finished_at.is_some());
    assert_eq!(ctx.worker.kill_count(), 1);
}

#[tokio::test]
async fn cancel_clears_the_worker_handle() {
    let ctx = setup();
    let job_id = running(&ctx).await;

    ctx.runtime.cancel(job_id.as_str()).await.unwrap();

    let record = ctx.runtime.record(job_id.as_str()).unwrap();
    assert!(record.lock().worker.is_none());
}

#[tokio::test]
async fn nothing_is_published_after_the_failed_status() {
    let ctx = setup();
    let job_id = running(&ctx).await;
    let mut sub = ctx.runtime.bus().subscribe(&job_id);

    ctx.runtime.cancel(job_id.as_str()).await.unwrap();
    // Give the executor a chance to observe the kill
    tokio::time::sleep(Duration::from_millis(20)).await;

    let mut events = Vec::new();
    while let Some(event) = sub.try_recv() {
        events.push(event);
    }
    assert_eq!(events, vec![JobEvent::cancelled(CANCELLED_BY_USER)]);
    assert_eq!(ctx.worker.spawn_count(), 1, "no retry after cancel");
    assert_eq!(
        ctx.runtime.get(job_id.as_str()).unwrap().retry_count,
        0,
        "a cancel is not a failure"
    );
}

#[tokio::test]
async fn stream_ends_after_cancel() {
    let ctx = setup();
    let job_id = running(&ctx).await;
    let mut stream = ctx.runtime.stream(job_id.as_str()).unwrap();

    ctx.runtime.cancel(job_id.as_str()).await.unwrap();

    assert_eq!(
        collect(&mut stream).await,
        vec![
            snapshot(JobStatus::Running, 10),
            JobEvent::cancelled(CANCELLED_BY_USER),
            JobEvent::Complete,
        ]
    );
}

#[tokio::test]
async fn cancel_pending_job_never_spawns() {
    let ctx = setup();
    let job_id = ctx.create("task");

    // The executor task has not been polled yet
    ctx.runtime.cancel(job_id.as_str()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let job = ctx.runtime.get(job_id.as_str()).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.started_at.is_none());
    assert_eq!(ctx.worker.spawn_count(), 0);
}

#[yare::parameterized(
    completed   = { None },
    needs_input = { Some(3) },
)]
fn cancel_rejects_settled_jobs(failures: Option<u32>) {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(async {
            let ctx = setup();
            for _ in 0..failures.unwrap_or(0) {
                ctx.worker.push(FakeAttempt::exits(1));
            }
            let job_id = ctx.create("task");
            let before = ctx.settled(&job_id).await;

            let err = ctx.runtime.cancel(job_id.as_str()).await.unwrap_err();

            assert!(matches!(err, RuntimeError::NotRunning(_)));
            assert_eq!(err.to_string(), "Job is not running");
            assert_eq!(ctx.runtime.get(job_id.as_str()).unwrap(), before);
        });
}

#[tokio::test]
async fn cancel_unknown_job_is_not_found() {
    let ctx = setup();
    assert!(ctx.runtime.cancel("ghost").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn shutdown_kills_live_workers() {
    let ctx = setup();
    let first = running(&ctx).await;
    let second = running(&ctx).await;

    ctx.runtime.shutdown().await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(ctx.worker.kill_count(), 2);
    assert_eq!(ctx.worker.spawn_count(), 2, "no retries during shutdown");
    for job_id in [first, second] {
        let record = ctx.runtime.record(job_id.as_str()).unwrap();
        assert!(record.lock().worker.is_none());
    }
}
