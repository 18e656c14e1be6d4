// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gantry_core::JobResult;

/// Create a job and drive it to NEEDS_INPUT
async fn escalated(ctx: &TestContext) -> JobId {
    for _ in 0..3 {
        ctx.worker.push(FakeAttempt::exits(1));
    }
    let job_id = ctx.create("task");
    let job = ctx.settled(&job_id).await;
    assert_eq!(job.status, JobStatus::NeedsInput);
    job_id
}

#[tokio::test]
async fn retry_starts_a_fresh_attempt() {
    let ctx = setup();
    let job_id = escalated(&ctx).await;
    ctx.worker.push(FakeAttempt::hangs().line(STEP_START));

    let status = ctx.runtime.action(job_id.as_str(), "retry").unwrap();

    assert_eq!(status, JobStatus::Running);
    let job = ctx.runtime.get(job_id.as_str()).unwrap();
    assert_eq!(job.status, JobStatus::Running);
    assert_eq!(job.retry_count, 0);
    assert!(job.error.is_none());
    assert!(job.finished_at.is_none());

    ctx.wait_for(&job_id, |_| ctx.worker.spawn_count() == 4).await;
    ctx.runtime.shutdown().await;
}

#[tokio::test]
async fn retry_can_complete_the_job() {
    let ctx = setup();
    let job_id = escalated(&ctx).await;
    ctx.worker.push(FakeAttempt::succeeds());

    ctx.runtime.action(job_id.as_str(), "retry").unwrap();
    let job = ctx
        .wait_for(&job_id, |job| job.status == JobStatus::Completed)
        .await;

    assert_eq!(job.progress, 100);
    assert_eq!(job.retry_count, 0);
}

#[tokio::test]
async fn stream_opened_while_awaiting_input_follows_the_retry() {
    let ctx = setup();
    let job_id = escalated(&ctx).await;
    let mut stream = ctx.runtime.stream(job_id.as_str()).unwrap();
    ctx.worker.push(FakeAttempt::succeeds());

    ctx.runtime.action(job_id.as_str(), "retry").unwrap();
    let events = collect(&mut stream).await;

    assert!(
        matches!(
            events.first(),
            Some(JobEvent::Status {
                status: JobStatus::NeedsInput,
                ..
            })
        ),
        "{events:?}"
    );
    assert!(events.contains(&JobEvent::running()), "{events:?}");
    assert!(
        matches!(
            events[events.len() - 2],
            JobEvent::Status {
                status: JobStatus::Completed,
                ..
            }
        ),
        "{events:?}"
    );
    assert_eq!(events.last(), Some(&JobEvent::Complete));
}

#[tokio::test]
async fn retry_gets_a_full_retry_budget() {
    let ctx = setup();
    let job_id = escalated(&ctx).await;
    for _ in 0..3 {
        ctx.worker.push(FakeAttempt::exits(1));
    }

    ctx.runtime.action(job_id.as_str(), "retry").unwrap();
    let job = ctx
        .wait_for(&job_id, |job| job.status == JobStatus::NeedsInput)
        .await;

    assert_eq!(job.retry_count, 3);
    assert_eq!(ctx.worker.spawn_count(), 6);
}

#[yare::parameterized(
    skip  = { "skip",  "Skipped by user" },
    abort = { "abort", "Aborted by user" },
)]
fn dismissal_fails_the_job(action: &str, reason: &str) {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(async {
            let ctx = setup();
            let job_id = escalated(&ctx).await;
            let mut sub = ctx.runtime.bus().subscribe(&job_id);

            let status = ctx.runtime.action(job_id.as_str(), action).unwrap();

            assert_eq!(status, JobStatus::Failed);
            let job = ctx.runtime.get(job_id.as_str()).unwrap();
            assert_eq!(job.result, Some(JobResult::dismissed(reason)));
            assert_eq!(
                serde_json::to_value(&job.result).unwrap(),
                serde_json::json!({ "error": reason })
            );
            assert_eq!(
                sub.try_recv(),
                Some(JobEvent::dismissed(JobResult::dismissed(reason)))
            );
            assert_eq!(ctx.worker.spawn_count(), 3);
        });
}

#[tokio::test]
async fn unknown_action_is_rejected_without_change() {
    let ctx = setup();
    let job_id = escalated(&ctx).await;

    let err = ctx.runtime.action(job_id.as_str(), "RETRY").unwrap_err();

    assert!(matches!(err, RuntimeError::UnknownAction(_)));
    assert_eq!(err.to_string(), "Unknown action: RETRY");
    assert_eq!(
        ctx.runtime.get(job_id.as_str()).unwrap().status,
        JobStatus::NeedsInput
    );
}

#[tokio::test]
async fn action_requires_needs_input() {
    let ctx = setup();
    let job_id = ctx.create("task");
    ctx.settled(&job_id).await;

    // The status check comes before the action is parsed
    for action in ["retry", "skip", "bogus"] {
        let err = ctx.runtime.action(job_id.as_str(), action).unwrap_err();
        assert!(matches!(err, RuntimeError::NotAwaitingInput(_)), "{action}");
        assert_eq!(err.to_string(), "Job is not in needs_input state");
    }
}

#[tokio::test]
async fn action_on_unknown_job_is_not_found() {
    let ctx = setup();
    let err = ctx.runtime.action("missing", "retry").unwrap_err();
    assert!(err.is_not_found());
}
