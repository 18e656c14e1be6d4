// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn three_failed_exits_escalate_to_needs_input() {
    let ctx = setup();
    for _ in 0..3 {
        ctx.worker.push(FakeAttempt::exits(1));
    }

    let job_id = ctx.create("flaky");
    let job = ctx.settled(&job_id).await;

    assert_eq!(job.status, JobStatus::NeedsInput);
    assert_eq!(job.retry_count, 3);
    assert_eq!(job.error.as_deref(), Some("Process exited with code 1"));
    assert!(job.finished_at.is_some());
    assert_eq!(ctx.worker.spawn_count(), 3);
}

#[tokio::test]
async fn stderr_is_part_of_the_exit_message() {
    let ctx = setup();
    for _ in 0..3 {
        ctx.worker
            .push(FakeAttempt::exits(2).stderr("model not found"));
    }

    let job_id = ctx.create("task");
    let job = ctx.settled(&job_id).await;

    assert_eq!(
        job.error.as_deref(),
        Some("Process exited with code 2\nStderr: model not found")
    );
}

#[tokio::test]
async fn error_finish_uses_worker_error_text() {
    let ctx = setup();
    for _ in 0..3 {
        ctx.worker.push(FakeAttempt::fails("context window exceeded"));
    }

    let job_id = ctx.create("task");
    let job = ctx.settled(&job_id).await;

    assert_eq!(job.status, JobStatus::NeedsInput);
    assert_eq!(job.error.as_deref(), Some("context window exceeded"));
    assert_eq!(ctx.worker.spawn_count(), 3);
}

#[tokio::test]
async fn finish_without_error_reports_reason() {
    let ctx = setup_with(RuntimeConfig {
        max_retries: 1,
        retry_backoff: Duration::ZERO,
        ..RuntimeConfig::default()
    });
    ctx.worker.push(
        FakeAttempt::exits(0).line(r#"{"type":"step_finish","part":{"reason":"length"}}"#),
    );

    let job_id = ctx.create("task");
    let job = ctx.settled(&job_id).await;

    assert_eq!(job.status, JobStatus::NeedsInput);
    assert_eq!(job.retry_count, 1);
    assert_eq!(job.error.as_deref(), Some("Failed with reason: length"));
}

#[tokio::test]
async fn recovery_keeps_progress_and_logs() {
    let ctx = setup();
    ctx.worker
        .push(FakeAttempt::exits(1).line(STEP_START).line(text_line("first")))
        .push(FakeAttempt::exits(0).line(text_line("second")).line(STOP));

    let job_id = ctx.create("task");
    let job = ctx.settled(&job_id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.retry_count, 1);
    assert_eq!(job.logs, vec!["first", "second"]);
    // Errors are only recorded when the job escalates
    assert!(job.error.is_none());
}

#[tokio::test]
async fn spawn_failures_escalate() {
    let ctx = setup();
    for _ in 0..3 {
        ctx.worker
            .push(FakeAttempt::spawn_error("/root/.opencode/bin/opencode: not found"));
    }

    let job_id = ctx.create("task");
    let job = ctx.settled(&job_id).await;

    assert_eq!(job.status, JobStatus::NeedsInput);
    assert!(
        job.error.as_deref().unwrap_or_default().contains("not found"),
        "got: {:?}",
        job.error
    );
}

#[tokio::test]
async fn every_attempt_publishes_running() {
    let ctx = setup();
    for _ in 0..3 {
        ctx.worker.push(FakeAttempt::exits(1));
    }

    let job_id = ctx.create("task");
    let mut stream = ctx.runtime.stream(job_id.as_str()).unwrap();
    let events = collect(&mut stream).await;

    let running = events
        .iter()
        .filter(|e| **e == JobEvent::running())
        .count();
    assert_eq!(running, 3);
    assert_eq!(
        &events[events.len() - 2..],
        &[
            JobEvent::needs_input("Process exited with code 1", 3),
            JobEvent::Complete
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn retries_wait_for_the_backoff() {
    let ctx = setup_with(RuntimeConfig::default());
    ctx.worker
        .push(FakeAttempt::exits(1))
        .push(FakeAttempt::succeeds());

    let job_id = ctx.create("task");
    ctx.wait_for(&job_id, |job| job.retry_count == 1).await;
    assert_eq!(ctx.worker.spawn_count(), 1);

    tokio::time::sleep(DEFAULT_RETRY_BACKOFF + Duration::from_millis(10)).await;
    let job = ctx.settled(&job_id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(ctx.worker.spawn_count(), 2);
}
