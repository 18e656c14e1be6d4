// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gantry_core::JobResult;

#[tokio::test]
async fn early_subscriber_sees_every_event_in_order() {
    let ctx = setup();
    ctx.worker.push(
        FakeAttempt::exits(0)
            .line(STEP_START)
            .line(text_line("hello"))
            .line(STOP),
    );

    let job_id = ctx.create("say hello");
    let mut stream = ctx.runtime.stream(job_id.as_str()).unwrap();

    assert_eq!(
        collect(&mut stream).await,
        vec![
            snapshot(JobStatus::Pending, 0),
            JobEvent::running(),
            JobEvent::Progress { value: 10 },
            JobEvent::Log {
                message: "hello".into(),
                progress: 15
            },
            JobEvent::completed(JobResult::success(vec!["hello".into()])),
            JobEvent::Complete,
        ]
    );
}

#[tokio::test]
async fn every_subscriber_gets_the_same_events() {
    let ctx = setup();
    let job_id = ctx.create("task");
    let mut a = ctx.runtime.stream(job_id.as_str()).unwrap();
    let mut b = ctx.runtime.stream(job_id.as_str()).unwrap();

    let (a, b) = tokio::join!(collect(&mut a), collect(&mut b));

    assert_eq!(a, b);
    assert_eq!(a.last(), Some(&JobEvent::Complete));
}

#[tokio::test]
async fn late_subscriber_on_finished_job_gets_snapshot_and_complete() {
    let ctx = setup();
    let job_id = ctx.create("task");
    ctx.settled(&job_id).await;

    let mut stream = ctx.runtime.stream(job_id.as_str()).unwrap();

    assert_eq!(
        collect(&mut stream).await,
        vec![snapshot(JobStatus::Completed, 100), JobEvent::Complete]
    );
}

#[tokio::test]
async fn mid_stream_subscriber_starts_from_current_progress() {
    let ctx = setup();
    ctx.worker
        .push(FakeAttempt::hangs().line(STEP_START).line(text_line("one")));
    let job_id = ctx.create("task");
    ctx.wait_for(&job_id, |job| job.progress == 15).await;

    let mut stream = ctx.runtime.stream(job_id.as_str()).unwrap();
    ctx.runtime.cancel(job_id.as_str()).await.unwrap();

    let events = collect(&mut stream).await;
    assert_eq!(events[0], snapshot(JobStatus::Running, 15));
    assert_eq!(events.len(), 3);
}

#[tokio::test]
async fn stream_of_unknown_job_is_rejected() {
    let ctx = setup();
    let err = ctx.runtime.stream("missing").err().unwrap();
    assert!(err.is_not_found());
    assert_eq!(ctx.runtime.bus().job_count(), 0);
}

#[tokio::test]
async fn disconnect_removes_the_subscriber() {
    let ctx = setup();
    ctx.worker.push(FakeAttempt::hangs());
    let job_id = ctx.create("task");

    let mut stream = ctx.runtime.stream(job_id.as_str()).unwrap();
    stream.next().await;
    assert_eq!(ctx.runtime.bus().subscriber_count(job_id.as_str()), 1);

    drop(stream);

    assert_eq!(ctx.runtime.bus().subscriber_count(job_id.as_str()), 0);
    ctx.runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn idle_job_stream_heartbeats() {
    let ctx = setup_with(RuntimeConfig {
        heartbeat_interval: Duration::from_secs(30),
        retry_backoff: Duration::ZERO,
        ..RuntimeConfig::default()
    });
    ctx.worker.push(FakeAttempt::hangs().line(STEP_START));
    let job_id = ctx.create("task");
    ctx.wait_for(&job_id, |job| job.progress == 10).await;

    let mut stream = ctx.runtime.stream(job_id.as_str()).unwrap();
    stream.next().await;

    assert_eq!(stream.next().await, Some(StreamItem::Heartbeat));
    ctx.runtime.shutdown().await;
}
