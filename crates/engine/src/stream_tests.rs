// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::event_bus::EventBus;
use gantry_core::{JobResult, JobStatus};

fn snapshot(status: JobStatus, progress: u8) -> JobEvent {
    JobEvent::Status {
        status,
        progress: Some(progress),
        result: None,
        error: None,
        retry_count: None,
    }
}

fn event(item: Option<StreamItem>) -> JobEvent {
    match item {
        Some(StreamItem::Event(event)) => event,
        other => panic!("expected an event, got {:?}", other),
    }
}

#[tokio::test]
async fn snapshot_comes_first_then_live_events() {
    let bus = EventBus::new();
    let job = JobId::new("job-1");
    let mut stream = JobStream::new(
        snapshot(JobStatus::Running, 10),
        bus.subscribe(&job),
        Duration::from_secs(30),
    );

    bus.publish(&job, &JobEvent::Progress { value: 15 });

    assert_eq!(event(stream.next().await), snapshot(JobStatus::Running, 10));
    assert_eq!(event(stream.next().await), JobEvent::Progress { value: 15 });
    assert_eq!(stream.job_id(), &job);
}

#[tokio::test]
async fn terminal_status_is_followed_by_complete() {
    let bus = EventBus::new();
    let job = JobId::new("job-1");
    let mut stream = JobStream::new(
        snapshot(JobStatus::Running, 0),
        bus.subscribe(&job),
        Duration::from_secs(30),
    );
    let done = JobEvent::completed(JobResult::success(vec!["hi".into()]));

    bus.publish(&job, &done);
    bus.publish(&job, &JobEvent::Progress { value: 1 });

    stream.next().await;
    assert_eq!(event(stream.next().await), done);
    assert_eq!(event(stream.next().await), JobEvent::Complete);
    assert_eq!(stream.next().await, None);
    assert_eq!(stream.next().await, None);
}

#[tokio::test]
async fn subscription_is_released_when_the_stream_ends() {
    let bus = EventBus::new();
    let job = JobId::new("job-1");
    let mut stream = JobStream::new(
        snapshot(JobStatus::Running, 0),
        bus.subscribe(&job),
        Duration::from_secs(30),
    );
    assert_eq!(bus.subscriber_count("job-1"), 1);

    bus.publish(&job, &JobEvent::needs_input("boom", 3));
    stream.next().await;
    stream.next().await;

    assert_eq!(bus.subscriber_count("job-1"), 0);
}

#[yare::parameterized(
    completed = { JobStatus::Completed },
    failed    = { JobStatus::Failed },
)]
fn finished_snapshot_ends_immediately(status: JobStatus) {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(async {
            let bus = EventBus::new();
            let job = JobId::new("job-1");
            let mut stream =
                JobStream::new(snapshot(status, 100), bus.subscribe(&job), Duration::from_secs(30));

            assert_eq!(bus.subscriber_count("job-1"), 0);
            assert_eq!(event(stream.next().await), snapshot(status, 100));
            assert_eq!(event(stream.next().await), JobEvent::Complete);
            assert_eq!(stream.next().await, None);
        });
}

#[tokio::test]
async fn needs_input_snapshot_keeps_streaming() {
    let bus = EventBus::new();
    let job = JobId::new("job-1");
    let mut stream = JobStream::new(
        snapshot(JobStatus::NeedsInput, 0),
        bus.subscribe(&job),
        Duration::from_secs(30),
    );
    assert_eq!(bus.subscriber_count("job-1"), 1);
    assert_eq!(event(stream.next().await), snapshot(JobStatus::NeedsInput, 0));

    bus.publish(&job, &JobEvent::running());
    assert_eq!(event(stream.next().await), JobEvent::running());
}

#[tokio::test(start_paused = true)]
async fn idle_stream_emits_heartbeats() {
    let bus = EventBus::new();
    let job = JobId::new("job-1");
    let mut stream = JobStream::new(
        snapshot(JobStatus::Running, 0),
        bus.subscribe(&job),
        Duration::from_secs(30),
    );
    stream.next().await;

    assert_eq!(stream.next().await, Some(StreamItem::Heartbeat));
    assert_eq!(stream.next().await, Some(StreamItem::Heartbeat));

    bus.publish(&job, &JobEvent::Progress { value: 10 });
    assert_eq!(event(stream.next().await), JobEvent::Progress { value: 10 });
}

#[tokio::test]
async fn dropping_the_stream_unsubscribes() {
    let bus = EventBus::new();
    let job = JobId::new("job-1");
    let stream = JobStream::new(
        snapshot(JobStatus::Pending, 0),
        bus.subscribe(&job),
        Duration::from_secs(30),
    );
    assert_eq!(bus.subscriber_count("job-1"), 1);

    drop(stream);

    assert_eq!(bus.subscriber_count("job-1"), 0);
}
