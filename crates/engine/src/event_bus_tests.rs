// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gantry_core::JobStatus;

fn progress(value: u8) -> JobEvent {
    JobEvent::Progress { value }
}

fn drain(sub: &mut Subscription) -> Vec<JobEvent> {
    std::iter::from_fn(|| sub.try_recv()).collect()
}

#[test]
fn publish_reaches_every_subscriber_in_order() {
    let bus = EventBus::new();
    let job = JobId::new("job-1");
    let mut a = bus.subscribe(&job);
    let mut b = bus.subscribe(&job);

    bus.publish(&job, &progress(10));
    bus.publish(&job, &progress(15));

    assert_eq!(drain(&mut a), vec![progress(10), progress(15)]);
    assert_eq!(drain(&mut b), vec![progress(10), progress(15)]);
}

#[test]
fn publish_is_scoped_to_the_job() {
    let bus = EventBus::new();
    let mut one = bus.subscribe(&JobId::new("job-1"));
    let mut two = bus.subscribe(&JobId::new("job-2"));

    bus.publish(&JobId::new("job-2"), &JobEvent::running());

    assert!(drain(&mut one).is_empty());
    assert_eq!(drain(&mut two), vec![JobEvent::running()]);
}

#[test]
fn late_subscriber_sees_only_later_events() {
    let bus = EventBus::new();
    let job = JobId::new("job-1");
    let mut early = bus.subscribe(&job);
    bus.publish(&job, &progress(10));

    let mut late = bus.subscribe(&job);
    bus.publish(&job, &progress(15));

    assert_eq!(drain(&mut early), vec![progress(10), progress(15)]);
    assert_eq!(drain(&mut late), vec![progress(15)]);
}

#[test]
fn publish_without_subscribers_is_a_no_op() {
    let bus = EventBus::new();
    bus.publish(&JobId::new("nobody"), &JobEvent::running());
    assert_eq!(bus.job_count(), 0);
}

#[test]
fn dropping_a_subscription_deregisters_it() {
    let bus = EventBus::new();
    let job = JobId::new("job-1");
    let a = bus.subscribe(&job);
    let b = bus.subscribe(&job);
    assert_eq!(bus.subscriber_count("job-1"), 2);

    drop(a);
    assert_eq!(bus.subscriber_count("job-1"), 1);

    drop(b);
    assert_eq!(bus.subscriber_count("job-1"), 0);
    assert_eq!(bus.job_count(), 0, "empty entries are removed");
}

#[test]
fn unsubscribe_unknown_id_is_harmless() {
    let bus = EventBus::new();
    let job = JobId::new("job-1");
    let _sub = bus.subscribe(&job);

    bus.unsubscribe(&job, 999);
    bus.unsubscribe(&JobId::new("other"), 1);

    assert_eq!(bus.subscriber_count("job-1"), 1);
}

#[test]
fn closed_receiver_does_not_block_others() {
    let bus = EventBus::new();
    let job = JobId::new("job-1");
    let mut healthy = bus.subscribe(&job);
    let mut closed = bus.subscribe(&job);
    closed.rx.close();

    bus.publish(&job, &JobEvent::completed(gantry_core::JobResult::success(vec![])));

    let delivered = drain(&mut healthy);
    assert_eq!(delivered.len(), 1);
    assert!(matches!(
        delivered[0],
        JobEvent::Status {
            status: JobStatus::Completed,
            ..
        }
    ));
}

#[tokio::test]
async fn concurrent_subscribe_and_publish() {
    let bus = EventBus::new();
    let job = JobId::new("job-1");

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let bus = Arc::clone(&bus);
        let job = job.clone();
        tasks.push(tokio::spawn(async move {
            let mut sub = bus.subscribe(&job);
            bus.publish(&job, &progress(1));
            sub.recv().await
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), Some(progress(1)));
    }
    assert_eq!(bus.subscriber_count("job-1"), 0);
}
