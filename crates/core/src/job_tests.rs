// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::{Clock, FakeClock};
use std::time::Duration;

fn new_job(clock: &FakeClock) -> Job {
    Job::new(
        JobId::new("job-1"),
        JobConfig::new("write a poem", "w"),
        clock.now(),
    )
}

fn job_in(status: JobStatus) -> Job {
    let clock = FakeClock::new();
    let mut job = new_job(&clock);
    job.status = status;
    job
}

#[test]
fn new_job_is_pending_with_defaults() {
    let clock = FakeClock::new();
    let job = new_job(&clock);

    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.model, DEFAULT_MODEL);
    assert_eq!(job.max_iterations, DEFAULT_MAX_ITERATIONS);
    assert!(!job.ultrawork);
    assert_eq!(job.progress, 0);
    assert_eq!(job.retry_count, 0);
    assert!(job.logs.is_empty());
    assert_eq!(job.created_at, clock.now());
    assert!(job.started_at.is_none());
    assert!(job.finished_at.is_none());
}

#[test]
fn config_builder_overrides_defaults() {
    let config = JobConfig::new("t", "w")
        .model("openai/gpt-5")
        .max_iterations(4)
        .ultrawork(true);
    assert_eq!(config.model, "openai/gpt-5");
    assert_eq!(config.max_iterations, 4);
    assert!(config.ultrawork);
}

#[test]
fn started_at_is_set_once() {
    let clock = FakeClock::new();
    let mut job = new_job(&clock);

    clock.advance(Duration::from_secs(1));
    job.begin_attempt(clock.now()).unwrap();
    let first = job.started_at;
    assert!(first.is_some());

    clock.advance(Duration::from_secs(5));
    job.begin_attempt(clock.now()).unwrap();
    assert_eq!(job.started_at, first);
}

#[yare::parameterized(
    pending     = { JobStatus::Pending,    true },
    running     = { JobStatus::Running,    true },
    completed   = { JobStatus::Completed,  false },
    failed      = { JobStatus::Failed,     false },
    needs_input = { JobStatus::NeedsInput, false },
)]
fn begin_attempt_edges(from: JobStatus, allowed: bool) {
    let mut job = job_in(from);
    let result = job.begin_attempt(FakeClock::new().now());
    assert_eq!(result.is_ok(), allowed);
    if allowed {
        assert_eq!(job.status, JobStatus::Running);
    } else {
        assert_eq!(job.status, from);
    }
}

#[yare::parameterized(
    pending     = { JobStatus::Pending,    true },
    running     = { JobStatus::Running,    true },
    completed   = { JobStatus::Completed,  false },
    failed      = { JobStatus::Failed,     false },
    needs_input = { JobStatus::NeedsInput, false },
)]
fn cancel_edges(from: JobStatus, allowed: bool) {
    let mut job = job_in(from);
    let result = job.cancel(FakeClock::new().now());
    assert_eq!(result.is_ok(), allowed);
    if allowed {
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some(CANCELLED_BY_USER));
        assert!(job.finished_at.is_some());
    } else {
        assert_eq!(job.status, from);
        assert!(job.error.is_none());
    }
}

#[yare::parameterized(
    pending     = { JobStatus::Pending },
    completed   = { JobStatus::Completed },
    failed      = { JobStatus::Failed },
    needs_input = { JobStatus::NeedsInput },
)]
fn complete_and_fail_require_running(from: JobStatus) {
    let now = FakeClock::new().now();
    let mut job = job_in(from);

    assert_eq!(
        job.complete(now),
        Err(TransitionError {
            from,
            action: "complete"
        })
    );
    assert!(job.record_failure("boom", 3, now).is_err());
    assert_eq!(job.status, from);
    assert_eq!(job.retry_count, 0);
}

#[yare::parameterized(
    pending   = { JobStatus::Pending },
    running   = { JobStatus::Running },
    completed = { JobStatus::Completed },
    failed    = { JobStatus::Failed },
)]
fn resolve_requires_needs_input(from: JobStatus) {
    let now = FakeClock::new().now();
    for action in [UserAction::Retry, UserAction::Skip, UserAction::Abort] {
        let mut job = job_in(from);
        let err = job.resolve(action, now).unwrap_err();
        assert_eq!(err.action, action.verb());
        assert_eq!(job.status, from);
    }
}

#[test]
fn progress_follows_worker_heuristic() {
    let clock = FakeClock::new();
    let mut job = new_job(&clock);
    job.begin_attempt(clock.now()).unwrap();

    assert_eq!(job.step_started(), 10);
    assert_eq!(job.append_log("a"), 15);
    assert_eq!(job.append_log("b"), 20);
    // A second step start never lowers progress
    assert_eq!(job.step_started(), 20);
}

#[test]
fn text_progress_caps_at_ninety() {
    let clock = FakeClock::new();
    let mut job = new_job(&clock);
    job.begin_attempt(clock.now()).unwrap();

    let mut last = 0;
    for i in 0..40 {
        let progress = job.append_log(format!("line {i}"));
        assert!(progress >= last, "progress went backwards");
        assert!(progress <= 90);
        last = progress;
    }
    assert_eq!(job.progress, 90);
    assert_eq!(job.logs.len(), 40);
}

#[test]
fn complete_sets_result_from_logs() {
    let clock = FakeClock::new();
    let mut job = new_job(&clock);
    job.begin_attempt(clock.now()).unwrap();
    job.step_started();
    job.append_log("hello");

    clock.advance(Duration::from_secs(3));
    let result = job.complete(clock.now()).unwrap();

    assert_eq!(result, JobResult::success(vec!["hello".to_string()]));
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 100);
    assert_eq!(job.result, Some(result));
    assert_eq!(job.finished_at, Some(clock.now()));
}

#[test]
fn third_failure_escalates() {
    let clock = FakeClock::new();
    let mut job = new_job(&clock);
    job.begin_attempt(clock.now()).unwrap();

    assert_eq!(
        job.record_failure("e1", 3, clock.now()),
        Ok(FailureOutcome::Retry { failures: 1 })
    );
    assert_eq!(job.status, JobStatus::Running);
    assert!(job.error.is_none());
    assert!(job.finished_at.is_none());

    assert_eq!(
        job.record_failure("e2", 3, clock.now()),
        Ok(FailureOutcome::Retry { failures: 2 })
    );
    assert_eq!(job.status, JobStatus::Running);

    assert_eq!(
        job.record_failure("e3", 3, clock.now()),
        Ok(FailureOutcome::Escalated { failures: 3 })
    );
    assert_eq!(job.status, JobStatus::NeedsInput);
    assert_eq!(job.error.as_deref(), Some("e3"));
    assert_eq!(job.retry_count, 3);
    assert!(job.finished_at.is_some());

    // No further failures can be counted once escalated
    assert!(job.record_failure("e4", 3, clock.now()).is_err());
    assert_eq!(job.retry_count, 3);
}

#[test]
fn failures_keep_progress_and_logs() {
    let clock = FakeClock::new();
    let mut job = new_job(&clock);
    job.begin_attempt(clock.now()).unwrap();
    job.step_started();
    job.append_log("partial");

    job.record_failure("boom", 3, clock.now()).unwrap();
    job.begin_attempt(clock.now()).unwrap();

    assert_eq!(job.progress, 15);
    assert_eq!(job.logs, vec!["partial".to_string()]);
}

fn escalated_job(clock: &FakeClock) -> Job {
    let mut job = new_job(clock);
    job.begin_attempt(clock.now()).unwrap();
    for _ in 0..3 {
        job.record_failure("exit 1", 3, clock.now()).unwrap();
    }
    assert_eq!(job.status, JobStatus::NeedsInput);
    job
}

#[test]
fn user_retry_resets_budget() {
    let clock = FakeClock::new();
    let mut job = escalated_job(&clock);

    job.resolve(UserAction::Retry, clock.now()).unwrap();

    assert_eq!(job.status, JobStatus::Running);
    assert_eq!(job.retry_count, 0);
    assert!(job.error.is_none());
    assert!(job.finished_at.is_none());
    assert!(job.result.is_none());
}

#[yare::parameterized(
    skip  = { UserAction::Skip,  "Skipped by user" },
    abort = { UserAction::Abort, "Aborted by user" },
)]
fn user_dismissal_fails_job(action: UserAction, reason: &str) {
    let clock = FakeClock::new();
    let mut job = escalated_job(&clock);
    let escalated_at = job.finished_at;

    clock.advance(Duration::from_secs(60));
    job.resolve(action, clock.now()).unwrap();

    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.result, Some(JobResult::dismissed(reason)));
    // finished_at was already recorded on escalation
    assert_eq!(job.finished_at, escalated_at);
    assert!(job.status.is_terminal());
}

#[test]
fn snapshot_serializes_expected_fields() {
    let clock = FakeClock::new();
    let job = new_job(&clock);
    let value = serde_json::to_value(&job).unwrap();

    assert_eq!(value["job_id"], "job-1");
    assert_eq!(value["status"], "pending");
    assert_eq!(value["model"], DEFAULT_MODEL);
    assert_eq!(value["created_at"], "2026-01-01T00:00:00Z");
    assert!(value["started_at"].is_null());
    assert!(value["finished_at"].is_null());
    assert!(value["result"].is_null());
}

#[yare::parameterized(
    pending     = { JobStatus::Pending,    false, true,  false },
    running     = { JobStatus::Running,    false, true,  false },
    completed   = { JobStatus::Completed,  true,  false, true },
    failed      = { JobStatus::Failed,     true,  false, true },
    needs_input = { JobStatus::NeedsInput, false, false, true },
)]
fn status_predicates(status: JobStatus, terminal: bool, cancellable: bool, ends_stream: bool) {
    assert_eq!(status.is_terminal(), terminal);
    assert_eq!(status.is_cancellable(), cancellable);
    assert_eq!(status.ends_stream(), ends_stream);
}
