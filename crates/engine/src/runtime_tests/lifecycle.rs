// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gantry_adapters::WorkerSpawnConfig;
use gantry_core::{DEFAULT_MAX_ITERATIONS, DEFAULT_MODEL};

#[tokio::test]
async fn create_returns_pending_job() {
    let ctx = setup();

    let created = ctx.runtime.create(JobConfig::new("fix the bug", "sisyphus"));

    assert_eq!(created.job_id, "job-1");
    assert_eq!(created.status, JobStatus::Pending);
    assert_eq!(created.created_at, ctx.clock.now());

    let job = ctx.runtime.get("job-1").unwrap();
    assert_eq!(job.task, "fix the bug");
    assert_eq!(job.model, DEFAULT_MODEL);
    assert_eq!(job.max_iterations, DEFAULT_MAX_ITERATIONS);
}

#[tokio::test]
async fn successful_run_completes_with_logs() {
    let ctx = setup();
    ctx.worker.push(
        FakeAttempt::exits(0)
            .line(STEP_START)
            .line(text_line("hello"))
            .line(STOP),
    );

    let job_id = ctx.create("say hello");
    let job = ctx.settled(&job_id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 100);
    assert_eq!(job.logs, vec!["hello"]);
    assert_eq!(job.retry_count, 0);
    assert!(job.error.is_none());
    assert!(job.started_at.is_some());
    assert!(job.finished_at.is_some());
    assert_eq!(
        serde_json::to_value(&job.result).unwrap(),
        serde_json::json!({"success": true, "logs": ["hello"]})
    );
}

#[tokio::test]
async fn clean_exit_without_stop_completes() {
    let ctx = setup();
    ctx.worker
        .push(FakeAttempt::exits(0).line(text_line("partial")));

    let job_id = ctx.create("task");
    let job = ctx.settled(&job_id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 100);
    assert_eq!(job.logs, vec!["partial"]);
}

#[tokio::test]
async fn worker_receives_job_parameters() {
    let ctx = setup();

    let job_id = ctx
        .runtime
        .create(
            JobConfig::new("refactor", "prometheus")
                .model("openai/gpt-5")
                .max_iterations(4)
                .ultrawork(true),
        )
        .job_id;
    ctx.settled(&job_id).await;

    assert_eq!(
        ctx.worker.spawns(),
        vec![WorkerSpawnConfig {
            job_id: job_id.clone(),
            task: "refactor".into(),
            workflow: "prometheus".into(),
            model: "openai/gpt-5".into(),
            ultrawork: true,
        }]
    );
    assert_eq!(ctx.runtime.get(job_id.as_str()).unwrap().max_iterations, 4);
}

#[tokio::test]
async fn unknown_job_is_not_found() {
    let ctx = setup();

    let err = ctx.runtime.get("nope").unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Job not found");
    assert!(ctx.runtime.list().is_empty(), "lookup must not create a job");
}

#[tokio::test]
async fn list_is_in_creation_order() {
    let ctx = setup();
    let ids: Vec<JobId> = ["a", "b", "c"].iter().map(|t| ctx.create(t)).collect();

    let listed: Vec<JobId> = ctx.runtime.list().into_iter().map(|j| j.job_id).collect();

    assert_eq!(listed, ids);
}

#[tokio::test]
async fn health_counts_jobs_by_status() {
    let ctx = setup();
    ctx.worker
        .push(FakeAttempt::succeeds())
        .push(FakeAttempt::hangs().line(STEP_START));

    let done = ctx.create("done");
    ctx.settled(&done).await;
    let busy = ctx.create("busy");
    ctx.wait_for(&busy, |job| job.progress == 10).await;

    let health = ctx.runtime.health();

    assert_eq!(health.status, "healthy");
    assert_eq!(
        health.jobs,
        JobCounts {
            total: 2,
            completed: 1,
            running: 1,
            ..JobCounts::default()
        }
    );
    ctx.runtime.shutdown().await;
}

#[tokio::test]
async fn progress_never_decreases_within_an_attempt() {
    let ctx = setup();
    let mut attempt = FakeAttempt::exits(0).line(STEP_START);
    for i in 0..25 {
        attempt = attempt.line(text_line(&format!("line {i}")));
    }
    ctx.worker.push(attempt.line(STEP_START).line(STOP));

    let job_id = ctx.create("long");
    let mut stream = ctx.runtime.stream(job_id.as_str()).unwrap();
    let events = collect(&mut stream).await;

    let progress: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            JobEvent::Progress { value } => Some(*value),
            JobEvent::Log { progress, .. } => Some(*progress),
            _ => None,
        })
        .collect();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{:?}", progress);
    assert_eq!(progress.iter().max(), Some(&90));
    assert_eq!(ctx.runtime.get(job_id.as_str()).unwrap().progress, 100);
}
