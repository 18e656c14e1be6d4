// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::worker::WorkerEvent;

fn config(job_id: &str) -> WorkerSpawnConfig {
    WorkerSpawnConfig {
        job_id: JobId::new(job_id),
        task: "task".to_string(),
        workflow: "sisyphus".to_string(),
        model: "m".to_string(),
        ultrawork: false,
    }
}

async fn drain(run: &mut WorkerRun) -> Vec<WorkerEvent> {
    let mut events = Vec::new();
    while let Some(event) = run.events.recv().await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn default_attempt_succeeds() {
    let fake = FakeWorkerAdapter::new();
    let mut run = fake.spawn(config("job-1")).await.unwrap();

    let events = drain(&mut run).await;
    assert_eq!(events.len(), 3);
    assert_eq!(events[0], WorkerEvent::StepStart);
    assert!(run.handle.wait().await.success());
    assert_eq!(fake.spawns(), vec![config("job-1")]);
}

#[tokio::test]
async fn attempts_play_back_in_order() {
    let fake = FakeWorkerAdapter::new();
    fake.push(FakeAttempt::exits(2).stderr("first"))
        .push(FakeAttempt::exits(0));

    let first = fake.spawn(config("job-1")).await.unwrap();
    assert_eq!(first.handle.wait().await, WorkerExit::exited(2, "first"));

    let second = fake.spawn(config("job-1")).await.unwrap();
    assert!(second.handle.wait().await.success());
    assert_eq!(fake.spawn_count(), 2);
}

#[tokio::test]
async fn scripted_lines_go_through_the_parser() {
    let fake = FakeWorkerAdapter::new();
    fake.push(
        FakeAttempt::exits(0)
            .line("not json")
            .line("")
            .line(r#"{"type":"text","part":{"text":"hi"}}"#),
    );

    let mut run = fake.spawn(config("job-1")).await.unwrap();
    assert_eq!(
        drain(&mut run).await,
        vec![WorkerEvent::Text { text: "hi".into() }]
    );
}

#[tokio::test]
async fn fails_reports_error_finish() {
    let fake = FakeWorkerAdapter::new();
    fake.push(FakeAttempt::fails("rate limited"));

    let mut run = fake.spawn(config("job-1")).await.unwrap();
    let events = drain(&mut run).await;
    assert_eq!(
        events.last(),
        Some(&WorkerEvent::StepFinish {
            reason: "error".into(),
            error: Some("rate limited".into())
        })
    );
    assert_eq!(run.handle.wait().await.code, Some(1));
}

#[tokio::test]
async fn spawn_error_is_returned_and_recorded() {
    let fake = FakeWorkerAdapter::new();
    fake.push(FakeAttempt::spawn_error("no binary"));

    let err = fake.spawn(config("job-1")).await.unwrap_err();
    assert!(matches!(err, WorkerError::SpawnFailed(ref m) if m == "no binary"));
    assert_eq!(fake.spawn_count(), 1);
}

#[tokio::test]
async fn hanging_attempt_waits_for_kill() {
    let fake = FakeWorkerAdapter::new();
    fake.push(FakeAttempt::hangs().line(r#"{"type":"step_start"}"#));

    let mut run = fake.spawn(config("job-7")).await.unwrap();
    assert_eq!(run.events.recv().await, Some(WorkerEvent::StepStart));
    assert!(!run.handle.has_exited());

    let exit = run.handle.kill().await;
    assert!(exit.killed);
    assert_eq!(run.events.recv().await, None);
    assert_eq!(fake.kill_count(), 1);
    assert!(fake.calls().contains(&WorkerCall::Killed {
        job_id: JobId::new("job-7")
    }));
}
