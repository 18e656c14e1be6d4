// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime tests

mod actions;
mod cancel;
mod lifecycle;
mod retry;
mod streaming;

use super::*;
use crate::stream::StreamItem;
use gantry_adapters::{FakeAttempt, FakeWorkerAdapter};
use gantry_core::{FakeClock, SequentialIdGen};

type TestRuntime = Runtime<FakeWorkerAdapter, FakeClock, SequentialIdGen>;

/// Test context holding the runtime and its fakes
struct TestContext {
    runtime: TestRuntime,
    worker: FakeWorkerAdapter,
    clock: FakeClock,
}

fn setup() -> TestContext {
    setup_with(RuntimeConfig {
        retry_backoff: Duration::ZERO,
        ..RuntimeConfig::default()
    })
}

fn setup_with(config: RuntimeConfig) -> TestContext {
    let worker = FakeWorkerAdapter::new();
    let clock = FakeClock::new();
    let runtime = Runtime::new(
        RuntimeDeps {
            worker: worker.clone(),
            clock: clock.clone(),
            ids: SequentialIdGen::new("job"),
        },
        config,
    );
    TestContext {
        runtime,
        worker,
        clock,
    }
}

const STEP_START: &str = r#"{"type":"step_start"}"#;
const STOP: &str = r#"{"type":"step_finish","part":{"reason":"stop"}}"#;

fn text_line(text: &str) -> String {
    format!(r#"{{"type":"text","part":{{"text":"{}"}}}}"#, text)
}

impl TestContext {
    fn create(&self, task: &str) -> JobId {
        self.runtime
            .create(JobConfig::new(task, "sisyphus"))
            .job_id
    }

    /// Poll until the job satisfies `done` or five seconds pass
    async fn wait_for(&self, job_id: &JobId, done: impl Fn(&Job) -> bool) -> Job {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let job = self.runtime.get(job_id.as_str()).unwrap();
            if done(&job) {
                return job;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting on {}; last state: {:?}",
                job_id,
                job
            );
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }

    /// Wait until the job is COMPLETED, FAILED or NEEDS_INPUT
    async fn settled(&self, job_id: &JobId) -> Job {
        self.wait_for(job_id, |job| job.status.ends_stream()).await
    }
}

/// Every event until the stream ends, skipping heartbeats
async fn collect(stream: &mut JobStream) -> Vec<JobEvent> {
    let mut events = Vec::new();
    while let Some(item) = stream.next().await {
        if let StreamItem::Event(event) = item {
            events.push(event);
        }
    }
    events
}

fn snapshot(status: JobStatus, progress: u8) -> JobEvent {
    JobEvent::Status {
        status,
        progress: Some(progress),
        result: None,
        error: None,
        retry_count: None,
    }
}
