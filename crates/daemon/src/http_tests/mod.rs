// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Router tests, driven in-process with `tower::ServiceExt::oneshot`

mod jobs;
mod stream;

use super::*;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use gantry_adapters::{FakeAttempt, FakeWorkerAdapter};
use gantry_core::{FakeClock, Job, JobStatus, SequentialIdGen, DEFAULT_MODEL};
use gantry_engine::RuntimeConfig;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;

type TestRuntime = Runtime<FakeWorkerAdapter, FakeClock, SequentialIdGen>;

struct TestApp {
    router: Router,
    runtime: TestRuntime,
    worker: FakeWorkerAdapter,
}

fn setup() -> TestApp {
    let worker = FakeWorkerAdapter::new();
    let runtime = Runtime::new(
        gantry_engine::RuntimeDeps {
            worker: worker.clone(),
            clock: FakeClock::new(),
            ids: SequentialIdGen::new("job"),
        },
        RuntimeConfig {
            retry_backoff: Duration::ZERO,
            ..RuntimeConfig::default()
        },
    );
    TestApp {
        router: router(AppState::new(runtime.clone(), DEFAULT_MODEL)),
        runtime,
        worker,
    }
}

/// Response status, headers and raw body
struct Reply {
    status: StatusCode,
    headers: axum::http::HeaderMap,
    body: String,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_str(&self.body)
            .unwrap_or_else(|e| panic!("not json ({e}): {}", self.body))
    }
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> Reply {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        Reply {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    async fn get(&self, uri: &str) -> Reply {
        self.send(Method::GET, uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> Reply {
        self.send(Method::POST, uri, Some(body)).await
    }

    async fn delete(&self, uri: &str) -> Reply {
        self.send(Method::DELETE, uri, None).await
    }

    /// Submit a job and return its id
    async fn create(&self, task: &str) -> String {
        let reply = self
            .post("/v1/jobs", json!({ "task": task, "workflow": "sisyphus" }))
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
        reply.json()["job_id"].as_str().unwrap().to_string()
    }

    /// Poll until the job satisfies `pred`
    async fn wait_for(&self, job_id: &str, pred: impl Fn(&Job) -> bool) -> Job {
        for _ in 0..400 {
            let job = self.runtime.get(job_id).unwrap();
            if pred(&job) {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("job {job_id} never reached the expected state");
    }

    async fn settled(&self, job_id: &str) -> Job {
        self.wait_for(job_id, |job| job.status.ends_stream()).await
    }
}
