// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const STEP_START: &str = r#"{"type":"step_start"}"#;

#[tokio::test]
async fn health_reports_counts() {
    let app = setup();
    let job_id = app.create("task").await;
    app.settled(&job_id).await;

    let reply = app.get("/v1/health").await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.json(),
        json!({
            "status": "healthy",
            "jobs": {
                "total": 1,
                "pending": 0,
                "running": 0,
                "completed": 1,
                "failed": 0,
                "needs_input": 0
            }
        })
    );
}

#[tokio::test]
async fn create_returns_id_status_and_timestamp() {
    let app = setup();

    let reply = app
        .post(
            "/v1/jobs",
            json!({ "task": "fix the bug", "workflow": "sisyphus" }),
        )
        .await;

    assert_eq!(reply.status, StatusCode::OK);
    let body = reply.json();
    assert_eq!(body["job_id"], "job-1");
    assert_eq!(body["status"], "pending");
    assert!(body["created_at"].is_string());
}

#[tokio::test]
async fn create_applies_defaults_and_overrides() {
    let app = setup();

    app.post(
        "/v1/jobs",
        json!({ "task": "a", "workflow": "sisyphus", "model": null }),
    )
    .await;
    app.post(
        "/v1/jobs",
        json!({
            "task": "b",
            "workflow": "prometheus",
            "model": "openai/gpt-5",
            "max_iterations": 4,
            "ultrawork": true
        }),
    )
    .await;

    let a = app.runtime.get("job-1").unwrap();
    assert_eq!(a.model, DEFAULT_MODEL);
    assert_eq!(a.max_iterations, 10);
    assert!(!a.ultrawork);

    let b = app.runtime.get("job-2").unwrap();
    assert_eq!(b.model, "openai/gpt-5");
    assert_eq!(b.max_iterations, 4);
    assert!(b.ultrawork);
}

#[tokio::test]
async fn create_treats_empty_model_as_unset() {
    let app = setup();

    app.post(
        "/v1/jobs",
        json!({ "task": "a", "workflow": "sisyphus", "model": "" }),
    )
    .await;

    assert_eq!(app.runtime.get("job-1").unwrap().model, DEFAULT_MODEL);
}

#[tokio::test]
async fn create_uses_configured_default_model() {
    let app = setup();
    let router = router(AppState::new(app.runtime.clone(), "local/llama"));
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/jobs")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"task":"t","workflow":"w"}"#))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.runtime.get("job-1").unwrap().model, "local/llama");
}

#[yare::parameterized(
    missing_task  = { json!({ "workflow": "sisyphus" }) },
    wrong_type    = { json!({ "task": 7, "workflow": "sisyphus" }) },
    bad_iteration = { json!({ "task": "t", "workflow": "w", "max_iterations": -1 }) },
)]
fn create_rejects_invalid_body(body: Value) {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(async {
            let app = setup();

            let reply = app.post("/v1/jobs", body).await;

            assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
            assert!(reply.json()["detail"].is_string());
            assert!(app.runtime.list().is_empty());
        });
}

#[tokio::test]
async fn list_returns_jobs_and_total() {
    let app = setup();
    let first = app.create("one").await;
    let second = app.create("two").await;

    let body = app.get("/v1/jobs").await.json();

    assert_eq!(body["total"], 2);
    let ids: Vec<&str> = body["jobs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|job| job["job_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![first.as_str(), second.as_str()]);
}

#[tokio::test]
async fn get_returns_the_snapshot() {
    let app = setup();
    let job_id = app.create("say hello").await;
    app.settled(&job_id).await;

    let body = app.get(&format!("/v1/jobs/{job_id}")).await.json();

    assert_eq!(body["job_id"], job_id.as_str());
    assert_eq!(body["task"], "say hello");
    assert_eq!(body["status"], "completed");
    assert_eq!(body["progress"], 100);
    assert_eq!(body["retry_count"], 0);
    assert!(body["finished_at"].is_string());
}

#[yare::parameterized(
    get    = { Method::GET, "/v1/jobs/ghost" },
    cancel = { Method::DELETE, "/v1/jobs/ghost" },
    stream = { Method::GET, "/v1/jobs/ghost/stream" },
)]
fn unknown_job_is_404(method: Method, uri: &str) {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(async {
            let app = setup();

            let reply = app.send(method, uri, None).await;

            assert_eq!(reply.status, StatusCode::NOT_FOUND);
            assert_eq!(reply.json(), json!({ "detail": "Job not found" }));
            assert!(app.runtime.list().is_empty());
        });
}

#[tokio::test]
async fn cancel_running_job() {
    let app = setup();
    app.worker.push(FakeAttempt::hangs().line(STEP_START));
    let job_id = app.create("long").await;
    app.wait_for(&job_id, |job| job.progress == 10).await;

    let reply = app.delete(&format!("/v1/jobs/{job_id}")).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.json(),
        json!({ "job_id": job_id, "status": "cancelled" })
    );
    let job = app.runtime.get(&job_id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some("Cancelled by user"));
}

#[tokio::test]
async fn cancel_finished_job_is_400() {
    let app = setup();
    let job_id = app.create("quick").await;
    app.settled(&job_id).await;

    let reply = app.delete(&format!("/v1/jobs/{job_id}")).await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json(), json!({ "detail": "Job is not running" }));
}

/// Submit a job whose every attempt fails, and wait for NEEDS_INPUT
async fn escalated(app: &TestApp) -> String {
    for _ in 0..3 {
        app.worker.push(FakeAttempt::exits(1));
    }
    let job_id = app.create("flaky").await;
    let job = app.settled(&job_id).await;
    assert_eq!(job.status, JobStatus::NeedsInput);
    job_id
}

#[yare::parameterized(
    retry = { "retry", "running" },
    skip  = { "skip",  "failed" },
    abort = { "abort", "failed" },
)]
fn action_reports_new_status(action: &str, status: &str) {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(async {
            let app = setup();
            let job_id = escalated(&app).await;
            app.worker.push(FakeAttempt::hangs());

            let reply = app
                .post(
                    &format!("/v1/jobs/{job_id}/action"),
                    json!({ "action": action }),
                )
                .await;

            assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
            assert_eq!(reply.json(), json!({ "job_id": job_id, "status": status }));
            app.runtime.shutdown().await;
        });
}

#[tokio::test]
async fn unknown_action_is_400() {
    let app = setup();
    let job_id = escalated(&app).await;

    let reply = app
        .post(
            &format!("/v1/jobs/{job_id}/action"),
            json!({ "action": "restart" }),
        )
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json(), json!({ "detail": "Unknown action: restart" }));
}

#[tokio::test]
async fn action_outside_needs_input_is_400() {
    let app = setup();
    let job_id = app.create("task").await;
    app.settled(&job_id).await;

    let reply = app
        .post(
            &format!("/v1/jobs/{job_id}/action"),
            json!({ "action": "retry" }),
        )
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        reply.json(),
        json!({ "detail": "Job is not in needs_input state" })
    );
}

#[tokio::test]
async fn action_on_unknown_job_is_404() {
    let app = setup();

    let reply = app
        .post("/v1/jobs/ghost/action", json!({ "action": "retry" }))
        .await;

    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let app = setup();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/v1/jobs")
        .header("origin", "http://example.com")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();

    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}
