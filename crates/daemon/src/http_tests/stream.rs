// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

/// `data:` payloads of an SSE body, in order
fn data_lines(body: &str) -> Vec<Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).unwrap())
        .collect()
}

#[tokio::test]
async fn finished_job_streams_snapshot_then_complete() {
    let app = setup();
    let job_id = app.create("task").await;
    app.settled(&job_id).await;

    let reply = app.get(&format!("/v1/jobs/{job_id}/stream")).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        data_lines(&reply.body),
        vec![
            json!({ "type": "status", "status": "completed", "progress": 100 }),
            json!({ "type": "complete" }),
        ]
    );
}

#[tokio::test]
async fn stream_headers_disable_buffering() {
    let app = setup();
    let job_id = app.create("task").await;
    app.settled(&job_id).await;

    let reply = app.get(&format!("/v1/jobs/{job_id}/stream")).await;

    let header = |name: &str| reply.headers.get(name).and_then(|v| v.to_str().ok());
    assert_eq!(header("content-type"), Some("text/event-stream"));
    assert_eq!(header("cache-control"), Some("no-cache"));
    assert_eq!(header("x-accel-buffering"), Some("no"));
}

#[tokio::test]
async fn live_stream_follows_the_job_to_completion() {
    let app = setup();
    app.worker.push(
        FakeAttempt::exits(0)
            .line(r#"{"type":"step_start"}"#)
            .line(r#"{"type":"text","part":{"text":"hello"}}"#)
            .line(r#"{"type":"step_finish","part":{"reason":"stop"}}"#),
    );
    let job_id = app.create("say hello").await;

    // Nothing has been polled yet, so the stream sees the job from PENDING
    let reply = app.get(&format!("/v1/jobs/{job_id}/stream")).await;

    let events = data_lines(&reply.body);
    assert_eq!(
        events.first(),
        Some(&json!({ "type": "status", "status": "pending", "progress": 0 }))
    );
    assert!(events.contains(&json!({ "type": "log", "message": "hello", "progress": 15 })));
    assert_eq!(
        &events[events.len() - 2..],
        &[
            json!({
                "type": "status",
                "status": "completed",
                "result": { "success": true, "logs": ["hello"] }
            }),
            json!({ "type": "complete" }),
        ]
    );
    assert_eq!(app.runtime.bus().subscriber_count(&job_id), 0);
}

#[tokio::test(start_paused = true)]
async fn idle_stream_sends_heartbeat_comments() {
    let worker = FakeWorkerAdapter::new();
    worker.push(FakeAttempt::hangs());
    let runtime = Runtime::new(
        gantry_engine::RuntimeDeps {
            worker: worker.clone(),
            clock: FakeClock::new(),
            ids: SequentialIdGen::new("job"),
        },
        RuntimeConfig::default(),
    );
    let created = runtime.create(gantry_core::JobConfig::new("idle", "sisyphus"));
    let router = router(AppState::new(runtime.clone(), DEFAULT_MODEL));
    let request = Request::builder()
        .uri(format!("/v1/jobs/{}/stream", created.job_id))
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    let mut body = response.into_body();
    let mut text = String::new();
    while !text.contains(": heartbeat") {
        let frame = body.frame().await.unwrap().unwrap();
        if let Ok(data) = frame.into_data() {
            text.push_str(std::str::from_utf8(&data).unwrap());
        }
    }

    assert!(text.starts_with("data: "), "{text}");
    runtime.shutdown().await;
}
