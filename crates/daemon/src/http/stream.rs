// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server-sent event stream of one job

use axum::extract::{Path, State};
use axum::http::header::{HeaderName, CACHE_CONTROL};
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use futures::Stream;
use gantry_adapters::WorkerAdapter;
use gantry_core::{Clock, IdGen};
use gantry_engine::{JobStream, StreamItem};

use super::{ApiError, AppState};

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// `data: <event json>` per event and a `: heartbeat` comment when idle.
///
/// The body ends right after the `complete` marker. Unknown jobs are rejected
/// before any bytes are sent.
pub async fn stream_job<W, C, I>(
    State(state): State<AppState<W, C, I>>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    W: WorkerAdapter,
    C: Clock,
    I: IdGen,
{
    let stream = state.runtime().stream(&job_id)?;
    tracing::debug!(%job_id, "stream opened");
    Ok((
        [(CACHE_CONTROL, "no-cache"), (X_ACCEL_BUFFERING, "no")],
        Sse::new(sse_events(stream)),
    ))
}

fn sse_events(stream: JobStream) -> impl Stream<Item = Result<Event, axum::Error>> {
    futures::stream::unfold(stream, |mut stream| async move {
        let item = stream.next().await?;
        Some((to_sse(item), stream))
    })
}

fn to_sse(item: StreamItem) -> Result<Event, axum::Error> {
    match item {
        StreamItem::Event(event) => Event::default().json_data(event),
        StreamItem::Heartbeat => Ok(Event::default().comment("heartbeat")),
    }
}
