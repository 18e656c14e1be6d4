// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport for the job runtime.
//!
//! | route | handler |
//! |---|---|
//! | `GET /v1/health` | `jobs::health` |
//! | `POST /v1/jobs`, `GET /v1/jobs` | `jobs::create`, `jobs::list` |
//! | `GET /v1/jobs/{job_id}`, `DELETE /v1/jobs/{job_id}` | `jobs::get`, `jobs::cancel` |
//! | `POST /v1/jobs/{job_id}/action` | `jobs::action` |
//! | `GET /v1/jobs/{job_id}/stream` | `stream::stream_job` |

mod error;
mod jobs;
mod stream;

pub use error::ApiError;
pub use jobs::{ActionReply, ActionRequest, CancelReply, CreateJobRequest, JobList};

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use gantry_adapters::WorkerAdapter;
use gantry_core::{Clock, IdGen};
use gantry_engine::Runtime;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// State shared by every handler
pub struct AppState<W, C, I> {
    runtime: Runtime<W, C, I>,
    default_model: Arc<str>,
}

impl<W, C, I> Clone for AppState<W, C, I> {
    fn clone(&self) -> Self {
        Self {
            runtime: self.runtime.clone(),
            default_model: Arc::clone(&self.default_model),
        }
    }
}

impl<W, C, I> AppState<W, C, I> {
    pub fn new(runtime: Runtime<W, C, I>, default_model: impl Into<Arc<str>>) -> Self {
        Self {
            runtime,
            default_model: default_model.into(),
        }
    }

    pub fn runtime(&self) -> &Runtime<W, C, I> {
        &self.runtime
    }

    /// Model assigned to requests that omit one
    pub fn default_model(&self) -> &str {
        &self.default_model
    }
}

/// Build the API router
pub fn router<W, C, I>(state: AppState<W, C, I>) -> Router
where
    W: WorkerAdapter,
    C: Clock,
    I: IdGen,
{
    Router::new()
        .route("/v1/health", get(jobs::health::<W, C, I>))
        .route(
            "/v1/jobs",
            post(jobs::create::<W, C, I>).get(jobs::list::<W, C, I>),
        )
        .route(
            "/v1/jobs/{job_id}",
            get(jobs::get::<W, C, I>).delete(jobs::cancel::<W, C, I>),
        )
        .route("/v1/jobs/{job_id}/action", post(jobs::action::<W, C, I>))
        .route("/v1/jobs/{job_id}/stream", get(stream::stream_job::<W, C, I>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
#[path = "../http_tests/mod.rs"]
mod tests;
