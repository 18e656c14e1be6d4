// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use gantry_adapters::WorkerAdapter;
use gantry_core::{Clock, IdGen, Job, JobConfig, JobId, JobStatus, DEFAULT_MAX_ITERATIONS};
use gantry_engine::{CreatedJob, Health};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};

/// Body of `POST /v1/jobs`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateJobRequest {
    pub task: String,
    pub workflow: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub max_iterations: Option<u32>,
    #[serde(default)]
    pub ultrawork: Option<bool>,
}

impl CreateJobRequest {
    fn into_config(self, default_model: &str) -> JobConfig {
        JobConfig::new(self.task, self.workflow)
            .model(
                self.model
                    .filter(|model| !model.is_empty())
                    .unwrap_or_else(|| default_model.to_string()),
            )
            .max_iterations(self.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS))
            .ultrawork(self.ultrawork.unwrap_or(false))
    }
}

/// Body of `POST /v1/jobs/{job_id}/action`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActionRequest {
    pub action: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobList {
    pub jobs: Vec<Job>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelReply {
    pub job_id: JobId,
    /// Always `"cancelled"`
    pub status: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionReply {
    pub job_id: JobId,
    pub status: JobStatus,
}

pub async fn health<W, C, I>(State(state): State<AppState<W, C, I>>) -> Json<Health>
where
    W: WorkerAdapter,
    C: Clock,
    I: IdGen,
{
    Json(state.runtime().health())
}

pub async fn create<W, C, I>(
    State(state): State<AppState<W, C, I>>,
    body: Result<Json<CreateJobRequest>, JsonRejection>,
) -> Result<Json<CreatedJob>, ApiError>
where
    W: WorkerAdapter,
    C: Clock,
    I: IdGen,
{
    let Json(request) = body?;
    let config = request.into_config(state.default_model());
    Ok(Json(state.runtime().create(config)))
}

pub async fn list<W, C, I>(State(state): State<AppState<W, C, I>>) -> Json<JobList>
where
    W: WorkerAdapter,
    C: Clock,
    I: IdGen,
{
    let jobs = state.runtime().list();
    let total = jobs.len();
    Json(JobList { jobs, total })
}

pub async fn get<W, C, I>(
    State(state): State<AppState<W, C, I>>,
    Path(job_id): Path<String>,
) -> Result<Json<Job>, ApiError>
where
    W: WorkerAdapter,
    C: Clock,
    I: IdGen,
{
    Ok(Json(state.runtime().get(&job_id)?))
}

pub async fn cancel<W, C, I>(
    State(state): State<AppState<W, C, I>>,
    Path(job_id): Path<String>,
) -> Result<Json<CancelReply>, ApiError>
where
    W: WorkerAdapter,
    C: Clock,
    I: IdGen,
{
    state.runtime().cancel(&job_id).await?;
    Ok(Json(CancelReply {
        job_id: JobId::new(job_id),
        status: "cancelled",
    }))
}

pub async fn action<W, C, I>(
    State(state): State<AppState<W, C, I>>,
    Path(job_id): Path<String>,
    body: Result<Json<ActionRequest>, JsonRejection>,
) -> Result<Json<ActionReply>, ApiError>
where
    W: WorkerAdapter,
    C: Clock,
    I: IdGen,
{
    let Json(request) = body?;
    let status = state.runtime().action(&job_id, &request.action)?;
    Ok(Json(ActionReply {
        job_id: JobId::new(job_id),
        status,
    }))
}
