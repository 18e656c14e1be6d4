// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker subprocess adapters
//!
//! A worker is an external process that carries out one attempt of a job.
//! It reports progress as newline-delimited JSON on stdout:
//!
//! ```text
//! {"type":"step_start"}
//! {"type":"text","part":{"text":"..."}}
//! {"type":"step_finish","part":{"reason":"stop"}}
//! ```
//!
//! `spawn` returns a [`WorkerRun`]: a channel of parsed [`WorkerEvent`]s
//! that closes when stdout reaches EOF, and a [`WorkerHandle`] for waiting
//! on or killing the process.

mod event;
mod handle;
mod opencode;

pub use event::{parse_line, WorkerEvent};
pub use handle::{ExitReporter, WorkerExit, WorkerHandle};
pub use opencode::{OpencodeWorkerAdapter, WorkerInvocation, DEFAULT_WORKER_BIN, DEFAULT_WORKSPACE};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeAttempt, FakeWorkerAdapter, WorkerCall};

use async_trait::async_trait;
use gantry_core::{Job, JobId};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from worker operations
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("worker {0} was not captured")]
    MissingPipe(&'static str),
}

/// What a worker needs to run one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSpawnConfig {
    pub job_id: JobId,
    pub task: String,
    pub workflow: String,
    pub model: String,
    /// Request the worker's maximum-effort variant
    pub ultrawork: bool,
}

impl WorkerSpawnConfig {
    pub fn for_job(job: &Job) -> Self {
        Self {
            job_id: job.job_id.clone(),
            task: job.task.clone(),
            workflow: job.workflow.clone(),
            model: job.model.clone(),
            ultrawork: job.ultrawork,
        }
    }
}

/// A running worker attempt
#[derive(Debug)]
pub struct WorkerRun {
    /// Parsed stdout events; closed at EOF
    pub events: mpsc::UnboundedReceiver<WorkerEvent>,
    pub handle: WorkerHandle,
}

/// Adapter for launching worker processes
#[async_trait]
pub trait WorkerAdapter: Clone + Send + Sync + 'static {
    /// Launch one attempt of a job
    async fn spawn(&self, config: WorkerSpawnConfig) -> Result<WorkerRun, WorkerError>;
}
