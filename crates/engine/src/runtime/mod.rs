// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime for the Gantry engine

mod control;

use crate::error::RuntimeError;
use crate::event_bus::EventBus;
use crate::executor::Executor;
use crate::store::{JobRecord, JobStore};
use crate::stream::JobStream;
use chrono::{DateTime, Utc};
use gantry_adapters::WorkerAdapter;
use gantry_core::{
    Clock, IdGen, Job, JobConfig, JobEvent, JobId, JobStatus, DEFAULT_MAX_RETRIES,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Default pause between automatic retries
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Default idle interval before a stream heartbeat
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Runtime tuning
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Failures before a job escalates to NEEDS_INPUT
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub heartbeat_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}

/// Runtime adapter dependencies
pub struct RuntimeDeps<W, C, I> {
    pub worker: W,
    pub clock: C,
    pub ids: I,
}

/// Reply to a create request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedJob {
    pub job_id: JobId,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

/// Job counts by status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub needs_input: usize,
}

impl JobCounts {
    fn add(&mut self, status: JobStatus) {
        self.total += 1;
        let bucket = match status {
            JobStatus::Pending => &mut self.pending,
            JobStatus::Running => &mut self.running,
            JobStatus::Completed => &mut self.completed,
            JobStatus::Failed => &mut self.failed,
            JobStatus::NeedsInput => &mut self.needs_input,
        };
        *bucket += 1;
    }
}

/// Health report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub jobs: JobCounts,
}

struct RuntimeInner<W, C, I> {
    store: JobStore,
    bus: Arc<EventBus>,
    executor: Executor<W, C>,
    ids: I,
    config: RuntimeConfig,
}

/// Runtime that owns every job, the event bus and the executor
///
/// Cheap to clone; clones share state.
pub struct Runtime<W, C, I> {
    inner: Arc<RuntimeInner<W, C, I>>,
}

impl<W, C, I> Clone for Runtime<W, C, I> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W, C, I> Runtime<W, C, I>
where
    W: WorkerAdapter,
    C: Clock,
    I: IdGen,
{
    /// Create a new runtime
    pub fn new(deps: RuntimeDeps<W, C, I>, config: RuntimeConfig) -> Self {
        let bus = EventBus::new();
        let executor = Executor::new(
            deps.worker,
            deps.clock,
            Arc::clone(&bus),
            config.max_retries,
            config.retry_backoff,
        );
        Self {
            inner: Arc::new(RuntimeInner {
                store: JobStore::default(),
                bus,
                executor,
                ids: deps.ids,
                config,
            }),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// Get a reference to the clock
    pub fn clock(&self) -> &C {
        self.inner.executor.clock()
    }

    /// The bus jobs publish on
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.inner.bus
    }

    /// Register a job and start executing it in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn create(&self, config: JobConfig) -> CreatedJob {
        let job_id = JobId::new(self.inner.ids.next());
        let job = Job::new(job_id.clone(), config, self.clock().now());
        let created = CreatedJob {
            job_id: job_id.clone(),
            status: job.status,
            created_at: job.created_at,
        };
        tracing::info!(
            %job_id,
            workflow = %job.workflow,
            model = %job.model,
            task = %task_preview(&job.task),
            "created job"
        );

        let record = self.inner.store.insert(job);
        self.inner.executor.launch(job_id, record);
        created
    }

    /// Snapshots of every job, in creation order
    pub fn list(&self) -> Vec<Job> {
        self.inner.store.snapshots()
    }

    pub fn get(&self, job_id: &str) -> Result<Job, RuntimeError> {
        Ok(self.record(job_id)?.snapshot())
    }

    pub fn health(&self) -> Health {
        let mut jobs = JobCounts::default();
        for job in self.inner.store.snapshots() {
            jobs.add(job.status);
        }
        Health {
            status: "healthy",
            jobs,
        }
    }

    /// Subscribe to a job's events, starting with a snapshot.
    pub fn stream(&self, job_id: &str) -> Result<JobStream, RuntimeError> {
        let record = self.record(job_id)?;
        let slot = record.lock();
        // Snapshot and subscribe under the job lock so nothing is missed between them
        let snapshot = JobEvent::snapshot(&slot.job);
        let subscription = self.inner.bus.subscribe(&slot.job.job_id);
        drop(slot);
        Ok(JobStream::new(
            snapshot,
            subscription,
            self.inner.config.heartbeat_interval,
        ))
    }

    fn record(&self, job_id: &str) -> Result<Arc<JobRecord>, RuntimeError> {
        self.inner
            .store
            .get(job_id)
            .ok_or_else(|| RuntimeError::NotFound(JobId::new(job_id)))
    }
}

/// First 50 characters of a task, for logs
fn task_preview(task: &str) -> &str {
    match task.char_indices().nth(50) {
        Some((idx, _)) => &task[..idx],
        None => task,
    }
}

#[cfg(test)]
#[path = "../runtime_tests/mod.rs"]
mod tests;
