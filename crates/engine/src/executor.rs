// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drives one job through its attempts.
//!
//! Each attempt runs in its own task so a panic surfaces as a `JoinError`
//! and is routed through the retry policy like any other failure. Attempts
//! are driven by an explicit loop; the job's `stopping` flag and status are
//! re-checked under the job lock before every state change.

use crate::event_bus::EventBus;
use crate::interpreter::{self, Outcome};
use crate::store::JobRecord;
use gantry_adapters::{WorkerAdapter, WorkerRun, WorkerSpawnConfig};
use gantry_core::{Clock, FailureOutcome, JobEvent, JobId};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// How an attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
enum AttemptEnd {
    Completed,
    /// The job was cancelled or the runtime is shutting down
    Stopped,
    Failed(String),
}

/// Runs job attempts against a worker adapter
#[derive(Clone)]
pub(crate) struct Executor<W, C> {
    worker: W,
    clock: C,
    bus: Arc<EventBus>,
    max_retries: u32,
    retry_backoff: Duration,
}

impl<W, C> Executor<W, C>
where
    W: WorkerAdapter,
    C: Clock,
{
    pub fn new(
        worker: W,
        clock: C,
        bus: Arc<EventBus>,
        max_retries: u32,
        retry_backoff: Duration,
    ) -> Self {
        Self {
            worker,
            clock,
            bus,
            max_retries,
            retry_backoff,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Start driving `record` in the background.
    pub fn launch(&self, job_id: JobId, record: Arc<JobRecord>) {
        let span = tracing::info_span!("job", %job_id);
        tokio::spawn(self.clone().run(job_id, record).instrument(span));
    }

    /// Attempt loop: run, and on failure either back off and retry or escalate.
    async fn run(self, job_id: JobId, record: Arc<JobRecord>) {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let Some(config) = self.begin_attempt(&job_id, &record) else {
                tracing::debug!(attempt, "job no longer runnable");
                return;
            };

            let task = tokio::spawn(
                self.clone()
                    .attempt(job_id.clone(), Arc::clone(&record), config)
                    .in_current_span(),
            );
            let end = match task.await {
                Ok(end) => end,
                Err(e) => {
                    tracing::error!(attempt, error = %e, "attempt aborted");
                    self.reap_worker(&record).await;
                    AttemptEnd::Failed(format!("Execution error: {}", e))
                }
            };

            let error = match end {
                AttemptEnd::Completed | AttemptEnd::Stopped => return,
                AttemptEnd::Failed(error) => error,
            };

            let outcome = {
                let mut slot = record.lock();
                if !slot.is_live() {
                    return;
                }
                let outcome = match slot.job.record_failure(
                    error.clone(),
                    self.max_retries,
                    self.clock.now(),
                ) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::warn!(error = %e, "failure not recorded");
                        return;
                    }
                };
                tracing::warn!(
                    attempt,
                    retry_count = slot.job.retry_count,
                    max_retries = self.max_retries,
                    error = %error,
                    "attempt failed"
                );
                if let FailureOutcome::Escalated { failures } = outcome {
                    self.bus
                        .publish(&job_id, &JobEvent::needs_input(error.clone(), failures));
                }
                outcome
            };

            match outcome {
                FailureOutcome::Escalated { .. } => {
                    tracing::error!("max retries reached, needs user input");
                    return;
                }
                FailureOutcome::Retry { .. } => {
                    tracing::info!(backoff_ms = self.retry_backoff.as_millis() as u64, "auto-retrying");
                    tokio::time::sleep(self.retry_backoff).await;
                }
            }
        }
    }

    /// Enter RUNNING and publish the status, or `None` if the job was stopped.
    fn begin_attempt(&self, job_id: &JobId, record: &JobRecord) -> Option<WorkerSpawnConfig> {
        let mut slot = record.lock();
        if slot.stopping {
            return None;
        }
        if let Err(e) = slot.job.begin_attempt(self.clock.now()) {
            tracing::debug!(error = %e, "not starting attempt");
            return None;
        }
        self.bus.publish(job_id, &JobEvent::running());
        Some(WorkerSpawnConfig::for_job(&slot.job))
    }

    /// One worker run: spawn, consume events, wait for exit.
    async fn attempt(
        self,
        job_id: JobId,
        record: Arc<JobRecord>,
        config: WorkerSpawnConfig,
    ) -> AttemptEnd {
        let WorkerRun {
            mut events,
            handle,
        } = match self.worker.spawn(config).await {
            Ok(run) => run,
            Err(e) => {
                tracing::error!(error = %e, "execution error");
                return AttemptEnd::Failed(e.to_string());
            }
        };

        let adopted = {
            let mut slot = record.lock();
            if slot.is_live() {
                slot.worker = Some(handle.clone());
                true
            } else {
                false
            }
        };
        if !adopted {
            handle.kill().await;
            return AttemptEnd::Stopped;
        }

        let mut completed = false;
        let mut interrupted = false;
        let mut failure = None;
        while let Some(event) = events.recv().await {
            if completed {
                // Drain to EOF so the worker is not cut off mid-write
                continue;
            }
            let outcome = {
                let mut slot = record.lock();
                if !slot.is_live() {
                    None
                } else {
                    let applied = interpreter::apply(&mut slot.job, event, self.clock.now());
                    for job_event in &applied.events {
                        self.bus.publish(&job_id, job_event);
                    }
                    Some(applied.outcome)
                }
            };
            match outcome {
                None => {
                    interrupted = true;
                    break;
                }
                Some(Outcome::Continue) => {}
                Some(Outcome::Completed) => completed = true,
                Some(Outcome::Failed(error)) => {
                    failure = Some(error);
                    interrupted = true;
                    break;
                }
            }
        }
        drop(events);

        let exit = if interrupted {
            handle.kill().await
        } else {
            handle.wait().await
        };
        tracing::debug!(code = ?exit.code, killed = exit.killed, "worker exited");

        let mut slot = record.lock();
        slot.worker = None;
        if completed {
            return AttemptEnd::Completed;
        }
        if !slot.is_live() {
            return AttemptEnd::Stopped;
        }
        if let Some(error) = failure {
            return AttemptEnd::Failed(error);
        }
        if !exit.success() {
            return AttemptEnd::Failed(exit.failure_message());
        }

        // Clean exit without an explicit stop still counts as success
        match slot.job.complete(self.clock.now()) {
            Ok(result) => {
                tracing::info!("completed on clean exit");
                self.bus.publish(&job_id, &JobEvent::completed(result));
                AttemptEnd::Completed
            }
            Err(e) => AttemptEnd::Failed(e.to_string()),
        }
    }

    /// Kill any worker left behind by an attempt task that did not finish.
    async fn reap_worker(&self, record: &JobRecord) {
        let handle = record.lock().worker.take();
        if let Some(handle) = handle {
            handle.kill().await;
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
