// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client-driven transitions: cancel, user actions, shutdown

use super::Runtime;
use crate::error::RuntimeError;
use gantry_adapters::WorkerAdapter;
use gantry_core::{
    Clock, IdGen, JobEvent, JobId, JobResult, JobStatus, UserAction, CANCELLED_BY_USER,
};
use std::sync::Arc;

impl<W, C, I> Runtime<W, C, I>
where
    W: WorkerAdapter,
    C: Clock,
    I: IdGen,
{
    /// Cancel a PENDING or RUNNING job.
    ///
    /// Kills the live worker and waits for it to exit before the job is
    /// marked FAILED, so no worker event can follow the failure event.
    pub async fn cancel(&self, job_id: &str) -> Result<(), RuntimeError> {
        let record = self.record(job_id)?;

        let worker = {
            let mut slot = record.lock();
            if !slot.job.status.is_cancellable() {
                return Err(RuntimeError::NotRunning(slot.job.job_id.clone()));
            }
            slot.stopping = true;
            slot.worker.take()
        };

        if let Some(worker) = worker {
            tracing::info!(job_id, pid = ?worker.pid(), "cancelling: killing worker");
            worker.kill().await;
        }

        let mut slot = record.lock();
        slot.job.cancel(self.clock().now())?;
        self.inner
            .bus
            .publish(&slot.job.job_id, &JobEvent::cancelled(CANCELLED_BY_USER));
        tracing::info!(job_id, "cancelled");
        Ok(())
    }

    /// Apply a user decision (`retry`, `skip` or `abort`) to a NEEDS_INPUT job.
    ///
    /// Returns the job's new status.
    pub fn action(&self, job_id: &str, action: &str) -> Result<JobStatus, RuntimeError> {
        let record = self.record(job_id)?;
        let mut slot = record.lock();
        if slot.job.status != JobStatus::NeedsInput {
            return Err(RuntimeError::NotAwaitingInput(slot.job.job_id.clone()));
        }
        let action: UserAction = action.parse()?;
        slot.job.resolve(action, self.clock().now())?;
        let job_id = slot.job.job_id.clone();

        match action {
            UserAction::Retry => {
                tracing::info!(%job_id, "user requested retry");
                drop(slot);
                self.inner.executor.launch(job_id, Arc::clone(&record));
                Ok(JobStatus::Running)
            }
            UserAction::Skip | UserAction::Abort => {
                let result = slot
                    .job
                    .result
                    .clone()
                    .unwrap_or_else(|| JobResult::dismissed(action.dismissal()));
                self.inner
                    .bus
                    .publish(&job_id, &JobEvent::dismissed(result));
                tracing::info!(%job_id, %action, "user dismissed job");
                Ok(slot.job.status)
            }
        }
    }

    /// Kill every live worker. Jobs are left as they are.
    pub async fn shutdown(&self) {
        let workers: Vec<(JobId, _)> = self
            .inner
            .store
            .records()
            .iter()
            .filter_map(|record| {
                let mut slot = record.lock();
                slot.stopping = true;
                let worker = slot.worker.take()?;
                Some((slot.job.job_id.clone(), worker))
            })
            .collect();

        tracing::info!(live_workers = workers.len(), "shutting down");
        for (job_id, worker) in workers {
            let exit = worker.kill().await;
            tracing::debug!(%job_id, code = ?exit.code, "worker stopped");
        }
    }
}
