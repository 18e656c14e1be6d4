// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::worker::{WorkerAdapter, WorkerError, WorkerRun, WorkerSpawnConfig};
use async_trait::async_trait;
use tracing::Instrument;

/// Wrapper that adds tracing to any WorkerAdapter
#[derive(Clone)]
pub struct TracedWorker<W> {
    inner: W,
}

impl<W> TracedWorker<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &W {
        &self.inner
    }
}

#[async_trait]
impl<W: WorkerAdapter> WorkerAdapter for TracedWorker<W> {
    async fn spawn(&self, config: WorkerSpawnConfig) -> Result<WorkerRun, WorkerError> {
        let span = tracing::info_span!(
            "worker.spawn",
            job_id = %config.job_id,
            workflow = %config.workflow,
            model = %config.model,
        );
        async {
            tracing::info!(ultrawork = config.ultrawork, "starting");
            let start = std::time::Instant::now();
            let result = self.inner.spawn(config).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(run) => tracing::info!(pid = ?run.handle.pid(), elapsed_ms, "worker started"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "spawn failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
