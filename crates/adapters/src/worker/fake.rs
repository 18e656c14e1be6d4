// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake worker adapter for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{
    parse_line, WorkerAdapter, WorkerError, WorkerExit, WorkerHandle, WorkerRun,
    WorkerSpawnConfig,
};
use async_trait::async_trait;
use gantry_core::JobId;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Recorded call to FakeWorkerAdapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerCall {
    Spawn(WorkerSpawnConfig),
    Killed { job_id: JobId },
}

/// Scripted behavior for one spawned attempt
///
/// Lines are raw stdout text and go through the same parser as a real worker.
#[derive(Debug, Clone)]
pub struct FakeAttempt {
    lines: Vec<String>,
    exit_code: i32,
    stderr: String,
    hang: bool,
    spawn_error: Option<String>,
}

impl FakeAttempt {
    /// Exit with `code` after emitting any scripted lines
    pub fn exits(code: i32) -> Self {
        Self {
            lines: Vec::new(),
            exit_code: code,
            stderr: String::new(),
            hang: false,
            spawn_error: None,
        }
    }

    /// Emit the scripted lines, then stay alive until killed
    pub fn hangs() -> Self {
        Self {
            hang: true,
            ..Self::exits(0)
        }
    }

    /// Fail to launch at all
    pub fn spawn_error(message: impl Into<String>) -> Self {
        Self {
            spawn_error: Some(message.into()),
            ..Self::exits(0)
        }
    }

    /// The usual happy path: start, say something, finish with `stop`
    pub fn succeeds() -> Self {
        Self::exits(0)
            .line(r#"{"type":"step_start"}"#)
            .line(r#"{"type":"text","part":{"text":"done"}}"#)
            .line(r#"{"type":"step_finish","part":{"reason":"stop"}}"#)
    }

    /// A step that finishes with an error and a non-zero exit
    pub fn fails(error: &str) -> Self {
        let finish = serde_json::json!({
            "type": "step_finish",
            "part": { "reason": "error", "error": error },
        });
        Self::exits(1)
            .line(r#"{"type":"step_start"}"#)
            .line(finish.to_string())
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }
}

/// Fake worker adapter for testing
///
/// Plays back queued [`FakeAttempt`]s in order and records all calls.
/// When the queue is empty, spawns behave like [`FakeAttempt::succeeds`].
#[derive(Clone, Default)]
pub struct FakeWorkerAdapter {
    inner: Arc<Mutex<FakeWorkerState>>,
}

#[derive(Default)]
struct FakeWorkerState {
    attempts: VecDeque<FakeAttempt>,
    calls: Vec<WorkerCall>,
}

impl FakeWorkerAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue behavior for the next spawn
    pub fn push(&self, attempt: FakeAttempt) -> &Self {
        self.inner.lock().attempts.push_back(attempt);
        self
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<WorkerCall> {
        self.inner.lock().calls.clone()
    }

    /// Spawn configs in call order
    pub fn spawns(&self) -> Vec<WorkerSpawnConfig> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                WorkerCall::Spawn(config) => Some(config),
                WorkerCall::Killed { .. } => None,
            })
            .collect()
    }

    pub fn spawn_count(&self) -> usize {
        self.spawns().len()
    }

    pub fn kill_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, WorkerCall::Killed { .. }))
            .count()
    }
}

#[async_trait]
impl WorkerAdapter for FakeWorkerAdapter {
    async fn spawn(&self, config: WorkerSpawnConfig) -> Result<WorkerRun, WorkerError> {
        let attempt = {
            let mut inner = self.inner.lock();
            inner.calls.push(WorkerCall::Spawn(config.clone()));
            inner
                .attempts
                .pop_front()
                .unwrap_or_else(FakeAttempt::succeeds)
        };

        let FakeAttempt {
            lines,
            exit_code,
            stderr,
            hang,
            spawn_error,
        } = attempt;
        if let Some(message) = spawn_error {
            return Err(WorkerError::SpawnFailed(message));
        }

        let (handle, mut reporter) = WorkerHandle::new(None);
        let (event_tx, events) = mpsc::unbounded_channel();
        let state = Arc::clone(&self.inner);
        let job_id = config.job_id;

        tokio::spawn(async move {
            for line in &lines {
                if let Ok(Some(event)) = parse_line(line) {
                    let _ = event_tx.send(event);
                }
            }
            if hang {
                reporter.kill_requested().await;
                drop(event_tx);
                state.lock().calls.push(WorkerCall::Killed { job_id });
                reporter.report(WorkerExit::killed(stderr));
            } else {
                drop(event_tx);
                reporter.report(WorkerExit::exited(exit_code, stderr));
            }
        });

        Ok(WorkerRun { events, handle })
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
