// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker adapter that runs the `opencode` CLI

use super::{
    parse_line, ExitReporter, WorkerAdapter, WorkerError, WorkerEvent, WorkerExit, WorkerHandle,
    WorkerRun, WorkerSpawnConfig,
};
use async_trait::async_trait;
use gantry_core::JobId;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::mpsc;

/// Default location of the worker binary
pub const DEFAULT_WORKER_BIN: &str = "/root/.opencode/bin/opencode";

/// Default working directory for worker processes
pub const DEFAULT_WORKSPACE: &str = "/workspace";

/// How long to keep collecting stderr after the process has exited.
///
/// Grandchildren can hold the pipe open past the worker's own exit.
const STDERR_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Fully resolved command line for one worker attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl WorkerInvocation {
    /// Space-joined command line, for logs
    pub fn display(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Runs `opencode run ... --format json <task>` in the workspace directory
#[derive(Debug, Clone)]
pub struct OpencodeWorkerAdapter {
    binary: PathBuf,
    workspace: PathBuf,
}

impl Default for OpencodeWorkerAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_WORKER_BIN, DEFAULT_WORKSPACE)
    }
}

impl OpencodeWorkerAdapter {
    pub fn new(binary: impl Into<PathBuf>, workspace: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            workspace: workspace.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Build the command line for an attempt.
    pub fn invocation(&self, config: &WorkerSpawnConfig) -> WorkerInvocation {
        let mut args: Vec<String> = vec![
            "run".into(),
            "-m".into(),
            config.model.clone(),
            "--agent".into(),
            config.workflow.clone(),
            "--format".into(),
            "json".into(),
        ];
        if config.ultrawork {
            args.push("--variant".into());
            args.push("max".into());
        }
        args.push(config.task.clone());

        WorkerInvocation {
            program: self.binary.clone(),
            args,
            cwd: self.workspace.clone(),
        }
    }
}

#[async_trait]
impl WorkerAdapter for OpencodeWorkerAdapter {
    async fn spawn(&self, config: WorkerSpawnConfig) -> Result<WorkerRun, WorkerError> {
        let invocation = self.invocation(&config);
        tracing::info!(job_id = %config.job_id, command = %invocation.display(), "executing worker");

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                WorkerError::SpawnFailed(format!("{}: {}", invocation.program.display(), e))
            })?;

        let stdout = child.stdout.take().ok_or(WorkerError::MissingPipe("stdout"))?;
        let stderr = child.stderr.take();

        let (handle, reporter) = WorkerHandle::new(child.id());
        let (event_tx, events) = mpsc::unbounded_channel();

        tokio::spawn(read_events(config.job_id.clone(), stdout, event_tx));
        tokio::spawn(supervise(config.job_id, child, stderr, reporter));

        Ok(WorkerRun { events, handle })
    }
}

/// Forward parsed stdout lines until EOF or until the receiver goes away.
async fn read_events(
    job_id: JobId,
    stdout: ChildStdout,
    event_tx: mpsc::UnboundedSender<WorkerEvent>,
) {
    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(%job_id, error = %e, "failed reading worker stdout");
                break;
            }
        }
        let line = String::from_utf8_lossy(&buf);
        match parse_line(&line) {
            Ok(Some(event)) => {
                if event_tx.send(event).is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(%job_id, error = %e, line = %line.trim_end(), "skipping non-JSON worker output");
            }
        }
    }
}

/// Wait for the child (or a kill request), then publish its exit status.
async fn supervise(
    job_id: JobId,
    mut child: Child,
    stderr: Option<ChildStderr>,
    mut reporter: ExitReporter,
) {
    let stderr_task = tokio::spawn(drain(stderr));

    let exited = tokio::select! {
        status = child.wait() => Some(status),
        _ = reporter.kill_requested() => None,
    };
    let (status, killed) = match exited {
        Some(status) => (status, false),
        None => {
            tracing::info!(%job_id, "killing worker");
            if let Err(e) = child.start_kill() {
                tracing::warn!(%job_id, error = %e, "failed to signal worker");
            }
            (child.wait().await, true)
        }
    };

    let stderr = match tokio::time::timeout(STDERR_DRAIN_TIMEOUT, stderr_task).await {
        Ok(Ok(text)) => text,
        _ => String::new(),
    };
    let code = match status {
        Ok(status) => status.code(),
        Err(e) => {
            tracing::warn!(%job_id, error = %e, "failed to wait on worker");
            None
        }
    };
    tracing::debug!(%job_id, ?code, killed, "worker exited");

    reporter.report(WorkerExit {
        code,
        stderr,
        killed,
    });
}

async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> String {
    let Some(mut pipe) = pipe else {
        return String::new();
    };
    let mut buf = Vec::new();
    let _ = pipe.read_to_end(&mut buf).await;
    String::from_utf8_lossy(&buf).trim_end().to_string()
}

#[cfg(test)]
#[path = "opencode_tests.rs"]
mod tests;
