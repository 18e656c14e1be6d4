// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handle to a running worker process

use tokio::sync::{mpsc, watch};

/// How a worker process ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerExit {
    /// Exit code, or `None` when terminated by a signal
    pub code: Option<i32>,
    /// Everything the process wrote to stderr, trailing whitespace trimmed
    pub stderr: String,
    /// Whether the exit followed a kill request
    pub killed: bool,
}

impl WorkerExit {
    pub fn exited(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stderr: stderr.into(),
            killed: false,
        }
    }

    pub fn killed(stderr: impl Into<String>) -> Self {
        Self {
            code: None,
            stderr: stderr.into(),
            killed: true,
        }
    }

    /// Reported when the supervising task went away without publishing a status
    fn lost() -> Self {
        Self {
            code: None,
            stderr: "worker supervisor stopped without reporting an exit status".to_string(),
            killed: false,
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Failure description recorded against the job
    pub fn failure_message(&self) -> String {
        let mut message = match self.code {
            Some(code) => format!("Process exited with code {}", code),
            None => "Process terminated by signal".to_string(),
        };
        if !self.stderr.is_empty() {
            message.push_str("\nStderr: ");
            message.push_str(&self.stderr);
        }
        message
    }
}

/// Cloneable handle for waiting on or killing a worker
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    pid: Option<u32>,
    kill_tx: mpsc::Sender<()>,
    exit_rx: watch::Receiver<Option<WorkerExit>>,
}

/// Supervisor side of a [`WorkerHandle`]
///
/// Owned by whatever task actually waits on the process.
#[derive(Debug)]
pub struct ExitReporter {
    kill_rx: mpsc::Receiver<()>,
    exit_tx: watch::Sender<Option<WorkerExit>>,
}

impl WorkerHandle {
    /// Create a connected handle/reporter pair.
    pub fn new(pid: Option<u32>) -> (Self, ExitReporter) {
        let (kill_tx, kill_rx) = mpsc::channel(1);
        let (exit_tx, exit_rx) = watch::channel(None);
        (
            Self {
                pid,
                kill_tx,
                exit_rx,
            },
            ExitReporter { kill_rx, exit_tx },
        )
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn has_exited(&self) -> bool {
        self.exit_rx.borrow().is_some()
    }

    /// Wait for the process to exit.
    pub async fn wait(&self) -> WorkerExit {
        let mut exit_rx = self.exit_rx.clone();
        let exit = match exit_rx.wait_for(Option::is_some).await {
            Ok(exit) => exit.clone().unwrap_or_else(WorkerExit::lost),
            Err(_) => WorkerExit::lost(),
        };
        exit
    }

    /// Request termination and wait for the process to exit.
    ///
    /// Safe to call more than once or after the process already exited.
    pub async fn kill(&self) -> WorkerExit {
        if !self.has_exited() {
            // A full channel means a kill is already pending
            let _ = self.kill_tx.try_send(());
        }
        self.wait().await
    }
}

impl ExitReporter {
    /// Resolves when a handle asks for the process to be killed.
    ///
    /// Never resolves if every handle has been dropped.
    pub async fn kill_requested(&mut self) {
        if self.kill_rx.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }

    pub fn report(self, exit: WorkerExit) {
        let _ = self.exit_tx.send(Some(exit));
    }
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
