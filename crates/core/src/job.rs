// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job record and state machine.
//!
//! ```text
//! PENDING ──► RUNNING ──► COMPLETED
//!                │  ▲
//!                │  │ retry
//!                ▼  │
//!            NEEDS_INPUT ──► FAILED (skip / abort)
//!
//! PENDING | RUNNING ──► FAILED (cancel)
//! ```
//!
//! Every transition is a method returning `Result<_, TransitionError>`;
//! an edge not drawn above leaves the job untouched.

use crate::action::UserAction;
use crate::id::JobId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Model used when the request does not name one.
pub const DEFAULT_MODEL: &str = "anthropic/claude-opus-4";

/// Iteration budget recorded when the request does not set one.
pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

/// Failures tolerated before a job escalates to NEEDS_INPUT.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Error recorded on a job cancelled through the API.
pub const CANCELLED_BY_USER: &str = "Cancelled by user";

const STEP_START_PROGRESS: u8 = 10;
const TEXT_PROGRESS_STEP: u8 = 5;
const TEXT_PROGRESS_CAP: u8 = 90;
const COMPLETE_PROGRESS: u8 = 100;

/// Lifecycle status of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    /// Retries exhausted; waiting for a human decision
    NeedsInput,
}

impl JobStatus {
    pub const ALL: [JobStatus; 5] = [
        JobStatus::Pending,
        JobStatus::Running,
        JobStatus::Completed,
        JobStatus::Failed,
        JobStatus::NeedsInput,
    ];

    /// COMPLETED and FAILED admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether a cancel request is accepted in this status.
    pub fn is_cancellable(self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Running)
    }

    /// Statuses after which a live stream closes with a `complete` marker.
    pub fn ends_stream(self) -> bool {
        self.is_terminal() || self == JobStatus::NeedsInput
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::NeedsInput => "needs_input",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final payload attached to a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobResult {
    /// Worker finished; carries every log line collected across attempts
    Success { success: bool, logs: Vec<String> },
    /// A human dismissed the job from NEEDS_INPUT
    Dismissed { error: String },
}

impl JobResult {
    pub fn success(logs: Vec<String>) -> Self {
        JobResult::Success {
            success: true,
            logs,
        }
    }

    pub fn dismissed(reason: impl Into<String>) -> Self {
        JobResult::Dismissed {
            error: reason.into(),
        }
    }
}

/// Attempted transition not allowed from the current status
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action} a job that is {from}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub action: &'static str,
}

/// What the retry policy decided after a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Another attempt should run after the backoff
    Retry { failures: u32 },
    /// Retries exhausted; the job now awaits a human decision
    Escalated { failures: u32 },
}

/// Request parameters for a new job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    pub task: String,
    pub workflow: String,
    pub model: String,
    pub max_iterations: u32,
    pub ultrawork: bool,
}

impl JobConfig {
    pub fn new(task: impl Into<String>, workflow: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            workflow: workflow.into(),
            model: DEFAULT_MODEL.to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            ultrawork: false,
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn ultrawork(mut self, ultrawork: bool) -> Self {
        self.ultrawork = ultrawork;
        self
    }
}

/// A submitted job and its execution state.
///
/// Serializes as the point-in-time snapshot returned by job queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: JobId,
    pub task: String,
    pub workflow: String,
    pub model: String,
    pub ultrawork: bool,
    pub max_iterations: u32,
    pub status: JobStatus,
    /// 0..=100; only COMPLETED reaches 100
    pub progress: u8,
    /// Text emitted by the worker, across all attempts
    pub logs: Vec<String>,
    pub result: Option<JobResult>,
    pub error: Option<String>,
    /// Failures since creation or the last user retry
    pub retry_count: u32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(job_id: JobId, config: JobConfig, now: DateTime<Utc>) -> Self {
        Self {
            job_id,
            task: config.task,
            workflow: config.workflow,
            model: config.model,
            ultrawork: config.ultrawork,
            max_iterations: config.max_iterations,
            status: JobStatus::Pending,
            progress: 0,
            logs: Vec::new(),
            result: None,
            error: None,
            retry_count: 0,
            created_at: now,
            started_at: None,
            finished_at: None,
        }
    }

    fn reject(&self, action: &'static str) -> TransitionError {
        TransitionError {
            from: self.status,
            action,
        }
    }

    /// Enter RUNNING for a new attempt.
    ///
    /// Accepted from PENDING (first attempt) and RUNNING (automatic retry or
    /// an attempt scheduled by a user retry).
    pub fn begin_attempt(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        match self.status {
            JobStatus::Pending | JobStatus::Running => {
                self.status = JobStatus::Running;
                self.started_at.get_or_insert(now);
                Ok(())
            }
            _ => Err(self.reject("start")),
        }
    }

    /// Worker reported a step start. Returns the new progress.
    pub fn step_started(&mut self) -> u8 {
        self.progress = self.progress.max(STEP_START_PROGRESS);
        self.progress
    }

    /// Append worker text to the log. Returns the new progress.
    pub fn append_log(&mut self, text: impl Into<String>) -> u8 {
        self.logs.push(text.into());
        let bumped = self
            .progress
            .saturating_add(TEXT_PROGRESS_STEP)
            .min(TEXT_PROGRESS_CAP);
        self.progress = bumped.max(self.progress);
        self.progress
    }

    /// RUNNING → COMPLETED. Returns the result that was recorded.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<JobResult, TransitionError> {
        if self.status != JobStatus::Running {
            return Err(self.reject("complete"));
        }
        let result = JobResult::success(self.logs.clone());
        self.status = JobStatus::Completed;
        self.progress = COMPLETE_PROGRESS;
        self.finished_at.get_or_insert(now);
        self.result = Some(result.clone());
        Ok(result)
    }

    /// Count one failure and decide between retry and escalation.
    ///
    /// On the `max_retries`-th failure the job moves to NEEDS_INPUT and keeps
    /// `error`; earlier failures leave it RUNNING for the next attempt.
    pub fn record_failure(
        &mut self,
        error: impl Into<String>,
        max_retries: u32,
        now: DateTime<Utc>,
    ) -> Result<FailureOutcome, TransitionError> {
        if self.status != JobStatus::Running {
            return Err(self.reject("fail"));
        }
        self.retry_count += 1;
        if self.retry_count >= max_retries {
            self.status = JobStatus::NeedsInput;
            self.error = Some(error.into());
            self.finished_at.get_or_insert(now);
            Ok(FailureOutcome::Escalated {
                failures: self.retry_count,
            })
        } else {
            Ok(FailureOutcome::Retry {
                failures: self.retry_count,
            })
        }
    }

    /// PENDING | RUNNING → FAILED on user request.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        if !self.status.is_cancellable() {
            return Err(self.reject("cancel"));
        }
        self.status = JobStatus::Failed;
        self.error = Some(CANCELLED_BY_USER.to_string());
        self.finished_at.get_or_insert(now);
        Ok(())
    }

    /// Apply a human decision to a NEEDS_INPUT job.
    ///
    /// `Retry` re-enters RUNNING with a fresh retry budget; the caller is
    /// responsible for scheduling the new attempt. `Skip` and `Abort` fail
    /// the job with a result naming the decision.
    pub fn resolve(&mut self, action: UserAction, now: DateTime<Utc>) -> Result<(), TransitionError> {
        if self.status != JobStatus::NeedsInput {
            return Err(self.reject(action.verb()));
        }
        match action {
            UserAction::Retry => {
                self.status = JobStatus::Running;
                self.retry_count = 0;
                self.error = None;
                self.finished_at = None;
            }
            UserAction::Skip | UserAction::Abort => {
                self.status = JobStatus::Failed;
                self.result = Some(JobResult::dismissed(action.dismissal()));
                self.finished_at.get_or_insert(now);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
