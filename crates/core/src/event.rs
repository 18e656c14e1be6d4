// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events published to job stream subscribers.
//!
//! Wire format is a JSON object tagged by `type`:
//!
//! ```text
//! {"type":"status","status":"running"}
//! {"type":"progress","value":10}
//! {"type":"log","message":"hello","progress":15}
//! {"type":"status","status":"completed","result":{"success":true,"logs":["hello"]}}
//! {"type":"complete"}
//! ```

use crate::job::{Job, JobResult, JobStatus};
use serde::{Deserialize, Serialize};

/// One record delivered to stream subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    Status {
        status: JobStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        progress: Option<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<JobResult>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        retry_count: Option<u32>,
    },
    Progress {
        value: u8,
    },
    Log {
        message: String,
        progress: u8,
    },
    /// Synthetic end-of-stream marker; never published on the bus
    Complete,
}

impl JobEvent {
    fn status(
        status: JobStatus,
        result: Option<JobResult>,
        error: Option<String>,
        retry_count: Option<u32>,
    ) -> Self {
        JobEvent::Status {
            status,
            progress: None,
            result,
            error,
            retry_count,
        }
    }

    /// Current status and progress, sent first to a new subscriber.
    pub fn snapshot(job: &Job) -> Self {
        JobEvent::Status {
            status: job.status,
            progress: Some(job.progress),
            result: None,
            error: None,
            retry_count: None,
        }
    }

    pub fn running() -> Self {
        Self::status(JobStatus::Running, None, None, None)
    }

    pub fn completed(result: JobResult) -> Self {
        Self::status(JobStatus::Completed, Some(result), None, None)
    }

    pub fn cancelled(error: impl Into<String>) -> Self {
        Self::status(JobStatus::Failed, None, Some(error.into()), None)
    }

    pub fn dismissed(result: JobResult) -> Self {
        Self::status(JobStatus::Failed, Some(result), None, None)
    }

    pub fn needs_input(error: impl Into<String>, retry_count: u32) -> Self {
        Self::status(
            JobStatus::NeedsInput,
            None,
            Some(error.into()),
            Some(retry_count),
        )
    }

    /// A status event after which the stream closes.
    pub fn ends_stream(&self) -> bool {
        matches!(self, JobEvent::Status { status, .. } if status.ends_stream())
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
