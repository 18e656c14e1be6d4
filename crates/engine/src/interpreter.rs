// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Applies worker events to a job.
//!
//! Pure with respect to I/O: the caller holds the job lock and publishes the
//! returned events.

use chrono::{DateTime, Utc};
use gantry_adapters::WorkerEvent;
use gantry_core::{Job, JobEvent};

/// The step_finish reason that means success
const STOP_REASON: &str = "stop";

/// What the attempt should do after an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    Continue,
    /// The job reached COMPLETED
    Completed,
    /// A failure signal; ends the attempt
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Applied {
    pub events: Vec<JobEvent>,
    pub outcome: Outcome,
}

impl Applied {
    fn none() -> Self {
        Self {
            events: Vec::new(),
            outcome: Outcome::Continue,
        }
    }

    fn publish(event: JobEvent) -> Self {
        Self {
            events: vec![event],
            outcome: Outcome::Continue,
        }
    }
}

pub(crate) fn apply(job: &mut Job, event: WorkerEvent, now: DateTime<Utc>) -> Applied {
    match event {
        WorkerEvent::StepStart => {
            let value = job.step_started();
            tracing::info!(job_id = %job.job_id, "step started");
            Applied::publish(JobEvent::Progress { value })
        }
        WorkerEvent::Text { text } if text.is_empty() => Applied::none(),
        WorkerEvent::Text { text } => {
            tracing::debug!(job_id = %job.job_id, text = %preview(&text), "text");
            let progress = job.append_log(text.clone());
            Applied::publish(JobEvent::Log {
                message: text,
                progress,
            })
        }
        WorkerEvent::StepFinish { reason, .. } if reason == STOP_REASON => {
            match job.complete(now) {
                Ok(result) => {
                    tracing::info!(job_id = %job.job_id, "completed successfully");
                    Applied {
                        events: vec![JobEvent::completed(result)],
                        outcome: Outcome::Completed,
                    }
                }
                Err(e) => {
                    tracing::warn!(job_id = %job.job_id, error = %e, "ignoring stop");
                    Applied::none()
                }
            }
        }
        WorkerEvent::StepFinish { reason, error } => Applied {
            events: Vec::new(),
            outcome: Outcome::Failed(
                error.unwrap_or_else(|| format!("Failed with reason: {}", reason)),
            ),
        },
        WorkerEvent::Other { kind } => {
            tracing::trace!(job_id = %job.job_id, kind = %kind, "ignoring worker event");
            Applied::none()
        }
    }
}

/// First 100 characters, for log lines
fn preview(text: &str) -> &str {
    match text.char_indices().nth(100) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
#[path = "interpreter_tests.rs"]
mod tests;
