// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine runtime

use gantry_core::{JobId, TransitionError, UnknownAction};
use thiserror::Error;

/// Errors returned by [`crate::Runtime`] operations
///
/// Display strings are the client-facing messages.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Job not found")]
    NotFound(JobId),
    #[error("Job is not running")]
    NotRunning(JobId),
    #[error("Job is not in needs_input state")]
    NotAwaitingInput(JobId),
    #[error(transparent)]
    UnknownAction(#[from] UnknownAction),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl RuntimeError {
    /// True when the job id did not resolve
    pub fn is_not_found(&self) -> bool {
        matches!(self, RuntimeError::NotFound(_))
    }
}
