// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human decisions for jobs awaiting input.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Decision a user can take on a NEEDS_INPUT job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserAction {
    /// Start over with a fresh retry budget
    Retry,
    /// Give up on the job, treating the failure as acceptable
    Skip,
    /// Give up on the job
    Abort,
}

/// Action string that names no [`UserAction`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown action: {0}")]
pub struct UnknownAction(pub String);

impl UserAction {
    pub fn verb(self) -> &'static str {
        match self {
            UserAction::Retry => "retry",
            UserAction::Skip => "skip",
            UserAction::Abort => "abort",
        }
    }

    /// Text recorded in the job result when this action ends the job.
    pub fn dismissal(self) -> &'static str {
        match self {
            UserAction::Retry => "Retried by user",
            UserAction::Skip => "Skipped by user",
            UserAction::Abort => "Aborted by user",
        }
    }
}

impl FromStr for UserAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "retry" => Ok(UserAction::Retry),
            "skip" => Ok(UserAction::Skip),
            "abort" => Ok(UserAction::Abort),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for UserAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
