// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.
//!
//! Empty values are treated as unset. Numbers that fail to parse fall back
//! to the caller's default.

use std::path::PathBuf;
use std::time::Duration;

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn millis(name: &str) -> Option<Duration> {
    var(name)
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Listen address (`GANTRY_ADDR`)
pub fn addr() -> Option<String> {
    var("GANTRY_ADDR")
}

/// Worker executable (`GANTRY_WORKER_BIN`)
pub fn worker_bin() -> Option<PathBuf> {
    var("GANTRY_WORKER_BIN").map(PathBuf::from)
}

/// Working directory for workers (`GANTRY_WORKSPACE`)
pub fn workspace() -> Option<PathBuf> {
    var("GANTRY_WORKSPACE").map(PathBuf::from)
}

/// Model for requests that omit one (`GANTRY_DEFAULT_MODEL`)
pub fn default_model() -> Option<String> {
    var("GANTRY_DEFAULT_MODEL")
}

/// Failures before escalation (`GANTRY_MAX_RETRIES`)
pub fn max_retries() -> Option<u32> {
    var("GANTRY_MAX_RETRIES").and_then(|s| s.trim().parse().ok())
}

/// Pause between automatic retries (`GANTRY_RETRY_BACKOFF_MS`)
pub fn retry_backoff() -> Option<Duration> {
    millis("GANTRY_RETRY_BACKOFF_MS")
}

/// Idle interval before a stream heartbeat (`GANTRY_HEARTBEAT_MS`)
pub fn heartbeat_interval() -> Option<Duration> {
    millis("GANTRY_HEARTBEAT_MS").filter(|d| !d.is_zero())
}

/// Log file; logs go to stderr when unset (`GANTRY_LOG_FILE`)
pub fn log_file() -> Option<PathBuf> {
    var("GANTRY_LOG_FILE").map(PathBuf::from)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
