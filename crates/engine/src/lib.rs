// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Gantry execution engine

mod error;
mod event_bus;
mod executor;
mod interpreter;
mod runtime;
mod store;
mod stream;

pub use error::RuntimeError;
pub use event_bus::{EventBus, Subscription};
pub use runtime::{
    CreatedJob, Health, JobCounts, Runtime, RuntimeConfig, RuntimeDeps,
    DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_RETRY_BACKOFF,
};
pub use stream::{JobStream, StreamItem};
