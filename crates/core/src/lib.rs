// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gantry-core: job model, state machine and wire events for the Gantry gateway

pub mod action;
pub mod clock;
pub mod event;
pub mod id;
pub mod job;

pub use action::{UnknownAction, UserAction};
pub use clock::{Clock, SystemClock};
pub use event::JobEvent;
pub use id::{IdGen, JobId, SequentialIdGen, UuidIdGen};
pub use job::{
    FailureOutcome, Job, JobConfig, JobResult, JobStatus, TransitionError,
    CANCELLED_BY_USER, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_RETRIES, DEFAULT_MODEL,
};

#[cfg(any(test, feature = "test-support"))]
pub use clock::FakeClock;
