// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gantry daemon library
//!
//! HTTP transport and process lifecycle for `gantryd`.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod http;
mod lifecycle;

pub use http::{router, AppState};
pub use lifecycle::{
    bind, build_runtime, serve, Config, DaemonRuntime, LifecycleError, DEFAULT_ADDR,
};
