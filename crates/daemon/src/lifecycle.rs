// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: configuration, startup, shutdown.

use std::future::{Future, IntoFuture};
use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

use gantry_adapters::{
    OpencodeWorkerAdapter, TracedWorker, WorkerAdapter, DEFAULT_WORKER_BIN, DEFAULT_WORKSPACE,
};
use gantry_core::{Clock, IdGen, SystemClock, UuidIdGen, DEFAULT_MODEL};
use gantry_engine::{Runtime, RuntimeConfig, RuntimeDeps};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

use crate::env;
use crate::http::{router, AppState};

/// Listen address when `GANTRY_ADDR` is unset
pub const DEFAULT_ADDR: &str = "0.0.0.0:8765";

/// Daemon runtime with concrete adapter types (wrapped with tracing)
pub type DaemonRuntime = Runtime<TracedWorker<OpencodeWorkerAdapter>, SystemClock, UuidIdGen>;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    /// Worker executable
    pub worker_bin: PathBuf,
    /// Working directory for every worker
    pub workspace: PathBuf,
    /// Model for requests that omit one
    pub default_model: String,
    pub runtime: RuntimeConfig,
    /// Daemon log file; stderr when `None`
    pub log_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `GANTRY_*` environment variables.
    pub fn load() -> Result<Self, LifecycleError> {
        let raw_addr = env::addr().unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = raw_addr
            .parse()
            .map_err(|source| LifecycleError::InvalidAddr {
                addr: raw_addr.clone(),
                source,
            })?;

        let defaults = RuntimeConfig::default();
        Ok(Self {
            addr,
            worker_bin: env::worker_bin().unwrap_or_else(|| PathBuf::from(DEFAULT_WORKER_BIN)),
            workspace: env::workspace().unwrap_or_else(|| PathBuf::from(DEFAULT_WORKSPACE)),
            default_model: env::default_model().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            runtime: RuntimeConfig {
                max_retries: env::max_retries().unwrap_or(defaults.max_retries),
                retry_backoff: env::retry_backoff().unwrap_or(defaults.retry_backoff),
                heartbeat_interval: env::heartbeat_interval()
                    .unwrap_or(defaults.heartbeat_interval),
            },
            log_path: env::log_file(),
        })
    }
}

/// Errors that stop the daemon
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("invalid listen address {addr:?}: {source}")]
    InvalidAddr {
        addr: String,
        source: AddrParseError,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("log path has no file name: {0}")]
    InvalidLogPath(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the production runtime from configuration
pub fn build_runtime(config: &Config) -> DaemonRuntime {
    let worker = OpencodeWorkerAdapter::new(&config.worker_bin, &config.workspace);
    Runtime::new(
        RuntimeDeps {
            worker: TracedWorker::new(worker),
            clock: SystemClock,
            ids: UuidIdGen,
        },
        config.runtime.clone(),
    )
}

/// Bind the configured listen address
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, LifecycleError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| LifecycleError::Bind { addr, source })
}

/// Serve the HTTP API until `shutdown` resolves, then kill every live worker.
///
/// Open event streams do not hold up shutdown.
pub async fn serve<W, C, I>(
    listener: TcpListener,
    state: AppState<W, C, I>,
    shutdown: impl Future<Output = ()>,
) -> Result<(), LifecycleError>
where
    W: WorkerAdapter,
    C: Clock,
    I: IdGen,
{
    let runtime = state.runtime().clone();
    let app = router(state);
    info!(addr = ?listener.local_addr().ok(), "listening");

    let result = tokio::select! {
        result = axum::serve(listener, app).into_future() => result,
        _ = shutdown => Ok(()),
    };

    info!("stopping workers");
    runtime.shutdown().await;
    result.map_err(LifecycleError::from)
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
