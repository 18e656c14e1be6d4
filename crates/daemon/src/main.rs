// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gantry Daemon (gantryd)
//!
//! HTTP gateway that runs coding-agent jobs as worker subprocesses and
//! streams their progress to clients.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use gantry_daemon::{bind, build_runtime, serve, AppState, Config, LifecycleError};
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config is read
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("gantryd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: gantryd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    let _log_guard = setup_logging(&config)?;

    info!(
        addr = %config.addr,
        worker_bin = %config.worker_bin.display(),
        workspace = %config.workspace.display(),
        "starting gantryd"
    );

    let runtime = build_runtime(&config);
    let listener = bind(config.addr).await?;
    let state = AppState::new(runtime, config.default_model.as_str());

    // Set up signal handlers
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let shutdown = async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
            _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
        }
    };

    serve(listener, state, shutdown).await?;
    info!("Daemon stopped");
    Ok(())
}

fn print_help() {
    println!("gantryd {}", env!("CARGO_PKG_VERSION"));
    println!("Gantry Daemon - HTTP gateway for worker jobs");
    println!();
    println!("USAGE:");
    println!("    gantryd");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -v, --version    Print version information");
    println!();
    println!("ENVIRONMENT:");
    println!("    GANTRY_ADDR              Listen address (default 0.0.0.0:8765)");
    println!("    GANTRY_WORKER_BIN        Worker executable");
    println!("    GANTRY_WORKSPACE         Worker working directory");
    println!("    GANTRY_DEFAULT_MODEL     Model for requests that omit one");
    println!("    GANTRY_MAX_RETRIES       Failures before a job needs input");
    println!("    GANTRY_RETRY_BACKOFF_MS  Pause between retries");
    println!("    GANTRY_HEARTBEAT_MS      Idle interval before a stream heartbeat");
    println!("    GANTRY_LOG_FILE          Log to this file instead of stderr");
    println!("    RUST_LOG                 Log filter (default info)");
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let (non_blocking, guard) = match &config.log_path {
        Some(path) => {
            let dir = match path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir,
                _ => std::path::Path::new("."),
            };
            let file_name = path
                .file_name()
                .ok_or_else(|| LifecycleError::InvalidLogPath(path.clone()))?;
            std::fs::create_dir_all(dir)?;
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name))
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    // Set up subscriber with env filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(config.log_path.is_none())
                .with_writer(non_blocking),
        )
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
