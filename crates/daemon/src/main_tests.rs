// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gantry_engine::RuntimeConfig;
use std::path::PathBuf;

fn config(log_path: &str) -> Config {
    Config {
        addr: "127.0.0.1:0".parse().unwrap(),
        worker_bin: PathBuf::from("/bin/false"),
        workspace: PathBuf::from("/tmp"),
        default_model: "anthropic/claude-opus-4".into(),
        runtime: RuntimeConfig::default(),
        log_path: Some(PathBuf::from(log_path)),
    }
}

#[yare::parameterized(
    root   = { "/" },
    parent = { "/var/log/.." },
)]
fn log_path_without_file_name_is_rejected(path: &str) {
    let err = setup_logging(&config(path)).unwrap_err();
    assert!(matches!(err, LifecycleError::InvalidLogPath(_)), "{err}");
}
