// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn with_var<T>(name: &str, value: Option<&str>, f: impl FnOnce() -> T) -> T {
    match value {
        Some(v) => std::env::set_var(name, v),
        None => std::env::remove_var(name),
    }
    let out = f();
    std::env::remove_var(name);
    out
}

#[test]
#[serial(env)]
fn unset_vars_are_none() {
    with_var("GANTRY_ADDR", None, || assert_eq!(addr(), None));
    with_var("GANTRY_LOG_FILE", None, || assert_eq!(log_file(), None));
}

#[test]
#[serial(env)]
fn blank_values_count_as_unset() {
    with_var("GANTRY_DEFAULT_MODEL", Some("  "), || {
        assert_eq!(default_model(), None)
    });
}

#[test]
#[serial(env)]
fn paths_are_read_verbatim() {
    with_var("GANTRY_WORKER_BIN", Some("/usr/local/bin/opencode"), || {
        assert_eq!(worker_bin(), Some(PathBuf::from("/usr/local/bin/opencode")))
    });
    with_var("GANTRY_WORKSPACE", Some("/srv/work"), || {
        assert_eq!(workspace(), Some(PathBuf::from("/srv/work")))
    });
}

#[yare::parameterized(
    valid    = { Some("500"), Some(Duration::from_millis(500)) },
    padded   = { Some(" 750 "), Some(Duration::from_millis(750)) },
    garbage  = { Some("soon"), None },
    negative = { Some("-1"), None },
    unset    = { None, None },
)]
#[serial(env)]
fn retry_backoff_parsing(value: Option<&str>, expected: Option<Duration>) {
    with_var("GANTRY_RETRY_BACKOFF_MS", value, || {
        assert_eq!(retry_backoff(), expected)
    });
}

#[test]
#[serial(env)]
fn zero_heartbeat_is_ignored() {
    with_var("GANTRY_HEARTBEAT_MS", Some("0"), || {
        assert_eq!(heartbeat_interval(), None)
    });
    with_var("GANTRY_HEARTBEAT_MS", Some("1500"), || {
        assert_eq!(heartbeat_interval(), Some(Duration::from_millis(1500)))
    });
}

#[test]
#[serial(env)]
fn max_retries_parses_integers() {
    with_var("GANTRY_MAX_RETRIES", Some("5"), || {
        assert_eq!(max_retries(), Some(5))
    });
    with_var("GANTRY_MAX_RETRIES", Some("many"), || {
        assert_eq!(max_retries(), None)
    });
}
