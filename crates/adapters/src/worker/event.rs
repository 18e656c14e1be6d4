// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parsing of the worker's newline-delimited JSON output.

use serde_json::Value;

/// One event reported by the worker on stdout
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// `{"type":"step_start"}`
    StepStart,
    /// `{"type":"text","part":{"text":"..."}}`
    Text { text: String },
    /// `{"type":"step_finish","part":{"reason":"stop"}}`
    StepFinish {
        reason: String,
        error: Option<String>,
    },
    /// Any other `type`; carried for logging only
    Other { kind: String },
}

/// Extract a string value from a JSON object by key.
fn get_str<'a>(obj: &'a Value, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

impl WorkerEvent {
    /// Interpret a decoded JSON record.
    ///
    /// Never fails: records with an unexpected shape become [`WorkerEvent::Other`].
    pub fn from_json(record: &Value) -> Self {
        let part = record.get("part").unwrap_or(&Value::Null);
        match get_str(record, "type") {
            Some("step_start") => WorkerEvent::StepStart,
            Some("text") => WorkerEvent::Text {
                text: get_str(part, "text").unwrap_or_default().to_string(),
            },
            Some("step_finish") => WorkerEvent::StepFinish {
                reason: get_str(part, "reason").unwrap_or_default().to_string(),
                error: part.get("error").and_then(error_text),
            },
            Some(other) => WorkerEvent::Other {
                kind: other.to_string(),
            },
            None => WorkerEvent::Other {
                kind: String::new(),
            },
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            WorkerEvent::StepStart => "step_start",
            WorkerEvent::Text { .. } => "text",
            WorkerEvent::StepFinish { .. } => "step_finish",
            WorkerEvent::Other { kind } => kind,
        }
    }
}

/// Workers report errors either as a plain string or as a structured object.
fn error_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Parse one line of worker output.
///
/// Blank lines yield `Ok(None)`. Lines that are not JSON yield an error for
/// the caller to log and skip.
pub fn parse_line(line: &str) -> Result<Option<WorkerEvent>, serde_json::Error> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let record: Value = serde_json::from_str(trimmed)?;
    Ok(Some(WorkerEvent::from_json(&record)))
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
