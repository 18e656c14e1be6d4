// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn parse(line: &str) -> WorkerEvent {
    parse_line(line).unwrap().unwrap()
}

#[test]
fn step_start() {
    assert_eq!(parse(r#"{"type":"step_start"}"#), WorkerEvent::StepStart);
}

#[test]
fn step_start_ignores_extra_fields() {
    assert_eq!(
        parse(r#"{"type":"step_start","timestamp":1,"part":{"id":"p1"}}"#),
        WorkerEvent::StepStart
    );
}

#[test]
fn text_with_content() {
    assert_eq!(
        parse(r#"{"type":"text","part":{"text":"hello"}}"#),
        WorkerEvent::Text {
            text: "hello".into()
        }
    );
}

#[yare::parameterized(
    missing_part  = { r#"{"type":"text"}"# },
    missing_text  = { r#"{"type":"text","part":{}}"# },
    non_string    = { r#"{"type":"text","part":{"text":42}}"# },
)]
fn text_without_content_is_empty(line: &str) {
    assert_eq!(parse(line), WorkerEvent::Text { text: String::new() });
}

#[test]
fn step_finish_stop() {
    assert_eq!(
        parse(r#"{"type":"step_finish","part":{"reason":"stop"}}"#),
        WorkerEvent::StepFinish {
            reason: "stop".into(),
            error: None
        }
    );
}

#[yare::parameterized(
    string_error = { r#"{"type":"step_finish","part":{"reason":"error","error":"rate limited"}}"#, Some("rate limited") },
    object_error = { r#"{"type":"step_finish","part":{"reason":"error","error":{"code":429}}}"#,  Some(r#"{"code":429}"#) },
    null_error   = { r#"{"type":"step_finish","part":{"reason":"length","error":null}}"#,       None },
    empty_error  = { r#"{"type":"step_finish","part":{"reason":"length","error":""}}"#,         None },
)]
fn step_finish_error_detail(line: &str, expected: Option<&str>) {
    match parse(line) {
        WorkerEvent::StepFinish { error, .. } => assert_eq!(error.as_deref(), expected),
        other => panic!("unexpected event: {:?}", other),
    }
}

#[test]
fn unknown_type_is_other() {
    let event = parse(r#"{"type":"tool_use","part":{"tool":"bash"}}"#);
    assert_eq!(
        event,
        WorkerEvent::Other {
            kind: "tool_use".into()
        }
    );
    assert_eq!(event.kind(), "tool_use");
}

#[yare::parameterized(
    missing_type = { r#"{"part":{}}"# },
    array        = { "[1,2,3]" },
    number       = { "42" },
)]
fn json_without_type_is_other(line: &str) {
    assert!(matches!(parse(line), WorkerEvent::Other { .. }));
}

#[yare::parameterized(
    empty       = { "" },
    spaces      = { "   " },
    carriage    = { "\r\n" },
)]
fn blank_lines_are_skipped(line: &str) {
    assert!(parse_line(line).unwrap().is_none());
}

#[yare::parameterized(
    plain_text = { "Loading configuration..." },
    truncated  = { r#"{"type":"text","part":{"te"# },
)]
fn malformed_lines_are_errors(line: &str) {
    assert!(parse_line(line).is_err());
}

#[test]
fn surrounding_whitespace_is_trimmed() {
    assert_eq!(parse("  {\"type\":\"step_start\"}  \n"), WorkerEvent::StepStart);
}
