// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use sun_core::{EventSource, EventType, RunId};

fn sample() -> AgentEvent {
    AgentEvent::new(EventType::GateStart, RunId::from_string("run-abc"), EventSource::Cli, 42, json!({"gate": "syntax"}))
}

#[test]
fn encode_appends_trailing_newline() {
    let line = encode(&sample()).unwrap();
    assert!(line.ends_with('\n'));
    assert_eq!(line.matches('\n').count(), 1);
}

#[test]
fn decode_line_roundtrips_encode() {
    let encoded = encode(&sample()).unwrap();
    let decoded = decode_line(&encoded).unwrap();
    assert_eq!(decoded.event_type, EventType::GateStart);
    assert_eq!(decoded.run_id.as_str(), "run-abc");
}

#[test]
fn decode_line_rejects_malformed_json() {
    let err = decode_line("not json").unwrap_err();
    assert!(matches!(err, WireError::Json(_)));
}

#[test]
fn decode_line_accepts_unknown_schema_version() {
    let line = r#"{"v":99,"type":"gate_start","run_id":"run-x","source":"cli","timestamp":1,"data":{}}"#;
    let event = decode_line(line).unwrap();
    assert_eq!(event.v, 99);
}
