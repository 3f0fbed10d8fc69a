// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn serializes_to_spec_wire_shape() {
    let event = AgentEvent::new(
        EventType::TaskComplete,
        RunId::from_string("run-abc"),
        EventSource::Cli,
        1_700_000_000,
        json!({"artifact_count": 3}),
    );
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["v"], 1);
    assert_eq!(value["type"], "task_complete");
    assert_eq!(value["source"], "cli");
    assert_eq!(value["data"]["artifact_count"], 3);
}

#[test]
fn deserializes_from_ndjson_line() {
    let line = r#"{"v":1,"type":"gate_pass","run_id":"run-xyz","source":"api","timestamp":5,"data":{}}"#;
    let event: AgentEvent = serde_json::from_str(line).unwrap();
    assert_eq!(event.event_type, EventType::GatePass);
    assert_eq!(event.run_id.as_str(), "run-xyz");
}
