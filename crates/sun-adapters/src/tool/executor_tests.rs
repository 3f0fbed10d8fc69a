// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

fn call(name: &str, arguments: Value) -> ToolCall {
    ToolCall { tool_call_id: "tc-1".into(), name: name.into(), arguments }
}

#[derive(Default)]
struct RecordingConsultant {
    calls: Mutex<Vec<(String, bool)>>,
}

#[async_trait]
impl CheckpointConsultant for RecordingConsultant {
    async fn maybe_snapshot(&self, _workspace: &Path, reason: &str, destructive: bool) {
        self.calls.lock().push((reason.to_string(), destructive));
    }
}

#[tokio::test]
async fn write_then_read_roundtrips_within_workspace() {
    let dir = tempfile::tempdir().unwrap();
    let executor = ToolExecutor::new(dir.path());
    let write = executor.execute(call("write_file", json!({"path": "src/lib.rs", "content": "fn f() {}"}))).await;
    assert!(write.success);
    let read = executor.execute(call("read_file", json!({"path": "src/lib.rs"}))).await;
    assert!(read.success);
    assert_eq!(read.output, "fn f() {}");
}

#[tokio::test]
async fn write_rejects_parent_dir_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let executor = ToolExecutor::new(dir.path());
    let result = executor.execute(call("write_file", json!({"path": "../escape.rs", "content": "x"}))).await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("escapes workspace"));
}

#[tokio::test]
async fn write_rejects_absolute_path() {
    let dir = tempfile::tempdir().unwrap();
    let executor = ToolExecutor::new(dir.path());
    let result = executor.execute(call("write_file", json!({"path": "/etc/passwd", "content": "x"}))).await;
    assert!(!result.success);
}

#[tokio::test]
async fn unknown_tool_name_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let executor = ToolExecutor::new(dir.path());
    let result = executor.execute(call("delete_everything", json!({}))).await;
    assert!(!result.success);
}

#[tokio::test]
async fn run_command_rejects_shell_metacharacters() {
    let dir = tempfile::tempdir().unwrap();
    let executor = ToolExecutor::new(dir.path());
    let result = executor.execute(call("run_command", json!({"command": "cargo build; rm -rf /"}))).await;
    assert!(!result.success);
}

#[tokio::test]
async fn run_command_rejects_binary_outside_allowlist() {
    let dir = tempfile::tempdir().unwrap();
    let executor = ToolExecutor::new(dir.path());
    let result = executor.execute(call("run_command", json!({"command": "curl https://example.com"}))).await;
    assert!(!result.success);
}

#[tokio::test]
async fn write_of_new_file_does_not_consult_checkpoint_engine() {
    let dir = tempfile::tempdir().unwrap();
    let consultant = Arc::new(RecordingConsultant::default());
    let executor = ToolExecutor::new(dir.path()).with_checkpoint_consultant(consultant.clone());
    let result = executor.execute(call("write_file", json!({"path": "new.rs", "content": "x"}))).await;
    assert!(result.success);
    assert!(consultant.calls.lock().is_empty());
}

#[tokio::test]
async fn overwriting_a_file_consults_checkpoint_engine_as_destructive() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("existing.rs"), "old").unwrap();
    let consultant = Arc::new(RecordingConsultant::default());
    let executor = ToolExecutor::new(dir.path()).with_checkpoint_consultant(consultant.clone());
    let result = executor.execute(call("write_file", json!({"path": "existing.rs", "content": "new"}))).await;
    assert!(result.success);
    let calls = consultant.calls.lock();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].1, "overwrite should be reported as destructive");
}

#[tokio::test]
async fn explicit_checkpoint_request_consults_engine_on_a_new_file() {
    let dir = tempfile::tempdir().unwrap();
    let consultant = Arc::new(RecordingConsultant::default());
    let executor = ToolExecutor::new(dir.path()).with_checkpoint_consultant(consultant.clone());
    let result =
        executor.execute(call("write_file", json!({"path": "new.rs", "content": "x", "checkpoint": true}))).await;
    assert!(result.success);
    let calls = consultant.calls.lock();
    assert_eq!(calls.len(), 1);
    assert!(!calls[0].1, "a new file is not destructive even when checkpointed explicitly");
}

#[tokio::test]
async fn run_command_executes_allowlisted_binary() {
    let dir = tempfile::tempdir().unwrap();
    let executor = ToolExecutor::new(dir.path()).with_allowed_command_prefixes(vec!["echo".into()]);
    let result = executor.execute(call("run_command", json!({"command": "echo hello"}))).await;
    assert!(result.success);
    assert_eq!(result.output.trim(), "hello");
}
