// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use std::sync::Arc;
use sun_adapters::FakeLlmClient;
use sun_core::{ArtifactId, FakeClock, Goal, GoalId, GoalType};
use sun_storage::RecoveryStore;
use crate::CommandGate;

fn goal() -> Goal {
    Goal::new(GoalId::new(), "write a greeting file", GoalType::Task)
}

fn write_call(path: &str, content: &str) -> serde_json::Value {
    json!({"tool_calls": [{"name": "write_file", "arguments": {"path": path, "content": content}}]})
}

fn write_calls(files: &[(&str, &str)]) -> serde_json::Value {
    let calls: Vec<serde_json::Value> =
        files.iter().map(|(path, content)| json!({"name": "write_file", "arguments": {"path": path, "content": content}})).collect();
    json!({"tool_calls": calls})
}

#[tokio::test]
async fn completes_on_first_pass() {
    let dir = tempfile::tempdir().unwrap();
    let llm = FakeLlmClient::new(vec![write_call("hello.txt", "hi")]);
    let tools = ToolExecutor::new(dir.path()).with_allowed_command_prefixes(vec!["echo".to_string()]);
    let pipeline = GatePipeline::new(vec![Arc::new(CommandGate::new("syntax", "echo ok"))]);
    let recovery_store = RecoveryStore::new(dir.path());
    let clock = FakeClock::new();
    let graph = ArtifactGraph::new(vec![ArtifactSpec::new(ArtifactId::new(), "greeting").produces(vec!["hello.txt".to_string()])]);

    let loop_ = ConvergenceLoop::new(&llm, &tools, &pipeline, &recovery_store, &clock);
    let token = CancellationToken::new();
    let mut events = Vec::new();
    let outcome = loop_.run(&goal(), &graph, RunId::new(), dir.path(), &token, |label, data| events.push((label.to_string(), data))).await.unwrap();

    match outcome {
        ConvergenceOutcome::Complete { artifacts } => {
            assert_eq!(artifacts.len(), 1);
            assert_eq!(artifacts[0].status, RecoveryStatus::Passed);
        }
        other => panic!("expected Complete, got {other:?}"),
    }
    assert!(events.iter().any(|(label, _)| label == "task_complete"));
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn escalates_at_max_iterations() {
    let dir = tempfile::tempdir().unwrap();
    let responses: Vec<serde_json::Value> = (0..3).map(|_| write_call("hello.txt", "hi")).collect();
    let llm = FakeLlmClient::new(responses);
    let tools = ToolExecutor::new(dir.path()).with_allowed_command_prefixes(vec!["false".to_string()]);
    let pipeline = GatePipeline::new(vec![Arc::new(CommandGate::new("syntax", "false"))]);
    let recovery_store = RecoveryStore::new(dir.path());
    let clock = FakeClock::new();
    let graph = ArtifactGraph::new(vec![ArtifactSpec::new(ArtifactId::new(), "greeting").produces(vec!["hello.txt".to_string()])]);

    let loop_ = ConvergenceLoop::new(&llm, &tools, &pipeline, &recovery_store, &clock).with_max_iterations(3).with_fixed_point_detection(false);
    let token = CancellationToken::new();
    let outcome = loop_.run(&goal(), &graph, RunId::new(), dir.path(), &token, |_, _| {}).await.unwrap();

    match outcome {
        ConvergenceOutcome::Escalated { reason, recovery } => {
            assert_eq!(reason, EscalationReason::MaxIterations);
            assert_eq!(recovery.iteration_history.len(), 3);
            let loaded = recovery_store.load(&recovery.goal_hash).unwrap();
            assert_eq!(loaded.goal_hash, recovery.goal_hash);
        }
        other => panic!("expected Escalated, got {other:?}"),
    }
    assert_eq!(llm.call_count(), 3);
}

#[tokio::test]
async fn escalates_on_non_progressing_fixed_point() {
    let dir = tempfile::tempdir().unwrap();
    let responses: Vec<serde_json::Value> = (0..5).map(|_| write_call("hello.txt", "same content every time")).collect();
    let llm = FakeLlmClient::new(responses);
    let tools = ToolExecutor::new(dir.path()).with_allowed_command_prefixes(vec!["false".to_string()]);
    let pipeline = GatePipeline::new(vec![Arc::new(CommandGate::new("syntax", "false"))]);
    let recovery_store = RecoveryStore::new(dir.path());
    let clock = FakeClock::new();
    let graph = ArtifactGraph::new(vec![ArtifactSpec::new(ArtifactId::new(), "greeting").produces(vec!["hello.txt".to_string()])]);

    let loop_ = ConvergenceLoop::new(&llm, &tools, &pipeline, &recovery_store, &clock).with_max_iterations(5);
    let token = CancellationToken::new();
    let outcome = loop_.run(&goal(), &graph, RunId::new(), dir.path(), &token, |_, _| {}).await.unwrap();

    match outcome {
        ConvergenceOutcome::Escalated { reason, .. } => assert_eq!(reason, EscalationReason::NonProgressing),
        other => panic!("expected Escalated(NonProgressing), got {other:?}"),
    }
    assert_eq!(llm.call_count(), 2);
}

#[tokio::test]
async fn cancellation_before_generate_saves_recovery() {
    let dir = tempfile::tempdir().unwrap();
    let llm = FakeLlmClient::new(vec![write_call("hello.txt", "hi")]);
    let tools = ToolExecutor::new(dir.path());
    let pipeline = GatePipeline::new(vec![]);
    let recovery_store = RecoveryStore::new(dir.path());
    let clock = FakeClock::new();
    let graph = ArtifactGraph::new(vec![ArtifactSpec::new(ArtifactId::new(), "greeting").produces(vec!["hello.txt".to_string()])]);

    let loop_ = ConvergenceLoop::new(&llm, &tools, &pipeline, &recovery_store, &clock);
    let token = CancellationToken::new();
    token.cancel();
    let outcome = loop_.run(&goal(), &graph, RunId::new(), dir.path(), &token, |_, _| {}).await.unwrap();

    assert!(matches!(outcome, ConvergenceOutcome::Cancelled { .. }));
    assert_eq!(llm.call_count(), 0);
}

/// S3 (§8): a 5-artifact graph where only artifact 3's own
/// `validation_commands` fails. The project-level gate still passes, so
/// this exercises the per-artifact path in `recovery_artifacts`
/// independently of the pipeline-wide outcome: two artifacts with no
/// on-disk content are `waiting` (never attempted, since the agent only
/// produced the three it had enough information for), one produced
/// artifact fails its own check, and the other two produced artifacts
/// pass theirs.
#[tokio::test]
async fn partial_failure_marks_per_artifact_status() {
    let dir = tempfile::tempdir().unwrap();
    let response = write_calls(&[("a1.txt", "ok"), ("a2.txt", "ok"), ("a3.txt", "broken")]);
    let llm = FakeLlmClient::new(vec![response]);
    let tools = ToolExecutor::new(dir.path()).with_allowed_command_prefixes(vec!["echo".to_string(), "false".to_string()]);
    let pipeline = GatePipeline::new(vec![Arc::new(CommandGate::new("syntax", "echo ok"))]);
    let recovery_store = RecoveryStore::new(dir.path());
    let clock = FakeClock::new();

    let a3 = ArtifactId::new();
    let graph = ArtifactGraph::new(vec![
        ArtifactSpec::new(ArtifactId::new(), "artifact one").produces(vec!["a1.txt".to_string()]),
        ArtifactSpec::new(ArtifactId::new(), "artifact two").produces(vec!["a2.txt".to_string()]),
        ArtifactSpec::new(a3, "artifact three").produces(vec!["a3.txt".to_string()]).validation_commands(vec!["false".to_string()]),
        ArtifactSpec::new(ArtifactId::new(), "artifact four").produces(vec!["a4.txt".to_string()]).requires(vec![a3]),
        ArtifactSpec::new(ArtifactId::new(), "artifact five").produces(vec!["a5.txt".to_string()]).requires(vec![a3]),
    ]);

    let loop_ =
        ConvergenceLoop::new(&llm, &tools, &pipeline, &recovery_store, &clock).with_max_iterations(1).with_fixed_point_detection(false);
    let token = CancellationToken::new();
    let outcome = loop_.run(&goal(), &graph, RunId::new(), dir.path(), &token, |_, _| {}).await.unwrap();

    match outcome {
        ConvergenceOutcome::Escalated { recovery, reason } => {
            assert_eq!(reason, EscalationReason::MaxIterations);
            let counts = recovery.status_counts();
            assert_eq!(counts.passed, 2);
            assert_eq!(counts.failed, 1);
            assert_eq!(counts.waiting, 2);
        }
        other => panic!("expected Escalated, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_tool_call_batch_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let llm = FakeLlmClient::new(vec![json!("not a batch")]);
    let tools = ToolExecutor::new(dir.path());
    let pipeline = GatePipeline::new(vec![]);
    let recovery_store = RecoveryStore::new(dir.path());
    let clock = FakeClock::new();
    let graph = ArtifactGraph::new(vec![]);

    let loop_ = ConvergenceLoop::new(&llm, &tools, &pipeline, &recovery_store, &clock);
    let token = CancellationToken::new();
    let result = loop_.run(&goal(), &graph, RunId::new(), dir.path(), &token, |_, _| {}).await;
    assert!(result.is_err());
}
