// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Convergence Loop: generate → validate → refine until every gate
//! passes (COMPLETE), the iteration cap is hit, or two successive
//! iterations produce identical artifact content and gate failures
//! (ESCALATE, `non_progressing`). Cancellation is checked at every
//! suspension point — between the LLM call and tool dispatch, and
//! between tool dispatch and gate evaluation — so a cancelled run always
//! saves recovery state instead of silently dropping work.

use crate::error::EngineError;
use crate::gates::GatePipeline;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::path::Path;
use sun_adapters::{CompletionRequest, LlmClient, ToolCall, ToolExecutor};
use sun_core::{
    ArtifactGraph, ArtifactSpec, Clock, Goal, IterationRecord, RecoveryArtifact, RecoveryState, RecoveryStatus, RunId,
};
use sun_storage::RecoveryStore;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationReason {
    MaxIterations,
    NonProgressing,
}

impl EscalationReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MaxIterations => "max_iterations",
            Self::NonProgressing => "non_progressing",
        }
    }
}

#[derive(Debug)]
pub enum ConvergenceOutcome {
    Complete { artifacts: Vec<RecoveryArtifact> },
    Escalated { recovery: RecoveryState, reason: EscalationReason },
    Cancelled { recovery: RecoveryState },
}

#[derive(Debug, Deserialize, Default)]
struct ToolCallDto {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize, Default)]
struct ToolCallBatchDto {
    #[serde(default)]
    tool_calls: Vec<ToolCallDto>,
}

fn tool_call_batch_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "tool_calls": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "arguments": {"type": "object"}
                    },
                    "required": ["name"]
                }
            }
        },
        "required": ["tool_calls"]
    })
}

async fn read_artifact_content(workspace: &Path, artifact: &ArtifactSpec) -> Option<String> {
    for pattern in &artifact.produces {
        if let Ok(content) = tokio::fs::read_to_string(workspace.join(pattern)).await {
            return Some(content);
        }
    }
    None
}

async fn content_hashes(workspace: &Path, graph: &ArtifactGraph) -> Vec<(String, String)> {
    let mut hashes = Vec::with_capacity(graph.len());
    for artifact in graph.nodes() {
        let content = read_artifact_content(workspace, artifact).await.unwrap_or_default();
        let hash = format!("{:x}", Sha256::digest(content.as_bytes()));
        hashes.push((artifact.id.to_string(), hash));
    }
    hashes
}

/// Build the recovery snapshot for every artifact in the graph, per
/// §4.9: an artifact with no file on disk yet is `Waiting` (either never
/// attempted or blocked on a dependency); a produced artifact is
/// `Passed` or `Failed` based on its own `validation_commands`, run
/// through `gates` independently of the project-level pipeline result —
/// this is what makes partial-failure summaries like `{passed: 2,
/// failed: 1, waiting: 2}` possible instead of an all-or-nothing verdict.
async fn recovery_artifacts(
    workspace: &Path,
    graph: &ArtifactGraph,
    gates: &GatePipeline,
    failure_text: &[String],
) -> Vec<RecoveryArtifact> {
    let mut artifacts = Vec::with_capacity(graph.len());
    for node in graph.nodes() {
        let content = read_artifact_content(workspace, node).await;
        let path = node.produces.first().cloned().unwrap_or_else(|| node.id.to_string());
        let (status, errors) = match &content {
            None => (RecoveryStatus::Waiting, Vec::new()),
            Some(_) => {
                let result = gates.run_artifact(workspace, node).await;
                if result.is_pass() {
                    (RecoveryStatus::Passed, Vec::new())
                } else {
                    let messages: Vec<String> = result.messages.iter().map(|m| m.message.clone()).collect();
                    let errors = if messages.is_empty() { failure_text.to_vec() } else { messages };
                    (RecoveryStatus::Failed, errors)
                }
            }
        };
        artifacts.push(RecoveryArtifact {
            path,
            content: content.unwrap_or_default(),
            status,
            errors,
            depends_on: node.requires.iter().map(|r| r.to_string()).collect(),
        });
    }
    artifacts
}

pub struct ConvergenceLoop<'a, L: LlmClient, C: Clock> {
    llm: &'a L,
    tools: &'a ToolExecutor,
    gates: &'a GatePipeline,
    recovery_store: &'a RecoveryStore,
    clock: &'a C,
    max_iterations: u32,
    fixed_point_detection: bool,
}

impl<'a, L: LlmClient, C: Clock> ConvergenceLoop<'a, L, C> {
    pub fn new(llm: &'a L, tools: &'a ToolExecutor, gates: &'a GatePipeline, recovery_store: &'a RecoveryStore, clock: &'a C) -> Self {
        Self {
            llm,
            tools,
            gates,
            recovery_store,
            clock,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            fixed_point_detection: true,
        }
    }

    pub fn with_max_iterations(mut self, n: u32) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_fixed_point_detection(mut self, enabled: bool) -> Self {
        self.fixed_point_detection = enabled;
        self
    }

    fn build_prompt(goal: &Goal, graph: &ArtifactGraph, feedback: Option<&str>) -> String {
        let graph_json = serde_json::to_string(graph).unwrap_or_default();
        match feedback {
            Some(fb) => format!(
                "Goal: {}\nArtifact graph: {graph_json}\nThe previous attempt failed validation with:\n{fb}\n\
                 Emit tool_calls to fix the failing artifacts.",
                goal.description
            ),
            None => format!(
                "Goal: {}\nArtifact graph: {graph_json}\nEmit tool_calls to produce every artifact in the graph.",
                goal.description
            ),
        }
    }

    fn parse_tool_calls(response: Value, iteration: u32) -> Result<Vec<ToolCall>, EngineError> {
        let dto: ToolCallBatchDto = serde_json::from_value(response)
            .map_err(|err| EngineError::Convergence(format!("malformed tool call batch: {err}")))?;
        Ok(dto
            .tool_calls
            .into_iter()
            .enumerate()
            .map(|(index, call)| ToolCall {
                tool_call_id: format!("iter-{iteration}-{index}"),
                name: call.name,
                arguments: call.arguments,
            })
            .collect())
    }

    async fn save_recovery(
        &self,
        goal: &Goal,
        run_id: RunId,
        artifacts: Vec<RecoveryArtifact>,
        failed_gate: Option<String>,
        failure_reason: Option<String>,
        history: Vec<IterationRecord>,
    ) -> Result<RecoveryState, EngineError> {
        let now = self.clock.epoch_ms();
        let mut state = RecoveryStore::create_from_execution(goal.clone(), artifacts, run_id, failed_gate, failure_reason, now);
        state.iteration_history = history;
        self.recovery_store.save(&state)?;
        Ok(state)
    }

    /// Run the loop to completion, escalation, or cancellation. `emit`
    /// receives a label and a JSON payload for every state transition —
    /// the orchestrator wraps these into `AgentEvent`s on the run stream.
    pub async fn run(
        &self,
        goal: &Goal,
        graph: &ArtifactGraph,
        run_id: RunId,
        workspace: &Path,
        cancel: &CancellationToken,
        mut emit: impl FnMut(&str, Value),
    ) -> Result<ConvergenceOutcome, EngineError> {
        let mut history: Vec<IterationRecord> = Vec::new();
        let mut feedback: Option<String> = None;
        let mut iteration: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                let artifacts = recovery_artifacts(workspace, graph, self.gates, &[]).await;
                let recovery =
                    self.save_recovery(goal, run_id, artifacts, None, Some("cancelled".to_string()), history).await?;
                return Ok(ConvergenceOutcome::Cancelled { recovery });
            }

            iteration += 1;
            emit("convergence_iter", json!({"iteration": iteration}));

            let prompt = Self::build_prompt(goal, graph, feedback.as_deref());
            let response = self.llm.complete(CompletionRequest::new(prompt).with_schema(tool_call_batch_schema())).await?;
            let calls = Self::parse_tool_calls(response, iteration)?;

            if cancel.is_cancelled() {
                let artifacts = recovery_artifacts(workspace, graph, self.gates, &[]).await;
                let recovery =
                    self.save_recovery(goal, run_id, artifacts, None, Some("cancelled".to_string()), history).await?;
                return Ok(ConvergenceOutcome::Cancelled { recovery });
            }

            let dispatches = calls.into_iter().map(|call| self.tools.execute(call));
            let _results = join_all(dispatches).await;

            if cancel.is_cancelled() {
                let artifacts = recovery_artifacts(workspace, graph, self.gates, &[]).await;
                let recovery =
                    self.save_recovery(goal, run_id, artifacts, None, Some("cancelled".to_string()), history).await?;
                return Ok(ConvergenceOutcome::Cancelled { recovery });
            }

            let pipeline_outcome = self.gates.run(workspace, graph.nodes()).await;
            let hashes = content_hashes(workspace, graph).await;
            let failure_text: Vec<String> = pipeline_outcome.failure_messages().iter().map(|m| m.message.clone()).collect();
            let artifacts = recovery_artifacts(workspace, graph, self.gates, &failure_text).await;
            let all_passed = pipeline_outcome.all_passed() && artifacts.iter().all(|a| a.status == RecoveryStatus::Passed);

            if all_passed {
                emit("task_complete", json!({"iteration": iteration}));
                return Ok(ConvergenceOutcome::Complete { artifacts });
            }

            let failed_gate = pipeline_outcome.failure.as_ref().map(|(name, _)| name.clone()).or_else(|| {
                artifacts.iter().find(|a| a.status == RecoveryStatus::Failed).map(|a| format!("validate:{}", a.path))
            });
            emit("gate_fail", json!({"iteration": iteration, "gate": failed_gate}));

            let record = IterationRecord { iteration, gate_failures: failure_text.clone(), content_hashes: hashes.clone() };

            if self.fixed_point_detection {
                if let Some(previous) = history.last() {
                    if previous.content_hashes == record.content_hashes && previous.gate_failures == record.gate_failures {
                        emit("convergence_escalated", json!({"reason": EscalationReason::NonProgressing.as_str()}));
                        let recovery = self
                            .save_recovery(
                                goal,
                                run_id,
                                artifacts,
                                failed_gate.clone(),
                                Some("non-progressing across iterations".to_string()),
                                history,
                            )
                            .await?;
                        return Ok(ConvergenceOutcome::Escalated { recovery, reason: EscalationReason::NonProgressing });
                    }
                }
            }

            history.push(record);
            feedback = Some(failure_text.join("\n"));

            if iteration >= self.max_iterations {
                emit("convergence_escalated", json!({"reason": EscalationReason::MaxIterations.as_str()}));
                let recovery = self
                    .save_recovery(
                        goal,
                        run_id,
                        artifacts,
                        failed_gate,
                        Some("iteration cap reached".to_string()),
                        history,
                    )
                    .await?;
                return Ok(ConvergenceOutcome::Escalated { recovery, reason: EscalationReason::MaxIterations });
            }
        }
    }
}

#[cfg(test)]
#[path = "convergence_tests.rs"]
mod tests;
