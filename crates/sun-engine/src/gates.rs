// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validation Gates: the pipeline the Convergence Loop runs after every
//! tool-dispatch round. A gate either passes or fails; the pipeline stops
//! at the first failure so the loop can feed that single failure back to
//! the model instead of a confusing pile of downstream noise.
//!
//! Every gate — "standard" (syntax, lint, import resolution, unit-test
//! subset) and project-declared custom ones alike — bottoms out in a
//! shell command dispatched through the Tool Executor's sandboxed
//! `run_command`, so gate commands are bound by the same tokenize-then-
//! allowlist policy as every other tool call; there is no separate
//! unsandboxed `sh -c` path for gates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use sun_adapters::{ToolCall, ToolExecutor};
use sun_core::ArtifactSpec;

pub const DEFAULT_GATE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateMessage {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub message: String,
    pub severity: Severity,
}

impl GateMessage {
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { path: path.into(), line: None, message: message.into(), severity: Severity::Error }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    pub status: GateStatus,
    pub messages: Vec<GateMessage>,
}

impl GateResult {
    pub fn pass() -> Self {
        Self { status: GateStatus::Pass, messages: Vec::new() }
    }

    pub fn fail(messages: Vec<GateMessage>) -> Self {
        Self { status: GateStatus::Fail, messages }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self.status, GateStatus::Pass)
    }
}

/// A single validation check over produced artifacts. Must be
/// deterministic on fixed inputs — the Convergence Loop's fixed-point
/// detection compares gate failures across iterations verbatim.
#[async_trait]
pub trait Gate: Send + Sync {
    fn name(&self) -> &str;
    async fn run(&self, workspace: &Path, artifacts: &[ArtifactSpec]) -> GateResult;
}

/// A gate backed by a single shell command run through the sandboxed
/// Tool Executor. Non-zero exit becomes a single `GateMessage` carrying
/// the command's stderr (or stdout, if stderr is empty).
pub struct CommandGate {
    name: String,
    command: String,
    timeout: Duration,
}

impl CommandGate {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self { name: name.into(), command: command.into(), timeout: DEFAULT_GATE_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Gate for CommandGate {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, workspace: &Path, _artifacts: &[ArtifactSpec]) -> GateResult {
        let binary = self.command.split_whitespace().next().unwrap_or_default().to_string();
        let executor = ToolExecutor::new(workspace)
            .with_command_timeout(self.timeout)
            .with_allowed_command_prefixes(vec![binary]);
        let call = ToolCall {
            tool_call_id: format!("gate:{}", self.name),
            name: "run_command".to_string(),
            arguments: json!({"command": self.command}),
        };
        let result = executor.execute(call).await;
        if result.success {
            GateResult::pass()
        } else {
            let message = result.error.unwrap_or_else(|| format!("gate `{}` produced no output", self.command));
            GateResult::fail(vec![GateMessage::error(&self.command, message)])
        }
    }
}

/// Builds the standard gate set from a project's configured toolchain
/// commands. Any entry left `None` is simply omitted from the pipeline —
/// not every project has, say, a separate import-resolution step.
#[derive(Debug, Clone, Default)]
pub struct StandardGateCommands {
    pub syntax: Option<String>,
    pub type_lint: Option<String>,
    pub import_resolution: Option<String>,
    pub unit_tests: Option<String>,
}

pub fn standard_gates(commands: &StandardGateCommands) -> Vec<Arc<dyn Gate>> {
    let mut gates: Vec<Arc<dyn Gate>> = Vec::new();
    if let Some(cmd) = &commands.syntax {
        gates.push(Arc::new(CommandGate::new("syntax", cmd.clone())));
    }
    if let Some(cmd) = &commands.type_lint {
        gates.push(Arc::new(CommandGate::new("type_lint", cmd.clone())));
    }
    if let Some(cmd) = &commands.import_resolution {
        gates.push(Arc::new(CommandGate::new("import_resolution", cmd.clone())));
    }
    if let Some(cmd) = &commands.unit_tests {
        gates.push(Arc::new(CommandGate::new("unit_tests", cmd.clone())));
    }
    gates
}

/// Outcome of running a [`GatePipeline`]: the names of gates that passed,
/// in order, plus the first failure (if any) and its result.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub passed: Vec<String>,
    pub failure: Option<(String, GateResult)>,
}

impl PipelineOutcome {
    pub fn all_passed(&self) -> bool {
        self.failure.is_none()
    }

    /// Flattened failure messages for feeding back to the model as
    /// structured refinement feedback (§4.9).
    pub fn failure_messages(&self) -> &[GateMessage] {
        match &self.failure {
            Some((_, result)) => &result.messages,
            None => &[],
        }
    }
}

pub struct GatePipeline {
    gates: Vec<Arc<dyn Gate>>,
}

impl GatePipeline {
    pub fn new(gates: Vec<Arc<dyn Gate>>) -> Self {
        Self { gates }
    }

    /// Run every gate in order, stopping at the first failure.
    pub async fn run(&self, workspace: &Path, artifacts: &[ArtifactSpec]) -> PipelineOutcome {
        let mut passed = Vec::with_capacity(self.gates.len());
        for gate in &self.gates {
            let result = gate.run(workspace, artifacts).await;
            if result.is_pass() {
                passed.push(gate.name().to_string());
            } else {
                return PipelineOutcome { passed, failure: Some((gate.name().to_string(), result)) };
            }
        }
        PipelineOutcome { passed, failure: None }
    }

    /// Run a single artifact's own `validation_commands`, independently
    /// of the project-level gates above. This is what lets recovery state
    /// (§4.9) mark individual artifacts passed or failed on a run that
    /// fails overall, rather than collapsing every artifact to the same
    /// verdict. An artifact with no `validation_commands` trivially
    /// passes — not every artifact declares its own check.
    pub async fn run_artifact(&self, workspace: &Path, artifact: &ArtifactSpec) -> GateResult {
        if artifact.validation_commands.is_empty() {
            return GateResult::pass();
        }
        let mut messages = Vec::new();
        for command in &artifact.validation_commands {
            let gate = CommandGate::new(format!("validate:{}", artifact.id), command.clone());
            let result = gate.run(workspace, std::slice::from_ref(artifact)).await;
            messages.extend(result.messages);
        }
        if messages.is_empty() {
            GateResult::pass()
        } else {
            GateResult::fail(messages)
        }
    }
}

#[cfg(test)]
#[path = "gates_tests.rs"]
mod tests;
