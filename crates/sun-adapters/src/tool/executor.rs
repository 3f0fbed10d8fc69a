// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool Executor: sandboxed file I/O and command execution for tool calls
//! the LLM emits during a convergence iteration.

use super::tokenize::{contains_unquoted_metachar, tokenize};
use crate::error::AdapterError;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Consulted before every file write, per §4.7's snapshot policy:
/// snapshot when the write is flagged destructive (overwriting an
/// existing file), or when the agent explicitly requests one via the
/// tool call's `checkpoint` argument. The Checkpoint Engine implements
/// this from `sun-storage`; kept as a trait here so the executor never
/// depends on a concrete snapshot store or its `Clock` parameter.
#[async_trait]
pub trait CheckpointConsultant: Send + Sync {
    async fn maybe_snapshot(&self, workspace: &Path, reason: &str, destructive: bool);
}

const DEFAULT_ALLOWED_PREFIXES: &[&str] =
    &["npm", "python", "python3", "cargo", "go", "make", "docker", "pip", "pip3", "uv", "node", "yarn", "pnpm"];

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolCall {
    pub tool_call_id: String,
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub success: bool,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    fn ok(tool_call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self { tool_call_id: tool_call_id.into(), success: true, output: output.into(), error: None }
    }

    fn err(tool_call_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self { tool_call_id: tool_call_id.into(), success: false, output: String::new(), error: Some(error.into()) }
    }
}

/// Sandboxed executor: file writes are confined to the workspace root,
/// command execution is confined to an allowlisted set of binaries with
/// argv validated before any shell-like metacharacter can reach a process.
pub struct ToolExecutor {
    workspace_root: PathBuf,
    allowed_tools: Vec<String>,
    allowed_command_prefixes: Vec<String>,
    command_timeout: Duration,
    checkpoints: Option<Arc<dyn CheckpointConsultant>>,
}

impl ToolExecutor {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            allowed_tools: vec!["read_file".into(), "write_file".into(), "run_command".into()],
            allowed_command_prefixes: DEFAULT_ALLOWED_PREFIXES.iter().map(|s| s.to_string()).collect(),
            command_timeout: Duration::from_secs(120),
            checkpoints: None,
        }
    }

    pub fn with_allowed_command_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.allowed_command_prefixes = prefixes;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_checkpoint_consultant(mut self, consultant: Arc<dyn CheckpointConsultant>) -> Self {
        self.checkpoints = Some(consultant);
        self
    }

    fn canonicalize_within_workspace(&self, relative: &str) -> Result<PathBuf, AdapterError> {
        if Path::new(relative).is_absolute() {
            return Err(AdapterError::PathEscapesWorkspace(relative.to_string()));
        }
        let candidate = self.workspace_root.join(relative);
        let mut normalized = PathBuf::new();
        for component in candidate.components() {
            match component {
                std::path::Component::ParentDir => {
                    return Err(AdapterError::PathEscapesWorkspace(relative.to_string()));
                }
                other => normalized.push(other),
            }
        }
        if !normalized.starts_with(&self.workspace_root) {
            return Err(AdapterError::PathEscapesWorkspace(relative.to_string()));
        }
        Ok(normalized)
    }

    fn validate_command(&self, command: &str) -> Result<Vec<String>, AdapterError> {
        if contains_unquoted_metachar(command) {
            return Err(AdapterError::CommandRejected(command.to_string()));
        }
        let argv = tokenize(command).map_err(|_| AdapterError::CommandRejected(command.to_string()))?;
        let binary = argv.first().ok_or_else(|| AdapterError::CommandRejected(command.to_string()))?;
        if !self.allowed_command_prefixes.iter().any(|p| p == binary) {
            return Err(AdapterError::CommandNotAllowed(binary.clone()));
        }
        Ok(argv)
    }

    /// Validate and run a single tool call. Never panics; every failure
    /// mode (disallowed tool, escaping path, rejected command) becomes a
    /// `success: false` result so the convergence loop can feed it back
    /// to the model as structured failure, not an aborted run.
    pub async fn execute(&self, call: ToolCall) -> ToolResult {
        let span = tracing::info_span!("tool.execute", tool = %call.name, tool_call_id = %call.tool_call_id);
        self.execute_inner(call).instrument(span).await
    }

    async fn execute_inner(&self, call: ToolCall) -> ToolResult {
        if !self.allowed_tools.iter().any(|t| t == &call.name) {
            return ToolResult::err(call.tool_call_id, AdapterError::ToolNotAllowed(call.name).to_string());
        }
        match call.name.as_str() {
            "read_file" => self.read_file(call).await,
            "write_file" => self.write_file(call).await,
            "run_command" => self.run_command(call).await,
            other => ToolResult::err(call.tool_call_id, format!("unhandled tool: {other}")),
        }
    }

    async fn read_file(&self, call: ToolCall) -> ToolResult {
        let Some(path) = call.arguments.get("path").and_then(Value::as_str) else {
            return ToolResult::err(call.tool_call_id, "missing `path` argument");
        };
        match self.canonicalize_within_workspace(path) {
            Ok(resolved) => match tokio::fs::read_to_string(&resolved).await {
                Ok(content) => ToolResult::ok(call.tool_call_id, content),
                Err(err) => ToolResult::err(call.tool_call_id, err.to_string()),
            },
            Err(err) => ToolResult::err(call.tool_call_id, err.to_string()),
        }
    }

    async fn write_file(&self, call: ToolCall) -> ToolResult {
        let (Some(path), Some(content)) = (
            call.arguments.get("path").and_then(Value::as_str),
            call.arguments.get("content").and_then(Value::as_str),
        ) else {
            return ToolResult::err(call.tool_call_id, "missing `path`/`content` argument");
        };
        match self.canonicalize_within_workspace(path) {
            Ok(resolved) => {
                if let Some(consultant) = &self.checkpoints {
                    let destructive = resolved.exists();
                    let explicit = call.arguments.get("checkpoint").and_then(Value::as_bool).unwrap_or(false);
                    if destructive || explicit {
                        consultant.maybe_snapshot(&self.workspace_root, &format!("pre-write: {path}"), destructive).await;
                    }
                }
                if let Some(parent) = resolved.parent() {
                    if let Err(err) = tokio::fs::create_dir_all(parent).await {
                        return ToolResult::err(call.tool_call_id, err.to_string());
                    }
                }
                match tokio::fs::write(&resolved, content).await {
                    Ok(()) => ToolResult::ok(call.tool_call_id, format!("wrote {path}")),
                    Err(err) => ToolResult::err(call.tool_call_id, err.to_string()),
                }
            }
            Err(err) => ToolResult::err(call.tool_call_id, err.to_string()),
        }
    }

    async fn run_command(&self, call: ToolCall) -> ToolResult {
        let Some(command) = call.arguments.get("command").and_then(Value::as_str) else {
            return ToolResult::err(call.tool_call_id, "missing `command` argument");
        };
        let argv = match self.validate_command(command) {
            Ok(argv) => argv,
            Err(err) => return ToolResult::err(call.tool_call_id, err.to_string()),
        };
        let mut process = tokio::process::Command::new(&argv[0]);
        process.args(&argv[1..]).current_dir(&self.workspace_root);
        match tokio::time::timeout(self.command_timeout, process.output()).await {
            Ok(Ok(output)) if output.status.success() => {
                ToolResult::ok(call.tool_call_id, String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(Ok(output)) => ToolResult::err(call.tool_call_id, String::from_utf8_lossy(&output.stderr).into_owned()),
            Ok(Err(err)) => ToolResult::err(call.tool_call_id, err.to_string()),
            Err(_) => ToolResult::err(call.tool_call_id, AdapterError::Timeout(self.command_timeout).to_string()),
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
