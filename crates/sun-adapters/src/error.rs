// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("llm call failed: {0}")]
    Llm(String),
    #[error("embedding call failed: {0}")]
    Embedding(String),
    #[error("tool not in allowlist: {0}")]
    ToolNotAllowed(String),
    #[error("path escapes workspace: {0}")]
    PathEscapesWorkspace(String),
    #[error("command rejected: {0}")]
    CommandRejected(String),
    #[error("command binary not allowed: {0}")]
    CommandNotAllowed(String),
    #[error("tool execution I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("tool call timed out after {0:?}")]
    Timeout(std::time::Duration),
}
