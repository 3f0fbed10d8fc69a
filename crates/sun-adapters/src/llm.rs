// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LLM adapter trait. The engine depends only on this trait object, never
//! a concrete provider, keeping provider wiring out of the planning and
//! convergence logic (passive-core principle).

use crate::error::AdapterError;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;

/// A single structured completion request: a prompt plus the JSON schema
/// the caller expects the response to satisfy.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub response_schema: Option<Value>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), response_schema: None }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Issue one completion call. Implementations are responsible for
    /// retries/backoff; callers treat a returned `Err` as non-retriable.
    async fn complete(&self, request: CompletionRequest) -> Result<Value, AdapterError>;
}

/// Canned-response adapter used by engine unit tests, and the default
/// when no provider is configured in a dry-run context.
pub struct FakeLlmClient {
    responses: Mutex<VecDeque<Value>>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl FakeLlmClient {
    pub fn new(responses: impl IntoIterator<Item = Value>) -> Self {
        Self { responses: Mutex::new(responses.into_iter().collect()), calls: Mutex::new(Vec::new()) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl LlmClient for FakeLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Value, AdapterError> {
        self.calls.lock().push(request.clone());
        self.responses
            .lock()
            .pop_front()
            .ok_or_else(|| AdapterError::Llm("fake client exhausted canned responses".into()))
    }
}

#[cfg(test)]
#[path = "llm_tests.rs"]
mod tests;
