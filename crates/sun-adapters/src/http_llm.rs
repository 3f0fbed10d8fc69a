// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP-backed `LlmClient` speaking the OpenAI-compatible chat completions
//! wire format with JSON-schema-constrained output. This is the only
//! concrete provider adapter shipped here; swapping providers means
//! implementing [`LlmClient`] again, never changing planning or
//! convergence code (passive-core principle).

use crate::error::AdapterError;
use crate::llm::{CompletionRequest, LlmClient};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

pub struct HttpLlmClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl HttpLlmClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder().timeout(DEFAULT_TIMEOUT).build().unwrap_or_default(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn body(&self, request: &CompletionRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": request.prompt}],
        });
        if let Some(schema) = &request.response_schema {
            body["response_format"] = json!({
                "type": "json_schema",
                "json_schema": {"name": "sunwell_response", "strict": true, "schema": schema},
            });
        }
        body
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Value, AdapterError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.body(&request))
            .send()
            .await
            .map_err(|err| AdapterError::Llm(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AdapterError::Llm(format!("provider returned {status}: {text}")));
        }

        let payload: Value = response.json().await.map_err(|err| AdapterError::Llm(err.to_string()))?;
        let content = payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| AdapterError::Llm("provider response missing choices[0].message.content".to_string()))?;
        serde_json::from_str(content)
            .map_err(|err| AdapterError::Llm(format!("provider returned non-JSON content: {err}")))
    }
}
