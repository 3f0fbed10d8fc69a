// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adaptive Router: classifies a goal into one of five execution
//! strategies from a single structured LLM call. Routing is a pure,
//! short-circuiting decision table over the returned signals — no
//! branch here makes its own LLM call.

use crate::error::EngineError;
use serde::Deserialize;
use serde_json::json;
use sun_adapters::{CompletionRequest, LlmClient};
use sun_core::Goal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Stop,
    Dialectic,
    Hierarchical,
    Harmonic,
    SingleShot,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutingSignals {
    pub is_dangerous: bool,
    pub is_ambiguous: bool,
    pub is_epic: bool,
    pub complexity: String,
    pub confidence: f32,
}

#[derive(Debug, Clone)]
pub struct RoutingDecision {
    pub route: Route,
    pub signals: RoutingSignals,
}

fn signals_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "is_dangerous": {"type": "boolean"},
            "is_ambiguous": {"type": "boolean"},
            "is_epic": {"type": "boolean"},
            "complexity": {"type": "string", "enum": ["low", "medium", "high"]},
            "confidence": {"type": "number"}
        },
        "required": ["is_dangerous", "is_ambiguous", "is_epic", "complexity", "confidence"]
    })
}

/// Short-circuiting routing table from §4.11: dangerous beats ambiguous
/// beats epic beats the single-shot fast path; anything left over
/// (including genuine ties) lands on HARMONIC, the safe center of the
/// spectrum.
fn route_from_signals(signals: &RoutingSignals) -> Route {
    if signals.is_dangerous {
        Route::Stop
    } else if signals.is_ambiguous {
        Route::Dialectic
    } else if signals.is_epic {
        Route::Hierarchical
    } else if signals.complexity.eq_ignore_ascii_case("low") && signals.confidence >= 0.8 {
        Route::SingleShot
    } else {
        Route::Harmonic
    }
}

pub struct AdaptiveRouter<'a, L: LlmClient> {
    llm: &'a L,
}

impl<'a, L: LlmClient> AdaptiveRouter<'a, L> {
    pub fn new(llm: &'a L) -> Self {
        Self { llm }
    }

    pub async fn classify(&self, goal: &Goal) -> Result<RoutingDecision, EngineError> {
        let prompt = format!(
            "Classify this goal. Return is_dangerous, is_ambiguous, is_epic (boolean), complexity \
             (low/medium/high), and your confidence (0-1).\nGoal: {}",
            goal.description
        );
        let response = self.llm.complete(CompletionRequest::new(prompt).with_schema(signals_schema())).await?;
        let signals: RoutingSignals = serde_json::from_value(response)
            .map_err(|err| EngineError::Routing(format!("malformed routing signals: {err}")))?;
        let route = route_from_signals(&signals);
        Ok(RoutingDecision { route, signals })
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
