// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use sun_adapters::FakeLlmClient;
use sun_core::{Goal, GoalId, GoalType};

fn goal() -> Goal {
    Goal::new(GoalId::new(), "do a thing", GoalType::Task)
}

async fn classify_with(signals: serde_json::Value) -> RoutingDecision {
    let llm = FakeLlmClient::new(vec![signals]);
    AdaptiveRouter::new(&llm).classify(&goal()).await.unwrap()
}

#[tokio::test]
async fn dangerous_beats_everything() {
    let decision = classify_with(json!({
        "is_dangerous": true, "is_ambiguous": true, "is_epic": true, "complexity": "low", "confidence": 0.9
    }))
    .await;
    assert_eq!(decision.route, Route::Stop);
}

#[tokio::test]
async fn ambiguous_beats_epic_and_single_shot() {
    let decision = classify_with(json!({
        "is_dangerous": false, "is_ambiguous": true, "is_epic": true, "complexity": "low", "confidence": 0.9
    }))
    .await;
    assert_eq!(decision.route, Route::Dialectic);
}

#[tokio::test]
async fn epic_routes_hierarchical() {
    let decision = classify_with(json!({
        "is_dangerous": false, "is_ambiguous": false, "is_epic": true, "complexity": "high", "confidence": 0.5
    }))
    .await;
    assert_eq!(decision.route, Route::Hierarchical);
}

#[tokio::test]
async fn low_complexity_high_confidence_is_single_shot() {
    let decision = classify_with(json!({
        "is_dangerous": false, "is_ambiguous": false, "is_epic": false, "complexity": "low", "confidence": 0.85
    }))
    .await;
    assert_eq!(decision.route, Route::SingleShot);
}

#[tokio::test]
async fn low_confidence_defaults_to_harmonic() {
    let decision = classify_with(json!({
        "is_dangerous": false, "is_ambiguous": false, "is_epic": false, "complexity": "low", "confidence": 0.4
    }))
    .await;
    assert_eq!(decision.route, Route::Harmonic);
}

#[tokio::test]
async fn malformed_signals_is_an_error() {
    let llm = FakeLlmClient::new(vec![json!("not signals")]);
    let result = AdaptiveRouter::new(&llm).classify(&goal()).await;
    assert!(result.is_err());
}
