// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use sun_adapters::FakeLlmClient;
use sun_core::{Goal, GoalId, GoalType};

fn epic(description: &str) -> Goal {
    Goal::new(GoalId::new(), description, GoalType::Epic)
}

fn milestone_response(titles: &[&str]) -> serde_json::Value {
    let milestones: Vec<serde_json::Value> =
        titles.iter().map(|t| json!({"title": t, "description": format!("do {t}"), "requires": []})).collect();
    json!({"milestones": milestones})
}

#[test]
fn detect_domain_matches_software_keywords() {
    assert_eq!(detect_domain(&epic("build a CRUD API for products")), Domain::Software);
    assert_eq!(detect_domain(&epic("write a novel about dragons")), Domain::Novel);
    assert_eq!(detect_domain(&epic("research the history of tea")), Domain::Research);
    assert_eq!(detect_domain(&epic("plan a birthday party")), Domain::General);
}

#[tokio::test]
async fn decompose_accepts_valid_first_attempt() {
    let titles = ["models", "routes", "tests", "docs", "deploy"];
    let llm = FakeLlmClient::new(vec![milestone_response(&titles)]);
    let decomposer = EpicDecomposer::new(&llm);
    let milestones = decomposer.decompose(&epic("build a CRUD API")).await.unwrap();
    assert_eq!(milestones.len(), 5);
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn decompose_retries_once_then_succeeds() {
    let too_few = milestone_response(&["only", "two"]);
    let titles = ["a", "b", "c", "d", "e"];
    let llm = FakeLlmClient::new(vec![too_few, milestone_response(&titles)]);
    let decomposer = EpicDecomposer::new(&llm);
    let milestones = decomposer.decompose(&epic("build something big")).await.unwrap();
    assert_eq!(milestones.len(), 5);
    assert_eq!(llm.call_count(), 2);
}

#[tokio::test]
async fn decompose_fails_after_second_invalid_attempt() {
    let too_few = milestone_response(&["only", "two"]);
    let llm = FakeLlmClient::new(vec![too_few.clone(), too_few]);
    let decomposer = EpicDecomposer::new(&llm);
    let result = decomposer.decompose(&epic("build something big")).await;
    assert!(result.is_err());
    assert_eq!(llm.call_count(), 2);
}

#[test]
fn validate_milestones_rejects_unresolved_requirement() {
    let m1 = Goal::new(GoalId::new(), "m1", GoalType::Milestone).requires(vec![GoalId::new()]);
    let milestones: Vec<Goal> = (0..5).map(|i| if i == 0 { m1.clone() } else { Goal::new(GoalId::new(), "x", GoalType::Milestone) }).collect();
    assert!(validate_milestones(&milestones).is_err());
}

#[test]
fn milestone_tracker_advances_in_order() {
    let milestones = vec![
        Goal::new(GoalId::new(), "first", GoalType::Milestone),
        Goal::new(GoalId::new(), "second", GoalType::Milestone),
    ];
    let mut tracker = MilestoneTracker::new(milestones);
    assert_eq!(tracker.active().unwrap().description, "first");
    tracker.advance();
    assert_eq!(tracker.active().unwrap().description, "second");
    assert_eq!(tracker.remaining(), 1);
    tracker.advance();
    assert!(tracker.is_complete());
}
