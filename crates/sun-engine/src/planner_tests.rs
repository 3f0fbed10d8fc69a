// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use sun_adapters::FakeLlmClient;
use sun_core::{Goal, GoalId, GoalType, TemplateData, TemplateVariable};
use sun_storage::KnowledgeStore;

fn goal(description: &str) -> Goal {
    Goal::new(GoalId::new(), description, GoalType::Task)
}

#[tokio::test]
async fn template_mode_skips_candidate_generation() {
    let knowledge = KnowledgeStore::new();
    knowledge.add_template(TemplateData {
        name: "crud".to_string(),
        match_patterns: vec!["CRUD".to_string()],
        variables: vec![TemplateVariable { name: "entity".to_string(), var_type: "string".to_string(), extraction_hints: vec![] }],
        produces: vec![],
        requires: vec![],
        expected_artifacts: vec!["models/{{entity_lower}}.py".to_string(), "routes/{{entity_lower}}.py".to_string()],
        validation_commands: vec!["python -m py_compile {{entity_lower}}.py".to_string()],
    });
    let llm = FakeLlmClient::new(vec![json!({"entity": "Product"})]);
    let planner = HarmonicPlanner::new(&llm, &knowledge);

    let mut events = Vec::new();
    let (graph, metrics) = planner
        .plan_with_metrics(&goal("Add CRUD endpoints for Product"), None, 5, |label, data| events.push((label.to_string(), data)))
        .await
        .unwrap();

    assert_eq!(metrics.mode, PlanMode::Template);
    assert_eq!(metrics.candidates_generated, 0);
    assert_eq!(graph.len(), 2);
    let paths: Vec<&String> = graph.nodes().iter().flat_map(|n| &n.produces).collect();
    assert!(paths.contains(&&"models/product.py".to_string()));
    assert!(paths.contains(&&"routes/product.py".to_string()));
    assert!(events.iter().any(|(label, _)| label == "template_matched"));
    assert!(!events.iter().any(|(label, _)| label.starts_with("plan_candidate")));
}

fn candidate_json(paths: &[&str]) -> serde_json::Value {
    let artifacts: Vec<serde_json::Value> = paths
        .iter()
        .map(|p| json!({"description": format!("produce {p}"), "produces": [p], "requires": [], "validation_commands": []}))
        .collect();
    json!({"artifacts": artifacts})
}

#[tokio::test]
async fn standard_mode_picks_fewer_artifact_candidate_on_tie() {
    let knowledge = KnowledgeStore::new();
    let llm = FakeLlmClient::new(vec![
        candidate_json(&["a.py", "b.py"]),
        candidate_json(&["a.py"]),
    ]);
    let planner = HarmonicPlanner::new(&llm, &knowledge).with_candidates(2).with_refinement_rounds(0);

    let (graph, metrics) = planner
        .plan_with_metrics(&goal("build a thing"), None, 5, |_, _| {})
        .await
        .unwrap();

    assert_eq!(metrics.mode, PlanMode::Standard);
    assert_eq!(metrics.candidates_generated, 2);
    assert_eq!(graph.len(), 1);
}

#[tokio::test]
async fn standard_mode_errors_when_every_candidate_is_malformed() {
    let knowledge = KnowledgeStore::new();
    let llm = FakeLlmClient::new(vec![json!("not an artifact graph"), json!(42)]);
    let planner = HarmonicPlanner::new(&llm, &knowledge).with_candidates(2).with_refinement_rounds(0);

    let result = planner.plan_with_metrics(&goal("build a thing"), None, 5, |_, _| {}).await;
    assert!(result.is_err());
}
