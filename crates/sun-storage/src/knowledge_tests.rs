// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn add_learning_is_idempotent_by_category_and_fact() {
    let store = KnowledgeStore::new();
    let id1 = store.add_learning("uses postgres", LearningCategory::Fact, 0.6, 0);
    let id2 = store.add_learning("uses postgres", LearningCategory::Fact, 0.9, 10);
    assert_eq!(id1, id2);
}

#[test]
fn retrieval_discards_low_score_learnings() {
    let store = KnowledgeStore::new();
    store.add_learning("completely unrelated trivia about birds", LearningCategory::Fact, 0.9, 0);
    let ctx = store.retrieve_for_planning("add a CRUD endpoint for products", None, 5);
    assert!(ctx.by_category.is_empty());
}

#[test]
fn retrieval_buckets_by_category_and_truncates() {
    let store = KnowledgeStore::new();
    for i in 0..8 {
        store.add_learning(format!("add crud endpoint variant {i}"), LearningCategory::Pattern, 0.9, 0);
    }
    let ctx = store.retrieve_for_planning("add crud endpoint", None, 5);
    assert_eq!(ctx.by_category.get(&LearningCategory::Pattern).map(Vec::len), Some(5));
}

#[test]
fn record_usage_updates_confidence_for_future_retrieval() {
    let store = KnowledgeStore::new();
    let id = store.add_learning("add crud endpoint for products", LearningCategory::Pattern, 0.5, 0);
    store.record_usage(id, true, 10);
    let ctx = store.retrieve_for_planning("add crud endpoint", None, 5);
    let learning = ctx.by_category.get(&LearningCategory::Pattern).and_then(|v| v.first()).unwrap();
    assert!((learning.confidence - 0.55).abs() < f32::EPSILON);
}

#[test]
fn matching_template_finds_pattern_hit() {
    let store = KnowledgeStore::new();
    store.add_template(TemplateData {
        name: "crud".into(),
        match_patterns: vec!["crud".into()],
        variables: vec![],
        produces: vec![],
        requires: vec![],
        expected_artifacts: vec![],
        validation_commands: vec![],
    });
    assert!(store.matching_template("Add CRUD endpoints").is_some());
    assert!(store.matching_template("write a haiku").is_none());
}

#[test]
fn save_then_load_round_trips_learnings_and_templates() {
    let dir = tempfile::tempdir().unwrap();
    let store = KnowledgeStore::new();
    store.add_learning("uses postgres", LearningCategory::Fact, 0.6, 0);
    store.add_template(TemplateData {
        name: "crud".into(),
        match_patterns: vec!["crud".into()],
        variables: vec![],
        produces: vec![],
        requires: vec![],
        expected_artifacts: vec![],
        validation_commands: vec![],
    });
    store.save(dir.path()).unwrap();

    let reloaded = KnowledgeStore::load(dir.path()).unwrap();
    let ctx = reloaded.retrieve_for_planning("uses postgres", None, 5);
    assert_eq!(ctx.by_category.get(&LearningCategory::Fact).map(Vec::len), Some(1));
    assert!(reloaded.matching_template("crud endpoint").is_some());
}

#[test]
fn load_missing_file_yields_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = KnowledgeStore::load(dir.path()).unwrap();
    assert!(store.get_templates().is_empty());
}
