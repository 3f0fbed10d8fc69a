// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn identity_is_category_and_fact() {
    let id1 = LearningId::of(LearningCategory::Fact, "uses postgres");
    let id2 = LearningId::of(LearningCategory::Fact, "uses postgres");
    let id3 = LearningId::of(LearningCategory::Constraint, "uses postgres");
    assert_eq!(id1, id2);
    assert_ne!(id1, id3);
}

#[test]
fn new_derives_id_from_fact_and_category() {
    let l = Learning::new("uses postgres", LearningCategory::Fact, 0.5, 0);
    assert_eq!(l.id, LearningId::of(LearningCategory::Fact, "uses postgres"));
}

#[test]
fn record_usage_success_increments_and_caps() {
    let mut l = Learning::new("x", LearningCategory::Pattern, 0.98, 0);
    l.record_usage(true, 100);
    assert!((l.confidence - 1.0).abs() < f32::EPSILON);
    assert_eq!(l.use_count, 1);
    assert_eq!(l.last_used_ms, 100);
}

#[test]
fn record_usage_failure_decrements_and_floors() {
    let mut l = Learning::new("x", LearningCategory::Pattern, 0.12, 0);
    l.record_usage(false, 50);
    assert!((l.confidence - 0.1).abs() < f32::EPSILON);
}

#[test]
fn confidence_clamped_on_construction() {
    let l = Learning::new("x", LearningCategory::Fact, 5.0, 0);
    assert_eq!(l.confidence, 1.0);
}

#[test]
fn template_matches_is_case_insensitive() {
    let template = TemplateData {
        name: "crud".into(),
        match_patterns: vec!["CRUD".into(), "endpoint".into()],
        variables: vec![],
        produces: vec![],
        requires: vec![],
        expected_artifacts: vec![],
        validation_commands: vec![],
    };
    assert!(template.matches("Add CRUD endpoints for Product"));
    assert!(!template.matches("write a haiku"));
}
