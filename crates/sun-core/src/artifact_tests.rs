// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn spec(id: ArtifactId, produces: &[&str], requires: &[ArtifactId]) -> ArtifactSpec {
    ArtifactSpec::new(id, "desc")
        .produces(produces.iter().map(|s| s.to_string()).collect())
        .requires(requires.to_vec())
}

#[test]
fn validate_passes_for_simple_chain() {
    let a = ArtifactId::new();
    let b = ArtifactId::new();
    let graph = ArtifactGraph::new(vec![spec(a, &["a.rs"], &[]), spec(b, &["b.rs"], &[a])]);
    graph.validate().unwrap();
}

#[test]
fn validate_rejects_unresolved_requirement() {
    let a = ArtifactId::new();
    let missing = ArtifactId::new();
    let graph = ArtifactGraph::new(vec![spec(a, &["a.rs"], &[missing])]);
    let err = graph.validate().unwrap_err();
    assert!(matches!(err, CoreError::UnresolvedRequirement { .. }));
}

#[test]
fn validate_rejects_duplicate_produced_path() {
    let a = ArtifactId::new();
    let b = ArtifactId::new();
    let graph = ArtifactGraph::new(vec![spec(a, &["shared.rs"], &[]), spec(b, &["shared.rs"], &[])]);
    let err = graph.validate().unwrap_err();
    assert!(matches!(err, CoreError::DuplicatePath(_)));
}

#[test]
fn validate_rejects_cycle() {
    let a = ArtifactId::new();
    let b = ArtifactId::new();
    let graph = ArtifactGraph::new(vec![spec(a, &["a.rs"], &[b]), spec(b, &["b.rs"], &[a])]);
    let err = graph.validate().unwrap_err();
    assert!(matches!(err, CoreError::Cycle(_)));
}

#[test]
fn topo_order_respects_dependencies() {
    let a = ArtifactId::new();
    let b = ArtifactId::new();
    let c = ArtifactId::new();
    let graph = ArtifactGraph::new(vec![
        spec(c, &["c.rs"], &[a, b]),
        spec(a, &["a.rs"], &[]),
        spec(b, &["b.rs"], &[a]),
    ]);
    let order = graph.topo_order().unwrap();
    let pos = |id: ArtifactId| order.iter().position(|x| *x == id).unwrap();
    assert!(pos(a) < pos(b));
    assert!(pos(b) < pos(c));
}

#[test]
fn roots_are_artifacts_with_no_requires() {
    let a = ArtifactId::new();
    let b = ArtifactId::new();
    let graph = ArtifactGraph::new(vec![spec(a, &["a.rs"], &[]), spec(b, &["b.rs"], &[a])]);
    let roots = graph.roots();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].id, a);
}
