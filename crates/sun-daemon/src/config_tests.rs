// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(dir.path()).unwrap();
    assert_eq!(config.convergence.max_iterations, 5);
    assert_eq!(config.planner.candidates, 5);
    assert_eq!(config.event_bus.max_subscribers, 100);
    assert_eq!(config.max_concurrent_runs, 10);
}

#[test]
fn partial_file_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join(".sunwell")).unwrap();
    std::fs::write(
        dir.path().join(".sunwell/config.toml"),
        "[convergence]\nmax_iterations = 8\n",
    )
    .unwrap();
    let config = Config::load(dir.path()).unwrap();
    assert_eq!(config.convergence.max_iterations, 8);
    assert!(config.convergence.fixed_point_detection);
    assert_eq!(config.knowledge.min_score, 0.3);
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join(".sunwell")).unwrap();
    std::fs::write(dir.path().join(".sunwell/config.toml"), "not valid toml {{{").unwrap();
    assert!(Config::load(dir.path()).is_err());
}
