// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn state() -> RecoveryState {
    RecoveryState {
        goal: crate::goal::Goal::new(crate::goal::GoalId::new(), "build", crate::goal::GoalType::Task),
        goal_hash: "abc123".into(),
        run_id: RunId::new(),
        artifacts: vec![
            RecoveryArtifact::new("a.rs", "fn a() {}", RecoveryStatus::Passed),
            RecoveryArtifact::new("b.rs", "", RecoveryStatus::Failed),
            RecoveryArtifact::new("c.rs", "", RecoveryStatus::Waiting),
            RecoveryArtifact::new("d.rs", "", RecoveryStatus::Waiting),
        ],
        failed_gate: Some("syntax".into()),
        failure_reason: Some("non_progressing".into()),
        iteration_history: vec![],
        fix_attempts: 0,
        created_at_ms: 0,
        updated_at_ms: 0,
    }
}

#[test]
fn status_counts_matches_s3_scenario() {
    let counts = state().status_counts();
    assert_eq!(counts.passed, 1);
    assert_eq!(counts.failed, 1);
    assert_eq!(counts.waiting, 2);
}

#[test]
fn resumable_artifacts_excludes_passed() {
    let s = state();
    let resumable: Vec<&str> = s.resumable_artifacts().map(|a| a.path.as_str()).collect();
    assert_eq!(resumable, vec!["b.rs", "c.rs", "d.rs"]);
}
