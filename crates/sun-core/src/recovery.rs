// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RecoveryArtifact and RecoveryState: durable state saved when convergence
//! escalates, so a later run can resume with the partially-passed artifacts
//! intact.

use crate::event::RunId;
use crate::goal::Goal;
use serde::{Deserialize, Serialize};

/// Status of a single artifact within a [`RecoveryState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStatus {
    Passed,
    Failed,
    Waiting,
    Skipped,
    Fixed,
}

crate::simple_display! {
    RecoveryStatus {
        Passed => "passed",
        Failed => "failed",
        Waiting => "waiting",
        Skipped => "skipped",
        Fixed => "fixed",
    }
}

/// One artifact's last-known content and gate outcome, as saved into a
/// recovery state or a workspace snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryArtifact {
    pub path: String,
    pub content: String,
    pub status: RecoveryStatus,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl RecoveryArtifact {
    pub fn new(path: impl Into<String>, content: impl Into<String>, status: RecoveryStatus) -> Self {
        Self { path: path.into(), content: content.into(), status, errors: Vec::new(), depends_on: Vec::new() }
    }
}

/// A single convergence-loop iteration, recorded for `iteration_history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: u32,
    pub gate_failures: Vec<String>,
    pub content_hashes: Vec<(String, String)>,
}

/// Durable state saved when convergence escalates (iteration cap or
/// non-progressing fixed point) so a later `sunwell review <goal_hash>`
/// can resume with `passed` artifacts intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryState {
    pub goal: Goal,
    pub goal_hash: String,
    pub run_id: RunId,
    pub artifacts: Vec<RecoveryArtifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_gate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub iteration_history: Vec<IterationRecord>,
    #[serde(default)]
    pub fix_attempts: u32,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl RecoveryState {
    /// Count artifacts by status, used to build the `{passed, failed,
    /// waiting}` summary emitted alongside `recovery_saved` (S3 in §8).
    pub fn status_counts(&self) -> RecoveryStatusCounts {
        let mut counts = RecoveryStatusCounts::default();
        for artifact in &self.artifacts {
            match artifact.status {
                RecoveryStatus::Passed => counts.passed += 1,
                RecoveryStatus::Failed => counts.failed += 1,
                RecoveryStatus::Waiting => counts.waiting += 1,
                RecoveryStatus::Skipped => counts.skipped += 1,
                RecoveryStatus::Fixed => counts.fixed += 1,
            }
        }
        counts
    }

    /// Artifacts eligible for a resumed run: `failed` and `waiting` only —
    /// `passed` artifacts are never regenerated (§4.10).
    pub fn resumable_artifacts(&self) -> impl Iterator<Item = &RecoveryArtifact> {
        self.artifacts
            .iter()
            .filter(|a| matches!(a.status, RecoveryStatus::Failed | RecoveryStatus::Waiting))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryStatusCounts {
    pub passed: u32,
    pub failed: u32,
    pub waiting: u32,
    pub skipped: u32,
    pub fixed: u32,
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
