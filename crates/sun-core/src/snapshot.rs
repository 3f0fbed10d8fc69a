// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WorkspaceSnapshot: a session-scoped, content-addressed checkpoint of the
//! workspace with intent metadata, finer-grained than recovery.

use crate::goal::GoalId;
use crate::recovery::RecoveryArtifact;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Content-addressed id: `hash(sorted(manifest) + intent.reasoning)[:16]`
/// (§8 invariant 4). Computed by [`WorkspaceSnapshot::compute_id`], never
/// assigned directly, so two snapshots with identical manifests and intent
/// reasoning always collide to the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId([u8; 8]);

impl SnapshotId {
    pub fn as_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_hex())
    }
}

/// Why a checkpoint was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<GoalId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Intent {
    pub fn new(reasoning: impl Into<String>, confidence: f32) -> Self {
        Self { reasoning: reasoning.into(), goal_id: None, task_id: None, confidence, name: None }
    }
}

/// One tracked file's path and SHA-256 content hash within a snapshot's
/// manifest. Content blobs are deduplicated by `content_hash` in the
/// checkpoint store; the manifest here is just the index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    pub content_hash: String,
}

/// A session-scoped, parent-linked workspace snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    pub id: SnapshotId,
    pub timestamp_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<SnapshotId>,
    pub intent: Intent,
    pub artifacts: Vec<RecoveryArtifact>,
    pub manifest: Vec<ManifestEntry>,
}

impl WorkspaceSnapshot {
    /// Build a snapshot, computing its content-addressed id from the
    /// (sorted) manifest and the intent's reasoning text.
    pub fn new(
        timestamp_ms: u64,
        parent: Option<SnapshotId>,
        intent: Intent,
        artifacts: Vec<RecoveryArtifact>,
        mut manifest: Vec<ManifestEntry>,
    ) -> Self {
        manifest.sort();
        let id = Self::compute_id(&manifest, &intent.reasoning);
        Self { id, timestamp_ms, parent, intent, artifacts, manifest }
    }

    pub fn compute_id(sorted_manifest: &[ManifestEntry], reasoning: &str) -> SnapshotId {
        let mut hasher = Sha256::new();
        for entry in sorted_manifest {
            hasher.update(entry.path.as_bytes());
            hasher.update(b"\0");
            hasher.update(entry.content_hash.as_bytes());
            hasher.update(b"\n");
        }
        hasher.update(reasoning.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        SnapshotId(bytes)
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
