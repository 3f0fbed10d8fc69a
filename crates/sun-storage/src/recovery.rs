// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recovery Store: durable state saved when convergence escalates.
//!
//! Writes are fatal on failure (we must not lie about durability); reads
//! degrade to "no recovery available" with a `tracing::warn!` instead of
//! returning an error, since a missing or corrupt recovery file simply
//! means the run starts fresh.

use crate::error::StorageError;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use sun_core::{Goal, RecoveryArtifact, RecoveryState, RunId};
use tempfile::NamedTempFile;

pub struct RecoveryStore {
    root: PathBuf,
}

impl RecoveryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn pending_dir(&self) -> PathBuf {
        self.root.join("recovery")
    }

    fn archive_dir(&self) -> PathBuf {
        self.pending_dir().join("archive")
    }

    fn path_for(&self, goal_hash: &str) -> PathBuf {
        self.pending_dir().join(format!("{goal_hash}.json"))
    }

    /// Stable content-addressed identifier for a goal, used as the
    /// recovery filename and as the argument to `sunwell review`.
    pub fn goal_hash(goal: &Goal) -> String {
        let mut hasher = Sha256::new();
        hasher.update(goal.id.as_str().as_bytes());
        let digest = hasher.finalize();
        digest[..8].iter().map(|b| format!("{b:02x}")).collect()
    }

    pub fn create_from_execution(
        goal: Goal,
        artifacts: Vec<RecoveryArtifact>,
        run_id: RunId,
        failed_gate: Option<String>,
        failure_reason: Option<String>,
        now_ms: u64,
    ) -> RecoveryState {
        let goal_hash = Self::goal_hash(&goal);
        RecoveryState {
            goal,
            goal_hash,
            run_id,
            artifacts,
            failed_gate,
            failure_reason,
            iteration_history: Vec::new(),
            fix_attempts: 0,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    pub fn save(&self, state: &RecoveryState) -> Result<PathBuf, StorageError> {
        let dir = self.pending_dir();
        fs::create_dir_all(&dir)?;
        let path = self.path_for(&state.goal_hash);
        let json = serde_json::to_vec_pretty(state)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&json)?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(path)
    }

    pub fn load(&self, goal_hash: &str) -> Option<RecoveryState> {
        let path = self.path_for(goal_hash);
        match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(state) => Some(state),
                Err(err) => {
                    tracing::warn!(%err, goal_hash, "corrupt recovery state, treating as unavailable");
                    None
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!(%err, goal_hash, "failed to load recovery state");
                None
            }
        }
    }

    pub fn list_pending(&self) -> Vec<RecoveryState> {
        let entries = match fs::read_dir(self.pending_dir()) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                tracing::warn!(%err, "failed to list pending recovery states");
                return Vec::new();
            }
        };
        let mut states = Vec::new();
        for entry in entries.flatten() {
            if entry.path().extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read(entry.path()).ok().and_then(|bytes| serde_json::from_slice(&bytes).ok()) {
                Some(state) => states.push(state),
                None => tracing::warn!(path = %entry.path().display(), "skipping unreadable recovery file"),
            }
        }
        states
    }

    /// Move a resolved recovery state to the archive directory. Recovery
    /// states are never deleted during a run, only archived.
    pub fn mark_resolved(&self, goal_hash: &str) -> Result<(), StorageError> {
        let archive = self.archive_dir();
        fs::create_dir_all(&archive)?;
        fs::rename(self.path_for(goal_hash), archive.join(format!("{goal_hash}.json")))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
