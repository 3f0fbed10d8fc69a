// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint Engine: content-addressed snapshots of a workspace.
//!
//! One mutex guards `snapshots`, `contents`, and `head` (teacher's
//! single-mutex-per-store pattern, also used by the knowledge store and
//! the daemon's event bus). Blobs are deduplicated by SHA-256 content
//! hash and written once per session under `contents/{hash[:2]}/{hash[2:]}`.

use crate::error::StorageError;
use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use sun_adapters::CheckpointConsultant;
use sun_core::{Clock, Intent, ManifestEntry, SnapshotId, WorkspaceSnapshot};

/// Recursively collect every file under `root`, skipping `.sunwell` and
/// VCS metadata, as `(relative_path, bytes)` pairs for a checkpoint's
/// content-addressed manifest.
pub fn collect_workspace_files(root: &Path) -> std::io::Result<Vec<(String, Vec<u8>)>> {
    fn walk(dir: &Path, root: &Path, out: &mut Vec<(String, Vec<u8>)>) -> std::io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name();
            if name == ".sunwell" || name == ".git" {
                continue;
            }
            if path.is_dir() {
                walk(&path, root, out)?;
            } else if let Ok(relative) = path.strip_prefix(root) {
                let bytes = fs::read(&path)?;
                out.push((relative.to_string_lossy().into_owned(), bytes));
            }
        }
        Ok(())
    }
    let mut out = Vec::new();
    walk(root, root, &mut out)?;
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChange {
    Added,
    Modified,
    Removed,
}

struct State {
    snapshots: HashMap<SnapshotId, WorkspaceSnapshot>,
    head: Option<SnapshotId>,
    history: Vec<SnapshotId>,
}

pub struct CheckpointEngine<C: Clock> {
    workspace: PathBuf,
    session_id: String,
    clock: C,
    state: Mutex<State>,
}

fn hash_file(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

impl<C: Clock> CheckpointEngine<C> {
    pub fn new(workspace: impl Into<PathBuf>, session_id: impl Into<String>, clock: C) -> Self {
        Self {
            workspace: workspace.into(),
            session_id: session_id.into(),
            clock,
            state: Mutex::new(State { snapshots: HashMap::new(), head: None, history: Vec::new() }),
        }
    }

    fn session_dir(&self) -> PathBuf {
        self.workspace.join(".sunwell").join("sessions").join(&self.session_id)
    }

    fn contents_dir(&self) -> PathBuf {
        self.session_dir().join("checkpoints").join("contents")
    }

    fn blob_path(&self, hash: &str) -> PathBuf {
        self.contents_dir().join(&hash[..2]).join(&hash[2..])
    }

    /// Snapshot every tracked file under `files`, dedup blobs by content
    /// hash, and link the new snapshot to the current HEAD.
    pub fn checkpoint(
        &self,
        files: &[(String, Vec<u8>)],
        reasoning: impl Into<String>,
        confidence: f32,
        name: Option<String>,
    ) -> Result<SnapshotId, StorageError> {
        let mut manifest = Vec::with_capacity(files.len());
        for (path, bytes) in files {
            let hash = hash_file(bytes);
            let blob_path = self.blob_path(&hash);
            if !blob_path.exists() {
                if let Some(parent) = blob_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&blob_path, bytes)?;
            }
            manifest.push(ManifestEntry { path: path.clone(), content_hash: hash });
        }

        let mut state = self.state.lock();
        let mut intent = Intent::new(reasoning, confidence);
        intent.name = name;
        let snapshot = WorkspaceSnapshot::new(
            self.clock.epoch_ms(),
            state.head,
            intent,
            Vec::new(),
            manifest,
        );
        let id = snapshot.id;
        state.snapshots.insert(id, snapshot);
        state.head = Some(id);
        state.history.push(id);
        Ok(id)
    }

    /// Restore a snapshot's tracked files back to disk, creating parent
    /// directories as needed, and move HEAD to it. Files not tracked by
    /// the target snapshot are left untouched (out of scope for v1).
    pub fn restore(&self, id: Option<SnapshotId>, root: &Path) -> Result<usize, StorageError> {
        let mut state = self.state.lock();
        let target = id.or(state.head).ok_or_else(|| StorageError::CheckpointNotFound("<none>".into()))?;
        let snapshot =
            state.snapshots.get(&target).cloned().ok_or_else(|| StorageError::CheckpointNotFound(target.to_string()))?;
        for entry in &snapshot.manifest {
            let blob_path = self.blob_path(&entry.content_hash);
            let bytes = fs::read(&blob_path)?;
            let dest = root.join(&entry.path);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&dest, bytes)?;
        }
        let count = snapshot.manifest.len();
        state.head = Some(target);
        Ok(count)
    }

    /// Path-keyed diff between two snapshots (defaults: `from` = HEAD's
    /// parent, `to` = HEAD).
    pub fn diff(&self, from: Option<SnapshotId>, to: Option<SnapshotId>) -> Result<HashMap<String, FileChange>, StorageError> {
        let state = self.state.lock();
        let to_id = to.or(state.head).ok_or_else(|| StorageError::CheckpointNotFound("<none>".into()))?;
        let to_snap = state.snapshots.get(&to_id).ok_or_else(|| StorageError::CheckpointNotFound(to_id.to_string()))?;
        let from_snap = match from.or_else(|| to_snap.parent) {
            Some(id) => state.snapshots.get(&id).cloned(),
            None => None,
        };

        let mut before: HashMap<&str, &str> = HashMap::new();
        if let Some(snap) = &from_snap {
            for entry in &snap.manifest {
                before.insert(entry.path.as_str(), entry.content_hash.as_str());
            }
        }
        let mut diff = HashMap::new();
        for entry in &to_snap.manifest {
            match before.remove(entry.path.as_str()) {
                None => {
                    diff.insert(entry.path.clone(), FileChange::Added);
                }
                Some(hash) if hash != entry.content_hash => {
                    diff.insert(entry.path.clone(), FileChange::Modified);
                }
                Some(_) => {}
            }
        }
        for path in before.keys() {
            diff.insert((*path).to_string(), FileChange::Removed);
        }
        Ok(diff)
    }

    pub fn history(&self, limit: usize) -> Vec<WorkspaceSnapshot> {
        let state = self.state.lock();
        state
            .history
            .iter()
            .rev()
            .take(limit)
            .filter_map(|id| state.snapshots.get(id).cloned())
            .collect()
    }

    pub fn head(&self) -> Option<SnapshotId> {
        self.state.lock().head
    }

    pub fn save(&self) -> Result<(), StorageError> {
        let dir = self.session_dir();
        fs::create_dir_all(&dir)?;
        let state = self.state.lock();
        let manifest: Vec<&WorkspaceSnapshot> = state.history.iter().filter_map(|id| state.snapshots.get(id)).collect();
        let json = serde_json::to_vec_pretty(&manifest)?;
        fs::write(dir.join("checkpoints.json"), json)?;
        Ok(())
    }

    pub fn load(workspace: impl Into<PathBuf>, session_id: impl Into<String>, clock: C) -> Result<Self, StorageError> {
        let engine = Self::new(workspace, session_id, clock);
        let path = engine.session_dir().join("checkpoints.json");
        if !path.exists() {
            return Ok(engine);
        }
        let bytes = fs::read(&path)?;
        let snapshots: Vec<WorkspaceSnapshot> = serde_json::from_slice(&bytes)?;
        let mut state = engine.state.lock();
        for snapshot in snapshots {
            state.history.push(snapshot.id);
            state.head = Some(snapshot.id);
            state.snapshots.insert(snapshot.id, snapshot);
        }
        drop(state);
        Ok(engine)
    }

    /// Freeze the session into a single zstd-compressed archive and clear
    /// in-memory state. Restore is not supported from an archived session
    /// in v1 — archival is a terminal operation.
    pub fn archive(&self) -> Result<PathBuf, StorageError> {
        self.save()?;
        let dir = self.session_dir();
        let archive_path = dir.join("archive.tar.zst");
        let mut encoder = zstd::Encoder::new(fs::File::create(&archive_path)?, 0)?;
        {
            let mut builder = tar::Builder::new(&mut encoder);
            builder.append_dir_all("checkpoints", dir.join("checkpoints"))?;
            if dir.join("checkpoints.json").exists() {
                builder.append_path_with_name(dir.join("checkpoints.json"), "checkpoints.json")?;
            }
            builder.finish()?;
        }
        encoder.finish()?;
        let mut state = self.state.lock();
        state.snapshots.clear();
        state.head = None;
        state.history.clear();
        Ok(archive_path)
    }
}

/// Lets the Tool Executor consult this engine before a write without
/// depending on `sun-storage` or its `Clock` parameter (§4.7). The
/// executor has already decided a snapshot is warranted — destructive
/// (overwriting a tracked file) or explicitly requested — before
/// calling this; `destructive` only labels the resulting checkpoint's
/// reasoning, it isn't re-checked here.
#[async_trait]
impl<C: Clock + 'static> CheckpointConsultant for CheckpointEngine<C> {
    async fn maybe_snapshot(&self, workspace: &Path, reason: &str, destructive: bool) {
        let confidence = if destructive { 1.0 } else { 0.8 };
        match collect_workspace_files(workspace) {
            Ok(files) => {
                if let Err(err) = self.checkpoint(&files, reason, confidence, None) {
                    tracing::warn!(%err, "failed to auto-checkpoint before write");
                }
            }
            Err(err) => tracing::warn!(%err, "failed to enumerate workspace files for checkpoint"),
        }
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
