// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Advisory single-writer guard for the workspace directory (§5(e):
//! Sunwell assumes exclusive access to the workspace during a run).
//! Best-effort: a platform that doesn't support advisory locks gets a
//! warning, not a hard failure.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

pub struct WorkspaceLock {
    file: File,
    path: PathBuf,
}

impl WorkspaceLock {
    /// Try to acquire the lock at `.sunwell/sunwelld.lock` under
    /// `workspace_root`. Returns `Ok(None)` (not `Err`) when another
    /// process already holds it, so the caller can surface
    /// `DaemonError::WorkspaceLocked` with context.
    pub fn try_acquire(workspace_root: &Path) -> std::io::Result<Option<Self>> {
        let dir = workspace_root.join(".sunwell");
        std::fs::create_dir_all(&dir)?;
        let path = dir.join("sunwelld.lock");
        let file = OpenOptions::new().create(true).write(true).open(&path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file, path })),
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(err) => {
                tracing::warn!(%err, "advisory workspace lock unsupported on this platform, continuing without it");
                Ok(Some(Self { file, path }))
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkspaceLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
