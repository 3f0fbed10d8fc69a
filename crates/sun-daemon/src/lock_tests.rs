// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn acquires_lock_on_fresh_workspace() {
    let dir = tempfile::tempdir().unwrap();
    let lock = WorkspaceLock::try_acquire(dir.path()).unwrap();
    assert!(lock.is_some());
    assert!(lock.unwrap().path().exists());
}

#[test]
fn second_acquire_in_same_process_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let first = WorkspaceLock::try_acquire(dir.path()).unwrap();
    assert!(first.is_some());
    let second = WorkspaceLock::try_acquire(dir.path()).unwrap();
    assert!(second.is_none());
}

#[test]
fn lock_is_released_on_drop() {
    let dir = tempfile::tempdir().unwrap();
    {
        let _lock = WorkspaceLock::try_acquire(dir.path()).unwrap();
    }
    let reacquired = WorkspaceLock::try_acquire(dir.path()).unwrap();
    assert!(reacquired.is_some());
}
