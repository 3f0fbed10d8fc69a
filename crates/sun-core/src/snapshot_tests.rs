// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn entries() -> Vec<ManifestEntry> {
    vec![
        ManifestEntry { path: "b.rs".into(), content_hash: "bbb".into() },
        ManifestEntry { path: "a.rs".into(), content_hash: "aaa".into() },
    ]
}

#[test]
fn id_is_deterministic_for_same_manifest_and_reasoning() {
    let intent = Intent::new("before refactor", 0.9);
    let s1 = WorkspaceSnapshot::new(1, None, intent.clone(), vec![], entries());
    let s2 = WorkspaceSnapshot::new(2, None, intent, vec![], entries());
    assert_eq!(s1.id, s2.id);
}

#[test]
fn id_changes_with_reasoning() {
    let s1 = WorkspaceSnapshot::new(1, None, Intent::new("a", 0.9), vec![], entries());
    let s2 = WorkspaceSnapshot::new(1, None, Intent::new("b", 0.9), vec![], entries());
    assert_ne!(s1.id, s2.id);
}

#[test]
fn manifest_is_sorted_on_construction() {
    let snap = WorkspaceSnapshot::new(1, None, Intent::new("x", 0.5), vec![], entries());
    assert_eq!(snap.manifest[0].path, "a.rs");
    assert_eq!(snap.manifest[1].path, "b.rs");
}

#[test]
fn id_formats_as_16_hex_chars() {
    let snap = WorkspaceSnapshot::new(1, None, Intent::new("x", 0.5), vec![], entries());
    assert_eq!(snap.id.to_string().len(), 16);
}
