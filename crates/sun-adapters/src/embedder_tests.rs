// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn embed_is_deterministic() {
    let embedder = FakeEmbedder::new(8);
    let a = embedder.embed("add crud endpoint").await.unwrap();
    let b = embedder.embed("add crud endpoint").await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn embed_has_configured_dimensionality() {
    let embedder = FakeEmbedder::new(32);
    let v = embedder.embed("hello world").await.unwrap();
    assert_eq!(v.len(), 32);
}

#[tokio::test]
async fn embed_differs_for_different_text() {
    let embedder = FakeEmbedder::default();
    let a = embedder.embed("add crud endpoint").await.unwrap();
    let b = embedder.embed("write a haiku about rust").await.unwrap();
    assert_ne!(a, b);
}
