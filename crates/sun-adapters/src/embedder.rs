// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Embedding adapter trait, kept separate from `sun-storage` so the
//! Knowledge Store never depends on a concrete provider: callers embed a
//! goal upstream and hand the vector to `KnowledgeStore::retrieve_for_planning`.

use crate::error::AdapterError;
use async_trait::async_trait;

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AdapterError>;
}

/// Deterministic bag-of-hashed-words embedder for tests: no network call,
/// stable across runs, good enough to exercise cosine-similarity code
/// paths without a real provider.
pub struct FakeEmbedder {
    dims: usize,
}

impl FakeEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }
}

impl Default for FakeEmbedder {
    fn default() -> Self {
        Self::new(16)
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AdapterError> {
        let mut vector = vec![0.0f32; self.dims];
        for word in text.split_whitespace() {
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            std::hash::Hash::hash(&word.to_lowercase(), &mut hasher);
            let bucket = (std::hash::Hasher::finish(&hasher) as usize) % self.dims;
            vector[bucket] += 1.0;
        }
        Ok(vector)
    }
}

#[cfg(test)]
#[path = "embedder_tests.rs"]
mod tests;
