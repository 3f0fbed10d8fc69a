// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Knowledge Store: facts, constraints, dead-ends, and templates retrieved
//! by relevance for planning.
//!
//! A single mutex protects the learning list (teacher's single-mutex
//! pattern). Writers replace records; readers clone `Arc` snapshots of
//! matched records before scoring so the lock is never held across the
//! (potentially expensive) similarity computation.

use crate::error::StorageError;
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use sun_core::{Learning, LearningCategory, LearningId, TemplateData};
use tempfile::NamedTempFile;

/// Embedding similarity is supplied by the caller (an external embedder
/// upstream of this store, kept out of `sun-storage` per the passive-core
/// principle); this store never computes embeddings itself, only scores
/// the vectors it's given and falls back to Jaccard token overlap when
/// none are available.
pub struct ScoredLearning {
    pub learning: Arc<Learning>,
    pub score: f32,
}

#[derive(Debug, Default, Clone)]
pub struct PlanningContext {
    pub by_category: HashMap<LearningCategory, Vec<Arc<Learning>>>,
}

const RELEVANCE_THRESHOLD: f32 = 0.3;

pub struct KnowledgeStore {
    learnings: Mutex<Vec<Arc<Learning>>>,
    templates: Mutex<Vec<TemplateData>>,
    word_re: Regex,
}

impl Default for KnowledgeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeStore {
    pub fn new() -> Self {
        Self {
            learnings: Mutex::new(Vec::new()),
            templates: Mutex::new(Vec::new()),
            word_re: Regex::new(r"\w+").expect("static pattern"),
        }
    }

    pub fn add_learning(&self, fact: impl Into<String>, category: LearningCategory, confidence: f32, now_ms: u64) -> LearningId {
        let learning = Learning::new(fact, category, confidence, now_ms);
        let id = learning.id;
        self.learnings.lock().push(Arc::new(learning));
        id
    }

    pub fn add_template(&self, template: TemplateData) {
        self.templates.lock().push(template);
    }

    pub fn get_templates(&self) -> Vec<TemplateData> {
        self.templates.lock().clone()
    }

    /// Find the first template whose `match_patterns` matches `goal_text`,
    /// short-circuiting normal retrieval for template-guided planning.
    pub fn matching_template(&self, goal_text: &str) -> Option<TemplateData> {
        self.templates.lock().iter().find(|t| t.matches(goal_text)).cloned()
    }

    pub fn record_usage(&self, id: LearningId, success: bool, now_ms: u64) {
        let mut learnings = self.learnings.lock();
        if let Some(slot) = learnings.iter_mut().find(|l| l.id == id) {
            let mut updated = (**slot).clone();
            updated.record_usage(success, now_ms);
            *slot = Arc::new(updated);
        }
    }

    fn tokenize(&self, text: &str) -> std::collections::HashSet<String> {
        self.word_re.find_iter(&text.to_lowercase()).map(|m| m.as_str().to_string()).collect()
    }

    fn jaccard(&self, a: &str, b: &str) -> f32 {
        let ta = self.tokenize(a);
        let tb = self.tokenize(b);
        if ta.is_empty() || tb.is_empty() {
            return 0.0;
        }
        let intersection = ta.intersection(&tb).count() as f32;
        let union = ta.union(&tb).count() as f32;
        intersection / union
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            0.0
        } else {
            dot / (norm_a * norm_b)
        }
    }

    /// Score every learning against `goal_text`, using `goal_embedding`
    /// (cosine similarity against each learning's own embedding) when
    /// given, falling back to Jaccard token overlap otherwise.
    pub fn retrieve_for_planning(
        &self,
        goal_text: &str,
        goal_embedding: Option<&[f32]>,
        limit_per_category: usize,
    ) -> PlanningContext {
        let snapshot: Vec<Arc<Learning>> = self.learnings.lock().clone();

        let mut scored: Vec<ScoredLearning> = snapshot
            .into_iter()
            .map(|learning| {
                let similarity = match (goal_embedding, &learning.embedding) {
                    (Some(goal_vec), Some(learning_vec)) => Self::cosine(goal_vec, learning_vec),
                    _ => self.jaccard(goal_text, &learning.fact),
                };
                let usage_boost = 1.0 + 0.05 * (learning.use_count.min(10) as f32);
                let score = similarity * learning.confidence * usage_boost;
                ScoredLearning { learning, score }
            })
            .filter(|s| s.score > RELEVANCE_THRESHOLD)
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        let mut by_category: HashMap<LearningCategory, Vec<Arc<Learning>>> = HashMap::new();
        for scored_learning in scored {
            let bucket = by_category.entry(scored_learning.learning.category).or_default();
            if bucket.len() < limit_per_category {
                bucket.push(scored_learning.learning);
            }
        }
        PlanningContext { by_category }
    }

    /// Persist every learning and template to `.sunwell/knowledge/learnings.json`
    /// under `workspace_root`, atomically (write-then-rename).
    pub fn save(&self, workspace_root: &Path) -> Result<(), StorageError> {
        let dir = workspace_root.join(".sunwell").join("knowledge");
        fs::create_dir_all(&dir)?;
        let snapshot = Snapshot {
            learnings: self.learnings.lock().iter().map(|l| (**l).clone()).collect(),
            templates: self.templates.lock().clone(),
        };
        let json = serde_json::to_vec_pretty(&snapshot)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&json)?;
        tmp.persist(dir.join("learnings.json")).map_err(|e| e.error)?;
        Ok(())
    }

    /// Load `.sunwell/knowledge/learnings.json` under `workspace_root` into
    /// a fresh store. A missing file yields an empty store, matching the
    /// Recovery Store's "absence is not an error" convention.
    pub fn load(workspace_root: &Path) -> Result<Self, StorageError> {
        let path = workspace_root.join(".sunwell").join("knowledge").join("learnings.json");
        let store = Self::new();
        match fs::read(&path) {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
                *store.learnings.lock() = snapshot.learnings.into_iter().map(Arc::new).collect();
                *store.templates.lock() = snapshot.templates;
                Ok(store)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(store),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    learnings: Vec<Learning>,
    templates: Vec<TemplateData>,
}

#[cfg(test)]
#[path = "knowledge_tests.rs"]
mod tests;
