// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Learning: a typed fact accumulated across runs, content-addressed by
//! `(category, fact)` so re-learning the same thing is idempotent.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Category a [`Learning`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningCategory {
    Fact,
    Preference,
    Constraint,
    Pattern,
    DeadEnd,
    Template,
    Heuristic,
}

crate::simple_display! {
    LearningCategory {
        Fact => "fact",
        Preference => "preference",
        Constraint => "constraint",
        Pattern => "pattern",
        DeadEnd => "dead_end",
        Template => "template",
        Heuristic => "heuristic",
    }
}

/// Identity of a [`Learning`]: `hash(category:fact)`, truncated to 16 hex
/// characters. Two learnings with the same `(category, fact)` always
/// produce the same id — this is what makes `add_learning` idempotent
/// (§8 invariant 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LearningId([u8; 8]);

impl LearningId {
    pub fn of(category: LearningCategory, fact: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(category.to_string().as_bytes());
        hasher.update(b":");
        hasher.update(fact.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        Self(bytes)
    }

    pub fn as_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for LearningId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lrn-{}", self.as_hex())
    }
}

/// Structural data carried by a `category = template` learning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateVariable {
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: String,
    #[serde(default)]
    pub extraction_hints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateData {
    pub name: String,
    pub match_patterns: Vec<String>,
    pub variables: Vec<TemplateVariable>,
    pub produces: Vec<String>,
    pub requires: Vec<String>,
    pub expected_artifacts: Vec<String>,
    pub validation_commands: Vec<String>,
}

impl TemplateData {
    /// True if any `match_patterns` entry appears (case-insensitively) in
    /// the goal text — this is what short-circuits the planner into
    /// template mode (§4.5).
    pub fn matches(&self, goal_text: &str) -> bool {
        let goal_lower = goal_text.to_lowercase();
        self.match_patterns
            .iter()
            .any(|p| goal_lower.contains(&p.to_lowercase()))
    }
}

/// A typed fact accumulated across runs, retrieved by semantic similarity
/// to seed planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Learning {
    pub id: LearningId,
    pub fact: String,
    pub category: LearningCategory,
    pub confidence: f32,
    #[serde(default)]
    pub source_turns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_data: Option<TemplateData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub use_count: u32,
    pub last_used_ms: u64,
}

impl Learning {
    pub fn new(fact: impl Into<String>, category: LearningCategory, confidence: f32, now_ms: u64) -> Self {
        let fact = fact.into();
        Self {
            id: LearningId::of(category, &fact),
            fact,
            category,
            confidence: confidence.clamp(0.0, 1.0),
            source_turns: Vec::new(),
            template_data: None,
            embedding: None,
            use_count: 0,
            last_used_ms: now_ms,
        }
    }

    /// Record a successful/unsuccessful use. Success: `+0.05` capped at
    /// `1.0`. Failure: `-0.1` floored at `0.1` (§4.4). This is the only
    /// place confidence changes.
    pub fn record_usage(&mut self, success: bool, now_ms: u64) {
        self.confidence = if success {
            (self.confidence + 0.05).min(1.0)
        } else {
            (self.confidence - 0.1).max(0.1)
        };
        self.use_count += 1;
        self.last_used_ms = now_ms;
    }
}

#[cfg(test)]
#[path = "learning_tests.rs"]
mod tests;
