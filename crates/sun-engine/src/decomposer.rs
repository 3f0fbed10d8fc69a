// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Epic Decomposer: splits an epic-sized goal into 5-15 milestone goals
//! with a domain-specialized prompt. The caller enforces the milestone
//! DAG invariant (acyclic, every `requires` resolves within the batch);
//! this module retries generation once on violation and otherwise
//! surfaces an error so the orchestrator can fall back to flat HARMONIC
//! planning rather than loop forever on a broken decomposition.

use crate::error::EngineError;
use serde::Deserialize;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use sun_adapters::{CompletionRequest, LlmClient};
use sun_core::{Goal, GoalId, GoalType};

pub const MIN_MILESTONES: usize = 5;
pub const MAX_MILESTONES: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Software,
    Novel,
    Research,
    General,
}

impl Domain {
    fn prompt_hint(self) -> &'static str {
        match self {
            Domain::Software => {
                "This is a software engineering epic. Break it into milestones aligned with \
                 architectural layers or feature slices (e.g. data model, API, UI, tests)."
            }
            Domain::Novel => {
                "This is a long-form creative writing epic. Break it into milestones aligned \
                 with narrative structure (e.g. act breaks, character arcs, revision passes)."
            }
            Domain::Research => {
                "This is a research epic. Break it into milestones aligned with the research \
                 process (e.g. literature review, methodology, experiments, writeup)."
            }
            Domain::General => "Break this epic into a sequence of concrete, checkable milestones.",
        }
    }
}

/// Heuristic domain detection by keyword — a single LLM call per §4.11's
/// signal budget is reserved for the Adaptive Router; the decomposer's
/// own domain hint is cheap enough to infer locally.
pub fn detect_domain(goal: &Goal) -> Domain {
    let text = goal.description.to_lowercase();
    let has_any = |words: &[&str]| words.iter().any(|w| text.contains(w));
    if has_any(&["chapter", "novel", "story", "manuscript", "character arc"]) {
        Domain::Novel
    } else if has_any(&["research", "paper", "study", "hypothesis", "literature review"]) {
        Domain::Research
    } else if has_any(&["endpoint", "function", "code", "api", "bug", "module", "refactor", "crud"]) {
        Domain::Software
    } else {
        Domain::General
    }
}

#[derive(Debug, Deserialize)]
struct MilestoneDto {
    #[serde(default)]
    id: Option<String>,
    title: String,
    description: String,
    #[serde(default)]
    requires: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MilestoneListDto {
    milestones: Vec<MilestoneDto>,
}

fn milestone_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "milestones": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"},
                        "title": {"type": "string"},
                        "description": {"type": "string"},
                        "requires": {"type": "array", "items": {"type": "string"}}
                    },
                    "required": ["title", "description"]
                }
            }
        },
        "required": ["milestones"]
    })
}

fn dto_to_milestones(epic: &Goal, dto: MilestoneListDto) -> Vec<Goal> {
    let mut id_map: HashMap<String, GoalId> = HashMap::new();
    let entries: Vec<(MilestoneDto, GoalId)> = dto
        .milestones
        .into_iter()
        .map(|m| {
            let id = m.id.clone().map(GoalId::from_string).unwrap_or_else(GoalId::new);
            if let Some(key) = &m.id {
                id_map.insert(key.clone(), id);
            }
            (m, id)
        })
        .collect();

    entries
        .into_iter()
        .map(|(m, id)| {
            let requires: HashSet<GoalId> =
                m.requires.iter().map(|r| id_map.get(r).copied().unwrap_or_else(|| GoalId::from_string(r))).collect();
            Goal::new(id, m.description, GoalType::Milestone)
                .parent_goal_id(epic.id)
                .category(m.title)
                .requires(requires)
        })
        .collect()
}

/// Enforce the milestone-batch invariant: count in range, every
/// `requires` resolves, no cycles.
pub fn validate_milestones(milestones: &[Goal]) -> Result<(), String> {
    if milestones.len() < MIN_MILESTONES || milestones.len() > MAX_MILESTONES {
        return Err(format!(
            "expected {MIN_MILESTONES}-{MAX_MILESTONES} milestones, got {}",
            milestones.len()
        ));
    }
    let ids: HashSet<GoalId> = milestones.iter().map(|g| g.id).collect();
    for goal in milestones {
        for req in &goal.requires {
            if !ids.contains(req) {
                return Err(format!("milestone {} requires unresolved milestone {}", goal.id, req));
            }
        }
    }
    let by_id: HashMap<GoalId, &Goal> = milestones.iter().map(|g| (g.id, g)).collect();
    let mut visiting = HashSet::new();
    let mut visited = HashSet::new();
    for id in by_id.keys() {
        visit(*id, &by_id, &mut visiting, &mut visited)?;
    }
    Ok(())
}

fn visit(
    id: GoalId,
    by_id: &HashMap<GoalId, &Goal>,
    visiting: &mut HashSet<GoalId>,
    visited: &mut HashSet<GoalId>,
) -> Result<(), String> {
    if visited.contains(&id) {
        return Ok(());
    }
    if !visiting.insert(id) {
        return Err(format!("cycle detected at milestone {id}"));
    }
    if let Some(goal) = by_id.get(&id) {
        for req in &goal.requires {
            visit(*req, by_id, visiting, visited)?;
        }
    }
    visiting.remove(&id);
    visited.insert(id);
    Ok(())
}

pub struct EpicDecomposer<'a, L: LlmClient> {
    llm: &'a L,
}

impl<'a, L: LlmClient> EpicDecomposer<'a, L> {
    pub fn new(llm: &'a L) -> Self {
        Self { llm }
    }

    async fn decompose_once(&self, epic: &Goal, domain: Domain) -> Result<Vec<Goal>, EngineError> {
        let prompt = format!(
            "{}\nEpic: {}\nReturn between {MIN_MILESTONES} and {MAX_MILESTONES} milestones, each with a \
             title, description, and any other milestone ids it requires to complete first.",
            domain.prompt_hint(),
            epic.description
        );
        let response = self.llm.complete(CompletionRequest::new(prompt).with_schema(milestone_schema())).await?;
        let dto: MilestoneListDto = serde_json::from_value(response)
            .map_err(|err| EngineError::Decomposition(format!("malformed milestone response: {err}")))?;
        Ok(dto_to_milestones(epic, dto))
    }

    /// Decompose `epic` into milestones, retrying once if the first
    /// attempt violates the milestone-batch invariant. A second failure
    /// is returned to the caller, which should fall back to flat
    /// planning rather than retry indefinitely.
    pub async fn decompose(&self, epic: &Goal) -> Result<Vec<Goal>, EngineError> {
        let domain = detect_domain(epic);
        let first = self.decompose_once(epic, domain).await?;
        if validate_milestones(&first).is_ok() {
            return Ok(first);
        }
        let second = self.decompose_once(epic, domain).await?;
        validate_milestones(&second).map_err(EngineError::Decomposition)?;
        Ok(second)
    }
}

/// Thin state machine over a milestone batch: which milestone is active,
/// and advancing to the next eligible one as each completes.
pub struct MilestoneTracker {
    milestones: Vec<Goal>,
    active_index: Option<usize>,
}

impl MilestoneTracker {
    pub fn new(milestones: Vec<Goal>) -> Self {
        let active_index = if milestones.is_empty() { None } else { Some(0) };
        Self { milestones, active_index }
    }

    pub fn active(&self) -> Option<&Goal> {
        self.active_index.and_then(|i| self.milestones.get(i))
    }

    pub fn is_complete(&self) -> bool {
        self.active_index.is_none()
    }

    /// Move to the next milestone in order. Milestone dependencies are
    /// already validated acyclic by [`validate_milestones`]; sequencing
    /// by position is sufficient because the decomposer always returns
    /// milestones in an order where a `requires` points only backward.
    pub fn advance(&mut self) {
        self.active_index = match self.active_index {
            Some(i) if i + 1 < self.milestones.len() => Some(i + 1),
            _ => None,
        };
    }

    pub fn remaining(&self) -> usize {
        match self.active_index {
            Some(i) => self.milestones.len() - i,
            None => 0,
        }
    }
}

#[cfg(test)]
#[path = "decomposer_tests.rs"]
mod tests;
