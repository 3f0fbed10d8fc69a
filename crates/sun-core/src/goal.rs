// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Goal identifier, goal hierarchy, and the Backlog state machine.

use crate::artifact::ArtifactId;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

crate::define_id! {
    /// Unique identifier for a goal (epic, milestone, or task).
    pub struct GoalId("gol-");
}

/// Level of a goal within the epic → milestone → task hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    Epic,
    Milestone,
    Task,
}

crate::simple_display! {
    GoalType {
        Epic => "epic",
        Milestone => "milestone",
        Task => "task",
    }
}

/// A goal accepted into a [`Backlog`]. Immutable once accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub description: String,
    pub goal_type: GoalType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_goal_id: Option<GoalId>,
    /// Normalized to `[0, 1]` by [`Goal::new`] and every setter.
    pub priority: f32,
    pub category: String,
    pub complexity: String,
    #[serde(default)]
    pub requires: HashSet<GoalId>,
    #[serde(default)]
    pub produces: Vec<ArtifactId>,
}

impl Goal {
    pub fn new(id: GoalId, description: impl Into<String>, goal_type: GoalType) -> Self {
        Self {
            id,
            description: description.into(),
            goal_type,
            parent_goal_id: None,
            priority: 0.5,
            category: String::new(),
            complexity: String::new(),
            requires: HashSet::new(),
            produces: Vec::new(),
        }
    }

    crate::setters! {
        into { category: String, complexity: String }
        option { parent_goal_id: GoalId }
    }

    /// Set priority, clamping to `[0, 1]` (the spec's domain for priority).
    pub fn priority(mut self, p: f32) -> Self {
        self.priority = p.clamp(0.0, 1.0);
        self
    }

    pub fn requires(mut self, requires: impl IntoIterator<Item = GoalId>) -> Self {
        self.requires = requires.into_iter().collect();
        self
    }

    pub fn produces(mut self, produces: impl IntoIterator<Item = ArtifactId>) -> Self {
        self.produces = produces.into_iter().collect();
        self
    }
}

/// Reason a goal is blocked, attached to the `blocked` view of a [`Backlog`].
pub type BlockReason = String;

/// Ordered set of goals plus the three derived views described in the data
/// model: `in_progress`, `completed`, `blocked`.
///
/// Goal order is preserved (insertion order) so planners and the CLI can
/// present a stable backlog ordering; lookups by id stay O(1) via the
/// underlying index.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Backlog {
    goals: indexmap::IndexMap<GoalId, Goal>,
    in_progress: Option<GoalId>,
    completed: HashSet<GoalId>,
    blocked: HashMap<GoalId, BlockReason>,
}

impl Backlog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a goal into the backlog. Rejects cycles in `requires`
    /// (checked against the goals already present).
    pub fn accept(&mut self, goal: Goal) -> Result<(), CoreError> {
        self.goals.insert(goal.id, goal);
        self.check_acyclic()
    }

    pub fn get(&self, id: &GoalId) -> Option<&Goal> {
        self.goals.get(id)
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Goal> {
        self.goals.values()
    }

    pub fn in_progress(&self) -> Option<&GoalId> {
        self.in_progress.as_ref()
    }

    pub fn completed(&self) -> &HashSet<GoalId> {
        &self.completed
    }

    pub fn blocked(&self) -> &HashMap<GoalId, BlockReason> {
        &self.blocked
    }

    /// A goal is eligible iff every id in `requires` is in `completed` and
    /// the goal itself is not already in progress, completed, or blocked.
    pub fn is_eligible(&self, id: &GoalId) -> bool {
        let Some(goal) = self.goals.get(id) else { return false };
        if self.in_progress.as_ref() == Some(id) || self.completed.contains(id) || self.blocked.contains_key(id) {
            return false;
        }
        goal.requires.iter().all(|r| self.completed.contains(r))
    }

    /// Move a goal into `in_progress`. Fails if another goal is already
    /// in progress or this goal is not eligible.
    pub fn start(&mut self, id: GoalId) -> Result<(), CoreError> {
        if !self.is_eligible(&id) {
            return Err(CoreError::GoalInMultipleStates(id.to_string()));
        }
        self.in_progress = Some(id);
        Ok(())
    }

    pub fn complete(&mut self, id: GoalId) {
        if self.in_progress == Some(id) {
            self.in_progress = None;
        }
        self.blocked.remove(&id);
        self.completed.insert(id);
    }

    pub fn block(&mut self, id: GoalId, reason: impl Into<String>) {
        if self.in_progress == Some(id) {
            self.in_progress = None;
        }
        self.blocked.insert(id, reason.into());
    }

    /// Enforce invariant 1 from §8: a goal is in at most one of the three
    /// derived views. Violating this would mean two code paths raced to
    /// mutate the backlog without going through these methods.
    pub fn check_exclusive(&self) -> Result<(), CoreError> {
        for id in self.blocked.keys() {
            if self.completed.contains(id) || self.in_progress.as_ref() == Some(id) {
                return Err(CoreError::GoalInMultipleStates(id.to_string()));
            }
        }
        Ok(())
    }

    fn check_acyclic(&self) -> Result<(), CoreError> {
        let mut visiting = HashSet::new();
        let mut visited = HashSet::new();
        for id in self.goals.keys() {
            self.visit(*id, &mut visiting, &mut visited)?;
        }
        Ok(())
    }

    fn visit(
        &self,
        id: GoalId,
        visiting: &mut HashSet<GoalId>,
        visited: &mut HashSet<GoalId>,
    ) -> Result<(), CoreError> {
        if visited.contains(&id) {
            return Ok(());
        }
        if !visiting.insert(id) {
            return Err(CoreError::Cycle(id.to_string()));
        }
        if let Some(goal) = self.goals.get(&id) {
            for dep in &goal.requires {
                self.visit(*dep, visiting, visited)?;
            }
        }
        visiting.remove(&id);
        visited.insert(id);
        Ok(())
    }
}

#[cfg(test)]
#[path = "goal_tests.rs"]
mod tests;
