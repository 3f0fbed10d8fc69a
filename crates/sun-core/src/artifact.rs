// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ArtifactSpec and the ArtifactGraph the planner emits.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

crate::define_id! {
    /// Unique identifier for an artifact the planner commits to produce.
    pub struct ArtifactId("art-");
}

/// A single artifact the planner commits to produce — typically a file or
/// a coherent change to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSpec {
    pub id: ArtifactId,
    pub description: String,
    /// Glob path patterns this artifact is expected to produce.
    pub produces: Vec<String>,
    pub requires: Vec<ArtifactId>,
    /// Commands the gate pipeline runs against this artifact specifically,
    /// on top of the project-level gates (`GatePipeline::run_artifact`).
    pub validation_commands: Vec<String>,
}

impl ArtifactSpec {
    pub fn new(id: ArtifactId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            produces: Vec::new(),
            requires: Vec::new(),
            validation_commands: Vec::new(),
        }
    }

    crate::setters! {
        set { produces: Vec<String>, requires: Vec<ArtifactId>, validation_commands: Vec<String> }
    }
}

/// A DAG over [`ArtifactSpec`]s — the planner's output, the convergence
/// loop's input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactGraph {
    nodes: Vec<ArtifactSpec>,
}

impl ArtifactGraph {
    pub fn new(nodes: Vec<ArtifactSpec>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[ArtifactSpec] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &ArtifactId) -> Option<&ArtifactSpec> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Artifacts with no unsatisfied `requires`, in graph order.
    pub fn roots(&self) -> Vec<&ArtifactSpec> {
        self.nodes.iter().filter(|n| n.requires.is_empty()).collect()
    }

    /// Enforce invariant 2 from §8: acyclic, every `requires` resolves,
    /// every `produces` path is unique across the graph.
    pub fn validate(&self) -> Result<(), CoreError> {
        let ids: HashSet<ArtifactId> = self.nodes.iter().map(|n| n.id).collect();
        for node in &self.nodes {
            for req in &node.requires {
                if !ids.contains(req) {
                    return Err(CoreError::UnresolvedRequirement {
                        owner: node.id.to_string(),
                        requirement: req.to_string(),
                    });
                }
            }
        }

        let mut seen_paths: HashMap<&str, &ArtifactId> = HashMap::new();
        for node in &self.nodes {
            for path in &node.produces {
                if let Some(owner) = seen_paths.insert(path.as_str(), &node.id) {
                    if owner != &node.id {
                        return Err(CoreError::DuplicatePath(path.clone()));
                    }
                }
            }
        }

        self.check_acyclic()
    }

    /// Topologically ordered artifact ids (Kahn's algorithm), used by the
    /// convergence loop to decide generation order.
    pub fn topo_order(&self) -> Result<Vec<ArtifactId>, CoreError> {
        let mut in_degree: HashMap<ArtifactId, usize> =
            self.nodes.iter().map(|n| (n.id, n.requires.len())).collect();
        let mut dependents: HashMap<ArtifactId, Vec<ArtifactId>> = HashMap::new();
        for node in &self.nodes {
            for req in &node.requires {
                dependents.entry(*req).or_default().push(node.id);
            }
        }

        let mut queue: Vec<ArtifactId> = self
            .nodes
            .iter()
            .filter(|n| n.requires.is_empty())
            .map(|n| n.id)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(id) = queue.pop() {
            order.push(id);
            if let Some(deps) = dependents.get(&id) {
                for dep in deps {
                    let degree = in_degree.get_mut(dep).expect("dependent tracked in in_degree");
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push(*dep);
                    }
                }
            }
        }

        if order.len() != self.nodes.len() {
            return Err(CoreError::Cycle("artifact graph".to_string()));
        }
        Ok(order)
    }

    fn check_acyclic(&self) -> Result<(), CoreError> {
        self.topo_order().map(|_| ())
    }
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
