// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error kinds for domain-level invariant violations.
//!
//! These are the errors a value type can return from a pure validation
//! method (e.g. [`crate::artifact::ArtifactGraph::validate`]). I/O errors
//! belong to the crates that do I/O (`sun-storage`, `sun-adapters`), never
//! here — domain types stay free of side effects.

use thiserror::Error;

/// Errors raised while validating a domain invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("cycle detected in graph at node {0}")]
    Cycle(String),

    #[error("requirement {requirement} of {owner} does not resolve to any node in the graph")]
    UnresolvedRequirement { owner: String, requirement: String },

    #[error("duplicate produced path {0:?} across the artifact graph")]
    DuplicatePath(String),

    #[error("goal {0} appears in more than one of in_progress/completed/blocked")]
    GoalInMultipleStates(String),
}
