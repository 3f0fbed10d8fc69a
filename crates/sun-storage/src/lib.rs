// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable stores for the Sunwell cognitive execution stack: the Recovery
//! Store (crash-resumable goal state), the Checkpoint Engine
//! (content-addressed workspace snapshots), and the Knowledge Store
//! (learnings retrieved by relevance for planning).

pub mod checkpoint;
pub mod error;
pub mod knowledge;
pub mod recovery;

pub use checkpoint::{collect_workspace_files, CheckpointEngine, FileChange};
pub use error::StorageError;
pub use knowledge::{KnowledgeStore, PlanningContext, ScoredLearning};
pub use recovery::RecoveryStore;
