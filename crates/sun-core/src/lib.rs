// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sun-core: passive domain types for the Sunwell cognitive execution
//! stack — Goal/Backlog, ArtifactSpec/ArtifactGraph, Learning, recovery and
//! checkpoint state, and the AgentEvent schema. No I/O lives here; stores
//! and orchestrators (in `sun-storage`, `sun-engine`, `sun-daemon`) own
//! side effects.

pub mod macros;

pub mod artifact;
pub mod clock;
pub mod error;
pub mod event;
pub mod goal;
pub mod id;
pub mod learning;
pub mod recovery;
pub mod snapshot;

pub use artifact::{ArtifactGraph, ArtifactId, ArtifactSpec};
pub use clock::{Clock, FakeClock, SystemClock};
pub use error::CoreError;
pub use event::{AgentEvent, EventSource, EventType, RunId, SCHEMA_VERSION};
pub use goal::{Backlog, BlockReason, Goal, GoalId, GoalType};
pub use id::short;
pub use learning::{Learning, LearningCategory, LearningId, TemplateData, TemplateVariable};
pub use recovery::{IterationRecord, RecoveryArtifact, RecoveryState, RecoveryStatus, RecoveryStatusCounts};
pub use snapshot::{Intent, ManifestEntry, SnapshotId, WorkspaceSnapshot};
