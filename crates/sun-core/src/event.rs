// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AgentEvent: the typed, versioned event emitted throughout a run.
//!
//! This module owns the domain shape only (a value type, no I/O per §9).
//! NDJSON (de)serialization and on-disk event-log writing live in
//! `sun-wire` and `sun-daemon` respectively.

use serde::{Deserialize, Serialize};
use serde_json::Value;

crate::define_id! {
    /// Unique identifier for a single agent run.
    pub struct RunId("run-");
}

/// Where a run was initiated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    Cli,
    Ui,
    Api,
}

/// Every event type the core emits, grouped as in §3/§4.1: planning,
/// execution, gates, memory, convergence, recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PlanCandidateGenerated,
    PlanCandidateScored,
    PlanWinner,
    PlanRefineRound,
    PlanRefineResult,
    TemplateMatched,
    TaskStart,
    TaskProgress,
    TaskComplete,
    TaskFailed,
    GateStart,
    GatePass,
    GateFail,
    MemoryLearning,
    MemoryDeadEnd,
    ConvergenceIter,
    ConvergenceEscalated,
    RecoverySaved,
    RecoveryResolved,
    Error,
}

/// The current schema version. Bump and document on any wire-breaking
/// change to [`AgentEvent::data`]'s shape for a given `type`.
pub const SCHEMA_VERSION: u32 = 1;

/// A single event on the agent event bus / NDJSON stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEvent {
    pub v: u32,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub run_id: RunId,
    pub source: EventSource,
    /// Epoch seconds (§6's wire format uses seconds, not milliseconds).
    pub timestamp: u64,
    #[serde(default)]
    pub data: Value,
}

impl AgentEvent {
    pub fn new(event_type: EventType, run_id: RunId, source: EventSource, timestamp: u64, data: Value) -> Self {
        Self { v: SCHEMA_VERSION, event_type, run_id, source, timestamp, data }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
