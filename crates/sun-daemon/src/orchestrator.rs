// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent Orchestrator: the single entry point that turns a goal into a
//! finished, escalated, or cancelled run. Classifies via the Adaptive
//! Router, decomposes epics into milestones, plans each goal/milestone
//! with the Harmonic Planner, executes with the Convergence Loop, and
//! deposits what it learned into the Knowledge Store — emitting an
//! `AgentEvent` onto the Event Bus at every step.

use crate::config::Config;
use crate::event_bus::EventBus;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use sun_adapters::{LlmClient, ToolExecutor};
use sun_core::{
    AgentEvent, ArtifactGraph, ArtifactId, ArtifactSpec, Clock, EventSource, EventType, Goal, LearningCategory,
    RecoveryArtifact, RecoveryState, RecoveryStatus, RunId,
};
use sun_engine::{
    standard_gates, AdaptiveRouter, ConvergenceLoop, ConvergenceOutcome, EpicDecomposer, GatePipeline,
    HarmonicPlanner, MilestoneTracker, PlanMetrics, Route, StandardGateCommands,
};
use sun_storage::{collect_workspace_files, CheckpointEngine, KnowledgeStore, RecoveryStore};
use tokio_util::sync::CancellationToken;

use crate::error::DaemonError;

/// Outcome of a full orchestrator run — the shape the CLI's exit code
/// (§6: 0/2/3/4/5) is derived from.
#[derive(Debug)]
pub enum RunOutcome {
    Completed,
    NeedsConfirmation { reason: String },
    NeedsClarification { reason: String },
    Escalated { goal_hash: String, reason: String },
    Cancelled { goal_hash: String },
}

/// Map a planner/convergence-loop emit label to the event type it
/// reports as. Anything neither module names falls back to
/// `TaskProgress` rather than panicking on an unrecognized label.
fn label_to_event_type(label: &str) -> EventType {
    match label {
        "template_matched" => EventType::TemplateMatched,
        "plan_candidate_generated" => EventType::PlanCandidateGenerated,
        "plan_candidate_scored" => EventType::PlanCandidateScored,
        "plan_winner" => EventType::PlanWinner,
        "plan_refine_round" => EventType::PlanRefineRound,
        "plan_refine_result" => EventType::PlanRefineResult,
        "convergence_iter" => EventType::ConvergenceIter,
        "gate_fail" => EventType::GateFail,
        "convergence_escalated" => EventType::ConvergenceEscalated,
        "task_complete" => EventType::TaskComplete,
        _ => EventType::TaskProgress,
    }
}

/// Build the artifact graph the Convergence Loop resumes with:
/// `failed` and `waiting` artifacts only — `passed` artifacts from the
/// recovery state are not regenerated (§4.10's recovery wiring).
fn resume_graph(recovery: &RecoveryState) -> ArtifactGraph {
    let nodes = recovery
        .artifacts
        .iter()
        .filter(|a| matches!(a.status, RecoveryStatus::Failed | RecoveryStatus::Waiting))
        .map(|a| ArtifactSpec::new(ArtifactId::new(), a.path.clone()).produces(vec![a.path.clone()]))
        .collect();
    ArtifactGraph::new(nodes)
}

pub struct Runtime<L: LlmClient, C: Clock> {
    llm: L,
    clock: C,
    workspace: PathBuf,
    config: Config,
    knowledge: Arc<KnowledgeStore>,
    recovery: Arc<RecoveryStore>,
    event_bus: Arc<EventBus>,
    gate_commands: StandardGateCommands,
}

impl<L: LlmClient, C: Clock + 'static> Runtime<L, C> {
    pub fn new(llm: L, clock: C, workspace: impl Into<PathBuf>, config: Config, event_bus: Arc<EventBus>) -> Self {
        let workspace = workspace.into();
        let knowledge = Arc::new(KnowledgeStore::load(&workspace).unwrap_or_else(|err| {
            tracing::warn!(%err, "failed to load knowledge store, starting empty");
            KnowledgeStore::new()
        }));
        let recovery = Arc::new(RecoveryStore::new(workspace.join(".sunwell")));
        Self { llm, clock, workspace, config, knowledge, recovery, event_bus, gate_commands: StandardGateCommands::default() }
    }

    pub fn with_gate_commands(mut self, commands: StandardGateCommands) -> Self {
        self.gate_commands = commands;
        self
    }

    pub fn knowledge(&self) -> &Arc<KnowledgeStore> {
        &self.knowledge
    }

    pub fn recovery(&self) -> &Arc<RecoveryStore> {
        &self.recovery
    }

    async fn emit(&self, run_id: RunId, source: EventSource, event_type: EventType, data: Value) {
        let event = AgentEvent::new(event_type, run_id, source, self.clock.epoch_ms() / 1000, data);
        self.event_bus.broadcast(event).await;
    }

    /// Run `goal` to completion, escalation, or cancellation. Checks for a
    /// pending recovery state matching this goal's hash first; if one
    /// exists, resumes from it instead of starting fresh.
    pub async fn run(
        &self,
        goal: Goal,
        run_id: RunId,
        source: EventSource,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, DaemonError> {
        let goal_hash = RecoveryStore::goal_hash(&goal);
        if let Some(pending) = self.recovery.load(&goal_hash) {
            tracing::info!(goal_hash, "resuming from pending recovery state");
            return self.resume_from_recovery(pending, run_id, source, cancel).await;
        }

        self.emit(run_id, source, EventType::TaskStart, json!({"goal": goal.description})).await;

        let router = AdaptiveRouter::new(&self.llm);
        let decision = router.classify(&goal).await?;
        match decision.route {
            Route::Stop => {
                let reason = "goal flagged as dangerous, awaiting user confirmation".to_string();
                self.emit(run_id, source, EventType::TaskFailed, json!({"reason": reason})).await;
                Ok(RunOutcome::NeedsConfirmation { reason })
            }
            Route::Dialectic => {
                let reason = "goal is ambiguous, clarification required".to_string();
                self.emit(run_id, source, EventType::TaskFailed, json!({"reason": reason})).await;
                Ok(RunOutcome::NeedsClarification { reason })
            }
            Route::Hierarchical => self.run_hierarchical(goal, run_id, source, cancel).await,
            Route::Harmonic => self.run_single(&goal, run_id, source, cancel, self.config.planner.candidates).await,
            Route::SingleShot => self.run_single(&goal, run_id, source, cancel, 1).await,
        }
    }

    async fn run_hierarchical(
        &self,
        epic: Goal,
        run_id: RunId,
        source: EventSource,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, DaemonError> {
        let decomposer = EpicDecomposer::new(&self.llm);
        let milestones = decomposer.decompose(&epic).await?;
        self.emit(run_id, source, EventType::TaskProgress, json!({"milestones": milestones.len()})).await;

        let mut tracker = MilestoneTracker::new(milestones);
        while let Some(milestone) = tracker.active().cloned() {
            match self.run_single(&milestone, run_id, source, cancel, self.config.planner.candidates).await? {
                RunOutcome::Completed => tracker.advance(),
                other => return Ok(other),
            }
        }
        self.emit(run_id, source, EventType::TaskComplete, json!({"epic": epic.description})).await;
        Ok(RunOutcome::Completed)
    }

    async fn run_single(
        &self,
        goal: &Goal,
        run_id: RunId,
        source: EventSource,
        cancel: &CancellationToken,
        candidates: usize,
    ) -> Result<RunOutcome, DaemonError> {
        let planner = HarmonicPlanner::new(&self.llm, &self.knowledge)
            .with_candidates(candidates)
            .with_refinement_rounds(self.config.planner.refinement_rounds);

        let mut planner_events: Vec<(String, Value)> = Vec::new();
        let (graph, metrics) = planner
            .plan_with_metrics(goal, None, self.config.knowledge.limit_per_category, |label, data| {
                planner_events.push((label.to_string(), data));
            })
            .await?;
        for (label, data) in planner_events {
            self.emit(run_id, source, label_to_event_type(&label), data).await;
        }

        let checkpoints = Arc::new(CheckpointEngine::new(&self.workspace, run_id.to_string(), self.clock.clone()));
        if self.config.checkpoints.auto_before_destructive {
            self.checkpoint_before_run(&checkpoints).await;
        }

        let tools = ToolExecutor::new(&self.workspace)
            .with_allowed_command_prefixes(self.config.allowed_command_prefixes.clone())
            .with_checkpoint_consultant(checkpoints.clone());
        let gates = GatePipeline::new(standard_gates(&self.gate_commands));
        let loop_runner = ConvergenceLoop::new(&self.llm, &tools, &gates, &self.recovery, &self.clock)
            .with_max_iterations(self.config.convergence.max_iterations)
            .with_fixed_point_detection(self.config.convergence.fixed_point_detection);

        let mut loop_events: Vec<(String, Value)> = Vec::new();
        let outcome = loop_runner
            .run(goal, &graph, run_id, &self.workspace, cancel, |label, data| {
                loop_events.push((label.to_string(), data));
            })
            .await?;
        for (label, data) in loop_events {
            self.emit(run_id, source, label_to_event_type(&label), data).await;
        }

        if let Err(err) = checkpoints.save() {
            tracing::warn!(%err, "failed to persist checkpoint session state");
        }

        self.apply_outcome(goal, run_id, source, metrics, outcome).await
    }

    async fn resume_from_recovery(
        &self,
        recovery: RecoveryState,
        run_id: RunId,
        source: EventSource,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, DaemonError> {
        self.emit(run_id, source, EventType::RecoveryResolved, json!({"goal_hash": recovery.goal_hash})).await;

        let graph = resume_graph(&recovery);
        let goal = recovery.goal.clone();
        let checkpoints = Arc::new(CheckpointEngine::new(&self.workspace, run_id.to_string(), self.clock.clone()));
        let tools = ToolExecutor::new(&self.workspace)
            .with_allowed_command_prefixes(self.config.allowed_command_prefixes.clone())
            .with_checkpoint_consultant(checkpoints.clone());
        let gates = GatePipeline::new(standard_gates(&self.gate_commands));
        let loop_runner = ConvergenceLoop::new(&self.llm, &tools, &gates, &self.recovery, &self.clock)
            .with_max_iterations(self.config.convergence.max_iterations)
            .with_fixed_point_detection(self.config.convergence.fixed_point_detection);

        let mut loop_events: Vec<(String, Value)> = Vec::new();
        let outcome = loop_runner
            .run(&goal, &graph, run_id, &self.workspace, cancel, |label, data| {
                loop_events.push((label.to_string(), data));
            })
            .await?;
        for (label, data) in loop_events {
            self.emit(run_id, source, label_to_event_type(&label), data).await;
        }

        if let Err(err) = checkpoints.save() {
            tracing::warn!(%err, "failed to persist checkpoint session state");
        }

        let metrics = PlanMetrics {
            mode: sun_engine::PlanMode::Standard,
            candidates_generated: 0,
            winner_strategy: None,
            expected_iterations: 0,
            refinement_rounds_run: 0,
            knowledge_used: Vec::new(),
        };
        self.apply_outcome(&goal, run_id, source, metrics, outcome).await
    }

    async fn checkpoint_before_run(&self, engine: &Arc<CheckpointEngine<C>>) {
        match collect_workspace_files(&self.workspace) {
            Ok(files) => {
                if let Err(err) = engine.checkpoint(&files, "pre-run snapshot", 1.0, Some("pre-run".to_string())) {
                    tracing::warn!(%err, "failed to checkpoint workspace before run");
                }
            }
            Err(err) => tracing::warn!(%err, "failed to enumerate workspace files for checkpoint"),
        }
    }

    fn extract_learnings(&self, goal: &Goal, artifacts: &[RecoveryArtifact], now_ms: u64) {
        if artifacts.is_empty() {
            return;
        }
        let paths: Vec<&str> = artifacts.iter().map(|a| a.path.as_str()).collect();
        let fact = format!("goal '{}' completed by producing: {}", goal.description, paths.join(", "));
        self.knowledge.add_learning(fact, LearningCategory::Pattern, 0.6, now_ms);
    }

    fn persist_knowledge(&self) {
        if let Err(err) = self.knowledge.save(&self.workspace) {
            tracing::warn!(%err, "failed to persist knowledge store");
        }
    }

    async fn apply_outcome(
        &self,
        goal: &Goal,
        run_id: RunId,
        source: EventSource,
        metrics: PlanMetrics,
        outcome: ConvergenceOutcome,
    ) -> Result<RunOutcome, DaemonError> {
        let now = self.clock.epoch_ms();
        match outcome {
            ConvergenceOutcome::Complete { artifacts } => {
                for id in &metrics.knowledge_used {
                    self.knowledge.record_usage(*id, true, now);
                }
                self.extract_learnings(goal, &artifacts, now);
                self.persist_knowledge();
                self.emit(run_id, source, EventType::TaskComplete, json!({"goal": goal.description})).await;
                Ok(RunOutcome::Completed)
            }
            ConvergenceOutcome::Escalated { recovery, reason } => {
                for id in &metrics.knowledge_used {
                    self.knowledge.record_usage(*id, false, now);
                }
                let fact = recovery.failure_reason.clone().unwrap_or_else(|| "unknown failure".to_string());
                self.knowledge.add_learning(fact, LearningCategory::DeadEnd, 0.5, now);
                self.persist_knowledge();
                self.emit(
                    run_id,
                    source,
                    EventType::RecoverySaved,
                    json!({"goal_hash": recovery.goal_hash, "reason": reason.as_str()}),
                )
                .await;
                Ok(RunOutcome::Escalated { goal_hash: recovery.goal_hash, reason: reason.as_str().to_string() })
            }
            ConvergenceOutcome::Cancelled { recovery } => {
                self.emit(
                    run_id,
                    source,
                    EventType::RecoverySaved,
                    json!({"goal_hash": recovery.goal_hash, "reason": "cancelled"}),
                )
                .await;
                Ok(RunOutcome::Cancelled { goal_hash: recovery.goal_hash })
            }
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
