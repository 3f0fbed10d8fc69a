// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Harmonic Planner: turns a goal into an [`ArtifactGraph`] either by
//! generating and scoring N independent candidates ("refraction" and
//! "synthesis" — standard mode) or, when a matching template exists in
//! the Knowledge Store, by variable substitution alone (template mode,
//! which skips candidate generation entirely).
//!
//! Candidate variance is a tagged enum the planner dispatches on by
//! index, not a trait hierarchy — matches the "dynamic dispatch over
//! persona variance" design note: a flat list of strategies, no
//! inheritance.

use crate::error::EngineError;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use sun_adapters::{CompletionRequest, LlmClient};
use sun_core::{ArtifactGraph, ArtifactId, ArtifactSpec, Goal, LearningId};
use sun_storage::{KnowledgeStore, PlanningContext};

pub const DEFAULT_CANDIDATES: usize = 5;
pub const DEFAULT_REFINEMENT_ROUNDS: u32 = 1;

const DEFAULT_PERSONAS: &[&str] = &["architect", "critic", "simplifier", "adversary", "pragmatist"];

/// Candidate variance, implemented as a flat tagged enum per the
/// "dynamic dispatch over persona variance" design note — the planner
/// holds a list of these and each candidate slot picks one by index.
#[derive(Debug, Clone, PartialEq)]
pub enum VarianceStrategy {
    Prompting(String),
    Temperature(f32),
    MultiRound(u32),
}

impl VarianceStrategy {
    fn label(&self) -> String {
        match self {
            Self::Prompting(persona) => persona.clone(),
            Self::Temperature(t) => format!("temperature-{t}"),
            Self::MultiRound(n) => format!("multi-round-{n}"),
        }
    }

    fn default_set(count: usize) -> Vec<Self> {
        (0..count).map(|i| Self::Prompting(DEFAULT_PERSONAS[i % DEFAULT_PERSONAS.len()].to_string())).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanMode {
    Standard,
    Template,
}

#[derive(Debug, Clone)]
pub struct PlanMetrics {
    pub mode: PlanMode,
    pub candidates_generated: usize,
    pub winner_strategy: Option<String>,
    pub expected_iterations: u32,
    pub refinement_rounds_run: u32,
    /// Learnings that fed this plan, for post-run `record_usage` once the
    /// run's outcome (success/failure) is known — the planner itself
    /// never learns whether the plan it produced actually worked.
    pub knowledge_used: Vec<LearningId>,
}

#[derive(Debug, Deserialize)]
struct CandidateArtifactDto {
    #[serde(default)]
    id: Option<String>,
    description: String,
    #[serde(default)]
    produces: Vec<String>,
    #[serde(default)]
    requires: Vec<String>,
    #[serde(default)]
    validation_commands: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateGraphDto {
    artifacts: Vec<CandidateArtifactDto>,
}

struct ScoredCandidate {
    strategy: VarianceStrategy,
    graph: ArtifactGraph,
    score: f32,
    expected_iterations: u32,
}

pub struct HarmonicPlanner<'a, L: LlmClient> {
    llm: &'a L,
    knowledge: &'a KnowledgeStore,
    candidates: usize,
    refinement_rounds: u32,
    strategies: Vec<VarianceStrategy>,
}

impl<'a, L: LlmClient> HarmonicPlanner<'a, L> {
    pub fn new(llm: &'a L, knowledge: &'a KnowledgeStore) -> Self {
        Self {
            llm,
            knowledge,
            candidates: DEFAULT_CANDIDATES,
            refinement_rounds: DEFAULT_REFINEMENT_ROUNDS,
            strategies: VarianceStrategy::default_set(DEFAULT_CANDIDATES),
        }
    }

    pub fn with_candidates(mut self, count: usize) -> Self {
        self.candidates = count;
        self.strategies = VarianceStrategy::default_set(count);
        self
    }

    pub fn with_refinement_rounds(mut self, rounds: u32) -> Self {
        self.refinement_rounds = rounds;
        self
    }

    fn knowledge_preamble(context: &PlanningContext) -> String {
        let mut lines = Vec::new();
        for (category, learnings) in &context.by_category {
            for learning in learnings {
                lines.push(format!("[{category}] {}", learning.fact));
            }
        }
        lines.join("\n")
    }

    fn knowledge_ids(context: &PlanningContext) -> Vec<LearningId> {
        context.by_category.values().flatten().map(|l| l.id).collect()
    }

    fn dto_to_graph(dto: CandidateGraphDto) -> ArtifactGraph {
        let mut id_map: HashMap<String, ArtifactId> = HashMap::new();
        let specs: Vec<(CandidateArtifactDto, ArtifactId)> = dto
            .artifacts
            .into_iter()
            .map(|artifact| {
                let id = artifact.id.clone().map(ArtifactId::from_string).unwrap_or_else(ArtifactId::new);
                if let Some(key) = &artifact.id {
                    id_map.insert(key.clone(), id);
                }
                (artifact, id)
            })
            .collect();

        let nodes = specs
            .into_iter()
            .map(|(artifact, id)| {
                let requires = artifact
                    .requires
                    .iter()
                    .map(|r| id_map.get(r).copied().unwrap_or_else(|| ArtifactId::from_string(r)))
                    .collect();
                ArtifactSpec::new(id, artifact.description)
                    .produces(artifact.produces)
                    .requires(requires)
                    .validation_commands(artifact.validation_commands)
            })
            .collect();
        ArtifactGraph::new(nodes)
    }

    fn candidate_prompt(&self, goal: &Goal, preamble: &str, strategy: &VarianceStrategy) -> CompletionRequest {
        let persona = match strategy {
            VarianceStrategy::Prompting(p) => p.clone(),
            other => other.label(),
        };
        let prompt = format!(
            "You are the {persona} voice on a planning panel.\nGoal: {}\nKnown context:\n{preamble}\n\
             Produce an artifact graph: a list of artifacts, each with id, description, produces (file path \
             patterns), requires (other artifact ids), and validation_commands.",
            goal.description
        );
        CompletionRequest::new(prompt).with_schema(Self::graph_schema())
    }

    fn graph_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "artifacts": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": {"type": "string"},
                            "description": {"type": "string"},
                            "produces": {"type": "array", "items": {"type": "string"}},
                            "requires": {"type": "array", "items": {"type": "string"}},
                            "validation_commands": {"type": "array", "items": {"type": "string"}}
                        },
                        "required": ["description"]
                    }
                }
            },
            "required": ["artifacts"]
        })
    }

    fn evaluate(graph: &ArtifactGraph) -> Option<(f32, u32)> {
        graph.validate().ok()?;
        let count = graph.len() as f32;
        let expected_iterations =
            graph.nodes().iter().map(|n| n.validation_commands.len() as u32).sum::<u32>().max(1);
        let score = 1.0 - count * 0.02 - (expected_iterations as f32) * 0.01;
        Some((score, expected_iterations))
    }

    fn pick_winner(candidates: Vec<ScoredCandidate>) -> Option<ScoredCandidate> {
        candidates.into_iter().fold(None, |best, candidate| match best {
            None => Some(candidate),
            Some(current) => {
                if candidate.score > current.score
                    || (candidate.score == current.score && candidate.graph.len() < current.graph.len())
                    || (candidate.score == current.score
                        && candidate.graph.len() == current.graph.len()
                        && candidate.expected_iterations < current.expected_iterations)
                {
                    Some(candidate)
                } else {
                    Some(current)
                }
            }
        })
    }

    /// Build the template-mode graph: one artifact per `expected_artifacts`
    /// entry, chained as a linear `requires` pipeline (matches the
    /// model → routes → test ordering convention used by the teacher's
    /// example templates), with every substituted validation command
    /// attached to the final artifact.
    fn template_graph(template: &sun_core::TemplateData, variables: &HashMap<String, String>) -> ArtifactGraph {
        let mut nodes = Vec::with_capacity(template.expected_artifacts.len());
        let mut previous: Option<ArtifactId> = None;
        let validation_commands: Vec<String> =
            template.validation_commands.iter().map(|c| substitute(c, variables)).collect();
        let last_index = template.expected_artifacts.len().saturating_sub(1);
        for (index, pattern) in template.expected_artifacts.iter().enumerate() {
            let path = substitute(pattern, variables);
            let id = ArtifactId::new();
            let mut spec = ArtifactSpec::new(id, format!("produce {path}")).produces(vec![path]);
            if let Some(prev) = previous {
                spec = spec.requires(vec![prev]);
            }
            if index == last_index {
                spec = spec.validation_commands(validation_commands.clone());
            }
            nodes.push(spec);
            previous = Some(id);
        }
        ArtifactGraph::new(nodes)
    }

    async fn extract_template_variables(
        &self,
        goal: &Goal,
        template: &sun_core::TemplateData,
    ) -> Result<HashMap<String, String>, EngineError> {
        if template.variables.is_empty() {
            return Ok(HashMap::new());
        }
        let names: Vec<&str> = template.variables.iter().map(|v| v.name.as_str()).collect();
        let prompt = format!(
            "Extract the following variables from this goal as a flat JSON object of name -> string value: {:?}\nGoal: {}",
            names, goal.description
        );
        let schema = json!({"type": "object", "additionalProperties": {"type": "string"}});
        let response = self.llm.complete(CompletionRequest::new(prompt).with_schema(schema)).await?;
        let map: HashMap<String, String> = serde_json::from_value(response)
            .map_err(|err| EngineError::Planning(format!("template variable extraction returned malformed JSON: {err}")))?;
        Ok(map)
    }

    /// Plan `goal`, returning the winning artifact graph and metrics
    /// describing how it was produced. `emit` receives a free-form event
    /// label for every planner-internal decision point (candidate
    /// generated/scored, winner chosen, template matched, refine round) —
    /// the caller (the orchestrator) is responsible for wrapping these
    /// into `AgentEvent`s on the run's event stream.
    pub async fn plan_with_metrics(
        &self,
        goal: &Goal,
        goal_embedding: Option<&[f32]>,
        limit_per_category: usize,
        mut emit: impl FnMut(&str, Value),
    ) -> Result<(ArtifactGraph, PlanMetrics), EngineError> {
        let context = self.knowledge.retrieve_for_planning(&goal.description, goal_embedding, limit_per_category);
        let knowledge_used = Self::knowledge_ids(&context);

        if let Some(template) = self.knowledge.matching_template(&goal.description) {
            let variables = self.extract_template_variables(goal, &template).await?;
            let graph = Self::template_graph(&template, &variables);
            graph.validate()?;
            emit("template_matched", json!({"template": template.name, "variables": variables}));
            let expected_iterations =
                graph.nodes().iter().map(|n| n.validation_commands.len() as u32).sum::<u32>().max(1);
            return Ok((
                graph,
                PlanMetrics {
                    mode: PlanMode::Template,
                    candidates_generated: 0,
                    winner_strategy: Some("template".to_string()),
                    expected_iterations,
                    refinement_rounds_run: 0,
                    knowledge_used,
                },
            ));
        }

        let preamble = Self::knowledge_preamble(&context);
        let futures = self
            .strategies
            .iter()
            .map(|strategy| self.llm.complete(self.candidate_prompt(goal, &preamble, strategy)));
        let raw_responses = join_all(futures).await;

        let mut scored = Vec::new();
        for (strategy, response) in self.strategies.iter().zip(raw_responses) {
            let Ok(value) = response else { continue };
            emit("plan_candidate_generated", json!({"strategy": strategy.label()}));
            let Ok(dto) = serde_json::from_value::<CandidateGraphDto>(value) else { continue };
            let graph = Self::dto_to_graph(dto);
            let Some((score, expected_iterations)) = Self::evaluate(&graph) else { continue };
            emit("plan_candidate_scored", json!({"strategy": strategy.label(), "score": score}));
            scored.push(ScoredCandidate { strategy: strategy.clone(), graph, score, expected_iterations });
        }

        let winner = Self::pick_winner(scored)
            .ok_or_else(|| EngineError::Planning("no candidate produced a valid artifact graph".to_string()))?;
        emit("plan_winner", json!({"strategy": winner.strategy.label(), "score": winner.score}));

        let mut graph = winner.graph;
        let mut expected_iterations = winner.expected_iterations;
        let mut rounds_run = 0;
        for round in 0..self.refinement_rounds {
            let prior_score = Self::evaluate(&graph).map(|(s, _)| s).unwrap_or(0.0);
            emit("plan_refine_round", json!({"round": round}));
            let prompt = format!(
                "Refine this artifact graph to better satisfy the goal: {}\nCurrent graph score: {prior_score}\n\
                 Current graph: {}",
                goal.description,
                serde_json::to_string(&graph).unwrap_or_default()
            );
            let Ok(response) = self.llm.complete(CompletionRequest::new(prompt).with_schema(Self::graph_schema())).await
            else {
                break;
            };
            let Ok(dto) = serde_json::from_value::<CandidateGraphDto>(response) else { break };
            let refined = Self::dto_to_graph(dto);
            let Some((new_score, new_iterations)) = Self::evaluate(&refined) else { break };
            rounds_run += 1;
            emit("plan_refine_result", json!({"round": round, "delta": new_score - prior_score}));
            if new_score <= prior_score {
                break;
            }
            graph = refined;
            expected_iterations = new_iterations;
        }

        Ok((
            graph,
            PlanMetrics {
                mode: PlanMode::Standard,
                candidates_generated: scored_len(&self.strategies),
                winner_strategy: Some(winner.strategy.label()),
                expected_iterations,
                refinement_rounds_run: rounds_run,
                knowledge_used,
            },
        ))
    }
}

fn scored_len(strategies: &[VarianceStrategy]) -> usize {
    strategies.len()
}

fn brace(inner: &str) -> String {
    let mut s = String::with_capacity(inner.len() + 4);
    s.push_str("{{");
    s.push_str(inner);
    s.push_str("}}");
    s
}

/// Supports only `{{var}}`, `{{var_lower}}`, `{{var_upper}}` — the
/// triple-brace forms seen in some template sources are typos, not a
/// distinct syntax (see template substitution note).
fn substitute(pattern: &str, variables: &HashMap<String, String>) -> String {
    let mut out = pattern.to_string();
    for (name, value) in variables {
        out = out.replace(&brace(name), value);
        out = out.replace(&brace(&format!("{name}_lower")), &value.to_lowercase());
        out = out.replace(&brace(&format!("{name}_upper")), &value.to_uppercase());
    }
    out
}

#[cfg(test)]
#[path = "planner_tests.rs"]
mod tests;
