// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recognized configuration, loaded from `.sunwell/config.toml`. Every
//! field has a spec-mandated default, so a missing file (or a file
//! missing individual tables) is not an error — `Config::default()` is a
//! fully valid configuration.

use crate::error::DaemonError;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConvergenceConfig {
    pub max_iterations: u32,
    pub fixed_point_detection: bool,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self { max_iterations: 5, fixed_point_detection: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub candidates: usize,
    pub refinement_rounds: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self { candidates: 5, refinement_rounds: 1 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    pub limit_per_category: usize,
    pub min_score: f32,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self { limit_per_category: 5, min_score: 0.3 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckpointsConfig {
    pub auto_before_destructive: bool,
}

impl Default for CheckpointsConfig {
    fn default() -> Self {
        Self { auto_before_destructive: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventBusConfig {
    pub max_subscribers: usize,
    pub retention_runs: usize,
    pub retention_seconds: u64,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self { max_subscribers: 100, retention_runs: 100, retention_seconds: 3600 }
    }
}

fn default_allowed_command_prefixes() -> Vec<String> {
    ["npm", "python", "python3", "cargo", "go", "make", "docker", "pip", "pip3", "uv", "node", "yarn", "pnpm"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

const DEFAULT_MAX_CONCURRENT_RUNS: usize = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub convergence: ConvergenceConfig,
    pub planner: PlannerConfig,
    pub knowledge: KnowledgeConfig,
    pub checkpoints: CheckpointsConfig,
    pub event_bus: EventBusConfig,
    #[serde(default = "default_allowed_command_prefixes")]
    pub allowed_command_prefixes: Vec<String>,
    pub max_concurrent_runs: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            convergence: ConvergenceConfig::default(),
            planner: PlannerConfig::default(),
            knowledge: KnowledgeConfig::default(),
            checkpoints: CheckpointsConfig::default(),
            event_bus: EventBusConfig::default(),
            allowed_command_prefixes: default_allowed_command_prefixes(),
            max_concurrent_runs: DEFAULT_MAX_CONCURRENT_RUNS,
        }
    }
}

impl Config {
    /// Load `.sunwell/config.toml` under `workspace_root`. A missing file
    /// is not an error — it simply yields spec defaults.
    pub fn load(workspace_root: &Path) -> Result<Self, DaemonError> {
        let path = workspace_root.join(".sunwell").join("config.toml");
        match std::fs::read_to_string(&path) {
            Ok(raw) => toml::from_str(&raw).map_err(|err| DaemonError::Config(err.to_string())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(DaemonError::Io(err)),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
